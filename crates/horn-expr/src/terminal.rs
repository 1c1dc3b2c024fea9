//! Terminal (leaf) types of the expression DAG
//!
//! Every value that can sit at a leaf implements [`Terminal`]: how it prints,
//! a strict order, equality and a hash consistent with that equality. The
//! built-in kinds are dispatched statically through [`Atom`]; any other type
//! implementing the trait can be embedded as [`Atom::Ext`] without touching
//! the DAG or the writers.
//!
//! IR handles (values, blocks, functions) are opaque: their identity is the
//! allocation address. They print with a globally unique name:
//!
//! - instruction or argument: `<function>@%<name>`
//! - global: `@<name>`
//! - unnamed value: its defining text
//! - block: `<function>@<block>`

use crate::ir::{BlockRef, FunctionRef, ValueRef};
use num_bigint::BigInt;
use rustc_hash::FxHasher;
use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Capabilities required of a leaf type.
pub trait Terminal {
    /// Render the value. `depth` is the nesting depth of the leaf in the
    /// expression being printed and `brkt` is set when the leaf sits inside
    /// an enclosing application.
    fn print(&self, out: &mut dyn fmt::Write, depth: usize, brkt: bool) -> fmt::Result;

    /// Strict weak order, total and stable for the life of the process.
    fn less(&self, other: &Self) -> bool;

    fn equal_to(&self, other: &Self) -> bool;

    /// Must agree with [`Terminal::equal_to`].
    fn hash_value(&self) -> u64;
}

fn fx_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

impl Terminal for bool {
    fn print(&self, out: &mut dyn fmt::Write, _depth: usize, _brkt: bool) -> fmt::Result {
        out.write_str(if *self { "true" } else { "false" })
    }

    fn less(&self, other: &Self) -> bool {
        !*self & *other
    }

    fn equal_to(&self, other: &Self) -> bool {
        self == other
    }

    fn hash_value(&self) -> u64 {
        fx_hash(self)
    }
}

impl Terminal for BigInt {
    fn print(&self, out: &mut dyn fmt::Write, _depth: usize, _brkt: bool) -> fmt::Result {
        write!(out, "{self}")
    }

    fn less(&self, other: &Self) -> bool {
        self < other
    }

    fn equal_to(&self, other: &Self) -> bool {
        self == other
    }

    fn hash_value(&self) -> u64 {
        fx_hash(self)
    }
}

/// A name compared by value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Terminal for Symbol {
    fn print(&self, out: &mut dyn fmt::Write, _depth: usize, _brkt: bool) -> fmt::Result {
        out.write_str(&self.0)
    }

    fn less(&self, other: &Self) -> bool {
        self < other
    }

    fn equal_to(&self, other: &Self) -> bool {
        self == other
    }

    fn hash_value(&self) -> u64 {
        fx_hash(self)
    }
}

impl Terminal for FunctionRef {
    fn print(&self, out: &mut dyn fmt::Write, _depth: usize, _brkt: bool) -> fmt::Result {
        out.write_str(self.name())
    }

    fn less(&self, other: &Self) -> bool {
        Arc::as_ptr(self) < Arc::as_ptr(other)
    }

    fn equal_to(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }

    fn hash_value(&self) -> u64 {
        fx_hash(&(Arc::as_ptr(self) as usize))
    }
}

impl Terminal for BlockRef {
    fn print(&self, out: &mut dyn fmt::Write, _depth: usize, _brkt: bool) -> fmt::Result {
        if let Some(func) = self.parent() {
            write!(out, "{}@", func.name())?;
        }
        out.write_str(self.name())
    }

    fn less(&self, other: &Self) -> bool {
        Arc::as_ptr(self) < Arc::as_ptr(other)
    }

    fn equal_to(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }

    fn hash_value(&self) -> u64 {
        fx_hash(&(Arc::as_ptr(self) as usize))
    }
}

impl Terminal for ValueRef {
    fn print(&self, out: &mut dyn fmt::Write, _depth: usize, _brkt: bool) -> fmt::Result {
        // locals are qualified by their function so names stay unique
        if let Some(func) = self.parent_function() {
            write!(out, "{}@", func.name())?;
        }
        match self.name() {
            Some(name) => {
                let sigil = if self.is_global() { '@' } else { '%' };
                write!(out, "{sigil}{name}")
            }
            None => write!(out, "{self}"),
        }
    }

    fn less(&self, other: &Self) -> bool {
        Arc::as_ptr(self) < Arc::as_ptr(other)
    }

    fn equal_to(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }

    fn hash_value(&self) -> u64 {
        fx_hash(&(Arc::as_ptr(self) as usize))
    }
}

trait DynTerminal: Any {
    fn as_any(&self) -> &dyn Any;
    fn print_dyn(&self, out: &mut dyn fmt::Write, depth: usize, brkt: bool) -> fmt::Result;
    fn less_dyn(&self, other: &dyn DynTerminal) -> bool;
    fn equal_dyn(&self, other: &dyn DynTerminal) -> bool;
    fn hash_dyn(&self) -> u64;
}

impl<T: Terminal + Any> DynTerminal for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn print_dyn(&self, out: &mut dyn fmt::Write, depth: usize, brkt: bool) -> fmt::Result {
        self.print(out, depth, brkt)
    }

    fn less_dyn(&self, other: &dyn DynTerminal) -> bool {
        match other.as_any().downcast_ref::<T>() {
            Some(other) => self.less(other),
            None => TypeId::of::<T>() < other.as_any().type_id(),
        }
    }

    fn equal_dyn(&self, other: &dyn DynTerminal) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self.equal_to(other))
    }

    fn hash_dyn(&self) -> u64 {
        fx_hash(&(TypeId::of::<T>(), self.hash_value()))
    }
}

/// A leaf of a user-supplied terminal type.
#[derive(Clone)]
pub struct ExtTerminal(Arc<dyn DynTerminal>);

impl ExtTerminal {
    pub fn new<T: Terminal + 'static>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

/// A leaf value of the DAG.
#[derive(Clone)]
pub enum Atom {
    Bool(bool),
    Int(BigInt),
    Name(Symbol),
    Value(ValueRef),
    Block(BlockRef),
    Function(FunctionRef),
    Ext(ExtTerminal),
}

impl Atom {
    fn rank(&self) -> u8 {
        match self {
            Atom::Bool(_) => 0,
            Atom::Int(_) => 1,
            Atom::Name(_) => 2,
            Atom::Value(_) => 3,
            Atom::Block(_) => 4,
            Atom::Function(_) => 5,
            Atom::Ext(_) => 6,
        }
    }

    pub fn print(&self, out: &mut dyn fmt::Write, depth: usize, brkt: bool) -> fmt::Result {
        match self {
            Atom::Bool(b) => b.print(out, depth, brkt),
            Atom::Int(n) => n.print(out, depth, brkt),
            Atom::Name(s) => s.print(out, depth, brkt),
            Atom::Value(v) => v.print(out, depth, brkt),
            Atom::Block(b) => b.print(out, depth, brkt),
            Atom::Function(f) => f.print(out, depth, brkt),
            Atom::Ext(e) => e.0.print_dyn(out, depth, brkt),
        }
    }

    pub fn hash_value(&self) -> u64 {
        let inner = match self {
            Atom::Bool(b) => b.hash_value(),
            Atom::Int(n) => n.hash_value(),
            Atom::Name(s) => s.hash_value(),
            Atom::Value(v) => v.hash_value(),
            Atom::Block(b) => b.hash_value(),
            Atom::Function(f) => f.hash_value(),
            Atom::Ext(e) => e.0.hash_dyn(),
        };
        fx_hash(&(self.rank(), inner))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Atom::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Atom::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&ValueRef> {
        match self {
            Atom::Value(v) => Some(v),
            _ => None,
        }
    }

    /// The printed form as an owned string.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.print(&mut out, 0, false);
        out
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Atom::Bool(a), Atom::Bool(b)) => a.equal_to(b),
            (Atom::Int(a), Atom::Int(b)) => a.equal_to(b),
            (Atom::Name(a), Atom::Name(b)) => a.equal_to(b),
            (Atom::Value(a), Atom::Value(b)) => a.equal_to(b),
            (Atom::Block(a), Atom::Block(b)) => a.equal_to(b),
            (Atom::Function(a), Atom::Function(b)) => a.equal_to(b),
            (Atom::Ext(a), Atom::Ext(b)) => a.0.equal_dyn(b.0.as_ref()),
            _ => false,
        }
    }
}

impl Eq for Atom {}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_value());
    }
}

fn order_of<T: Terminal>(a: &T, b: &T) -> Ordering {
    if a.less(b) {
        Ordering::Less
    } else if b.less(a) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

impl Ord for Atom {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Atom::Bool(a), Atom::Bool(b)) => order_of(a, b),
            (Atom::Int(a), Atom::Int(b)) => order_of(a, b),
            (Atom::Name(a), Atom::Name(b)) => order_of(a, b),
            (Atom::Value(a), Atom::Value(b)) => order_of(a, b),
            (Atom::Block(a), Atom::Block(b)) => order_of(a, b),
            (Atom::Function(a), Atom::Function(b)) => order_of(a, b),
            (Atom::Ext(a), Atom::Ext(b)) => {
                if a.0.less_dyn(b.0.as_ref()) {
                    Ordering::Less
                } else if b.0.less_dyn(a.0.as_ref()) {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Atom {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print(f, 0, false)
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Atom::Bool(_) => "Bool",
            Atom::Int(_) => "Int",
            Atom::Name(_) => "Name",
            Atom::Value(_) => "Value",
            Atom::Block(_) => "Block",
            Atom::Function(_) => "Function",
            Atom::Ext(_) => "Ext",
        };
        write!(f, "{kind}(")?;
        self.print(f, 0, false)?;
        write!(f, ")")
    }
}

impl From<bool> for Atom {
    fn from(b: bool) -> Self {
        Atom::Bool(b)
    }
}

impl From<BigInt> for Atom {
    fn from(n: BigInt) -> Self {
        Atom::Int(n)
    }
}

impl From<i64> for Atom {
    fn from(n: i64) -> Self {
        Atom::Int(BigInt::from(n))
    }
}

impl From<Symbol> for Atom {
    fn from(s: Symbol) -> Self {
        Atom::Name(s)
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Self {
        Atom::Name(Symbol::new(s))
    }
}

impl From<ValueRef> for Atom {
    fn from(v: ValueRef) -> Self {
        Atom::Value(v)
    }
}

impl From<BlockRef> for Atom {
    fn from(b: BlockRef) -> Self {
        Atom::Block(b)
    }
}

impl From<FunctionRef> for Atom {
    fn from(f: FunctionRef) -> Self {
        Atom::Function(f)
    }
}

impl From<ExtTerminal> for Atom {
    fn from(e: ExtTerminal) -> Self {
        Atom::Ext(e)
    }
}
