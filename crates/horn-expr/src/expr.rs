//! Hash-consed expression DAG
//!
//! Expressions live in an [`ExprFactory`] arena and are referred to by
//! [`ExprId`] handles. Every node is interned: building the same atom, or the
//! same operator over the same children, returns the same handle, so
//! equality is handle equality and hashing reads a cached value.
//!
//! Children are always created before their parents, so the DAG is acyclic
//! by construction. Nodes are never removed; the arena lives as long as the
//! factory that owns it.

// These constructors build DAG nodes, not perform operations.
#![allow(clippy::should_implement_trait)]

use crate::ir::{BlockRef, FunctionRef, Value, ValueRef};
use crate::numeric;
use crate::terminal::{Atom, ExtTerminal, Symbol, Terminal};
use crate::{Arity, ExprError, ExprResult, Op, Sort};
use num_bigint::BigInt;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Handle to an interned expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Shape of an expression node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Atom(Atom),
    App(Op, Vec<ExprId>),
}

#[derive(Debug)]
struct Entry {
    node: Node,
    hash: u64,
}

/// Interning table and arena for expressions.
///
/// The factory is an explicit context object: create one per run and pass
/// it to whatever builds or prints expressions.
#[derive(Debug, Default)]
pub struct ExprFactory {
    nodes: Vec<Entry>,
    /// Structural hash -> nodes with that hash
    table: FxHashMap<u64, Vec<ExprId>>,
}

impl ExprFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct nodes created so far
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: ExprId) -> &Node {
        &self.nodes[id.index()].node
    }

    /// Cached structural hash.
    pub fn hash(&self, id: ExprId) -> u64 {
        self.nodes[id.index()].hash
    }

    /// Interned expressions are equal iff their handles are.
    pub fn equals(&self, a: ExprId, b: ExprId) -> bool {
        a == b
    }

    pub fn children(&self, id: ExprId) -> &[ExprId] {
        match self.get(id) {
            Node::App(_, children) => children,
            Node::Atom(_) => &[],
        }
    }

    pub fn op(&self, id: ExprId) -> Option<&Op> {
        match self.get(id) {
            Node::App(op, _) => Some(op),
            Node::Atom(_) => None,
        }
    }

    pub fn atom(&self, id: ExprId) -> Option<&Atom> {
        match self.get(id) {
            Node::Atom(atom) => Some(atom),
            Node::App(..) => None,
        }
    }

    fn structural_hash(&self, node: &Node) -> u64 {
        let mut hasher = FxHasher::default();
        match node {
            Node::Atom(atom) => {
                0u8.hash(&mut hasher);
                atom.hash_value().hash(&mut hasher);
            }
            Node::App(op, children) => {
                1u8.hash(&mut hasher);
                op.hash(&mut hasher);
                children.len().hash(&mut hasher);
                for child in children {
                    self.hash(*child).hash(&mut hasher);
                }
            }
        }
        hasher.finish()
    }

    /// Return the existing node equal to `node`, or store it.
    fn intern(&mut self, node: Node) -> ExprId {
        let hash = self.structural_hash(&node);
        if let Some(bucket) = self.table.get(&hash) {
            for &id in bucket {
                if self.nodes[id.index()].node == node {
                    return id;
                }
            }
        }
        let id = ExprId(u32::try_from(self.nodes.len()).expect("expression arena exhausted"));
        self.nodes.push(Entry { node, hash });
        self.table.entry(hash).or_default().push(id);
        id
    }

    // ------------------------------------------------------------------
    // Terminals
    // ------------------------------------------------------------------

    /// Intern a leaf of one of the built-in terminal kinds.
    pub fn mk_terminal(&mut self, atom: impl Into<Atom>) -> ExprId {
        self.intern(Node::Atom(atom.into()))
    }

    /// Intern a leaf of a user-supplied terminal type.
    pub fn mk_ext<T: Terminal + 'static>(&mut self, value: T) -> ExprId {
        self.mk_terminal(ExtTerminal::new(value))
    }

    pub fn mk_bool(&mut self, b: bool) -> ExprId {
        self.mk_terminal(b)
    }

    pub fn mk_true(&mut self) -> ExprId {
        self.mk_bool(true)
    }

    pub fn mk_false(&mut self) -> ExprId {
        self.mk_bool(false)
    }

    pub fn mk_int(&mut self, n: impl Into<BigInt>) -> ExprId {
        self.mk_terminal(Atom::Int(n.into()))
    }

    pub fn mk_symbol(&mut self, name: &str) -> ExprId {
        self.mk_terminal(Symbol::new(name))
    }

    pub fn mk_value(&mut self, value: &ValueRef) -> ExprId {
        self.mk_terminal(ValueRef::clone(value))
    }

    pub fn mk_block(&mut self, block: &BlockRef) -> ExprId {
        self.mk_terminal(BlockRef::clone(block))
    }

    pub fn mk_function(&mut self, func: &FunctionRef) -> ExprId {
        self.mk_terminal(FunctionRef::clone(func))
    }

    /// Integer literal for an IR constant (integer or null pointer).
    pub fn mk_num(&mut self, value: &Value) -> ExprResult<ExprId> {
        let n = numeric::from_value(value)?;
        Ok(self.mk_int(n))
    }

    // ------------------------------------------------------------------
    // Variables and relations
    // ------------------------------------------------------------------

    /// Uninterpreted constant of `sort` named by `name`.
    pub fn mk_const(&mut self, name: impl Into<Atom>, sort: Sort) -> ExprId {
        let name = self.mk_terminal(name);
        self.intern(Node::App(Op::Const(sort), vec![name]))
    }

    /// Variable named by a plain string.
    pub fn mk_var(&mut self, name: &str, sort: Sort) -> ExprId {
        self.mk_const(Symbol::new(name), sort)
    }

    /// Variable standing for an IR value; its sort follows the value's type.
    pub fn mk_value_const(&mut self, value: &ValueRef) -> ExprResult<ExprId> {
        let sort = Sort::of_type(value.ty()).ok_or_else(|| {
            ExprError::Malformed(format!("value `{value}` of type {} has no sort", value.ty()))
        })?;
        Ok(self.mk_const(ValueRef::clone(value), sort))
    }

    /// Relation declaration `name : domain -> Bool`.
    pub fn mk_decl(&mut self, name: impl Into<Atom>, domain: Vec<Sort>) -> ExprId {
        let name = self.mk_terminal(name);
        self.intern(Node::App(Op::Decl(domain), vec![name]))
    }

    /// Apply relation `decl` to `args`.
    pub fn mk_fapp(&mut self, decl: ExprId, args: Vec<ExprId>) -> ExprResult<ExprId> {
        let Some(domain) = self.decl_domain(decl) else {
            return Err(ExprError::Malformed(format!(
                "`{}` is not a relation declaration",
                self.display(decl)
            )));
        };
        if domain.len() != args.len() {
            return Err(ExprError::ArityMismatch {
                op: self.display(decl).to_string(),
                expected: Arity::Exact(domain.len()),
                actual: args.len(),
            });
        }
        let mut children = Vec::with_capacity(args.len() + 1);
        children.push(decl);
        children.extend(args);
        Ok(self.intern(Node::App(Op::FApp, children)))
    }

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------

    /// Apply `op` to `args`, rejecting child counts the operator does not
    /// admit.
    pub fn mk_app(&mut self, op: Op, args: Vec<ExprId>) -> ExprResult<ExprId> {
        match &op {
            Op::FApp => {
                let Some((&decl, rest)) = args.split_first() else {
                    return Err(ExprError::ArityMismatch {
                        op: op.to_string(),
                        expected: op.arity(),
                        actual: 0,
                    });
                };
                return self.mk_fapp(decl, rest.to_vec());
            }
            Op::Const(_) | Op::Decl(_) => {
                if let [name] = args.as_slice() {
                    if self.atom(*name).is_none() {
                        return Err(ExprError::Malformed(format!(
                            "{op} name must be a terminal, got `{}`",
                            self.display(*name)
                        )));
                    }
                }
            }
            _ => {}
        }
        let arity = op.arity();
        if !arity.admits(args.len()) {
            return Err(ExprError::ArityMismatch {
                op: op.to_string(),
                expected: arity,
                actual: args.len(),
            });
        }
        Ok(self.intern(Node::App(op, args)))
    }

    fn mk_unary(&mut self, op: Op, a: ExprId) -> ExprId {
        self.intern(Node::App(op, vec![a]))
    }

    fn mk_binary(&mut self, op: Op, a: ExprId, b: ExprId) -> ExprId {
        self.intern(Node::App(op, vec![a, b]))
    }

    pub fn mk_not(&mut self, a: ExprId) -> ExprId {
        self.mk_unary(Op::Not, a)
    }

    /// Conjunction; empty is `true`, a single conjunct is returned as is.
    pub fn mk_and(&mut self, args: Vec<ExprId>) -> ExprId {
        match args.as_slice() {
            [] => self.mk_true(),
            [single] => *single,
            _ => self.intern(Node::App(Op::And, args)),
        }
    }

    /// Disjunction; empty is `false`, a single disjunct is returned as is.
    pub fn mk_or(&mut self, args: Vec<ExprId>) -> ExprId {
        match args.as_slice() {
            [] => self.mk_false(),
            [single] => *single,
            _ => self.intern(Node::App(Op::Or, args)),
        }
    }

    pub fn mk_implies(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.mk_binary(Op::Implies, a, b)
    }

    pub fn mk_iff(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.mk_binary(Op::Iff, a, b)
    }

    pub fn mk_eq(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.mk_binary(Op::Eq, a, b)
    }

    pub fn mk_ne(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.mk_binary(Op::Ne, a, b)
    }

    pub fn mk_lt(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.mk_binary(Op::Lt, a, b)
    }

    pub fn mk_le(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.mk_binary(Op::Le, a, b)
    }

    pub fn mk_gt(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.mk_binary(Op::Gt, a, b)
    }

    pub fn mk_ge(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.mk_binary(Op::Ge, a, b)
    }

    pub fn mk_add(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.mk_binary(Op::Add, a, b)
    }

    pub fn mk_sub(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.mk_binary(Op::Sub, a, b)
    }

    pub fn mk_mul(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.mk_binary(Op::Mul, a, b)
    }

    pub fn mk_div(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.mk_binary(Op::Div, a, b)
    }

    pub fn mk_mod(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.mk_binary(Op::Mod, a, b)
    }

    pub fn mk_neg(&mut self, a: ExprId) -> ExprId {
        self.mk_unary(Op::Neg, a)
    }

    pub fn mk_ite(&mut self, cond: ExprId, then_: ExprId, else_: ExprId) -> ExprId {
        self.intern(Node::App(Op::Ite, vec![cond, then_, else_]))
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn is_true(&self, id: ExprId) -> bool {
        matches!(self.get(id), Node::Atom(Atom::Bool(true)))
    }

    pub fn is_false(&self, id: ExprId) -> bool {
        matches!(self.get(id), Node::Atom(Atom::Bool(false)))
    }

    pub fn is_const(&self, id: ExprId) -> bool {
        matches!(self.get(id), Node::App(Op::Const(_), _))
    }

    pub fn is_fapp(&self, id: ExprId) -> bool {
        matches!(self.get(id), Node::App(Op::FApp, _))
    }

    /// Sort of a variable.
    pub fn const_sort(&self, id: ExprId) -> Option<&Sort> {
        match self.get(id) {
            Node::App(Op::Const(sort), _) => Some(sort),
            _ => None,
        }
    }

    /// Domain of a relation declaration.
    pub fn decl_domain(&self, id: ExprId) -> Option<&[Sort]> {
        match self.get(id) {
            Node::App(Op::Decl(domain), _) => Some(domain),
            _ => None,
        }
    }

    /// Declaration of a relation application.
    pub fn fapp_decl(&self, id: ExprId) -> Option<ExprId> {
        match self.get(id) {
            Node::App(Op::FApp, children) => children.first().copied(),
            _ => None,
        }
    }

    /// Arguments of a relation application (empty for anything else).
    pub fn fapp_args(&self, id: ExprId) -> &[ExprId] {
        match self.get(id) {
            Node::App(Op::FApp, children) => &children[1..],
            _ => &[],
        }
    }

    /// Name atom of a variable or declaration, or of the relation applied
    /// by a relation application.
    pub fn name_of(&self, id: ExprId) -> Option<&Atom> {
        match self.get(id) {
            Node::App(Op::Const(_) | Op::Decl(_), children) => self.atom(children[0]),
            Node::App(Op::FApp, children) => self.name_of(children[0]),
            _ => None,
        }
    }

    /// Variables of `roots` in first-occurrence (depth-first, left to right)
    /// order, each listed once.
    pub fn free_consts_of(&self, roots: &[ExprId]) -> Vec<ExprId> {
        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        let mut stack: Vec<ExprId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            match self.get(id) {
                Node::App(Op::Const(_), _) => result.push(id),
                // relation symbols are not variables
                Node::App(Op::Decl(_), _) | Node::Atom(_) => {}
                Node::App(_, children) => stack.extend(children.iter().rev()),
            }
        }
        result
    }

    pub fn free_consts(&self, root: ExprId) -> Vec<ExprId> {
        self.free_consts_of(&[root])
    }

    /// Total order on expressions built from the terminal order. Used to
    /// canonicalize sibling lists; it is not semantically meaningful.
    pub fn compare(&self, a: ExprId, b: ExprId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        match (self.get(a), self.get(b)) {
            (Node::Atom(x), Node::Atom(y)) => x.cmp(y),
            (Node::Atom(_), Node::App(..)) => Ordering::Less,
            (Node::App(..), Node::Atom(_)) => Ordering::Greater,
            (Node::App(op_a, ca), Node::App(op_b, cb)) => op_a
                .cmp(op_b)
                .then(ca.len().cmp(&cb.len()))
                .then_with(|| {
                    ca.iter()
                        .zip(cb.iter())
                        .map(|(x, y)| self.compare(*x, *y))
                        .find(|o| o.is_ne())
                        .unwrap_or(Ordering::Equal)
                }),
        }
    }

    /// Sort `ids` by [`ExprFactory::compare`].
    pub fn sort_canonical(&self, ids: &mut [ExprId]) {
        ids.sort_by(|a, b| self.compare(*a, *b));
    }

    // ------------------------------------------------------------------
    // Printing
    // ------------------------------------------------------------------

    pub fn display(&self, id: ExprId) -> ExprDisplay<'_> {
        ExprDisplay { efac: self, id }
    }

    fn print(&self, id: ExprId, out: &mut dyn fmt::Write, depth: usize, brkt: bool) -> fmt::Result {
        match self.get(id) {
            Node::Atom(atom) => atom.print(out, depth, brkt),
            Node::App(Op::Const(_) | Op::Decl(_), children) => {
                self.print(children[0], out, depth + 1, false)
            }
            Node::App(Op::FApp, children) => {
                if children.len() == 1 {
                    return self.print(children[0], out, depth + 1, false);
                }
                out.write_char('(')?;
                self.print(children[0], out, depth + 1, false)?;
                for arg in &children[1..] {
                    out.write_char(' ')?;
                    self.print(*arg, out, depth + 1, true)?;
                }
                out.write_char(')')
            }
            Node::App(op, children) => {
                // SMT-LIB spells both as `=`
                match op {
                    Op::Iff => out.write_str("(iff")?,
                    _ => write!(out, "({op}")?,
                }
                for child in children {
                    out.write_char(' ')?;
                    self.print(*child, out, depth + 1, true)?;
                }
                out.write_char(')')
            }
        }
    }
}

/// Printable view of an expression (s-expression syntax).
pub struct ExprDisplay<'a> {
    efac: &'a ExprFactory,
    id: ExprId,
}

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.efac.print(self.id, f, 0, false)
    }
}
