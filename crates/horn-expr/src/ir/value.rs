//! IR values: arguments, instructions, globals and constants

use super::{ApInt, BasicBlock, Function, FunctionRef};
use crate::numeric::to_exact_integer;
use std::fmt;
use std::sync::{Arc, Weak};

/// IR types, as far as the expression layer cares about them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// Integer of the given bit width (`i1` is a boolean)
    Int(u32),
    Ptr,
    Void,
    Label,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int(w) => write!(f, "i{w}"),
            Type::Ptr => write!(f, "ptr"),
            Type::Void => write!(f, "void"),
            Type::Label => write!(f, "label"),
        }
    }
}

/// Shared handle to an IR value. Identity is the allocation address.
pub type ValueRef = Arc<Value>;

/// What a value is and where it lives.
#[derive(Debug)]
pub enum ValueKind {
    /// Formal argument of a function
    Argument { parent: Weak<Function>, index: usize },
    /// Instruction inside a basic block; `text` is its defining text
    Instruction { parent: Weak<BasicBlock>, text: String },
    /// Module-level named value
    Global,
    ConstantInt(ApInt),
    ConstantNull,
    /// Constant expression, kept as its textual form
    ConstantExpr(String),
}

#[derive(Debug)]
pub struct Value {
    name: Option<String>,
    ty: Type,
    kind: ValueKind,
}

impl Value {
    pub(crate) fn new(name: Option<String>, ty: Type, kind: ValueKind) -> Self {
        Self {
            name: name.filter(|n| !n.is_empty()),
            ty,
            kind,
        }
    }

    /// A named global of the given type.
    pub fn global(name: impl Into<String>, ty: Type) -> ValueRef {
        Arc::new(Self::new(Some(name.into()), ty, ValueKind::Global))
    }

    /// Integer constant; its type is `iN` for the width of `value`.
    pub fn const_int(value: ApInt) -> ValueRef {
        let ty = Type::Int(value.width());
        Arc::new(Self::new(None, ty, ValueKind::ConstantInt(value)))
    }

    /// Integer constant from a machine integer, sign-extended to `width`.
    pub fn const_i64(width: u32, value: i64) -> ValueRef {
        Self::const_int(ApInt::from_i64(width, value))
    }

    /// The null pointer constant.
    pub fn null() -> ValueRef {
        Arc::new(Self::new(None, Type::Ptr, ValueKind::ConstantNull))
    }

    /// An unnamed constant expression with the given defining text.
    pub fn const_expr(text: impl Into<String>, ty: Type) -> ValueRef {
        Arc::new(Self::new(None, ty, ValueKind::ConstantExpr(text.into())))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    pub fn ty(&self) -> Type {
        self.ty
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn is_global(&self) -> bool {
        matches!(self.kind, ValueKind::Global)
    }

    pub fn is_constant(&self) -> bool {
        matches!(
            self.kind,
            ValueKind::ConstantInt(_) | ValueKind::ConstantNull | ValueKind::ConstantExpr(_)
        )
    }

    /// Function enclosing an argument or instruction, if it is still alive.
    pub fn parent_function(&self) -> Option<FunctionRef> {
        match &self.kind {
            ValueKind::Argument { parent, .. } => parent.upgrade(),
            ValueKind::Instruction { parent, .. } => parent.upgrade().and_then(|bb| bb.parent()),
            _ => None,
        }
    }
}

/// Defining text of the value, in IR assembly style.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::ConstantInt(v) => write!(f, "{} {}", self.ty, to_exact_integer(v)),
            ValueKind::ConstantNull => write!(f, "{} null", self.ty),
            ValueKind::ConstantExpr(text) => f.write_str(text),
            ValueKind::Instruction { text, .. } => match &self.name {
                Some(name) => write!(f, "%{name} = {text}"),
                None => f.write_str(text),
            },
            ValueKind::Argument { index, .. } => match &self.name {
                Some(name) => write!(f, "{} %{name}", self.ty),
                None => write!(f, "{} %{index}", self.ty),
            },
            ValueKind::Global => write!(f, "{} @{}", self.ty, self.name.as_deref().unwrap_or("")),
        }
    }
}
