//! Operators of the expression DAG

use crate::Sort;
use std::fmt;

/// Number of children an operator admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn admits(self, n: usize) -> bool {
        match self {
            Arity::Exact(k) => n == k,
            Arity::AtLeast(k) => n >= k,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(k) => write!(f, "{k}"),
            Arity::AtLeast(k) => write!(f, "at least {k}"),
        }
    }
}

/// Operator of an application node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Op {
    // Boolean operations
    Not,
    And,
    Or,
    Implies,
    /// Boolean equivalence. Displays as `=` like [`Op::Eq`]; the expression
    /// printer writes it as `iff`.
    Iff,

    // Comparisons
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Arithmetic operations
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,

    // Conditional
    Ite,

    /// Uninterpreted constant (a variable). Single child: its name atom.
    Const(Sort),
    /// Relation declaration over the given domain. Single child: its name atom.
    Decl(Vec<Sort>),
    /// Relation application. Child 0 is a `Decl`, the rest are arguments.
    FApp,
}

impl Op {
    pub fn arity(&self) -> Arity {
        match self {
            Op::Not | Op::Neg | Op::Const(_) | Op::Decl(_) => Arity::Exact(1),
            Op::And | Op::Or | Op::FApp => Arity::AtLeast(1),
            Op::Add | Op::Sub | Op::Mul => Arity::AtLeast(2),
            Op::Implies
            | Op::Iff
            | Op::Eq
            | Op::Ne
            | Op::Lt
            | Op::Le
            | Op::Gt
            | Op::Ge
            | Op::Div
            | Op::Mod => Arity::Exact(2),
            Op::Ite => Arity::Exact(3),
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            Op::Not | Op::And | Op::Or | Op::Implies | Op::Iff | Op::FApp
        ) || self.is_comparison()
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge)
    }
}

/// SMT-LIB operator names
impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Op::Not => "not",
            Op::And => "and",
            Op::Or => "or",
            Op::Implies => "=>",
            Op::Iff => "=",
            Op::Eq => "=",
            Op::Ne => "distinct",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "div",
            Op::Mod => "mod",
            Op::Neg => "-",
            Op::Ite => "ite",
            Op::Const(_) => "const",
            Op::Decl(_) => "decl",
            Op::FApp => "fapp",
        };
        f.write_str(name)
    }
}
