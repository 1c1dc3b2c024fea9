//! Sorts (types) of expressions

use crate::ir::Type;
use std::fmt;

/// Sort of a variable or relation argument.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sort {
    Bool,
    Int,
    Real,
    BitVec(u32),
}

impl Sort {
    /// Sort used to model an IR value of type `ty`: `i1` and labels are
    /// booleans, other integers and pointers are mathematical integers.
    pub fn of_type(ty: Type) -> Option<Sort> {
        match ty {
            Type::Int(1) | Type::Label => Some(Sort::Bool),
            Type::Int(_) | Type::Ptr => Some(Sort::Int),
            Type::Void => None,
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::Int => write!(f, "Int"),
            Sort::Real => write!(f, "Real"),
            Sort::BitVec(w) => write!(f, "(_ BitVec {w})"),
        }
    }
}
