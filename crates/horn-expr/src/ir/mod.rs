//! Read-only compiler IR handles
//!
//! Functions, blocks and values are shared through `Arc` handles whose
//! identity is their address. The expression layer embeds them as atoms and
//! never mutates them.

mod apint;
mod function;
mod value;

pub use apint::{ApInt, WORD_BITS};
pub use function::{BasicBlock, BlockRef, Function, FunctionBuilder, FunctionRef, Module};
pub use value::{Type, Value, ValueKind, ValueRef};
