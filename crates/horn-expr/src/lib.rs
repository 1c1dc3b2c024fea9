//! Hash-consed expressions over compiler IR terminals
//!
//! This crate provides the expression layer used to state verification
//! conditions about a compiler IR:
//!
//! - [`ir`]: read-only handles to functions, blocks and values
//! - [`Terminal`]: the contract a leaf type satisfies to be embedded in
//!   expressions (print, order, equality, hash)
//! - [`ExprFactory`]: the interning table; expressions are [`ExprId`]
//!   handles and structurally equal expressions share one node
//! - [`numeric`]: exact conversion between fixed-width two's-complement bit
//!   patterns and arbitrary-precision integers
//!
//! # Example
//!
//! ```
//! use horn_expr::{ExprFactory, Sort};
//!
//! let mut efac = ExprFactory::new();
//! let inv = efac.mk_decl("inv", vec![Sort::Int]);
//! let x = efac.mk_var("x", Sort::Int);
//! let zero = efac.mk_int(0);
//! let head = efac.mk_fapp(inv, vec![x]).unwrap();
//! let body = efac.mk_gt(x, zero);
//! let rule = efac.mk_implies(body, head);
//! assert_eq!(efac.display(rule).to_string(), "(=> (> x 0) (inv x))");
//! ```

pub mod error;
pub mod expr;
pub mod ir;
pub mod numeric;
pub mod op;
pub mod sort;
pub mod terminal;

pub use error::{ExprError, ExprResult};
pub use expr::{ExprDisplay, ExprFactory, ExprId, Node};
pub use op::{Arity, Op};
pub use sort::Sort;
pub use terminal::{Atom, ExtTerminal, Symbol, Terminal};
