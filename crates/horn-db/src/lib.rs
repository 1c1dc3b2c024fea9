//! Horn clause database and writers
//!
//! This crate holds the clauses produced by a verification front end and
//! prints them for a solver, either as constraint logic programming clauses
//! or in a relational SMT-LIB dialect.
//!
//! # Example
//!
//! ```text
//! ; inv(x) :- x = 0
//! ; false  :- inv(x), x < 0
//! ```
//!
//! ```
//! use horn_db::{HornClause, HornClauseDb, HornFormat, HornWrite, HornWriteConfig, Query};
//! use horn_expr::{ExprFactory, Sort};
//!
//! let mut efac = ExprFactory::new();
//! let mut db = HornClauseDb::new();
//! let inv = efac.mk_decl("inv", vec![Sort::Int]);
//! db.register_relation(&efac, inv).unwrap();
//!
//! let x = efac.mk_var("x", Sort::Int);
//! let zero = efac.mk_int(0);
//! let head = efac.mk_fapp(inv, vec![x]).unwrap();
//! let init = efac.mk_eq(x, zero);
//! db.add_rule(HornClause::new(vec![init], head));
//! let neg = efac.mk_lt(x, zero);
//! db.set_query(Query::new(vec![head, neg]));
//!
//! let mut out = Vec::new();
//! let writer = HornWrite::new(HornWriteConfig::with_format(HornFormat::Clp));
//! writer.run(&mut db, &mut efac, &mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "inv(X) :- X=0.\nfalse :- inv(X), X<0.\n");
//! ```
//!
//! # Architecture
//!
//! - `HornClauseDb`: relations, rules, the query and cover constraints
//! - `normalize_heads`: turns compound rule heads into relation applications
//! - `FixedPoint` / `HornEngine`: the engine the relational path loads into
//! - `ClpWriter`, `smt2::render`: the two formatters
//! - `HornWrite`: the driver tying them together under `HornWriteConfig`

mod clause;
mod clp;
mod config;
mod db;
pub mod engine;
mod error;
mod normalize;
pub mod smt2;
mod write;

pub use clause::{CoverConstraint, HornClause, Query};
pub use clp::ClpWriter;
pub use config::{ConstraintPolicy, HeadNormalization, HornFormat, HornWriteConfig};
pub use db::HornClauseDb;
pub use engine::{FixedPoint, HornEngine};
pub use error::{HornError, HornResult};
pub use normalize::{canonicalize_head_args, normalize_heads, NormalizeStats};
pub use write::{HornWrite, WriteSummary};
