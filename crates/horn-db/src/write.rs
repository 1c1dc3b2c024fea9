//! The clause writer driver
//!
//! [`HornWrite::run`] takes a clause database through the whole pipeline:
//! configuration check, head normalization, database validation, cover
//! constraint handling and rendering. The document is built in memory and
//! reaches the sink with one write and one flush, so a failed run leaves the
//! sink untouched.

use crate::clp::ClpWriter;
use crate::config::{ConstraintPolicy, HornFormat, HornWriteConfig};
use crate::db::HornClauseDb;
use crate::engine::{FixedPoint, HornEngine};
use crate::normalize::{canonicalize_head_args, normalize_heads, NormalizeStats};
use crate::{smt2, HornError, HornResult};
use horn_expr::ExprFactory;
use std::io::Write;
use tracing::{debug, info, warn};

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub format: HornFormat,
    /// Rules written, including clauses added by normalization
    pub rules: usize,
    /// `None` when normalization did not run
    pub normalized: Option<NormalizeStats>,
    pub constraints_dropped: usize,
    pub bytes: usize,
}

/// Writes a clause database in the configured format.
#[derive(Debug, Clone, Default)]
pub struct HornWrite {
    config: HornWriteConfig,
}

impl HornWrite {
    pub fn new(config: HornWriteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HornWriteConfig {
        &self.config
    }

    /// Run the pipeline and return the document without writing it.
    ///
    /// The rewrites run on a copy of `db`, which replaces it only once the
    /// document is complete. A failed run leaves `db` as it was.
    pub fn render(
        &self,
        db: &mut HornClauseDb,
        efac: &mut ExprFactory,
    ) -> HornResult<(String, WriteSummary)> {
        self.config.validate()?;

        let mut work = db.clone();
        let normalized = if self.config.normalizes_heads() {
            Some(normalize_heads(&mut work, efac)?)
        } else {
            debug!(format = %self.config.format, "head normalization disabled");
            None
        };
        if self.config.canonical_head_args {
            canonicalize_head_args(&mut work, efac)?;
        }
        work.validate(efac)?;
        let constraints_dropped = self.apply_constraint_policy(&work)?;

        let text = match self.config.format {
            HornFormat::Clp => {
                let writer = ClpWriter::new(&work, efac);
                writer.check_heads()?;
                writer.to_string()
            }
            HornFormat::Smt2 => {
                let mut fp = HornEngine::new();
                // the query goal is always transferred, its constraints never are
                work.load_fixed_point(efac, &mut fp, true, false)?;
                if self.config.internal_writer {
                    smt2::render(&fp)?
                } else {
                    fp.to_native_string()
                }
            }
        };

        let summary = WriteSummary {
            format: self.config.format,
            rules: work.rules().len(),
            normalized,
            constraints_dropped,
            bytes: text.len(),
        };
        *db = work;
        Ok((text, summary))
    }

    /// Render `db` and write it to `out`, flushing once at the end.
    pub fn run<W: Write + ?Sized>(
        &self,
        db: &mut HornClauseDb,
        efac: &mut ExprFactory,
        out: &mut W,
    ) -> HornResult<WriteSummary> {
        let (text, summary) = self.render(db, efac)?;
        out.write_all(text.as_bytes())?;
        out.flush()?;
        info!(
            format = %summary.format,
            rules = summary.rules,
            bytes = summary.bytes,
            "wrote horn clauses"
        );
        Ok(summary)
    }

    fn apply_constraint_policy(&self, db: &HornClauseDb) -> HornResult<usize> {
        let n = db.constraints().len();
        if n == 0 {
            return Ok(0);
        }
        match self.config.constraint_policy {
            ConstraintPolicy::Drop => {
                warn!(
                    count = n,
                    format = %self.config.format,
                    "dropping cover constraints the output format cannot carry"
                );
                Ok(n)
            }
            ConstraintPolicy::Reject => Err(HornError::UnsupportedConstraints(n)),
        }
    }
}
