//! Configuration types for clause writing

use crate::{HornError, HornResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HornFormat {
    /// Relational SMT-LIB dialect, via the fixed-point engine
    #[default]
    Smt2,

    /// Constraint logic programming clauses
    Clp,
}

impl HornFormat {
    /// Whether this format can only carry relation applications as heads.
    pub fn requires_canonical_heads(self) -> bool {
        matches!(self, HornFormat::Smt2)
    }
}

impl fmt::Display for HornFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HornFormat::Smt2 => write!(f, "smt2"),
            HornFormat::Clp => write!(f, "clp"),
        }
    }
}

impl FromStr for HornFormat {
    type Err = HornError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "smt2" => Ok(HornFormat::Smt2),
            "clp" => Ok(HornFormat::Clp),
            _ => Err(HornError::UnsupportedFormatCombination(format!(
                "unknown format `{s}` (expected `smt2` or `clp`)"
            ))),
        }
    }
}

/// When to run head normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeadNormalization {
    /// Only for formats that require canonical heads
    #[default]
    Auto,
    Always,
    Never,
}

/// What to do with cover constraints, which no output format can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintPolicy {
    /// Leave them out of the output and log a warning
    #[default]
    Drop,

    /// Fail the run before anything is written
    Reject,
}

/// Configuration for [`crate::HornWrite`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HornWriteConfig {
    /// Output grammar (default: smt2)
    pub format: HornFormat,

    /// Print the engine with the built-in formatter instead of the
    /// engine's native text (default: true). Only affects smt2.
    pub internal_writer: bool,

    pub head_normalization: HeadNormalization,

    /// Rewrite relation heads to distinct variable arguments (default: false)
    pub canonical_head_args: bool,

    pub constraint_policy: ConstraintPolicy,
}

impl Default for HornWriteConfig {
    fn default() -> Self {
        Self {
            format: HornFormat::Smt2,
            internal_writer: true,
            head_normalization: HeadNormalization::Auto,
            canonical_head_args: false,
            constraint_policy: ConstraintPolicy::Drop,
        }
    }
}

impl HornWriteConfig {
    pub fn with_format(format: HornFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Reject option combinations that make no sense.
    pub fn validate(&self) -> HornResult<()> {
        if self.head_normalization == HeadNormalization::Always
            && !self.format.requires_canonical_heads()
        {
            return Err(HornError::UnsupportedFormatCombination(format!(
                "head normalization requested for {} output, which does not need it",
                self.format
            )));
        }
        Ok(())
    }

    /// Whether the driver normalizes heads for this configuration.
    pub fn normalizes_heads(&self) -> bool {
        match self.head_normalization {
            HeadNormalization::Auto => self.format.requires_canonical_heads(),
            HeadNormalization::Always => true,
            HeadNormalization::Never => false,
        }
    }
}
