#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of a judging or of a single run.
///
/// `Pending` is the explicit "not decided yet" state; every other variant is a
/// concrete result reported by a grading worker.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")
)]
#[serde(rename_all = "kebab-case")]
pub enum JudgingResult {
    /// No result committed yet.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    /// All test cases passed.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "correct"))]
    Correct,
    /// Failed to compile.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "compiler-error"))]
    CompilerError,
    /// Output did not match expected output.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "wrong-answer"))]
    WrongAnswer,
    /// Exceeded time limit.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "timelimit"))]
    #[serde(rename = "timelimit")]
    TimeLimit,
    /// Program crashed or exited with non-zero code.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "run-error"))]
    RunError,
    /// Program produced no output.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "no-output"))]
    NoOutput,
    /// Program produced more output than allowed.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "output-limit"))]
    OutputLimit,
}

impl JudgingResult {
    /// Returns true if a concrete result has been committed.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if this is a successful result.
    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct)
    }

    /// All possible result values.
    pub const ALL: &'static [JudgingResult] = &[
        Self::Pending,
        Self::Correct,
        Self::CompilerError,
        Self::WrongAnswer,
        Self::TimeLimit,
        Self::RunError,
        Self::NoOutput,
        Self::OutputLimit,
    ];

    /// Returns the string representation used in storage and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Correct => "correct",
            Self::CompilerError => "compiler-error",
            Self::WrongAnswer => "wrong-answer",
            Self::TimeLimit => "timelimit",
            Self::RunError => "run-error",
            Self::NoOutput => "no-output",
            Self::OutputLimit => "output-limit",
        }
    }
}

impl fmt::Display for JudgingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for JudgingResult {
    fn default() -> Self {
        Self::Pending
    }
}

/// Error when parsing an invalid result string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResultError {
    invalid: String,
}

impl fmt::Display for ParseResultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid judging result '{}'. Valid values: {}",
            self.invalid,
            JudgingResult::ALL
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseResultError {}

impl FromStr for JudgingResult {
    type Err = ParseResultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JudgingResult::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseResultError {
                invalid: s.to_string(),
            })
    }
}
