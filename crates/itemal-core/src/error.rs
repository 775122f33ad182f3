//! Structural error and data warning types.
//!
//! Structural errors mean the input is malformed and the current exam cannot
//! be analyzed. Data warnings are recorded during tallying and never abort a
//! pass.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::GroupId;

/// Errors raised by the accumulator, the response model, and the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ItemalError {
    /// An accumulator index had the wrong number of components.
    #[error("index of rank {found} used where rank {expected} was expected")]
    RankMismatch { expected: usize, found: usize },

    /// Answer vectors (or an answer key) disagree in length.
    #[error("answer length {found} does not match expected length {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A response or key value exceeds the section's maximum choice index.
    #[error("value {value} exceeds the maximum choice index {maximum}")]
    RangeViolation { value: i64, maximum: u32 },

    /// A group with the same identifier is already attached to the section.
    #[error("group {0} is already present in this section")]
    DuplicateGroup(GroupId),

    /// A section's group identifiers differ from the rest of the exam.
    #[error("section groups [{}] do not match exam groups [{}]", join(.found), join(.expected))]
    GroupSetMismatch {
        expected: Vec<GroupId>,
        found: Vec<GroupId>,
    },

    /// A group has a different number of students than in the first section.
    #[error("group {group} has {found} students, first section has {expected}")]
    StudentCountMismatch {
        group: GroupId,
        expected: usize,
        found: usize,
    },

    /// A supplied score is outside `0..=question count`.
    #[error("invalid score {score}, out of {maximum}")]
    InvalidScore { score: u32, maximum: usize },

    /// A section without any students cannot be analyzed.
    #[error("section {section} has no students")]
    EmptySection { section: usize },
}

fn join(ids: &[GroupId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias used by the model and the engine.
pub type Result<T, E = ItemalError> = std::result::Result<T, E>;

/// A non-fatal data problem found while analyzing a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataWarning {
    /// 1-based section index within the exam.
    pub section: usize,
    /// Exam-wide item number.
    pub question_number: usize,
    /// Group of the offending response, if the warning concerns a response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    pub kind: WarningKind,
}

/// What went wrong with a single data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WarningKind {
    NegativeResponse { value: i32 },
    ResponseExceedsMaximum { value: i32, maximum: u32 },
    DifficultyOutOfRange { difficulty: f64 },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group = self
            .group
            .as_ref()
            .map(|g| g.to_string())
            .unwrap_or_else(|| "-".to_string());
        match &self.kind {
            WarningKind::NegativeResponse { value } => write!(
                f,
                "response for question {} for group {} is negative ({value})",
                self.question_number, group
            ),
            WarningKind::ResponseExceedsMaximum { value, maximum } => write!(
                f,
                "response for question {} for group {} exceeds possible answers {maximum} ({value})",
                self.question_number, group
            ),
            WarningKind::DifficultyOutOfRange { difficulty } => write!(
                f,
                "difficulty of item {} is greater than one or less than zero ({difficulty:.3})",
                self.question_number
            ),
        }
    }
}
