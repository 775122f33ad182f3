//! itemal-core: Item analysis of right/wrong scored tests.
//!
//! This crate holds the exam data model, the statistics behind item
//! difficulty, discrimination and test reliability, the analysis engine,
//! and readers for the JSON/YAML document and legacy fixed-width formats.

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod legacy;
pub mod model;
pub mod report;
pub mod sparse;
pub mod statistics;

pub use engine::{analyze, ItemAnalyzer};
pub use error::{DataWarning, ItemalError, WarningKind};
pub use model::{Exam, ExamSection, GroupId, Options, StudentAnswers};
