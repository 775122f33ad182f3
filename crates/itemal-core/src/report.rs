//! Statistical summary types attached to sections and exams after analysis.

use serde::{Deserialize, Serialize};

use crate::model::GroupId;
use crate::statistics::{CorrelationRange, PassingRange};

/// Display label of choice `answer` (0 is the omitted response).
pub fn choice_label(answer: u32) -> String {
    match answer {
        0 => "OMIT".to_string(),
        1..=26 => char::from(b'A' + (answer - 1) as u8).to_string(),
        n => format!("#{n}"),
    }
}

/// Statistics of one answer choice of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceStatistics {
    /// `OMIT`, `A`, `B`, ...
    pub label: String,
    /// Choice number in the source encoding (counts down when reversed).
    pub answer_index: u32,
    pub is_key: bool,
    pub proportion_choosing: f64,
    /// Mean total score of the students choosing this option.
    pub mean_score: f64,
    pub response_total: u64,
    pub is_questionable: bool,
    /// Response counts per group, in section group order.
    pub per_group_counts: Vec<u64>,
}

/// Statistics of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStatistics {
    /// Exam-wide, 1-based item number.
    pub question_number: usize,
    pub correct_answer: u32,
    pub correct_label: String,
    pub difficulty: f64,
    /// `None` when the difficulty fell outside `[0, 1]`.
    pub passing_range: Option<PassingRange>,
    pub difficulty_rating: u8,
    pub biserial: f64,
    pub point_biserial: f64,
    pub t: f64,
    pub mean_score_correct: f64,
    pub mean_score_incorrect: f64,
    pub ordinate: f64,
    /// `None` when every student answered the item alike.
    pub correlation_range: Option<CorrelationRange>,
    pub choices: Vec<ChoiceStatistics>,
}

/// Statistics of one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    pub first_question_number: usize,
    pub student_count: usize,
    pub question_count: usize,
    pub responses_per_question: u32,
    pub group_ids: Vec<GroupId>,
    pub group_student_counts: Vec<usize>,
    pub score_mean: f64,
    pub variance: f64,
    pub std_deviation: f64,
    /// Standard error of a correlation coefficient for this section.
    pub standard_error: f64,
    pub items: Vec<ItemStatistics>,
}

/// Number of items falling into one range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeCount {
    pub range: String,
    pub number_of_items: usize,
}

/// Keyed and chosen frequencies of one choice letter across the exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceBreakdown {
    pub label: String,
    /// Fraction of items keyed to this choice.
    pub keyed_frequency: f64,
    /// Fraction of all responses (excluding omits) choosing it.
    pub chosen_frequency: f64,
    /// Mean difficulty of items keyed to this choice.
    pub average_difficulty: f64,
}

/// Whole-test statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    pub mean_difficulty: f64,
    pub mean_biserial: f64,
    pub kr20_reliability: f64,
    pub score_mean: f64,
    pub variance: f64,
    pub std_deviation: f64,
    pub standard_error_of_measurement: f64,
    pub student_count: usize,
    pub question_count: usize,
    pub distribution_by_passing_range: Vec<RangeCount>,
    pub distribution_by_correlation_range: Vec<RangeCount>,
    pub choice_breakdown: Vec<ChoiceBreakdown>,
}
