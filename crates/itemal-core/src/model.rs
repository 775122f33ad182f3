//! Response model types for itemal.
//!
//! An [`Exam`] owns an ordered list of [`ExamSection`]s; each section owns an
//! answer key and the [`StudentAnswers`] groups answered against it. The
//! statistics engine annotates sections and the exam in place.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ItemalError, Result};
use crate::report::{ExamSummary, SectionSummary};

/// Identifier of a response group (cohort).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupId {
    Number(u64),
    Name(String),
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupId::Number(n) => write!(f, "{n}"),
            GroupId::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<u64> for GroupId {
    fn from(n: u64) -> Self {
        GroupId::Number(n)
    }
}

impl From<&str> for GroupId {
    fn from(name: &str) -> Self {
        GroupId::Name(name.to_string())
    }
}

impl From<String> for GroupId {
    fn from(name: String) -> Self {
        GroupId::Name(name)
    }
}

/// Sequential identifier source, scoped to one reading context.
#[derive(Debug, Clone)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a choice between first-to-last and last-to-first numbering.
///
/// Zero (omitted) is left alone. Applying the mapping twice with the same
/// `responses_per_question` yields the original value.
pub fn reverse_choice(answer: i32, responses_per_question: u32) -> i32 {
    if answer == 0 {
        return 0;
    }
    let reversed = i64::from(responses_per_question) + 1 - i64::from(answer);
    reversed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn reverse_key_choice(key: u32, responses_per_question: u32) -> u32 {
    if key == 0 {
        0
    } else {
        (responses_per_question + 1).saturating_sub(key)
    }
}

/// Report options. Unset values inherit from the enclosing exam.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Choices were listed last-to-first in the source data.
    #[serde(
        default,
        rename = "isReverseOrder",
        skip_serializing_if = "Option::is_none"
    )]
    pub reverse_order: Option<bool>,
    /// Copies of the per-item report to print (0..=2).
    #[serde(
        default,
        deserialize_with = "deserialize_copies",
        skip_serializing_if = "Option::is_none"
    )]
    pub number_of_copies: Option<u8>,
    /// Print only the test summary, not the per-item tables.
    #[serde(
        default,
        rename = "testSummaryOnly",
        skip_serializing_if = "Option::is_none"
    )]
    pub summary_only: Option<bool>,
}

impl Options {
    pub const MAX_COPIES: u8 = 2;

    /// Overlay `overrides` on top of `self`, returning a new value.
    pub fn merge(&self, overrides: &Options) -> Options {
        Options {
            reverse_order: overrides.reverse_order.or(self.reverse_order),
            number_of_copies: overrides.number_of_copies.or(self.number_of_copies),
            summary_only: overrides.summary_only.or(self.summary_only),
        }
    }

    pub fn is_reverse_order(&self) -> bool {
        self.reverse_order.unwrap_or(false)
    }

    pub fn copies(&self) -> u8 {
        self.number_of_copies.unwrap_or(1).min(Self::MAX_COPIES)
    }

    pub fn is_summary_only(&self) -> bool {
        self.summary_only.unwrap_or(false)
    }

    /// Set the copy count, clamping into `0..=MAX_COPIES`.
    pub fn with_copies(mut self, copies: i64) -> Self {
        self.number_of_copies = Some(clamp_copies(copies));
        self
    }
}

fn clamp_copies(copies: i64) -> u8 {
    copies.clamp(0, i64::from(Options::MAX_COPIES)) as u8
}

fn deserialize_copies<'de, D>(deserializer: D) -> std::result::Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.map(clamp_copies))
}

/// One group's students: parallel score and answer vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentAnswers {
    group_id: GroupId,
    scores: Vec<u32>,
    answers: Vec<Vec<i32>>,
}

impl StudentAnswers {
    pub fn new(group_id: impl Into<GroupId>) -> Self {
        Self {
            group_id: group_id.into(),
            scores: Vec::new(),
            answers: Vec::new(),
        }
    }

    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    pub fn student_count(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    pub fn answers(&self) -> &[Vec<i32>] {
        &self.answers
    }

    /// Iterate `(score, answers)` pairs in insertion order.
    pub fn students(&self) -> impl Iterator<Item = (u32, &[i32])> + '_ {
        self.scores
            .iter()
            .copied()
            .zip(self.answers.iter().map(Vec::as_slice))
    }

    /// Length shared by every answer vector, once a student exists.
    pub fn answer_length(&self) -> Option<usize> {
        self.answers.first().map(Vec::len)
    }

    /// Append one student.
    pub fn push_student(&mut self, score: u32, answers: Vec<i32>) -> Result<()> {
        if let Some(expected) = self.answer_length() {
            if answers.len() != expected {
                return Err(ItemalError::DimensionMismatch {
                    expected,
                    found: answers.len(),
                });
            }
        }
        self.scores.push(score);
        self.answers.push(answers);
        Ok(())
    }

    /// Replace every score with the number of answers matching `key`.
    pub fn calculate_scores_for_answer_key(&mut self, key: &[u32]) -> Result<()> {
        if let Some(expected) = self.answer_length() {
            if key.len() != expected {
                return Err(ItemalError::DimensionMismatch {
                    expected,
                    found: key.len(),
                });
            }
        }
        self.scores = self
            .answers
            .iter()
            .map(|answers| score_against_key(answers, key))
            .collect();
        Ok(())
    }

    pub(crate) fn max_response(&self) -> Option<i32> {
        self.answers.iter().flatten().copied().max()
    }

    fn remap_answers(&mut self, responses_per_question: u32) {
        for answer in self.answers.iter_mut().flatten() {
            *answer = reverse_choice(*answer, responses_per_question);
        }
    }
}

fn score_against_key(answers: &[i32], key: &[u32]) -> u32 {
    answers
        .iter()
        .zip(key)
        .filter(|(a, k)| i64::from(**a) == i64::from(**k))
        .count() as u32
}

/// One test form: answer key, options, and its response groups.
#[derive(Debug, Clone, Default)]
pub struct ExamSection {
    answer_key: Vec<u32>,
    responses_per_question: Option<u32>,
    options: Options,
    groups: Vec<StudentAnswers>,
    reversed_with: Option<u32>,
    input_format: Option<String>,
    statistical_summary: Option<SectionSummary>,
}

impl ExamSection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn answer_key(&self) -> &[u32] {
        &self.answer_key
    }

    /// Number of items: the key length, or the answer length before a key is set.
    pub fn question_count(&self) -> usize {
        if self.answer_key.is_empty() {
            self.answer_length().unwrap_or(0)
        } else {
            self.answer_key.len()
        }
    }

    /// Maximum valid choice index (inclusive).
    ///
    /// Falls back to the value used for reversal, then to the largest key value.
    pub fn responses_per_question(&self) -> u32 {
        self.responses_per_question
            .or(self.reversed_with)
            .unwrap_or_else(|| self.answer_key.iter().copied().max().unwrap_or(0))
    }

    pub fn configured_responses_per_question(&self) -> Option<u32> {
        self.responses_per_question
    }

    pub fn set_responses_per_question(&mut self, maximum: u32) -> Result<()> {
        if let Some(&key_max) = self.answer_key.iter().max() {
            if key_max > maximum {
                return Err(ItemalError::RangeViolation {
                    value: i64::from(key_max),
                    maximum,
                });
            }
        }
        if let Some(answer_max) = self.groups.iter().filter_map(|g| g.max_response()).max() {
            if i64::from(answer_max) > i64::from(maximum) {
                return Err(ItemalError::RangeViolation {
                    value: i64::from(answer_max),
                    maximum,
                });
            }
        }
        self.responses_per_question = Some(maximum);
        Ok(())
    }

    /// Record a declared choice count without checking attached answers.
    ///
    /// Readers use this after attaching groups, so answers above the
    /// maximum surface as analysis warnings instead of errors.
    pub fn declare_responses_per_question(&mut self, maximum: u32) -> Result<()> {
        if let Some(&key_max) = self.answer_key.iter().max() {
            if key_max > maximum {
                return Err(ItemalError::RangeViolation {
                    value: i64::from(key_max),
                    maximum,
                });
            }
        }
        self.responses_per_question = Some(maximum);
        Ok(())
    }

    pub fn set_answer_key(&mut self, key: Vec<u32>) -> Result<()> {
        if let Some(expected) = self.answer_length() {
            if key.len() != expected {
                return Err(ItemalError::DimensionMismatch {
                    expected,
                    found: key.len(),
                });
            }
        }
        if let (Some(maximum), Some(&key_max)) = (self.responses_per_question, key.iter().max()) {
            if key_max > maximum {
                return Err(ItemalError::RangeViolation {
                    value: i64::from(key_max),
                    maximum,
                });
            }
        }
        self.answer_key = key;
        Ok(())
    }

    /// Attach a response group.
    pub fn add_student_answers(&mut self, mut group: StudentAnswers) -> Result<()> {
        if self.groups.iter().any(|g| g.group_id == group.group_id) {
            return Err(ItemalError::DuplicateGroup(group.group_id));
        }
        if let Some(found) = group.answer_length() {
            let expected = self.answer_length().or_else(|| {
                (!self.answer_key.is_empty()).then_some(self.answer_key.len())
            });
            if let Some(expected) = expected {
                if expected != found {
                    return Err(ItemalError::DimensionMismatch { expected, found });
                }
            }
            if let (Some(maximum), Some(answer_max)) =
                (self.responses_per_question, group.max_response())
            {
                if i64::from(answer_max) > i64::from(maximum) {
                    return Err(ItemalError::RangeViolation {
                        value: i64::from(answer_max),
                        maximum,
                    });
                }
            }
            if !self.answer_key.is_empty() {
                if let Some(&score) = group.scores.iter().find(|&&s| s as usize > found) {
                    return Err(ItemalError::InvalidScore {
                        score,
                        maximum: found,
                    });
                }
            }
        }
        if let Some(maximum) = self.reversed_with {
            group.remap_answers(maximum);
        }
        self.groups.push(group);
        Ok(())
    }

    /// The next free default group identifier for this section.
    pub fn next_group_id(&self) -> GroupId {
        let mut candidate = self.groups.len() as u64 + 1;
        while self
            .groups
            .iter()
            .any(|g| g.group_id == GroupId::Number(candidate))
        {
            candidate += 1;
        }
        GroupId::Number(candidate)
    }

    pub fn groups(&self) -> &[StudentAnswers] {
        &self.groups
    }

    pub fn group(&self, id: &GroupId) -> Option<&StudentAnswers> {
        self.groups.iter().find(|g| &g.group_id == id)
    }

    pub fn group_ids(&self) -> Vec<GroupId> {
        self.groups.iter().map(|g| g.group_id.clone()).collect()
    }

    pub fn student_count(&self) -> usize {
        self.groups.iter().map(StudentAnswers::student_count).sum()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    /// Derive every group's scores from the answer key.
    pub fn calculate_scores(&mut self) -> Result<()> {
        let key = &self.answer_key;
        for group in &mut self.groups {
            group.calculate_scores_for_answer_key(key)?;
        }
        Ok(())
    }

    /// Renumber choices to first-to-last order when the reverse option is set.
    ///
    /// Returns `true` if the section was remapped. A section is never
    /// remapped twice.
    pub fn reverse_answer_ordering_if_necessary(&mut self) -> bool {
        if !self.options.is_reverse_order() || self.reversed_with.is_some() {
            return false;
        }
        let maximum = self.responses_per_question();
        self.remap_all(maximum);
        self.reversed_with = Some(maximum);
        true
    }

    /// Undo a previous reversal, restoring the source numbering.
    pub fn restore_answer_ordering(&mut self) -> bool {
        match self.reversed_with.take() {
            Some(maximum) => {
                self.remap_all(maximum);
                true
            }
            None => false,
        }
    }

    /// Record layout the section was read with, for fixed-width sources.
    pub fn input_format(&self) -> Option<&str> {
        self.input_format.as_deref()
    }

    pub fn set_input_format(&mut self, format: impl Into<String>) {
        self.input_format = Some(format.into());
    }

    /// The maximum used by an applied reversal, if any.
    pub fn reversal_maximum(&self) -> Option<u32> {
        self.reversed_with
    }

    pub fn statistical_summary(&self) -> Option<&SectionSummary> {
        self.statistical_summary.as_ref()
    }

    pub(crate) fn set_statistical_summary(&mut self, summary: SectionSummary) {
        self.statistical_summary = Some(summary);
    }

    fn remap_all(&mut self, maximum: u32) {
        for key in &mut self.answer_key {
            *key = reverse_key_choice(*key, maximum);
        }
        for group in &mut self.groups {
            group.remap_answers(maximum);
        }
    }

    fn answer_length(&self) -> Option<usize> {
        self.groups.iter().find_map(StudentAnswers::answer_length)
    }
}

/// A complete exam: metadata, default options, and ordered sections.
#[derive(Debug, Clone)]
pub struct Exam {
    pub id: u64,
    pub course: String,
    pub instructor: String,
    pub date: Option<NaiveDate>,
    options: Options,
    sections: Vec<ExamSection>,
    statistical_summary: Option<ExamSummary>,
}

impl Exam {
    pub fn new(id: u64) -> Self {
        Self::with_options(id, Options::default())
    }

    pub fn with_options(id: u64, options: Options) -> Self {
        Self {
            id,
            course: String::new(),
            instructor: String::new(),
            date: None,
            options,
            sections: Vec::new(),
            statistical_summary: None,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Append a section, checking its groups against the first section.
    ///
    /// The section's options are merged over the exam's by value.
    pub fn add_exam_section(&mut self, mut section: ExamSection) -> Result<()> {
        if let Some(first) = self.sections.first() {
            let expected: HashSet<&GroupId> = first.groups.iter().map(|g| &g.group_id).collect();
            let found: HashSet<&GroupId> = section.groups.iter().map(|g| &g.group_id).collect();
            if expected != found {
                return Err(ItemalError::GroupSetMismatch {
                    expected: first.group_ids(),
                    found: section.group_ids(),
                });
            }
            for group in &first.groups {
                let found = section
                    .group(&group.group_id)
                    .map(StudentAnswers::student_count)
                    .unwrap_or(0);
                if found != group.student_count() {
                    return Err(ItemalError::StudentCountMismatch {
                        group: group.group_id.clone(),
                        expected: group.student_count(),
                        found,
                    });
                }
            }
        }
        section.options = self.options.merge(&section.options);
        self.sections.push(section);
        Ok(())
    }

    pub fn sections(&self) -> &[ExamSection] {
        &self.sections
    }

    pub(crate) fn sections_mut(&mut self) -> &mut [ExamSection] {
        &mut self.sections
    }

    /// Group identifiers shared by every section.
    pub fn group_ids(&self) -> Vec<GroupId> {
        self.sections
            .first()
            .map(ExamSection::group_ids)
            .unwrap_or_default()
    }

    /// Total items across all sections.
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(ExamSection::question_count).sum()
    }

    pub fn student_count(&self) -> usize {
        self.sections
            .first()
            .map(ExamSection::student_count)
            .unwrap_or(0)
    }

    /// Apply [`ExamSection::reverse_answer_ordering_if_necessary`] to every
    /// section, returning how many were remapped.
    pub fn reverse_answer_ordering_if_necessary(&mut self) -> usize {
        self.sections
            .iter_mut()
            .filter_map(|s| s.reverse_answer_ordering_if_necessary().then_some(()))
            .count()
    }

    pub fn statistical_summary(&self) -> Option<&ExamSummary> {
        self.statistical_summary.as_ref()
    }

    pub(crate) fn set_statistical_summary(&mut self, summary: ExamSummary) {
        self.statistical_summary = Some(summary);
    }
}
