//! JSON / YAML exam documents.
//!
//! [`ExamDocument`] mirrors the on-disk layout. Reading converts it into the
//! response model; writing converts an analyzed [`Exam`] back, restoring the
//! source answer numbering and attaching the statistical summaries.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{reverse_choice, Exam, ExamSection, GroupId, IdSequence, Options, StudentAnswers};
use crate::report::{ExamSummary, SectionSummary};

/// A list of answers, written either as digits (`"1320"`) or as an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerList {
    Values(Vec<i32>),
    Digits(String),
}

impl AnswerList {
    pub fn to_values(&self) -> Result<Vec<i32>> {
        match self {
            AnswerList::Values(values) => Ok(values.clone()),
            AnswerList::Digits(digits) => digits
                .trim()
                .chars()
                .map(|c| {
                    c.to_digit(10)
                        .map(|d| d as i32)
                        .with_context(|| format!("invalid answer digit '{c}' in \"{digits}\""))
                })
                .collect(),
        }
    }

    fn to_key(&self) -> Result<Vec<u32>> {
        self.to_values()?
            .into_iter()
            .map(|v| u32::try_from(v).with_context(|| format!("negative answer key value {v}")))
            .collect()
    }
}

/// One response group of a question set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseGroupDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<u32>>,
    pub answers: Vec<AnswerList>,
}

/// One question set (exam section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSetDocument {
    pub answer_key: AnswerList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_range: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
    #[serde(default)]
    pub responses: Vec<ResponseGroupDocument>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub statistical_summary: Option<SectionSummary>,
}

/// A complete exam document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_id: Option<u64>,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub instructor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
    pub question_sets: Vec<QuestionSetDocument>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub processed_timestamp: Option<String>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub statistical_summary: Option<ExamSummary>,
}

/// Parse a date written as `MMDDYY`, `YYYY-MM-DD`, or an ISO timestamp.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%m%d%y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .or_else(|_| {
            let day = raw.split('T').next().unwrap_or(raw);
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
        })
        .with_context(|| format!("invalid exam date: {raw}"))
}

impl ExamDocument {
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("failed to parse exam JSON")
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("failed to parse exam YAML")
    }

    /// Build the response model.
    ///
    /// `defaults` sit beneath the document's own exam options. A missing
    /// `examId` is drawn from `ids`; missing group ids and scores are derived.
    pub fn into_exam(self, ids: &mut IdSequence, defaults: &Options) -> Result<Exam> {
        if self.question_sets.is_empty() {
            bail!("exam document has no questionSets");
        }
        let options = defaults.merge(&self.options.unwrap_or_default());
        let id = self.exam_id.unwrap_or_else(|| ids.next_id());
        let mut exam = Exam::with_options(id, options);
        exam.course = self.course;
        exam.instructor = self.instructor;
        exam.date = Some(match self.date.as_deref() {
            Some(raw) => parse_date(raw)?,
            None => chrono::Local::now().date_naive(),
        });

        for (index, set) in self.question_sets.into_iter().enumerate() {
            let section = set
                .into_section()
                .with_context(|| format!("question set {}", index + 1))?;
            exam.add_exam_section(section)
                .with_context(|| format!("question set {}", index + 1))?;
        }
        tracing::debug!(
            exam = exam.id,
            sections = exam.sections().len(),
            students = exam.student_count(),
            "read exam document"
        );
        Ok(exam)
    }

    /// Document for an exam, with statistics attached when present.
    pub fn from_exam(exam: &Exam) -> Self {
        Self {
            exam_id: Some(exam.id),
            course: exam.course.clone(),
            instructor: exam.instructor.clone(),
            date: exam.date.map(|d| d.format("%Y-%m-%d").to_string()),
            options: non_default(*exam.options()),
            question_sets: exam.sections().iter().map(QuestionSetDocument::from_section).collect(),
            processed_timestamp: None,
            statistical_summary: exam.statistical_summary().cloned(),
        }
    }
}

impl QuestionSetDocument {
    fn into_section(self) -> Result<ExamSection> {
        let key = self.answer_key.to_key().context("answerKey")?;
        let mut section = ExamSection::with_options(self.options.unwrap_or_default());
        section.set_answer_key(key)?;

        for (index, group) in self.responses.into_iter().enumerate() {
            let id = group.group.unwrap_or_else(|| section.next_group_id());
            let answers = group
                .answers
                .iter()
                .map(AnswerList::to_values)
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("response group {}", index + 1))?;
            let students = build_group(id, answers, group.scores, section.answer_key())
                .with_context(|| format!("response group {}", index + 1))?;
            section.add_student_answers(students)?;
        }
        if let Some(range) = self.answer_range {
            section.declare_responses_per_question(range)?;
        }
        Ok(section)
    }

    fn from_section(section: &ExamSection) -> Self {
        let source = |value: i32| match section.reversal_maximum() {
            Some(maximum) => reverse_choice(value, maximum),
            None => value,
        };
        let answer_key = section
            .answer_key()
            .iter()
            .map(|&k| source(k as i32))
            .collect();
        let responses = section
            .groups()
            .iter()
            .map(|g| ResponseGroupDocument {
                group: Some(g.group_id().clone()),
                scores: Some(g.scores().to_vec()),
                answers: g
                    .answers()
                    .iter()
                    .map(|row| AnswerList::Values(row.iter().map(|&a| source(a)).collect()))
                    .collect(),
            })
            .collect();
        Self {
            answer_key: AnswerList::Values(answer_key),
            answer_range: section.configured_responses_per_question(),
            options: non_default(*section.options()),
            responses,
            statistical_summary: section.statistical_summary().cloned(),
        }
    }
}

fn build_group(
    id: GroupId,
    answers: Vec<Vec<i32>>,
    scores: Option<Vec<u32>>,
    key: &[u32],
) -> Result<StudentAnswers> {
    let mut group = StudentAnswers::new(id);
    match scores {
        Some(scores) => {
            if scores.len() != answers.len() {
                bail!(
                    "{} scores supplied for {} students",
                    scores.len(),
                    answers.len()
                );
            }
            for (score, row) in scores.into_iter().zip(answers) {
                group.push_student(score, row)?;
            }
        }
        None => {
            for row in answers {
                group.push_student(0, row)?;
            }
            group.calculate_scores_for_answer_key(key)?;
        }
    }
    Ok(group)
}

fn non_default(options: Options) -> Option<Options> {
    (options != Options::default()).then_some(options)
}
