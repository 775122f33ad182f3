//! Fixed-width card-image reader.
//!
//! A legacy input holds one exam: a control card, then for every section an
//! answer key, a record format card, and the student records of five groups
//! each closed by a `-1` record. A further control card with a non-zero item
//! count starts another section of the same exam.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use crate::model::{Exam, ExamSection, Options, StudentAnswers};

/// Groups per section in the card layout.
pub const GROUPS: usize = 5;

/// Score value that closes the current group.
const GROUP_END: i64 = -1;

/// Non-blank lines with their 1-based line numbers, trailing whitespace removed.
struct Cards<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Cards<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines().enumerate(),
        }
    }
}

impl<'a> Iterator for Cards<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.lines
            .by_ref()
            .find(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| (n + 1, line.trim_end()))
    }
}

/// Characters `start..end` of a card; short cards yield what is there.
fn columns(card: &str, start: usize, end: Option<usize>) -> String {
    let chars = card.chars().skip(start);
    match end {
        Some(end) => chars.take(end.saturating_sub(start)).collect(),
        None => chars.collect(),
    }
}

/// Integer value of a numeric field. Blank or unreadable fields are zero.
fn int_field(card: &str, start: usize, end: Option<usize>) -> i64 {
    columns(card, start, end).trim().parse().unwrap_or(0)
}

/// The control card describing one section.
#[derive(Debug, Clone, PartialEq)]
struct ControlCard {
    id: u64,
    course: String,
    instructor: String,
    raw_date: String,
    students: usize,
    items: usize,
    evaluation: i64,
    choices: u32,
    response_order: i64,
    copies: i64,
}

impl ControlCard {
    fn parse(card: &str) -> Self {
        let count = |start, end| int_field(card, start, Some(end)).max(0);
        Self {
            id: count(0, 4) as u64,
            course: columns(card, 4, Some(14)).trim_end().to_string(),
            instructor: columns(card, 14, Some(24)).trim_end().to_string(),
            raw_date: columns(card, 29, Some(35)).trim().to_string(),
            students: count(35, 41) as usize,
            items: count(41, 46) as usize,
            evaluation: int_field(card, 46, Some(51)),
            choices: count(51, 56) as u32,
            response_order: int_field(card, 56, Some(61)),
            copies: int_field(card, 62, None),
        }
    }

    fn validate(&self) -> Result<()> {
        if !matches!(self.response_order, 1 | 2) {
            bail!(
                "response order must be 1 (forward) or 2 (reverse), found {}",
                self.response_order
            );
        }
        if self.items == 0 {
            bail!("control card declares no items");
        }
        Ok(())
    }

    fn options(&self) -> Options {
        Options {
            reverse_order: Some(self.response_order == 2),
            number_of_copies: None,
            summary_only: Some(self.evaluation == 0),
        }
        .with_copies(self.copies)
    }

    fn date(&self) -> Result<Option<NaiveDate>> {
        if self.raw_date.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(&self.raw_date, "%m%d%y")
            .map(Some)
            .with_context(|| format!("invalid date '{}', expected MMDDYY", self.raw_date))
    }
}

/// One field of a record format card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    /// `count` integers of `width` columns each.
    Integer { count: usize, width: usize },
    /// Move to 1-based column `column`.
    Tab { column: usize },
}

/// A parsed record format card such as `(I3,T10,40I1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFormat {
    text: String,
    fields: Vec<Field>,
}

/// One decoded student record line.
#[derive(Debug, Clone, PartialEq)]
enum Record {
    GroupEnd,
    Student { score: i64, answers: Vec<i32> },
}

impl RecordFormat {
    pub fn parse(card: &str) -> Result<Self> {
        let text = card.trim().to_string();
        let body = text.trim_start_matches('(').trim_end_matches(')');
        let fields = body
            .split(',')
            .map(|field| parse_field(field.trim()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { text, fields })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Decode one line. `continued` holds the score of a record spanning
    /// several lines; its repeated score must match.
    fn read(&self, line: &str, continued: Option<i64>) -> Result<Record> {
        let mut position = 0usize;
        let mut first = true;
        let mut score = continued.unwrap_or(0);
        let mut answers = Vec::new();
        for field in &self.fields {
            match *field {
                Field::Tab { column } => position = column.saturating_sub(1),
                Field::Integer { count, width } => {
                    for _ in 0..count {
                        let raw = columns(line, position, Some(position + width));
                        let value: i64 = if raw.trim().is_empty() {
                            0
                        } else {
                            raw.trim().parse().with_context(|| {
                                format!("invalid integer '{raw}' at column {}", position + 1)
                            })?
                        };
                        if first {
                            match continued {
                                None if value == GROUP_END => return Ok(Record::GroupEnd),
                                None => score = value,
                                Some(previous) if previous != value => bail!(
                                    "score {value} at column {} does not match {previous} on the previous line",
                                    position + 1
                                ),
                                Some(_) => {}
                            }
                            first = false;
                        } else {
                            let answer = i32::try_from(value)
                                .with_context(|| format!("answer {value} out of range"))?;
                            answers.push(answer);
                        }
                        position += width;
                    }
                }
            }
        }
        Ok(Record::Student { score, answers })
    }
}

fn parse_field(field: &str) -> Result<Field> {
    let split = field
        .find(|c: char| !c.is_ascii_digit())
        .with_context(|| format!("invalid field format: {field}"))?;
    let (count, rest) = field.split_at(split);
    let mut chars = rest.chars();
    let kind = chars.next().map(|c| c.to_ascii_uppercase());
    let width: usize = chars
        .as_str()
        .parse()
        .with_context(|| format!("invalid field format: {field}"))?;
    let count = if count.is_empty() { 1 } else { count.parse()? };
    match kind {
        Some('I') => Ok(Field::Integer { count, width }),
        Some('T') => Ok(Field::Tab { column: width }),
        _ => bail!("invalid field type in {field}, expected I or T"),
    }
}

/// Read a legacy input. Returns `None` for an empty input or a job number of 0.
pub fn parse_legacy_str(content: &str) -> Result<Option<Exam>> {
    let mut cards = Cards::new(content);
    let Some((line_no, card)) = cards.next() else {
        return Ok(None);
    };
    let mut header = ControlCard::parse(card);
    if header.id == 0 {
        return Ok(None);
    }
    header
        .validate()
        .with_context(|| format!("control card on line {line_no}"))?;

    let mut exam = Exam::with_options(header.id, header.options());
    exam.course = header.course.clone();
    exam.instructor = header.instructor.clone();
    exam.date = header
        .date()
        .with_context(|| format!("control card on line {line_no}"))?;

    let mut number = 1;
    loop {
        let section =
            read_section(&mut cards, &header).with_context(|| format!("section {number}"))?;
        exam.add_exam_section(section)
            .with_context(|| format!("section {number}"))?;

        let Some((line_no, card)) = cards.next() else {
            break;
        };
        let next = ControlCard::parse(card);
        if next.items == 0 {
            break;
        }
        next.validate()
            .with_context(|| format!("control card on line {line_no}"))?;
        header = next;
        number += 1;
    }

    tracing::debug!(
        exam = exam.id,
        sections = exam.sections().len(),
        "read legacy input"
    );
    Ok(Some(exam))
}

fn read_section(cards: &mut Cards<'_>, header: &ControlCard) -> Result<ExamSection> {
    let mut section = ExamSection::with_options(header.options());
    section.set_answer_key(read_answer_key(cards, header.items)?)?;

    let (line_no, card) = cards.next().context("missing record format card")?;
    let format =
        RecordFormat::parse(card).with_context(|| format!("format card on line {line_no}"))?;
    section.set_input_format(format.text());

    let mut groups: Vec<StudentAnswers> =
        (1..=GROUPS as u64).map(StudentAnswers::new).collect();
    let mut current = 0;
    for student in 1..=header.students {
        let mut score = None;
        let mut answers = Vec::with_capacity(header.items);
        while score.is_none() || answers.len() < header.items {
            let (line_no, card) = cards
                .next()
                .with_context(|| format!("input ended before student {student} was complete"))?;
            match format
                .read(card, score)
                .with_context(|| format!("line {line_no}"))?
            {
                Record::GroupEnd => {
                    current += 1;
                    if current >= GROUPS {
                        bail!("line {line_no}: all {GROUPS} groups closed before student {student}");
                    }
                }
                Record::Student {
                    score: value,
                    answers: more,
                } => {
                    score = Some(value);
                    answers.extend(more);
                    if answers.len() > header.items {
                        bail!(
                            "line {line_no}: {} answers read, expected {}",
                            answers.len(),
                            header.items
                        );
                    }
                }
            }
        }
        let score = score.unwrap_or(0);
        let score =
            u32::try_from(score).with_context(|| format!("student {student}: invalid score {score}"))?;
        groups[current].push_student(score, answers)?;
    }

    while current < GROUPS {
        let (line_no, card) = cards
            .next()
            .with_context(|| format!("expected {} more group terminators", GROUPS - current))?;
        match format
            .read(card, None)
            .with_context(|| format!("line {line_no}"))?
        {
            Record::GroupEnd => current += 1,
            Record::Student { .. } => {
                bail!("line {line_no}: expected a group terminator (-1), found a student record")
            }
        }
    }

    for group in groups {
        section.add_student_answers(group)?;
    }
    if header.choices > 0 {
        section.declare_responses_per_question(header.choices)?;
    }
    Ok(section)
}

fn read_answer_key(cards: &mut Cards<'_>, items: usize) -> Result<Vec<u32>> {
    let mut key = Vec::with_capacity(items);
    while key.len() < items {
        let (line_no, card) = cards.next().context("input ended inside the answer key")?;
        for c in card.chars().filter(|c| !c.is_whitespace()) {
            let digit = c
                .to_digit(10)
                .with_context(|| format!("line {line_no}: invalid answer key digit '{c}'"))?;
            key.push(digit);
        }
    }
    if key.len() != items {
        bail!("answer key has {} values, expected {items}", key.len());
    }
    Ok(key)
}
