//! Item-analysis engine.
//!
//! Walks the sections of an [`Exam`] in order, tallies responses into sparse
//! accumulators, derives per-item statistics, and aggregates them into the
//! whole-test summary. Results are attached to the model in place.

use tracing::{debug, info, warn};

use crate::error::{DataWarning, ItemalError, Result, WarningKind};
use crate::model::{reverse_choice, Exam, ExamSection, GroupId};
use crate::report::{
    choice_label, ChoiceBreakdown, ChoiceStatistics, ExamSummary, ItemStatistics, RangeCount,
    SectionSummary,
};
use crate::sparse::SparseArray;
use crate::statistics::{
    approx_eq, correlate, difficulty, difficulty_rating, distractor_threshold, kr20,
    standard_error_of_measurement, CorrelationRange, ItemTally, PassingRange, ScoreMoments,
    KEY_PROPORTION_BAND,
};

/// Analyze every section of `exam`, attach the summaries, and return the
/// data warnings raised along the way.
pub fn analyze(exam: &mut Exam) -> Result<Vec<DataWarning>> {
    let mut analyzer = ItemAnalyzer::new();
    analyzer.analyze_exam(exam)?;
    Ok(analyzer.take_warnings())
}

/// Cumulative state of one analysis pass.
///
/// Sections must be fed in exam order: item numbering and the aggregate
/// sums advance with every section.
#[derive(Debug, Clone)]
pub struct ItemAnalyzer {
    item_offset: usize,
    difficulty_sum: f64,
    biserial_sum: f64,
    item_variance_sum: f64,
    passing: [usize; 5],
    correlation: [usize; 6],
    keyed_count: SparseArray<f64>,
    keyed_difficulty_sum: SparseArray<f64>,
    chosen_count: SparseArray<f64>,
    max_choices: u32,
    last_moments: ScoreMoments,
    warnings: Vec<DataWarning>,
}

impl Default for ItemAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-section response tallies.
struct SectionTally {
    /// (item, choice + 1, group) -> responses.
    by_group: SparseArray<u64>,
    /// (item, choice + 1) -> responses.
    response_total: SparseArray<u64>,
    /// (item, choice + 1) -> sum of the choosers' total scores.
    score_sum: SparseArray<u64>,
    correct: SparseArray<u64>,
    correct_score_sum: SparseArray<u64>,
    incorrect_score_sum: SparseArray<u64>,
}

impl SectionTally {
    fn new() -> Self {
        Self {
            by_group: SparseArray::new(3, 0),
            response_total: SparseArray::new(2, 0),
            score_sum: SparseArray::new(2, 0),
            correct: SparseArray::new(1, 0),
            correct_score_sum: SparseArray::new(1, 0),
            incorrect_score_sum: SparseArray::new(1, 0),
        }
    }
}

impl ItemAnalyzer {
    pub fn new() -> Self {
        Self {
            item_offset: 0,
            difficulty_sum: 0.0,
            biserial_sum: 0.0,
            item_variance_sum: 0.0,
            passing: [0; 5],
            correlation: [0; 6],
            keyed_count: SparseArray::new(1, 0.0),
            keyed_difficulty_sum: SparseArray::new(1, 0.0),
            chosen_count: SparseArray::new(1, 0.0),
            max_choices: 0,
            last_moments: ScoreMoments::default(),
            warnings: Vec::new(),
        }
    }

    /// Analyze every section of `exam` in order and attach the exam summary.
    ///
    /// Aggregate state from earlier calls is discarded; warnings are kept
    /// until [`take_warnings`](Self::take_warnings).
    pub fn analyze_exam(&mut self, exam: &mut Exam) -> Result<ExamSummary> {
        let warnings = std::mem::take(&mut self.warnings);
        *self = Self {
            warnings,
            ..Self::new()
        };

        for (index, section) in exam.sections_mut().iter_mut().enumerate() {
            self.analyze_section(section, index + 1)?;
        }

        let summary = self.summarize();
        info!(
            exam = exam.id,
            items = summary.question_count,
            students = summary.student_count,
            kr20 = summary.kr20_reliability,
            "exam analyzed"
        );
        exam.set_statistical_summary(summary.clone());
        Ok(summary)
    }

    /// Tally and analyze one section, attaching its summary.
    ///
    /// `section_number` is the 1-based position used in warnings and errors.
    pub fn analyze_section(&mut self, section: &mut ExamSection, section_number: usize) -> Result<()> {
        let students = section.student_count();
        if students == 0 {
            return Err(ItemalError::EmptySection {
                section: section_number,
            });
        }
        let questions = section.question_count();
        let key = section.answer_key().to_vec();
        if key.len() != questions {
            return Err(ItemalError::DimensionMismatch {
                expected: questions,
                found: key.len(),
            });
        }
        let choices = section.responses_per_question();
        debug!(
            section = section_number,
            students, questions, choices, "analyzing section"
        );

        let tally = self.tally(section, section_number, &key, choices)?;
        debug!(
            section = section_number,
            cells = tally.response_total.len(),
            "tallied responses"
        );
        let moments = ScoreMoments::from_scores(
            section
                .groups()
                .iter()
                .flat_map(|g| g.scores().iter().copied()),
        );

        let group_count = section.groups().len();
        let reversed_with = section.reversal_maximum();
        let mut items = Vec::with_capacity(questions);
        for (i, &keyed) in key.iter().enumerate() {
            let question_number = self.item_offset + i + 1;
            let item_tally = ItemTally {
                students,
                correct: tally.correct.get(&[i])?,
                correct_score_sum: tally.correct_score_sum.get(&[i])?,
                incorrect_score_sum: tally.incorrect_score_sum.get(&[i])?,
            };
            let d = difficulty(item_tally.correct, students);
            let passing_range = PassingRange::classify(d);
            match passing_range {
                Some(range) => self.passing[range.index()] += 1,
                None => self.record(DataWarning {
                    section: section_number,
                    question_number,
                    group: None,
                    kind: WarningKind::DifficultyOutOfRange { difficulty: d },
                }),
            }

            let item = correlate(&item_tally, moments.mean, moments.std_dev);
            let correlation_range = if item.degenerate {
                None
            } else {
                let range = CorrelationRange::classify(item.correlation.biserial);
                self.correlation[range.index()] += 1;
                self.difficulty_sum += d;
                self.biserial_sum += item.correlation.biserial;
                Some(range)
            };
            self.item_variance_sum += item.item_variance;

            let mut stats = Vec::with_capacity(choices as usize + 1);
            for choice in 0..=choices {
                let j = choice as usize + 1;
                let total = tally.response_total.get(&[i, j])?;
                let mean_score = if total == 0 {
                    0.0
                } else {
                    tally.score_sum.get(&[i, j])? as f64 / total as f64
                };
                let per_group_counts = (0..group_count)
                    .map(|g| tally.by_group.get(&[i, j, g]))
                    .collect::<Result<Vec<_>>>()?;
                let answer_index = match reversed_with {
                    Some(maximum) => reverse_choice(choice as i32, maximum) as u32,
                    None => choice,
                };
                stats.push(ChoiceStatistics {
                    label: choice_label(choice),
                    answer_index,
                    is_key: choice == keyed,
                    proportion_choosing: total as f64 / students as f64,
                    mean_score,
                    response_total: total,
                    is_questionable: false,
                    per_group_counts,
                });
            }
            flag_questionable(&mut stats, keyed, choices, moments.mean);

            let key_proportion = stats
                .get(keyed as usize)
                .map(|c| c.proportion_choosing)
                .unwrap_or(0.0);
            self.keyed_count.add(&[keyed as usize], 1.0)?;
            self.keyed_difficulty_sum
                .add(&[keyed as usize], key_proportion)?;
            for (index, choice) in stats.iter().enumerate().skip(1) {
                self.chosen_count.add(&[index], choice.response_total as f64)?;
            }

            items.push(ItemStatistics {
                question_number,
                correct_answer: keyed,
                correct_label: choice_label(keyed),
                difficulty: d,
                passing_range,
                difficulty_rating: difficulty_rating(d),
                biserial: item.correlation.biserial,
                point_biserial: item.correlation.point_biserial,
                t: item.correlation.t,
                mean_score_correct: item.mean_correct,
                mean_score_incorrect: item.mean_incorrect,
                ordinate: item.ordinate,
                correlation_range,
                choices: stats,
            });
        }

        let summary = SectionSummary {
            first_question_number: self.item_offset + 1,
            student_count: students,
            question_count: questions,
            responses_per_question: choices,
            group_ids: section.group_ids(),
            group_student_counts: section.groups().iter().map(|g| g.student_count()).collect(),
            score_mean: moments.mean,
            variance: moments.variance,
            std_deviation: moments.std_dev,
            standard_error: moments.standard_error,
            items,
        };
        section.set_statistical_summary(summary);

        self.item_offset += questions;
        self.max_choices = self.max_choices.max(choices);
        self.last_moments = moments;
        Ok(())
    }

    fn tally(
        &mut self,
        section: &ExamSection,
        section_number: usize,
        key: &[u32],
        choices: u32,
    ) -> Result<SectionTally> {
        let mut tally = SectionTally::new();
        for (g, group) in section.groups().iter().enumerate() {
            for (score, answers) in group.students() {
                let score = u64::from(score);
                for (i, (&answer, &keyed)) in answers.iter().zip(key).enumerate() {
                    if i64::from(answer) == i64::from(keyed) {
                        tally.correct.add(&[i], 1)?;
                        tally.correct_score_sum.add(&[i], score)?;
                    } else {
                        tally.incorrect_score_sum.add(&[i], score)?;
                    }

                    let kind = if answer < 0 {
                        Some(WarningKind::NegativeResponse { value: answer })
                    } else if answer as u32 > choices {
                        Some(WarningKind::ResponseExceedsMaximum {
                            value: answer,
                            maximum: choices,
                        })
                    } else {
                        None
                    };
                    if let Some(kind) = kind {
                        self.record(DataWarning {
                            section: section_number,
                            question_number: self.item_offset + i + 1,
                            group: Some(group.group_id().clone()),
                            kind,
                        });
                        continue;
                    }

                    let j = answer as usize + 1;
                    tally.by_group.add(&[i, j, g], 1)?;
                    tally.response_total.add(&[i, j], 1)?;
                    tally.score_sum.add(&[i, j], score)?;
                }
            }
        }
        Ok(tally)
    }

    fn record(&mut self, warning: DataWarning) {
        warn!(section = warning.section, "{warning}");
        self.warnings.push(warning);
    }

    /// Warnings recorded since the last call, clearing them.
    pub fn take_warnings(&mut self) -> Vec<DataWarning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn warnings(&self) -> &[DataWarning] {
        &self.warnings
    }

    /// Whole-test statistics over every section analyzed so far.
    ///
    /// Reads the accumulated state only, so repeated calls agree.
    pub fn summarize(&self) -> ExamSummary {
        let items = self.item_offset;
        let k = items as f64;
        let per_item = |sum: f64| if items == 0 { 0.0 } else { sum / k };
        let moments = self.last_moments;
        let reliability = kr20(items, moments.variance, self.item_variance_sum);
        let responses = moments.count as f64 * k;

        let choice_breakdown = (1..=self.max_choices)
            .map(|choice| {
                let index = [choice as usize];
                let keyed = self.keyed_count.get(&index).unwrap_or(0.0);
                let chosen = self.chosen_count.get(&index).unwrap_or(0.0);
                let difficulty_sum = self.keyed_difficulty_sum.get(&index).unwrap_or(0.0);
                ChoiceBreakdown {
                    label: choice_label(choice),
                    keyed_frequency: per_item(keyed),
                    chosen_frequency: if responses > 0.0 { chosen / responses } else { 0.0 },
                    average_difficulty: if approx_eq(keyed, 0.0) {
                        0.0
                    } else {
                        difficulty_sum / keyed
                    },
                }
            })
            .collect();

        ExamSummary {
            mean_difficulty: per_item(self.difficulty_sum),
            mean_biserial: per_item(self.biserial_sum),
            kr20_reliability: reliability,
            score_mean: moments.mean,
            variance: moments.variance,
            std_deviation: moments.std_dev,
            standard_error_of_measurement: standard_error_of_measurement(
                moments.std_dev,
                reliability,
            ),
            student_count: moments.count,
            question_count: items,
            distribution_by_passing_range: PassingRange::ALL
                .iter()
                .map(|r| RangeCount {
                    range: r.label().to_string(),
                    number_of_items: self.passing[r.index()],
                })
                .collect(),
            distribution_by_correlation_range: CorrelationRange::ALL
                .iter()
                .map(|r| RangeCount {
                    range: r.label().to_string(),
                    number_of_items: self.correlation[r.index()],
                })
                .collect(),
            choice_breakdown,
        }
    }
}

/// Mark questionable options of one item. Omits are never flagged.
///
/// Every option, the key included, is flagged when the key's choosers
/// score below the test mean.
fn flag_questionable(stats: &mut [ChoiceStatistics], keyed: u32, choices: u32, test_mean: f64) {
    let threshold = distractor_threshold(choices);
    let (low, high) = KEY_PROPORTION_BAND;
    let key_mean = stats.get(keyed as usize).map(|c| c.mean_score).unwrap_or(0.0);
    let weak_key = key_mean < test_mean;

    for choice in stats.iter_mut().skip(1) {
        let p = choice.proportion_choosing;
        let by_proportion = if choice.is_key {
            p < low || p > high
        } else {
            p < threshold
        };
        choice.is_questionable = by_proportion || choice.mean_score > key_mean || weak_key;
    }
}

/// Group identifiers for which a warning was recorded, in first-seen order.
pub fn warned_groups(warnings: &[DataWarning]) -> Vec<GroupId> {
    let mut seen = Vec::new();
    for group in warnings.iter().filter_map(|w| w.group.as_ref()) {
        if !seen.contains(group) {
            seen.push(group.clone());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Options, StudentAnswers};
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn section(key: &[u32], choices: Option<u32>, groups: &[(u64, &[&[i32]])]) -> ExamSection {
        let mut section = ExamSection::new();
        if let Some(c) = choices {
            section.set_responses_per_question(c).unwrap();
        }
        section.set_answer_key(key.to_vec()).unwrap();
        for (id, rows) in groups {
            let mut g = StudentAnswers::new(*id);
            for row in rows.iter() {
                g.push_student(0, row.to_vec()).unwrap();
            }
            section.add_student_answers(g).unwrap();
        }
        section.calculate_scores().unwrap();
        section
    }

    fn exam_of(sections: Vec<ExamSection>) -> Exam {
        let mut exam = Exam::new(1);
        for s in sections {
            exam.add_exam_section(s).unwrap();
        }
        exam
    }

    #[test]
    fn four_students_two_items() {
        let mut exam = exam_of(vec![section(
            &[1, 2],
            None,
            &[(1, &[&[1, 2], &[1, 1], &[2, 2], &[1, 2]])],
        )]);
        let warnings = analyze(&mut exam).unwrap();
        assert!(warnings.is_empty());

        let s = &exam.sections()[0];
        assert_eq!(s.groups()[0].scores(), &[2, 1, 1, 2]);
        let summary = s.statistical_summary().unwrap();
        let first = &summary.items[0];
        assert_eq!(first.question_number, 1);
        assert!(close(first.difficulty, 0.75));
        assert_eq!(first.passing_range, Some(PassingRange::SixtyTo79));
        assert!(close(first.mean_score_correct, 5.0 / 3.0));
        assert!(close(first.point_biserial, 0.5));
        assert!(close(summary.score_mean, 1.5));
        assert!(close(summary.variance, 1.0 / 3.0));

        let omit = &first.choices[0];
        assert_eq!(omit.label, "OMIT");
        assert_eq!(omit.response_total, 0);
        let a = &first.choices[1];
        assert!(a.is_key);
        assert_eq!(a.response_total, 3);
        assert_eq!(a.per_group_counts, vec![3]);
        assert!(close(a.mean_score, 5.0 / 3.0));
    }

    #[test]
    fn median_item_uses_fixed_ordinate() {
        let mut exam = exam_of(vec![section(
            &[1, 2],
            None,
            &[(1, &[&[1, 2], &[1, 1], &[2, 2], &[1, 1]])],
        )]);
        analyze(&mut exam).unwrap();
        let item = &exam.sections()[0].statistical_summary().unwrap().items[1];
        assert!(close(item.difficulty, 0.5));
        assert_eq!(item.ordinate, 0.39894);
        assert_eq!(item.passing_range, Some(PassingRange::FortyTo59));
    }

    #[test]
    fn boundary_items() {
        let mut exam = exam_of(vec![section(
            &[1, 2, 1],
            Some(3),
            &[(1, &[&[1, 1, 1], &[1, 3, 2], &[1, 3, 1]])],
        )]);
        analyze(&mut exam).unwrap();
        let items = &exam.sections()[0].statistical_summary().unwrap().items;

        let all_right = &items[0];
        assert_eq!(all_right.difficulty, 1.0);
        assert_eq!(all_right.passing_range, Some(PassingRange::EightyTo100));
        assert_eq!((all_right.biserial, all_right.point_biserial, all_right.t), (0.0, 0.0, 0.0));

        let all_wrong = &items[1];
        assert_eq!(all_wrong.difficulty, 0.0);
        assert_eq!(all_wrong.passing_range, Some(PassingRange::ZeroTo19));
        assert_eq!((all_wrong.biserial, all_wrong.point_biserial, all_wrong.t), (0.0, 0.0, 0.0));
        assert_eq!(all_wrong.correlation_range, None);
        assert_eq!(all_right.correlation_range, None);
    }

    #[test]
    fn all_alike_items_stay_out_of_aggregates() {
        let mut exam = exam_of(vec![section(
            &[1, 2, 1],
            Some(3),
            &[(1, &[&[1, 1, 1], &[1, 3, 2], &[1, 3, 1], &[1, 2, 2]])],
        )]);
        analyze(&mut exam).unwrap();
        let summary = exam.statistical_summary().unwrap();
        assert_eq!(summary.question_count, 3);
        // Only items 2 and 3 contribute, still divided by all three items.
        assert!(close(summary.mean_difficulty, 0.25));
        assert!(close(
            summary.mean_biserial,
            (0.388_136_333_134_226 + 0.626_660_650_724_419) / 3.0
        ));

        let counts: Vec<usize> = summary
            .distribution_by_correlation_range
            .iter()
            .map(|r| r.number_of_items)
            .collect();
        assert_eq!(counts, vec![0, 0, 1, 1, 0, 0]);
        let passing: usize = summary
            .distribution_by_passing_range
            .iter()
            .map(|r| r.number_of_items)
            .sum();
        assert_eq!(passing, 3);

        let items = &exam.sections()[0].statistical_summary().unwrap().items;
        assert_eq!(items[1].correlation_range, Some(CorrelationRange::Fair));
        assert_eq!(items[2].correlation_range, Some(CorrelationRange::Good));
    }

    #[test]
    fn malformed_responses_warn_and_skip_choice_tallies() {
        let mut exam = exam_of(vec![section(
            &[1, 2],
            None,
            &[(1, &[&[1, 2], &[-1, 2]]), (2, &[&[7, 2], &[2, 1]])],
        )]);
        let warnings = analyze(&mut exam).unwrap();
        assert_eq!(warnings.len(), 2);
        assert_eq!(
            warnings[0].kind,
            WarningKind::NegativeResponse { value: -1 }
        );
        assert_eq!(warnings[0].group, Some(GroupId::Number(1)));
        assert_eq!(
            warnings[1].kind,
            WarningKind::ResponseExceedsMaximum {
                value: 7,
                maximum: 2
            }
        );
        assert_eq!(warned_groups(&warnings), vec![GroupId::Number(1), GroupId::Number(2)]);

        let item = &exam.sections()[0].statistical_summary().unwrap().items[0];
        let tallied: u64 = item.choices.iter().map(|c| c.response_total).sum();
        assert_eq!(tallied, 2);
        assert!(close(item.difficulty, 0.25));
    }

    #[test]
    fn warnings_are_cleared_once_taken() {
        let mut analyzer = ItemAnalyzer::new();
        let mut exam = exam_of(vec![section(&[1], None, &[(1, &[&[-2], &[1]])])]);
        analyzer.analyze_exam(&mut exam).unwrap();
        assert_eq!(analyzer.warnings().len(), 1);
        assert_eq!(analyzer.take_warnings().len(), 1);
        assert!(analyzer.take_warnings().is_empty());
    }

    #[test]
    fn well_behaved_item_has_no_questionable_options() {
        let rows: Vec<&[i32]> = [&[1][..]; 6]
            .into_iter()
            .chain([&[2][..]; 3])
            .chain([&[3][..]; 1])
            .collect();
        let mut exam = exam_of(vec![section(&[1], Some(3), &[(1, rows.as_slice())])]);
        analyze(&mut exam).unwrap();
        let item = &exam.sections()[0].statistical_summary().unwrap().items[0];
        assert!(item.choices.iter().all(|c| !c.is_questionable));
    }

    #[test]
    fn rare_distractor_and_easy_key_are_questionable() {
        let rows: Vec<&[i32]> = [&[1][..]; 17]
            .into_iter()
            .chain([&[2][..]; 2])
            .chain([&[3][..]; 1])
            .collect();
        let mut exam = exam_of(vec![section(&[1], Some(3), &[(1, rows.as_slice())])]);
        analyze(&mut exam).unwrap();
        let flags: Vec<bool> = exam.sections()[0].statistical_summary().unwrap().items[0]
            .choices
            .iter()
            .map(|c| c.is_questionable)
            .collect();
        assert_eq!(flags, vec![false, true, false, true]);
    }

    #[test]
    fn weak_key_flags_itself_and_stronger_distractor() {
        let mut exam = exam_of(vec![section(
            &[1, 1, 1],
            Some(2),
            &[(
                1,
                &[&[1, 2, 2], &[1, 2, 2], &[2, 1, 1], &[2, 1, 1], &[1, 1, 1]],
            )],
        )]);
        analyze(&mut exam).unwrap();
        let item = &exam.sections()[0].statistical_summary().unwrap().items[0];
        let key = &item.choices[1];
        assert!(key.is_key);
        assert!(close(key.proportion_choosing, 0.6));
        assert!(close(key.mean_score, 5.0 / 3.0));
        // Key choosers average 1.67 against a test mean of 1.8.
        assert!(key.is_questionable);
        assert!(item.choices[2].is_questionable);
        assert!(!item.choices[0].is_questionable);
    }

    #[test]
    fn numbering_and_aggregates_span_sections() {
        let first = section(&[1, 2], None, &[(1, &[&[1, 2], &[2, 2], &[1, 1]])]);
        let second = section(&[2], None, &[(1, &[&[2], &[1], &[2]])]);
        let mut exam = exam_of(vec![first, second]);
        let mut analyzer = ItemAnalyzer::new();
        let summary = analyzer.analyze_exam(&mut exam).unwrap();

        let second = exam.sections()[1].statistical_summary().unwrap();
        assert_eq!(second.first_question_number, 3);
        assert_eq!(second.items[0].question_number, 3);
        assert_eq!(summary.question_count, 3);
        assert_eq!(summary.student_count, 3);
        assert!(close(summary.mean_difficulty, (2.0 / 3.0) * 3.0 / 3.0));

        let passing: usize = summary
            .distribution_by_passing_range
            .iter()
            .map(|r| r.number_of_items)
            .sum();
        let correlations: usize = summary
            .distribution_by_correlation_range
            .iter()
            .map(|r| r.number_of_items)
            .sum();
        assert_eq!(passing, 3);
        assert_eq!(correlations, 3);

        let a = &summary.choice_breakdown[0];
        let b = &summary.choice_breakdown[1];
        assert_eq!(a.label, "A");
        assert!(close(a.keyed_frequency, 1.0 / 3.0));
        assert!(close(b.keyed_frequency, 2.0 / 3.0));
        assert!(close(a.chosen_frequency, 4.0 / 9.0));
        assert!(close(b.average_difficulty, 2.0 / 3.0));
    }

    #[test]
    fn summarize_is_idempotent() {
        let mut exam = exam_of(vec![section(
            &[1, 2, 3],
            Some(4),
            &[(1, &[&[1, 2, 3], &[1, 4, 3], &[2, 2, 0]]), (2, &[&[1, 2, 1]])],
        )]);
        let mut analyzer = ItemAnalyzer::new();
        let attached = analyzer.analyze_exam(&mut exam).unwrap();
        assert_eq!(analyzer.summarize(), attached);
        assert_eq!(analyzer.summarize(), analyzer.summarize());
        assert_eq!(exam.statistical_summary(), Some(&attached));
    }

    #[test]
    fn reversed_sections_report_source_numbering() {
        let mut reversed = ExamSection::with_options(Options {
            reverse_order: Some(true),
            ..Options::default()
        });
        reversed.set_responses_per_question(4).unwrap();
        reversed.set_answer_key(vec![4]).unwrap();
        let mut g = StudentAnswers::new(1);
        g.push_student(0, vec![4]).unwrap();
        g.push_student(0, vec![1]).unwrap();
        reversed.add_student_answers(g).unwrap();
        reversed.calculate_scores().unwrap();

        let mut exam = exam_of(vec![reversed]);
        assert_eq!(exam.reverse_answer_ordering_if_necessary(), 1);
        analyze(&mut exam).unwrap();

        let item = &exam.sections()[0].statistical_summary().unwrap().items[0];
        assert_eq!(item.correct_answer, 1);
        assert_eq!(item.correct_label, "A");
        let a = &item.choices[1];
        assert!(a.is_key);
        assert_eq!(a.answer_index, 4);
        assert_eq!(a.response_total, 1);
        assert_eq!(item.choices[4].answer_index, 1);
        assert_eq!(item.choices[0].answer_index, 0);

        let summary = exam.statistical_summary().unwrap();
        assert!(close(summary.choice_breakdown[0].keyed_frequency, 1.0));
        assert!(close(summary.choice_breakdown[3].chosen_frequency, 0.5));
    }

    #[test]
    fn empty_section_is_an_error() {
        let mut exam = Exam::new(3);
        let mut s = ExamSection::new();
        s.set_answer_key(vec![1, 2]).unwrap();
        exam.add_exam_section(s).unwrap();
        assert_eq!(
            analyze(&mut exam),
            Err(ItemalError::EmptySection { section: 1 })
        );
    }

    #[test]
    fn kr20_on_consistent_test() {
        let mut exam = exam_of(vec![section(
            &[1, 1, 1, 1],
            Some(2),
            &[(
                1,
                &[
                    &[1, 1, 1, 1],
                    &[1, 1, 1, 2],
                    &[1, 1, 2, 2],
                    &[1, 2, 2, 2],
                    &[2, 2, 2, 2],
                ],
            )],
        )]);
        analyze(&mut exam).unwrap();
        let summary = exam.statistical_summary().unwrap();
        // Scores 4, 3, 2, 1, 0: variance 2.5, item p = .8 .6 .4 .2.
        let pq = 0.16 + 0.24 + 0.24 + 0.16;
        assert!(close(summary.variance, 2.5));
        assert!(close(summary.kr20_reliability, (4.0 / 3.0) * (2.5 - pq) / 2.5));
        assert!(summary.standard_error_of_measurement > 0.0);
    }

    proptest! {
        #[test]
        fn difficulties_stay_in_range(
            rows in proptest::collection::vec(proptest::collection::vec(0i32..=4, 5), 1..40),
            key in proptest::collection::vec(1u32..=4, 5),
        ) {
            let mut s = ExamSection::new();
            s.set_responses_per_question(4).unwrap();
            s.set_answer_key(key).unwrap();
            let mut g = StudentAnswers::new(1);
            for row in &rows {
                g.push_student(0, row.clone()).unwrap();
            }
            s.add_student_answers(g).unwrap();
            s.calculate_scores().unwrap();
            let mut exam = exam_of(vec![s]);
            let warnings = analyze(&mut exam).unwrap();
            prop_assert!(warnings.is_empty());

            let summary = exam.sections()[0].statistical_summary().unwrap();
            let correct: f64 = summary.items.iter().map(|i| i.difficulty * rows.len() as f64).sum();
            prop_assert!(correct <= (rows.len() * 5) as f64 + 1e-9);
            for item in &summary.items {
                prop_assert!((0.0..=1.0).contains(&item.difficulty));
                prop_assert!(item.passing_range.is_some());
                let total: u64 = item.choices.iter().map(|c| c.response_total).sum();
                prop_assert_eq!(total, rows.len() as u64);
            }
        }
    }
}
