//! Console summary tables.

use comfy_table::{Cell, Table};

use itemal_core::model::Exam;

/// Per-section counts and score moments.
pub fn section_table(exam: &Exam) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Section", "Groups", "Students", "Items", "Choices", "Mean", "Std Dev",
    ]);

    for (i, section) in exam.sections().iter().enumerate() {
        let (mean, sd) = section
            .statistical_summary()
            .map(|s| (format!("{:.2}", s.score_mean), format!("{:.2}", s.std_deviation)))
            .unwrap_or_else(|| ("-".into(), "-".into()));
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(section.groups().len()),
            Cell::new(section.student_count()),
            Cell::new(section.question_count()),
            Cell::new(section.responses_per_question()),
            Cell::new(mean),
            Cell::new(sd),
        ]);
    }
    table
}

/// Whole-test reliability figures, if the exam was analyzed.
pub fn exam_table(exam: &Exam) -> Option<Table> {
    let summary = exam.statistical_summary()?;
    let mut table = Table::new();
    table.set_header(vec![
        "Exam",
        "Students",
        "Items",
        "KR-20",
        "SEM",
        "Mean Difficulty",
        "Mean Biserial",
    ]);
    table.add_row(vec![
        Cell::new(exam.id),
        Cell::new(summary.student_count),
        Cell::new(summary.question_count),
        Cell::new(format!("{:.3}", summary.kr20_reliability)),
        Cell::new(format!("{:.2}", summary.standard_error_of_measurement)),
        Cell::new(format!("{:.3}", summary.mean_difficulty)),
        Cell::new(format!("{:.3}", summary.mean_biserial)),
    ]);
    Some(table)
}

/// Both tables, rendered for the terminal.
pub fn render_summary(exam: &Exam) -> String {
    let mut out = format!("{}\n", section_table(exam));
    if let Some(table) = exam_table(exam) {
        out.push_str(&format!("{table}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use itemal_core::model::{ExamSection, StudentAnswers};

    fn exam() -> Exam {
        let mut section = ExamSection::new();
        section.set_answer_key(vec![1, 2]).unwrap();
        let mut group = StudentAnswers::new(1u64);
        for answers in [[1, 2], [1, 1], [2, 2], [1, 2]] {
            group.push_student(0, answers.to_vec()).unwrap();
        }
        section.add_student_answers(group).unwrap();
        section.calculate_scores().unwrap();
        let mut exam = Exam::new(42);
        exam.add_exam_section(section).unwrap();
        exam
    }

    #[test]
    fn unanalyzed_exam_has_no_exam_table() {
        let exam = exam();
        assert!(exam_table(&exam).is_none());
        let rendered = section_table(&exam).to_string();
        assert!(rendered.contains("Students"));
        assert!(rendered.contains('-'));
    }

    #[test]
    fn analyzed_exam_summary() {
        let mut exam = exam();
        itemal_core::analyze(&mut exam).unwrap();
        let rendered = render_summary(&exam);
        assert!(rendered.contains("KR-20"));
        assert!(rendered.contains("1.50"));
        assert!(rendered.contains("0.750"));
        assert!(rendered.contains("42"));
    }
}
