//! The `itemal validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use itemal_core::config::{load_config_from, Format};
use itemal_core::engine::warned_groups;
use itemal_core::model::IdSequence;

use super::{load_exam, read_input};

pub fn execute(input: String, format: Option<Format>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let format = format.unwrap_or(config.default_format);
    let defaults = config.defaults.to_options();

    let content = read_input(&input)?;
    let Some(mut exam) = load_exam(&content, format, &mut IdSequence::new(), &defaults)
        .with_context(|| format!("failed to read {input}"))?
    else {
        println!("No exam found in {input}.");
        return Ok(());
    };

    println!(
        "Exam {}: {} section(s), {} group(s), {} student(s), {} item(s)",
        exam.id,
        exam.sections().len(),
        exam.group_ids().len(),
        exam.student_count(),
        exam.question_count()
    );
    for (i, section) in exam.sections().iter().enumerate() {
        println!(
            "  section {}: {} item(s), {} choice(s), {} student(s){}",
            i + 1,
            section.question_count(),
            section.responses_per_question(),
            section.student_count(),
            if section.options().is_reverse_order() {
                ", reverse order"
            } else {
                ""
            }
        );
    }

    exam.reverse_answer_ordering_if_necessary();
    let warnings = itemal_core::analyze(&mut exam)?;
    for w in &warnings {
        println!("  WARNING: {w}");
    }

    if warnings.is_empty() {
        println!("Input valid.");
    } else {
        let groups: Vec<String> = warned_groups(&warnings)
            .iter()
            .map(|g| g.to_string())
            .collect();
        if groups.is_empty() {
            println!("\n{} warning(s) found.", warnings.len());
        } else {
            println!(
                "\n{} warning(s) found in group(s): {}",
                warnings.len(),
                groups.join(", ")
            );
        }
    }

    Ok(())
}
