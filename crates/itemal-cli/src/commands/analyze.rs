//! The `itemal analyze` command.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use itemal_core::config::{load_config_from, Format};
use itemal_core::model::IdSequence;

use super::{load_exam, read_input};

const STDIO: &str = "-";

pub fn execute(
    inputs: Vec<String>,
    outputs: Vec<String>,
    format: Option<Format>,
    append: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let format = format.unwrap_or(config.default_format);
    let append = append || config.append;
    let defaults = config.defaults.to_options();

    let inputs = if inputs.is_empty() {
        vec![STDIO.to_string()]
    } else {
        inputs
    };
    let outputs = if outputs.is_empty() {
        vec![STDIO.to_string()]
    } else {
        outputs
    };
    if inputs.iter().filter(|i| *i == STDIO).count() > 1 {
        bail!("stdin (\"-\") can be used only once with --input");
    }

    let mut ids = IdSequence::new();
    let mut written: HashSet<&str> = HashSet::new();
    let mut warning_count = 0;

    for (n, input) in inputs.iter().enumerate() {
        let output = outputs
            .get(n)
            .or_else(|| outputs.last())
            .map(String::as_str)
            .unwrap_or(STDIO);

        let content = read_input(input)?;
        let Some(mut exam) = load_exam(&content, format, &mut ids, &defaults)
            .with_context(|| format!("failed to read {}", display_name(input)))?
        else {
            tracing::info!(input = %display_name(input), "no exam found");
            continue;
        };

        let reversed = exam.reverse_answer_ordering_if_necessary();
        tracing::debug!(exam = exam.id, reversed, "prepared exam");
        let warnings = itemal_core::analyze(&mut exam)
            .with_context(|| format!("failed to analyze {}", display_name(input)))?;
        warning_count += warnings.len();

        if output == STDIO {
            let rendered = itemal_report::render(&exam, format)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        } else {
            let append = append || written.contains(output);
            itemal_report::write_report(&exam, format, Path::new(output), append)?;
            written.insert(output);
        }

        eprintln!("{}", itemal_report::table::render_summary(&exam));
    }

    if warning_count > 0 {
        tracing::warn!(count = warning_count, "data warnings recorded");
        if config.fail_on_warnings {
            bail!("{warning_count} data warning(s) recorded");
        }
    }

    Ok(())
}

fn display_name(input: &str) -> &str {
    if input == STDIO {
        "stdin"
    } else {
        input
    }
}
