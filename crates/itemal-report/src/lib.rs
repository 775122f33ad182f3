//! itemal-report: Writers for analyzed exams.
//!
//! Every writer takes an [`Exam`] whose statistical summaries have been
//! attached by the analysis engine.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use itemal_core::config::Format;
use itemal_core::model::Exam;

pub mod document;
pub mod table;
pub mod text;

/// Render an analyzed exam in the given output format.
pub fn render(exam: &Exam, format: Format) -> Result<String> {
    match format {
        Format::Legacy => Ok(text::generate_text(exam)),
        Format::Json => document::generate_json(exam, false),
        Format::JsonPretty => document::generate_json(exam, true),
        Format::Yaml => document::generate_yaml(exam),
    }
}

/// Write a rendered report to `path`, appending when asked.
pub fn write_report(exam: &Exam, format: Format, path: &Path, append: bool) -> Result<()> {
    let rendered = render(exam, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .with_context(|| format!("failed to open output file: {}", path.display()))?;
    file.write_all(rendered.as_bytes())
        .with_context(|| format!("failed to write output file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), %format, "report written");
    Ok(())
}
