pub mod analyze;
pub mod init;
pub mod validate;

use std::io::Read;

use anyhow::{Context, Result};

use itemal_core::config::Format;
use itemal_core::document::ExamDocument;
use itemal_core::legacy::parse_legacy_str;
use itemal_core::model::{Exam, IdSequence, Options};

/// Read a whole input, `-` meaning stdin.
pub fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("failed to read stdin")?;
        return Ok(content);
    }
    std::fs::read_to_string(input).with_context(|| format!("failed to read input file: {input}"))
}

/// Decode the exam held in `content`. `None` when the input holds no exam.
pub fn load_exam(
    content: &str,
    format: Format,
    ids: &mut IdSequence,
    defaults: &Options,
) -> Result<Option<Exam>> {
    match format {
        Format::Legacy => parse_legacy_str(content),
        Format::Json | Format::JsonPretty => {
            if content.trim().is_empty() {
                return Ok(None);
            }
            ExamDocument::from_json_str(content)?
                .into_exam(ids, defaults)
                .map(Some)
        }
        Format::Yaml => {
            if content.trim().is_empty() {
                return Ok(None);
            }
            ExamDocument::from_yaml_str(content)?
                .into_exam(ids, defaults)
                .map(Some)
        }
    }
}
