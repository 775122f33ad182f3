//! Tool configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::Options;

/// Input and output encoding of exam data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    /// Fixed-width card images in, historical printout out.
    #[default]
    #[serde(alias = "fortran")]
    Legacy,
    Json,
    #[serde(alias = "json+pretty")]
    JsonPretty,
    Yaml,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Legacy, Format::Json, Format::JsonPretty, Format::Yaml];
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Legacy => "legacy",
            Format::Json => "json",
            Format::JsonPretty => "json-pretty",
            Format::Yaml => "yaml",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" | "fortran" => Ok(Format::Legacy),
            "json" => Ok(Format::Json),
            "json-pretty" | "json+pretty" => Ok(Format::JsonPretty),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(format!(
                "unknown format '{other}', expected one of: {}",
                Format::ALL
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// Option defaults applied to documents that leave them unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDefaults {
    #[serde(default)]
    pub reverse_order: Option<bool>,
    #[serde(default)]
    pub number_of_copies: Option<i64>,
    #[serde(default)]
    pub summary_only: Option<bool>,
}

impl OptionDefaults {
    pub fn to_options(&self) -> Options {
        let options = Options {
            reverse_order: self.reverse_order,
            number_of_copies: None,
            summary_only: self.summary_only,
        };
        match self.number_of_copies {
            Some(copies) => options.with_copies(copies),
            None => options,
        }
    }
}

/// Top-level itemal configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemalConfig {
    /// Format used when `--format` is not given.
    #[serde(default)]
    pub default_format: Format,
    /// Append to output files instead of truncating them.
    #[serde(default)]
    pub append: bool,
    /// Exit non-zero when any data warning was recorded.
    #[serde(default)]
    pub fail_on_warnings: bool,
    #[serde(default)]
    pub defaults: OptionDefaults,
}

/// Load config from an explicit path, or search the well-known locations.
///
/// Search order without a path:
/// 1. `itemal.toml` in the current directory
/// 2. `~/.config/itemal/config.toml`
///
/// `ITEMAL_FORMAT` overrides `default_format`.
pub fn load_config_from(path: Option<&Path>) -> Result<ItemalConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("itemal.toml");
            if local.exists() {
                Some(local)
            } else {
                config_dir()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ItemalConfig::default(),
    };

    if let Ok(format) = std::env::var("ITEMAL_FORMAT") {
        config.default_format = format
            .parse()
            .map_err(|e: String| anyhow::anyhow!("ITEMAL_FORMAT: {e}"))?;
    }

    Ok(config)
}

/// Parse a TOML configuration string.
pub fn parse_config(content: &str) -> Result<ItemalConfig> {
    Ok(toml::from_str(content)?)
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("itemal"))
}

/// Starter configuration written by `itemal init`.
pub const STARTER_CONFIG: &str = r#"# itemal configuration

# legacy | json | json-pretty | yaml
default_format = "legacy"

# Append to output files instead of overwriting them.
append = false

# Exit with status 1 when data warnings were recorded.
fail_on_warnings = false

# Defaults for JSON/YAML documents that omit their options.
[defaults]
reverse_order = false
number_of_copies = 1
summary_only = false
"#;
