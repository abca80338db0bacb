//! resolver::format
//!
//! Structured content extraction strategies.
//!
//! The format is a tagged enum, not sniffed from the content: the caller
//! names what the file is supposed to be, and a parse failure under that
//! format is a distinct error from the file being missing.

use serde_json::Value;
use thiserror::Error;

/// How resolved content should be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    Yaml,
    Json,
    /// No structured parse; the content passes through as a string value.
    Text,
}

impl ContentFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ContentFormat::Yaml => "yaml",
            ContentFormat::Json => "json",
            ContentFormat::Text => "text",
        }
    }
}

impl std::fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ContentFormat {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(ContentFormat::Yaml),
            "json" => Ok(ContentFormat::Json),
            "text" | "txt" => Ok(ContentFormat::Text),
            other => Err(ExtractError::UnknownFormat(other.to_string())),
        }
    }
}

/// Structured parse failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("content is not valid {format}: {message}")]
    Parse {
        format: ContentFormat,
        message: String,
    },

    #[error("unknown content format '{0}'")]
    UnknownFormat(String),
}

/// Parse `content` according to `format`.
///
/// # Errors
///
/// Returns [`ExtractError::Parse`] when the content does not parse under
/// the named format. [`ContentFormat::Text`] never fails.
pub fn extract(format: ContentFormat, content: &str) -> Result<Value, ExtractError> {
    match format {
        ContentFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|err| ExtractError::Parse {
                format,
                message: err.to_string(),
            })
        }
        ContentFormat::Json => {
            serde_json::from_str(content).map_err(|err| ExtractError::Parse {
                format,
                message: err.to_string(),
            })
        }
        ContentFormat::Text => Ok(Value::String(content.to_string())),
    }
}
