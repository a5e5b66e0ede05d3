//! Rendering sentences for the terminal

use serde::{Deserialize, Serialize};

use crate::domain::Sentence;

/// Output encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The sentence as plain text
    #[default]
    Text,
    /// The full record as pretty-printed JSON
    Json,
}

/// Render `sentence` in the requested format
///
/// `include_source` only affects text output; JSON always carries every field.
pub fn format_sentence(
    sentence: &Sentence,
    include_source: bool,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(sentence),
        OutputFormat::Text if include_source => Ok(match source_line(sentence) {
            Some(source) => format!("{} —— {}", sentence.text, source),
            None => sentence.text.clone(),
        }),
        OutputFormat::Text => Ok(sentence.text.clone()),
    }
}

/// `author「work」`, either part alone, or `None` when neither is known
pub fn source_line(sentence: &Sentence) -> Option<String> {
    let author = present(sentence.from_who.as_deref());
    let work = present(sentence.from.as_deref());
    match (author, work) {
        (Some(a), Some(w)) => Some(format!("{}「{}」", a, w)),
        (Some(a), None) => Some(a.to_string()),
        (None, Some(w)) => Some(format!("「{}」", w)),
        (None, None) => None,
    }
}

// Upstream data sometimes carries the literal string "null"
fn present(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|s| !s.is_empty() && *s != "null")
}
