//! The sentence record and its identifier

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::Category;

/// A single hitokoto sentence, in the shape served by the API and the bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// Numeric id, unique within a bundle
    pub id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,

    /// The sentence itself
    #[serde(rename = "hitokoto")]
    pub text: String,

    #[serde(rename = "type")]
    pub category: Category,

    /// Work the sentence comes from
    #[serde(default)]
    pub from: Option<String>,

    /// Author of the sentence
    #[serde(default)]
    pub from_who: Option<String>,

    /// Creator/reviewer metadata and any other upstream fields, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Sentence {
    pub fn new(id: u64, text: impl Into<String>, category: Category) -> Self {
        Self {
            id,
            uuid: None,
            text: text.into(),
            category,
            from: None,
            from_who: None,
            extra: Map::new(),
        }
    }

    /// Text length in characters
    pub fn length(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether this sentence carries the given id or uuid
    pub fn has_id(&self, id: &SentenceId) -> bool {
        match id {
            SentenceId::Numeric(n) => self.id == *n,
            SentenceId::Uuid(u) => self.uuid.as_ref() == Some(u),
        }
    }

    /// Check the record invariants that serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err(format!("sentence {} has empty text", self.id));
        }
        Ok(())
    }
}

/// Exact-match key: the numeric id or the uuid of a sentence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SentenceId {
    Numeric(u64),
    Uuid(Uuid),
}

#[derive(Debug, Error)]
#[error("Invalid sentence id '{0}': expected a number or a UUID")]
pub struct ParseSentenceIdError(String);

impl std::str::FromStr for SentenceId {
    type Err = ParseSentenceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            return s
                .parse::<u64>()
                .map(Self::Numeric)
                .map_err(|_| ParseSentenceIdError(s.to_string()));
        }
        Uuid::parse_str(s)
            .map(Self::Uuid)
            .map_err(|_| ParseSentenceIdError(s.to_string()))
    }
}

impl std::fmt::Display for SentenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{}", n),
            Self::Uuid(u) => write!(f, "{}", u),
        }
    }
}
