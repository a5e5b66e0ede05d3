//! Domain types for hitokoto
//!
//! Sentence records, their categories and ids, and the filter criteria
//! used to look them up.

mod category;
mod criteria;
mod sentence;

pub use category::{Category, parse_categories};
pub use criteria::Criteria;
pub use sentence::{ParseSentenceIdError, Sentence, SentenceId};
