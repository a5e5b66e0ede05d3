//! Hitokoto - short quotations from the online API or an offline bundle
//!
//! Sentences are fetched from the hitokoto.cn API, or picked at random from a
//! local bundle downloaded once from one of several mirrors.
//!
//! # Layout
//!
//! ```text
//! <bundle-dir>/
//! ├── sentences.jsonl   # one sentence record per line
//! └── index.json        # per-category counts and provenance
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hitokoto::{BundleStore, Category, Config, Criteria, QueryEngine};
//!
//! let config = Config::load(None)?;
//! let store = BundleStore::open(&config);
//! let criteria = Criteria::new().with_categories([Category::Anime]);
//! let sentence = QueryEngine::new(&store).select(&criteria, &mut rand::rng())?;
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod index;
pub mod output;
pub mod query;
pub mod store;

pub use api::{ApiEndpoint, HitokotoApi};
pub use config::Config;
pub use domain::{Category, Criteria, Sentence, SentenceId};
pub use error::{ApiError, BundleError};
pub use fetcher::{BundleFetcher, FetchReport, Mirror, MirrorClient};
pub use index::{BundleIndex, Provenance};
pub use output::{OutputFormat, format_sentence};
pub use query::QueryEngine;
pub use store::BundleStore;
