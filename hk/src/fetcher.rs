//! Bundle fetcher: download the sentence bundle from a mirror into the store
//!
//! The bundle is published as one JSON array per category at
//! `<mirror>/sentences/<code>.json`. Every category is downloaded into
//! memory first; the store is only touched once at least one category came
//! through, and then it is replaced wholesale.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::DownloadConfig;
use crate::domain::{Category, Sentence};
use crate::error::BundleError;
use crate::index::{BundleIndex, Provenance};
use crate::store::BundleStore;

/// Bundle download source
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Mirror {
    /// sentences-bundle.hitokoto.cn
    #[default]
    #[serde(rename = "of")]
    #[value(name = "of")]
    Official,
    /// raw.githubusercontent.com
    #[serde(rename = "gh")]
    #[value(name = "gh")]
    Github,
    /// cdn.jsdelivr.net
    #[serde(rename = "jsd")]
    #[value(name = "jsd")]
    Jsdelivr,
}

impl Mirror {
    pub fn code(self) -> &'static str {
        match self {
            Self::Official => "of",
            Self::Github => "gh",
            Self::Jsdelivr => "jsd",
        }
    }

    /// Base URL, always ending in `/`
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Official => "https://sentences-bundle.hitokoto.cn/",
            Self::Github => "https://raw.githubusercontent.com/hitokoto-osc/sentences-bundle/master/",
            Self::Jsdelivr => "https://cdn.jsdelivr.net/gh/hitokoto-osc/sentences-bundle@latest/",
        }
    }

    pub fn category_url(self, category: Category) -> String {
        format!("{}sentences/{}.json", self.base_url(), category.code())
    }

    /// This mirror first, then the others in gh, jsd, of order
    pub fn fallback_order(self) -> Vec<Mirror> {
        let mut order = vec![self];
        order.extend(
            [Self::Github, Self::Jsdelivr, Self::Official]
                .into_iter()
                .filter(|m| *m != self),
        );
        order
    }
}

impl std::fmt::Display for Mirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Transport used to download bundle files
#[async_trait]
pub trait MirrorClient: Send + Sync {
    /// GET `url`; `Ok(None)` means the file does not exist there (HTTP 404)
    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>, BundleError>;
}

/// reqwest-backed [`MirrorClient`]
pub struct HttpMirrorClient {
    http: Client,
}

impl HttpMirrorClient {
    pub fn from_config(config: &DownloadConfig) -> Self {
        debug!(?config, "HttpMirrorClient::from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.as_str())
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client, using defaults: {}", e);
                Client::new()
            });
        Self { http }
    }
}

#[async_trait]
impl MirrorClient for HttpMirrorClient {
    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>, BundleError> {
        debug!(%url, "HttpMirrorClient::get: called");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BundleError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(%url, "HttpMirrorClient::get: not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(BundleError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let body = response.bytes().await.map_err(|e| BundleError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(body.to_vec()))
    }
}

/// One category that was downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFetch {
    pub category: Category,
    /// Mirror that actually served the file
    pub mirror: Mirror,
    pub count: usize,
}

/// Summary of a completed fetch
#[derive(Debug, Clone)]
pub struct FetchReport {
    /// Mirror that was requested
    pub mirror: Mirror,
    pub fetched: Vec<CategoryFetch>,
    pub failed: Vec<Category>,
    /// Index written after the save
    pub index: BundleIndex,
}

impl FetchReport {
    /// Every category was downloaded
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// How many category files each mirror served
    pub fn mirror_usage(&self) -> BTreeMap<Mirror, usize> {
        let mut usage = BTreeMap::new();
        for fetch in &self.fetched {
            *usage.entry(fetch.mirror).or_insert(0) += 1;
        }
        usage
    }
}

/// Downloads the bundle and merges it into a [`BundleStore`]
pub struct BundleFetcher<C: MirrorClient> {
    store: BundleStore,
    client: C,
}

impl BundleFetcher<HttpMirrorClient> {
    /// Fetcher over HTTP using the download settings from config
    pub fn from_config(store: BundleStore, config: &DownloadConfig) -> Self {
        Self::new(store, HttpMirrorClient::from_config(config))
    }
}

impl<C: MirrorClient> BundleFetcher<C> {
    pub fn new(store: BundleStore, client: C) -> Self {
        Self { store, client }
    }

    pub fn store(&self) -> &BundleStore {
        &self.store
    }

    /// Download every category, replace the store and rebuild the index
    ///
    /// When no category can be downloaded the last error is returned and the
    /// existing store is left as it was.
    pub async fn fetch(&self, mirror: Mirror) -> Result<FetchReport, BundleError> {
        info!(%mirror, "Fetching bundle");
        let order = mirror.fallback_order();

        let mut records = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut fetched = Vec::new();
        let mut failed = Vec::new();
        let mut last_error = None;

        for category in Category::ALL {
            match self.fetch_category(category, &order).await {
                Ok((used, sentences)) => {
                    let before = records.len();
                    for sentence in sentences {
                        if seen_ids.insert(sentence.id) {
                            records.push(sentence);
                        } else {
                            warn!(id = sentence.id, %category, "Dropping duplicate sentence id");
                        }
                    }
                    let count = records.len() - before;
                    info!(%category, mirror = %used, count, "Downloaded category");
                    fetched.push(CategoryFetch {
                        category,
                        mirror: used,
                        count,
                    });
                }
                Err(e) => {
                    warn!(%category, "Could not download category: {}", e);
                    failed.push(category);
                    last_error = Some(e);
                }
            }
        }

        if fetched.is_empty() {
            return Err(last_error.unwrap_or_else(|| BundleError::DownloadFailed {
                url: mirror.base_url().to_string(),
                reason: "no category could be downloaded".to_string(),
            }));
        }

        self.store.save(&records)?;
        let provenance = Provenance {
            mirror: Some(mirror),
            source_url: Some(mirror.base_url().trim_end_matches('/').to_string()),
            downloaded_at: Some(Utc::now()),
            failed_categories: failed.clone(),
        };
        let index = self.store.rebuild_index(provenance)?;

        Ok(FetchReport {
            mirror,
            fetched,
            failed,
            index,
        })
    }

    /// Try each mirror in `order` until one serves a well-formed file
    async fn fetch_category(
        &self,
        category: Category,
        order: &[Mirror],
    ) -> Result<(Mirror, Vec<Sentence>), BundleError> {
        debug!(%category, ?order, "BundleFetcher::fetch_category: called");
        let mut last_error = None;

        for &mirror in order {
            let url = mirror.category_url(category);
            match self.client.get(&url).await {
                Ok(Some(body)) => match parse_category_file(&url, &body) {
                    Ok(sentences) => return Ok((mirror, sentences)),
                    Err(e) => {
                        debug!(%url, "BundleFetcher::fetch_category: malformed file");
                        last_error = Some(e);
                    }
                },
                Ok(None) => {
                    debug!(%url, "BundleFetcher::fetch_category: not on this mirror");
                    // a 404 never hides an earlier, more specific failure
                    if last_error.is_none() {
                        last_error = Some(BundleError::DownloadFailed {
                            url,
                            reason: "HTTP 404 Not Found".to_string(),
                        });
                    }
                }
                Err(e) => {
                    debug!(%url, "BundleFetcher::fetch_category: download failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| BundleError::DownloadFailed {
            url: category.code().to_string(),
            reason: "no mirrors to try".to_string(),
        }))
    }
}

/// Parse one category file: a JSON array of sentence records
///
/// Entries that do not form a valid sentence are dropped; a body that is not
/// an array, or an array where nothing is usable, is `ExtractFailed`.
pub fn parse_category_file(url: &str, body: &[u8]) -> Result<Vec<Sentence>, BundleError> {
    let entries: Vec<serde_json::Value> = serde_json::from_slice(body).map_err(|e| BundleError::ExtractFailed {
        url: url.to_string(),
        reason: format!("expected a JSON array of sentences: {}", e),
    })?;

    let total = entries.len();
    let mut sentences = Vec::with_capacity(total);
    for entry in entries {
        match serde_json::from_value::<Sentence>(entry) {
            Ok(s) if s.validate().is_ok() => sentences.push(s),
            Ok(s) => warn!(%url, id = s.id, "Dropping sentence with empty text"),
            Err(e) => warn!(%url, "Dropping malformed sentence: {}", e),
        }
    }

    if total > 0 && sentences.is_empty() {
        return Err(BundleError::ExtractFailed {
            url: url.to_string(),
            reason: format!("none of {} entries is a valid sentence", total),
        });
    }
    Ok(sentences)
}
