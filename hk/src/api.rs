//! Client for the online hitokoto sentence API

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::domain::{Criteria, Sentence};
use crate::error::ApiError;

/// Which API deployment to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum ApiEndpoint {
    /// international.v1.hitokoto.cn
    #[serde(rename = "in")]
    #[value(name = "in")]
    International,
    /// v1.hitokoto.cn
    #[serde(rename = "cn")]
    #[value(name = "cn")]
    China,
}

impl std::fmt::Display for ApiEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::International => write!(f, "in"),
            Self::China => write!(f, "cn"),
        }
    }
}

pub struct HitokotoApi {
    international_url: String,
    china_url: String,
    http: Client,
}

impl HitokotoApi {
    pub fn from_config(config: &ApiConfig) -> Self {
        debug!(?config, "HitokotoApi::from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client, using defaults: {}", e);
                Client::new()
            });
        Self {
            international_url: config.international_url.clone(),
            china_url: config.china_url.clone(),
            http,
        }
    }

    /// URLs to try, in order: the forced endpoint only, or international then China
    pub fn endpoints(&self, forced: Option<ApiEndpoint>) -> Vec<(ApiEndpoint, &str)> {
        match forced {
            Some(ApiEndpoint::International) => vec![(ApiEndpoint::International, self.international_url.as_str())],
            Some(ApiEndpoint::China) => vec![(ApiEndpoint::China, self.china_url.as_str())],
            None => vec![
                (ApiEndpoint::International, self.international_url.as_str()),
                (ApiEndpoint::China, self.china_url.as_str()),
            ],
        }
    }

    /// Fetch one sentence matching the category and length filters
    ///
    /// The exact-id field of `criteria` is not supported by the API and is ignored.
    pub async fn fetch(&self, forced: Option<ApiEndpoint>, criteria: &Criteria) -> Result<Sentence, ApiError> {
        let params = query_params(criteria);
        debug!(?forced, ?params, "HitokotoApi::fetch: called");

        let mut last_error = ApiError::NoEndpoints;
        for (endpoint, url) in self.endpoints(forced) {
            match self.fetch_from(url, &params).await {
                Ok(sentence) => {
                    debug!(%endpoint, id = sentence.id, "HitokotoApi::fetch: success");
                    return Ok(sentence);
                }
                Err(e) => {
                    warn!(%endpoint, "API request failed: {}", e);
                    last_error = e;
                }
            }
        }

        Err(ApiError::Exhausted(Box::new(last_error)))
    }

    async fn fetch_from(&self, url: &str, params: &[(&'static str, String)]) -> Result<Sentence, ApiError> {
        let response = self.http.get(url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json::<Sentence>().await?)
    }
}

/// Query string for `criteria`: one `c` per category plus length bounds
pub fn query_params(criteria: &Criteria) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&'static str, String)> =
        criteria.categories.iter().map(|c| ("c", c.code().to_string())).collect();
    if let Some(min) = criteria.min_length {
        params.push(("min_length", min.to_string()));
    }
    if let Some(max) = criteria.max_length {
        params.push(("max_length", max.to_string()));
    }
    params
}
