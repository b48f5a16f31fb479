use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use tracing::debug;

use crate::config::StoreConfig;

/// A single curated news story, as stored in the `stories` table.
///
/// Stories are written by the upstream curation pipeline; this app never
/// mutates them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub source_domain: String,
    pub summary: String,
    pub topics: Vec<String>,
    pub trust_score: f64,
    pub relevance_score: f64,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A daily digest row from the `daily_digests` table.
///
/// `story_ids` is ordered; the position of an id is its presentation rank.
/// `stories` is never present on a raw fetched row, it is filled in by
/// [`crate::digest::assemble`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Digest {
    pub id: String,
    pub digest_date: NaiveDate,
    pub story_ids: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub stories: Option<Vec<Story>>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid store configuration: {0}")]
    Config(String),
}

/// Read-only client for the hosted store's REST interface.
pub struct Store {
    client: reqwest::Client,
    base_url: String,
}

impl Store {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.anon_key)
            .map_err(|_| StoreError::Config("anon key is not a valid header value".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.anon_key))
            .map_err(|_| StoreError::Config("anon key is not a valid header value".into()))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("DailyBrief/1.0")
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the digest whose `digest_date` equals `date`.
    ///
    /// Exactly one matching row yields `Some`; zero or conflicting matches
    /// yield `None`.
    pub async fn fetch_digest_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<Digest>, StoreError> {
        let url = format!("{}/rest/v1/daily_digests", self.base_url);
        debug!(%url, %date, "fetching digest");

        let rows: Vec<Digest> = self
            .get(&url, &[
                ("select", "*".to_string()),
                ("digest_date", format!("eq.{}", date)),
                ("limit", "2".to_string()),
            ])
            .await?;

        if rows.len() == 1 {
            Ok(rows.into_iter().next())
        } else {
            Ok(None)
        }
    }

    /// Fetch all stories whose id is in `ids`, in whatever order the store
    /// returns them. Missing ids are simply absent from the result; an empty
    /// id list skips the round trip.
    pub async fn fetch_stories_by_ids(&self, ids: &[String]) -> Result<Vec<Story>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/rest/v1/stories", self.base_url);
        debug!(%url, count = ids.len(), "fetching stories");

        let quoted: Vec<String> = ids.iter().map(|id| format!("\"{}\"", id)).collect();
        let filter = format!("in.({})", quoted.join(","));

        self.get(&url, &[("select", "*".to_string()), ("id", filter)])
            .await
    }

    /// Fetch the `limit` most recent digests, ordered by date descending.
    pub async fn fetch_recent_digests(&self, limit: usize) -> Result<Vec<Digest>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let url = format!("{}/rest/v1/daily_digests", self.base_url);
        debug!(%url, limit, "fetching recent digests");

        self.get(&url, &[
            ("select", "*".to_string()),
            ("order", "digest_date.desc".to_string()),
            ("limit", limit.to_string()),
        ])
        .await
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, StoreError> {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status));
        }

        Ok(response.json().await?)
    }
}
