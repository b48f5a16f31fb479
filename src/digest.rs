use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::warn;

use crate::store::{Digest, Store, Story};

/// Resolve a digest's ordered id list against an unordered batch of fetched
/// stories.
///
/// Ids that did not resolve are dropped; duplicate ids each resolve again.
/// When the fetched batch carries duplicates, the first occurrence wins.
pub fn assemble(digest: Digest, fetched: Vec<Story>) -> Digest {
    let mut by_id: HashMap<String, Story> = HashMap::with_capacity(fetched.len());
    for story in fetched {
        by_id.entry(story.id.clone()).or_insert(story);
    }

    let stories = digest
        .story_ids
        .iter()
        .filter_map(|id| by_id.get(id).cloned())
        .collect();

    Digest {
        stories: Some(stories),
        ..digest
    }
}

/// Read side of the digest store, with the app's uniform soft-fail policy:
/// any query failure is logged and surfaced to callers as "no data".
pub struct DigestService {
    store: Arc<Store>,
}

impl DigestService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// The digest for the current UTC date, hydrated, or `None` if there is
    /// no digest yet (or the lookup failed).
    pub async fn todays_digest(&self) -> Option<Digest> {
        self.digest_for_date(Utc::now().date_naive()).await
    }

    /// The digest for an explicit date, hydrated.
    pub async fn digest_for_date(&self, date: NaiveDate) -> Option<Digest> {
        let digest = match self.store.fetch_digest_for_date(date).await {
            Ok(Some(digest)) => digest,
            Ok(None) => return None,
            Err(e) => {
                warn!("digest lookup for {} failed: {}", date, e);
                return None;
            }
        };

        let fetched = match self.store.fetch_stories_by_ids(&digest.story_ids).await {
            Ok(stories) => stories,
            Err(e) => {
                warn!("story fetch for digest {} failed: {}", digest.id, e);
                Vec::new()
            }
        };

        Some(assemble(digest, fetched))
    }

    /// The `limit` most recent digests, newest first, without hydrated
    /// stories.
    pub async fn recent_digests(&self, limit: usize) -> Vec<Digest> {
        match self.store.fetch_recent_digests(limit).await {
            Ok(digests) => digests,
            Err(e) => {
                warn!("recent digest lookup failed: {}", e);
                Vec::new()
            }
        }
    }
}
