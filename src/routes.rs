use std::sync::Arc;
use std::time::{Duration, Instant};

use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::digest::DigestService;
use crate::store::Story;

/// Upper bound on the archive page size, whatever the query string asks for.
const MAX_ARCHIVE_LIMIT: usize = 31;

const DISPLAY_DATE_FORMAT: &str = "%A, %B %-d, %Y";

pub struct AppState {
    pub digests: Arc<DigestService>,
    pub page_cache: PageCache,
    pub archive_limit: usize,
}

/// Whole-page cache for the front page. The rendered HTML is served as-is
/// until the TTL elapses, then recomputed on the next request. A zero TTL
/// disables caching.
pub struct PageCache {
    ttl: Duration,
    slot: RwLock<Option<CachedPage>>,
}

struct CachedPage {
    rendered_at: Instant,
    html: String,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Option<String> {
        if self.ttl.is_zero() {
            return None;
        }
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|page| page.rendered_at.elapsed() < self.ttl)
            .map(|page| page.html.clone())
    }

    pub async fn put(&self, html: String) {
        if self.ttl.is_zero() {
            return;
        }
        let mut slot = self.slot.write().await;
        *slot = Some(CachedPage {
            rendered_at: Instant::now(),
            html,
        });
    }
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub digest: Option<DigestPage>,
}

pub struct DigestPage {
    pub date: String,
    pub stories: Vec<Story>,
}

#[derive(Template)]
#[template(path = "archive.html")]
pub struct ArchiveTemplate {
    pub entries: Vec<ArchiveEntry>,
}

pub struct ArchiveEntry {
    pub date: String,
    pub story_count: usize,
    pub status: String,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

// Route handlers
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    if let Some(html) = state.page_cache.get().await {
        return Html(html).into_response();
    }

    // A digest with nothing hydrated renders the same empty state as no
    // digest at all
    let digest = state.digests.todays_digest().await.and_then(|digest| {
        let stories = digest.stories.unwrap_or_default();
        if stories.is_empty() {
            None
        } else {
            Some(DigestPage {
                date: digest.digest_date.format(DISPLAY_DATE_FORMAT).to_string(),
                stories,
            })
        }
    });

    match (IndexTemplate { digest }).render() {
        Ok(html) => {
            state.page_cache.put(html.clone()).await;
            Html(html).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render template: {}", err),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
pub struct ArchiveQuery {
    pub limit: Option<usize>,
}

pub async fn archive(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ArchiveQuery>,
) -> impl IntoResponse {
    let limit = query
        .limit
        .unwrap_or(state.archive_limit)
        .min(MAX_ARCHIVE_LIMIT);

    let entries = state
        .digests
        .recent_digests(limit)
        .await
        .into_iter()
        .map(|digest| ArchiveEntry {
            date: digest.digest_date.format(DISPLAY_DATE_FORMAT).to_string(),
            story_count: digest.story_ids.len(),
            status: digest.status,
        })
        .collect();

    HtmlTemplate(ArchiveTemplate { entries })
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
