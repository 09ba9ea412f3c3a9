//! HTTP implementations of the profile and catalog sources.
//!
//! Both retry on 429 and 5xx with exponential backoff. The overall deadline is enforced by the
//! pipeline with `tokio::time::timeout`; the client timeout is a per-attempt cap.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::sources::{CatalogQuery, CatalogSource, ProfileSource, SourceError};

const MAX_RETRIES: u32 = 3;
const BACKOFF_BASE_MS: u64 = 250;

fn build_client(timeout: Duration) -> Result<Client, SourceError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// GET `url` with `query`, retrying transient failures. Returns the body text.
async fn get_with_retry(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<String, SourceError> {
    let mut last_error: Option<SourceError> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            // Exponential backoff: 250ms, 500ms
            let delay = Duration::from_millis(BACKOFF_BASE_MS * (1 << (attempt - 1)));
            warn!(
                "GET {url} attempt {attempt} failed, retrying after {}ms...",
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = match client.get(url).query(query).send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(SourceError::Http(e));
                continue;
            }
        };

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("GET {url} returned {status}: {body}");
            last_error = Some(SourceError::Status {
                status: status.as_u16(),
                message: body,
            });
            continue;
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        return Ok(response.text().await?);
    }

    Err(last_error.unwrap_or(SourceError::Status {
        status: 503,
        message: format!("no response after {MAX_RETRIES} attempts"),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Profile source
// ────────────────────────────────────────────────────────────────────────────

/// Fetches `GET {url}?session_id=...`. The body may be JSON or plain generated text.
#[derive(Clone)]
pub struct HttpProfileSource {
    client: Client,
    url: String,
}

impl HttpProfileSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ProfileSource for HttpProfileSource {
    async fn fetch_profile(&self, session_id: Uuid) -> Result<Value, SourceError> {
        let body = get_with_retry(
            &self.client,
            &self.url,
            &[("session_id", session_id.to_string())],
        )
        .await?;
        Ok(profile_body_to_value(body))
    }
}

/// Non-JSON bodies are kept as text so the parser's free-text strategies can handle them.
fn profile_body_to_value(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

// ────────────────────────────────────────────────────────────────────────────
// Catalog source
// ────────────────────────────────────────────────────────────────────────────

/// Fetches `GET {url}?q=...&page=...&page_size=...`.
pub struct HttpCatalogSource<R> {
    client: Client,
    url: String,
    _record: PhantomData<fn() -> R>,
}

impl<R> HttpCatalogSource<R> {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
            _record: PhantomData,
        })
    }
}

#[async_trait]
impl<R> CatalogSource<R> for HttpCatalogSource<R>
where
    R: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(&self, query: &CatalogQuery) -> Result<Vec<R>, SourceError> {
        let body = get_with_retry(
            &self.client,
            &self.url,
            &[
                ("q", query.query.clone()),
                ("page", query.page.to_string()),
                ("page_size", query.page_size.to_string()),
            ],
        )
        .await?;
        let records = decode_page(serde_json::from_str(&body)?)?;
        debug!(
            "Fetched {} record(s) from {} (page {})",
            records.len(),
            self.url,
            query.page
        );
        Ok(records)
    }
}

/// Accepts a bare array or `{"results": [...]}`. Entries that fail to decode are skipped so one
/// malformed record never aborts the page.
pub fn decode_page<R: DeserializeOwned>(body: Value) -> Result<Vec<R>, SourceError> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(SourceError::Shape("object without a results array".into())),
        },
        other => return Err(SourceError::Shape(format!("expected a list, got {other}"))),
    };

    let total = entries.len();
    let records: Vec<R> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed catalog record at index {i}: {e}");
                None
            }
        })
        .collect();

    if records.len() < total {
        debug!("Decoded {} of {} catalog record(s)", records.len(), total);
    }
    Ok(records)
}
