//! Card Client: fetches card art and effect text from the public card database.
//!
//! Both fetch kinds are memoized in bounded FIFO caches whose entries are filled
//! by the first fetch of a key; concurrent requests for the same key wait on that
//! fetch instead of issuing their own, and all of them share one `CardImage`.
//! Failed fetches are never cached, so a transient upstream error is retried on
//! the next request.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{CardImage, CardLanguage, EffectText};

pub mod cache;

use cache::FifoCache;

#[derive(Debug, Error)]
pub enum CardFetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("card {card_id}: upstream returned status {status}")]
    Status { card_id: u32, status: u16 },

    #[error("card {card_id}: {message}")]
    Decode { card_id: u32, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Source traits consumed by the sheet orchestrator
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait CardImageSource: Send + Sync {
    async fn fetch_image(&self, card_id: u32, language: CardLanguage) -> Result<CardImage, CardFetchError>;
}

#[async_trait]
pub trait CardTextSource: Send + Sync {
    async fn fetch_card_text(&self, card_id: u32) -> Result<EffectText, CardFetchError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Upstream response shape
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CardApiResponse {
    text: Option<CardApiText>,
}

#[derive(Debug, Deserialize)]
struct CardApiText {
    types: Option<String>,
    desc: Option<String>,
}

/// Converts a card API body into `EffectText`, filling gaps with placeholders.
pub fn parse_card_text(card_id: u32, body: &str) -> Result<EffectText, CardFetchError> {
    let response: CardApiResponse = serde_json::from_str(body)?;
    let text = response.text;
    let types = text.as_ref().and_then(|t| t.types.clone()).unwrap_or_default();
    let desc = text
        .and_then(|t| t.desc)
        .unwrap_or_else(|| format!("(未找到卡牌 {card_id} 的效果文本)"));
    Ok(EffectText { types, desc })
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Cache slot set once by the first successful fetch of its key.
type SharedFetch<V> = Arc<OnceCell<V>>;

pub struct CardClient {
    client: Client,
    image_url_template: String,
    text_api_base: String,
    images: Mutex<FifoCache<(CardLanguage, u32), SharedFetch<CardImage>>>,
    texts: Mutex<FifoCache<u32, SharedFetch<EffectText>>>,
}

impl CardClient {
    pub fn new(config: &Config) -> Result<Self, CardFetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            image_url_template: config.card_image_url_template.clone(),
            text_api_base: config.card_text_api_base.trim_end_matches('/').to_string(),
            images: Mutex::new(FifoCache::new(config.card_cache_capacity)),
            texts: Mutex::new(FifoCache::new(config.card_cache_capacity)),
        })
    }

    pub fn image_url(&self, card_id: u32, language: CardLanguage) -> String {
        self.image_url_template
            .replace("{lang}", language.image_dir())
            .replace("{id}", &card_id.to_string())
    }

    pub fn text_url(&self, card_id: u32) -> String {
        format!("{}/card/{card_id}", self.text_api_base)
    }

    async fn get_ok(&self, card_id: u32, url: &str) -> Result<reqwest::Response, CardFetchError> {
        debug!("Fetching card {card_id}: {url}");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Card {card_id} fetch returned {status}");
            return Err(CardFetchError::Status {
                card_id,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn download_image(&self, card_id: u32, language: CardLanguage) -> Result<CardImage, CardFetchError> {
        let url = self.image_url(card_id, language);
        let bytes = self.get_ok(card_id, &url).await?.bytes().await?;

        // Decoding is CPU-bound
        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| CardFetchError::Decode {
                card_id,
                message: format!("decode task failed: {e}"),
            })?
            .map_err(|e| CardFetchError::Decode {
                card_id,
                message: format!("undecodable image: {e}"),
            })?;

        Ok(Arc::new(decoded))
    }

    async fn download_text(&self, card_id: u32) -> Result<EffectText, CardFetchError> {
        let url = self.text_url(card_id);
        let body = self.get_ok(card_id, &url).await?.text().await?;
        parse_card_text(card_id, &body)
    }
}

/// Returns the cached value for `key`, running `fetch` at most once across
/// concurrent callers. A failed fetch leaves no entry behind.
async fn fetch_shared<K, V, F, Fut>(
    cache: &Mutex<FifoCache<K, SharedFetch<V>>>,
    key: K,
    fetch: F,
) -> Result<V, CardFetchError>
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, CardFetchError>>,
{
    let slot = {
        let mut cache = cache.lock().await;
        match cache.get(&key) {
            Some(slot) => slot,
            None => {
                let slot = Arc::new(OnceCell::new());
                cache.insert(key.clone(), Arc::clone(&slot));
                slot
            }
        }
    };

    match slot.get_or_try_init(fetch).await {
        Ok(value) => Ok(value.clone()),
        Err(e) => {
            cache
                .lock()
                .await
                .remove_if(&key, |current| Arc::ptr_eq(current, &slot) && !current.initialized());
            Err(e)
        }
    }
}

#[async_trait]
impl CardImageSource for CardClient {
    async fn fetch_image(&self, card_id: u32, language: CardLanguage) -> Result<CardImage, CardFetchError> {
        fetch_shared(&self.images, (language, card_id), || {
            self.download_image(card_id, language)
        })
        .await
    }
}

#[async_trait]
impl CardTextSource for CardClient {
    async fn fetch_card_text(&self, card_id: u32) -> Result<EffectText, CardFetchError> {
        fetch_shared(&self.texts, card_id, || self.download_text(card_id)).await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
