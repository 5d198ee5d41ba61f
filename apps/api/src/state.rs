use std::sync::Arc;

use crate::card_client::CardClient;
use crate::config::Config;
use crate::deck::IdChangelog;
use crate::render::FontCache;
use crate::sheet::BackgroundSampler;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Card art and effect text, with bounded per-kind caches.
    pub card_client: Arc<CardClient>,
    /// Pluggable overlay background sampler. Default: EdgeColorSampler.
    pub sampler: Arc<dyn BackgroundSampler>,
    /// Overlay font, loaded on the first overlay request and kept for the process lifetime.
    pub fonts: Arc<FontCache>,
    pub changelog: Arc<IdChangelog>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let card_client = Arc::new(CardClient::new(&config)?);
        let fonts = Arc::new(FontCache::new(config.overlay_font_path.clone()));
        let changelog = Arc::new(IdChangelog::load(config.id_changelog_path.as_deref()).await);

        Ok(Self {
            config,
            card_client,
            sampler: Arc::new(crate::sheet::EdgeColorSampler),
            fonts,
            changelog,
        })
    }
}
