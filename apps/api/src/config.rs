use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every key has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Card art URL; `{lang}` is replaced with the language's CDN directory
    /// and `{id}` with the card id.
    pub card_image_url_template: String,
    pub card_text_api_base: String,
    pub overlay_font_path: PathBuf,
    pub id_changelog_path: Option<PathBuf>,
    pub fetch_concurrency: usize,
    pub fetch_min_delay_ms: u64,
    pub http_timeout_secs: u64,
    pub card_cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            card_image_url_template: "https://cdn.233.momobako.com/ygoimg/{lang}/{id}.webp"
                .to_string(),
            card_text_api_base: "https://ygocdb.com/api/v0".to_string(),
            overlay_font_path: PathBuf::from("assets/simkai.ttf"),
            id_changelog_path: None,
            fetch_concurrency: 4,
            fetch_min_delay_ms: 100,
            http_timeout_secs: 30,
            card_cache_capacity: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Config {
            port: parse_or("PORT", &lookup, defaults.port)?,
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
            card_image_url_template: lookup("CARD_IMAGE_URL_TEMPLATE")
                .unwrap_or(defaults.card_image_url_template),
            card_text_api_base: lookup("CARD_TEXT_API_BASE").unwrap_or(defaults.card_text_api_base),
            overlay_font_path: lookup("OVERLAY_FONT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.overlay_font_path),
            id_changelog_path: lookup("ID_CHANGELOG_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            fetch_concurrency: parse_or("FETCH_CONCURRENCY", &lookup, defaults.fetch_concurrency)?,
            fetch_min_delay_ms: parse_or("FETCH_MIN_DELAY_MS", &lookup, defaults.fetch_min_delay_ms)?,
            http_timeout_secs: parse_or("HTTP_TIMEOUT_SECS", &lookup, defaults.http_timeout_secs)?,
            card_cache_capacity: parse_or(
                "CARD_CACHE_CAPACITY",
                &lookup,
                defaults.card_cache_capacity,
            )?,
        })
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.fetch_concurrency, 4);
        assert_eq!(config.fetch_min_delay_ms, 100);
        assert_eq!(config.card_cache_capacity, 100);
        assert!(config.id_changelog_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("FETCH_CONCURRENCY", " 8 "),
            ("ID_CHANGELOG_PATH", "data/idChangelog.json"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.fetch_concurrency, 8);
        assert_eq!(
            config.id_changelog_path,
            Some(PathBuf::from("data/idChangelog.json"))
        );
    }

    #[test]
    fn test_malformed_number_is_error() {
        let err = Config::from_lookup(lookup(&[("FETCH_MIN_DELAY_MS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("FETCH_MIN_DELAY_MS"));
    }
}
