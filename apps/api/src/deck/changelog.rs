use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

/// Remaps retired card ids to their current ones.
///
/// Loaded once at startup from a JSON object `{ "oldId": newId }`.
#[derive(Debug, Clone, Default)]
pub struct IdChangelog {
    entries: HashMap<u32, u32>,
}

impl IdChangelog {
    pub fn from_entries(entries: impl IntoIterator<Item = (u32, u32)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Parses the changelog JSON. Keys that are not ids are skipped.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, u32> = serde_json::from_str(body)?;
        Ok(Self::from_entries(
            raw.into_iter()
                .filter_map(|(old, new)| old.trim().parse().ok().map(|old| (old, new))),
        ))
    }

    /// Loads the table from `path`. No path, an unreadable file or bad JSON all
    /// give an empty table; the latter two are logged.
    pub async fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        let body = match tokio::fs::read_to_string(path).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Card id changelog {} unreadable: {e}", path.display());
                return Self::default();
            }
        };

        match Self::from_json(&body) {
            Ok(changelog) => {
                info!(
                    "Loaded card id changelog: {} entries from {}",
                    changelog.len(),
                    path.display()
                );
                changelog
            }
            Err(e) => {
                warn!("Card id changelog {} is not valid JSON: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn normalize_id(&self, id: u32) -> u32 {
        self.entries.get(&id).copied().unwrap_or(id)
    }

    pub fn normalize(&self, ids: &[u32]) -> Vec<u32> {
        ids.iter().map(|&id| self.normalize_id(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
