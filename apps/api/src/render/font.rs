//! Overlay font asset and its process-wide cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::layout::font_metrics::{FontError, FontMetricTable};
use crate::sheet::SheetError;

/// Raw TrueType bytes for embedding plus the metrics the wrapper measures with.
#[derive(Debug)]
pub struct FontAsset {
    pub name: String,
    pub bytes: Vec<u8>,
    pub metrics: FontMetricTable,
}

impl FontAsset {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, FontError> {
        let metrics = FontMetricTable::from_font_bytes(&bytes)?;
        Ok(Self {
            name: name.into(),
            bytes,
            metrics,
        })
    }

    pub async fn load(path: &Path) -> Result<Self, FontError> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "overlay".to_string());
        Self::from_bytes(name, bytes)
    }
}

/// Lazily loads the overlay font once and hands out shared handles.
///
/// A failed load leaves the cache empty, so the next overlay request retries.
pub struct FontCache {
    path: PathBuf,
    cell: OnceCell<Arc<FontAsset>>,
}

impl FontCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get(&self) -> Result<Arc<FontAsset>, SheetError> {
        self.cell
            .get_or_try_init(|| async {
                let asset = FontAsset::load(&self.path)
                    .await
                    .map_err(|e| SheetError::FontAsset(format!("{}: {e}", self.path.display())))?;
                info!(
                    "Loaded overlay font '{}' ({} bytes)",
                    asset.name,
                    asset.bytes.len()
                );
                Ok::<_, SheetError>(Arc::new(asset))
            })
            .await
            .cloned()
    }
}
