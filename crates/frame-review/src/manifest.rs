use std::path::{Path, PathBuf};
use std::sync::Arc;

use frame_review_sync::{AnalyzedItem, BatchHandle, ItemId, StaticAsset};
use frame_review_types::{
    AffineTransform, FrameAnnotationSet, FrameImage, Overlay, OverlayId, OverlayStatus, Rect,
    Size,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct Manifest {
    source: PathBuf,
    #[serde(default)]
    checked: bool,
    #[serde(default)]
    asset: AssetManifest,
    #[serde(default)]
    frames: Vec<FrameManifest>,
    processing_time_ms: Option<u64>,
}

/// Playback properties of the source video. A missing field behaves like a
/// property that failed to load.
#[derive(Debug, Default, Deserialize)]
struct AssetManifest {
    duration: Option<f64>,
    natural_size: Option<[f64; 2]>,
    preferred_transform: Option<[f64; 6]>,
    nominal_frame_rate: Option<f64>,
    #[serde(default)]
    load_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
struct FrameManifest {
    size: [u32; 2],
    #[serde(default)]
    overlays: Vec<OverlayManifest>,
}

#[derive(Debug, Deserialize)]
struct OverlayManifest {
    id: OverlayId,
    rect: [f64; 4],
    status: OverlayStatus,
    #[serde(default)]
    text: String,
}

impl AssetManifest {
    fn into_asset(self) -> StaticAsset {
        StaticAsset {
            duration: self.duration,
            natural_size: self.natural_size.map(|[w, h]| Size::new(w, h)),
            preferred_transform: self
                .preferred_transform
                .map(|[a, b, c, d, tx, ty]| AffineTransform::new(a, b, c, d, tx, ty)),
            nominal_frame_rate: self.nominal_frame_rate,
            has_video_track: true,
            load_delay: std::time::Duration::from_millis(self.load_delay_ms),
        }
    }
}

impl FrameManifest {
    fn into_frame(self) -> FrameAnnotationSet {
        let [width, height] = self.size;
        let overlays = self
            .overlays
            .into_iter()
            .map(|overlay| {
                let [x, y, w, h] = overlay.rect;
                Overlay {
                    id: overlay.id,
                    rect: Rect::new(x, y, w, h),
                    status: overlay.status,
                    text: overlay.text,
                }
            })
            .collect();
        FrameAnnotationSet::new(FrameImage::blank(width, height), overlays)
    }
}

pub fn parse_manifest(path: &Path, contents: &[u8]) -> Result<AnalyzedItem, ManifestError> {
    let manifest: Manifest =
        serde_json::from_slice(contents).map_err(|source| ManifestError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    let source = if manifest.source.is_relative() {
        path.parent()
            .map(|dir| dir.join(&manifest.source))
            .unwrap_or(manifest.source)
    } else {
        manifest.source
    };
    Ok(AnalyzedItem {
        source,
        frames: manifest
            .frames
            .into_iter()
            .map(FrameManifest::into_frame)
            .collect(),
        checked: manifest.checked,
        asset: Arc::new(manifest.asset.into_asset()),
        processing_time_ms: manifest.processing_time_ms,
    })
}

pub async fn load_manifest(path: &Path) -> Result<AnalyzedItem, ManifestError> {
    let contents = tokio::fs::read(path)
        .await
        .map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_manifest(path, &contents)
}

/// Loads every manifest into a fresh batch. Manifests that fail to load are
/// logged and skipped.
pub async fn load_batch(paths: &[PathBuf]) -> BatchHandle {
    let batch = BatchHandle::new();
    for path in paths {
        match load_manifest(path).await {
            Ok(item) => {
                let frames = item.frames.len();
                let id: ItemId = batch.add(item);
                info!(item = id, frames, path = %path.display(), "imported analysis");
            }
            Err(err) => warn!(%err, "skipping manifest"),
        }
    }
    batch
}
