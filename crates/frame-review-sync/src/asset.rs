use std::sync::Arc;
use std::time::Duration;

use frame_review_types::{AffineTransform, Size};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AssetError {
    #[error("asset has no video track")]
    NoVideoTrack,
    #[error("{property} is unavailable: {reason}")]
    Unavailable {
        property: &'static str,
        reason: String,
    },
}

pub type AssetResult<T> = Result<T, AssetError>;

/// Playback collaborator view of one video. Each property loads on its own
/// and may fail independently of the others.
pub trait VideoAsset: Send + Sync {
    fn load_duration(&self) -> BoxFuture<'_, AssetResult<f64>>;
    /// Encoded size of the first video track.
    fn load_natural_size(&self) -> BoxFuture<'_, AssetResult<Size>>;
    /// Orientation transform of the first video track.
    fn load_preferred_transform(&self) -> BoxFuture<'_, AssetResult<AffineTransform>>;
    /// Nominal frame rate of the first video track.
    fn load_nominal_frame_rate(&self) -> BoxFuture<'_, AssetResult<f64>>;
}

pub type DynVideoAsset = Arc<dyn VideoAsset>;

/// In-process asset whose properties are known up front. A `None` property
/// fails to load.
#[derive(Debug, Clone, Default)]
pub struct StaticAsset {
    pub duration: Option<f64>,
    pub natural_size: Option<Size>,
    pub preferred_transform: Option<AffineTransform>,
    pub nominal_frame_rate: Option<f64>,
    pub has_video_track: bool,
    /// Artificial latency applied to every load.
    pub load_delay: Duration,
}

impl StaticAsset {
    pub fn new(duration: f64, natural_size: Size, nominal_frame_rate: f64) -> Self {
        Self {
            duration: Some(duration),
            natural_size: Some(natural_size),
            preferred_transform: Some(AffineTransform::IDENTITY),
            nominal_frame_rate: Some(nominal_frame_rate),
            has_video_track: true,
            load_delay: Duration::ZERO,
        }
    }

    async fn load<T: Copy>(&self, property: &'static str, value: Option<T>) -> AssetResult<T> {
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        value.ok_or_else(|| AssetError::Unavailable {
            property,
            reason: "not present in asset".to_string(),
        })
    }

    async fn load_track<T: Copy>(
        &self,
        property: &'static str,
        value: Option<T>,
    ) -> AssetResult<T> {
        if !self.has_video_track {
            return Err(AssetError::NoVideoTrack);
        }
        self.load(property, value).await
    }
}

impl VideoAsset for StaticAsset {
    fn load_duration(&self) -> BoxFuture<'_, AssetResult<f64>> {
        self.load("duration", self.duration).boxed()
    }

    fn load_natural_size(&self) -> BoxFuture<'_, AssetResult<Size>> {
        self.load_track("natural size", self.natural_size).boxed()
    }

    fn load_preferred_transform(&self) -> BoxFuture<'_, AssetResult<AffineTransform>> {
        self.load_track("preferred transform", self.preferred_transform)
            .boxed()
    }

    fn load_nominal_frame_rate(&self) -> BoxFuture<'_, AssetResult<f64>> {
        self.load_track("nominal frame rate", self.nominal_frame_rate)
            .boxed()
    }
}
