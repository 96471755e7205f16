use std::fmt::Debug;

use frame_review_types::{AffineTransform, Size, VideoMetadata};

use crate::asset::{AssetResult, DynVideoAsset, VideoAsset};
use crate::session::SessionId;

/// Loads the four asset properties concurrently and joins them. Any load that
/// fails is replaced by its typed default; resolution itself never fails.
pub async fn resolve_metadata(asset: &dyn VideoAsset) -> VideoMetadata {
    let (duration, natural_size, preferred_transform, nominal_frame_rate) = tokio::join!(
        asset.load_duration(),
        asset.load_natural_size(),
        asset.load_preferred_transform(),
        asset.load_nominal_frame_rate(),
    );

    VideoMetadata {
        duration: sanitize_non_negative(or_default("duration", duration, 0.0)),
        natural_size: sanitize_size(or_default("natural size", natural_size, Size::ZERO)),
        preferred_transform: or_default(
            "preferred transform",
            preferred_transform,
            AffineTransform::IDENTITY,
        ),
        nominal_frame_rate: sanitize_non_negative(or_default(
            "nominal frame rate",
            nominal_frame_rate,
            0.0,
        )),
    }
}

fn or_default<T: Debug>(property: &'static str, result: AssetResult<T>, default: T) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(property, %err, fallback = ?default, "metadata load failed");
            default
        }
    }
}

fn sanitize_non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn sanitize_size(size: Size) -> Size {
    Size::new(
        sanitize_non_negative(size.width),
        sanitize_non_negative(size.height),
    )
}

/// Metadata resolution owed to one session.
#[derive(Clone)]
pub struct MetadataRequest {
    pub session: SessionId,
    pub asset: DynVideoAsset,
}

impl MetadataRequest {
    pub async fn resolve(self) -> MetadataResolution {
        let metadata = resolve_metadata(self.asset.as_ref()).await;
        MetadataResolution {
            session: self.session,
            metadata,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetadataResolution {
    pub session: SessionId,
    pub metadata: VideoMetadata,
}
