//! Shared data model for the frame review workspace.

mod geometry;
mod image;
mod metadata;
mod overlay;

pub use geometry::{AffineTransform, Point, Rect, Rgba, Size};
pub use image::{FrameImage, Nv12Planes, RgbaBuffer};
pub use metadata::{DEFAULT_FRAME_RATE, VideoMetadata};
pub use overlay::{FrameAnnotationSet, FrameSummary, Overlay, OverlayId, OverlayStatus, Severity};
