//! Geometry crate entry point: maps annotation rectangles from processed-image
//! pixels into an aspect-fitted viewport.

pub mod config;
pub mod fit;
pub mod palette;
pub mod projection;

pub use config::{Configuration, ParseRenderModeError, RenderMode};
pub use fit::{ViewportGeometry, aspect_fit};
pub use palette::{OverlayStyle, UNKNOWN_COLOR, severity_color, status_color};
pub use projection::{
    OverlayLabel, ProjectedFrame, ProjectedOverlay, Scale, ScaleChain, label_anchor, project_frame,
};
