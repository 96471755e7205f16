use frame_review_types::{OverlayStatus, Rgba, Severity};

use crate::Configuration;

pub const PASS_COLOR: Rgba = Rgba::opaque(0.20, 0.78, 0.35);
pub const WARN_COLOR: Rgba = Rgba::opaque(1.0, 0.80, 0.0);
pub const FAIL_COLOR: Rgba = Rgba::opaque(1.0, 0.23, 0.19);
pub const UNKNOWN_COLOR: Rgba = Rgba::opaque(0.56, 0.56, 0.58);
const EMPTY_MARKER_ALPHA: f32 = 0.25;

pub fn status_color(status: OverlayStatus) -> Rgba {
    match status {
        OverlayStatus::Pass => PASS_COLOR,
        OverlayStatus::Warn => WARN_COLOR,
        OverlayStatus::Fail => FAIL_COLOR,
        OverlayStatus::Unknown => UNKNOWN_COLOR,
    }
}

/// Timeline marker color; frames without overlays get a faint gray tick.
pub fn severity_color(severity: Severity) -> Rgba {
    match severity {
        Severity::None => UNKNOWN_COLOR.with_alpha(EMPTY_MARKER_ALPHA),
        Severity::Pass => PASS_COLOR,
        Severity::Warn => WARN_COLOR,
        Severity::Fail => FAIL_COLOR,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayStyle {
    pub stroke: Rgba,
    pub fill: Rgba,
    pub stroke_width: f64,
}

impl OverlayStyle {
    pub fn for_status(status: OverlayStatus, config: &Configuration) -> Self {
        let stroke = status_color(status);
        Self {
            stroke,
            fill: stroke.with_alpha(config.fill_opacity),
            stroke_width: config.stroke_width,
        }
    }
}
