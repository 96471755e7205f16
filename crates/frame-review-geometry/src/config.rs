use std::fmt;
use std::str::FromStr;

use frame_review_types::{FrameAnnotationSet, Size};
use thiserror::Error;

use crate::projection::{ProjectedFrame, project_frame};

pub const DEFAULT_LABEL_OFFSET: f64 = 10.0;
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;
pub const DEFAULT_FILL_OPACITY: f32 = 0.12;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum RenderMode {
    /// Draw on top of the played-back video: processed image -> presentation -> viewport.
    #[default]
    Presentation,
    /// Draw on top of the processed frame itself: processed image -> viewport.
    ProcessedDirect,
}

impl RenderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderMode::Presentation => "presentation",
            RenderMode::ProcessedDirect => "processed",
        }
    }

    pub fn available() -> [RenderMode; 2] {
        [RenderMode::Presentation, RenderMode::ProcessedDirect]
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown render mode '{0}' (expected presentation or processed)")]
pub struct ParseRenderModeError(pub String);

impl FromStr for RenderMode {
    type Err = ParseRenderModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "presentation" => Ok(RenderMode::Presentation),
            "processed" | "processed-direct" => Ok(RenderMode::ProcessedDirect),
            _ => Err(ParseRenderModeError(lower)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    pub mode: RenderMode,
    pub label_offset: f64,
    pub stroke_width: f64,
    pub fill_opacity: f32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            mode: RenderMode::default(),
            label_offset: DEFAULT_LABEL_OFFSET,
            stroke_width: DEFAULT_STROKE_WIDTH,
            fill_opacity: DEFAULT_FILL_OPACITY,
        }
    }
}

impl Configuration {
    pub fn with_mode(mode: RenderMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn project(
        &self,
        frame: &FrameAnnotationSet,
        presentation_size: Size,
        container: Size,
    ) -> ProjectedFrame {
        project_frame(frame, presentation_size, container, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_mode_round_trips_through_strings() {
        for mode in RenderMode::available() {
            assert_eq!(mode.as_str().parse::<RenderMode>().unwrap(), mode);
        }
        assert_eq!(
            " Processed-Direct ".parse::<RenderMode>().unwrap(),
            RenderMode::ProcessedDirect
        );
    }

    #[test]
    fn unknown_render_mode_is_rejected() {
        let err = "stretched".parse::<RenderMode>().unwrap_err();
        assert_eq!(err.0, "stretched");
    }
}
