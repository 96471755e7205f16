use crate::{AffineTransform, Rect, Size};

/// Frame rate assumed when the asset reports none.
pub const DEFAULT_FRAME_RATE: f64 = 25.0;

/// Raw playback properties of one selected video.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VideoMetadata {
    pub duration: f64,
    pub natural_size: Size,
    pub preferred_transform: AffineTransform,
    pub nominal_frame_rate: f64,
}

impl VideoMetadata {
    /// Displayed size after applying the orientation transform. Falls back to
    /// the natural size when the transformed box has no area.
    pub fn presentation_size(&self) -> Size {
        let rect = self
            .preferred_transform
            .bounding_box(Rect::from_size(self.natural_size));
        let presented = Size::new(rect.width.abs(), rect.height.abs());
        if presented.width == 0.0
            || presented.height == 0.0
            || !presented.width.is_finite()
            || !presented.height.is_finite()
        {
            self.natural_size
        } else {
            presented
        }
    }

    pub fn frame_rate_or(&self, fallback: f64) -> f64 {
        if self.nominal_frame_rate.is_finite() && self.nominal_frame_rate > 0.0 {
            self.nominal_frame_rate
        } else {
            fallback
        }
    }

    pub fn detected_fps(&self) -> f64 {
        self.frame_rate_or(DEFAULT_FRAME_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn portrait_transform_swaps_presentation_size() {
        let metadata = VideoMetadata {
            duration: 12.0,
            natural_size: Size::new(1920.0, 1080.0),
            preferred_transform: AffineTransform::new(0.0, 1.0, -1.0, 0.0, 1080.0, 0.0),
            nominal_frame_rate: 30.0,
        };
        assert_eq!(metadata.presentation_size(), Size::new(1080.0, 1920.0));

        let rotated = VideoMetadata {
            preferred_transform: AffineTransform::rotation(FRAC_PI_2),
            ..metadata
        };
        let size = rotated.presentation_size();
        assert!((size.width - 1080.0).abs() < 1e-9);
        assert!((size.height - 1920.0).abs() < 1e-9);
    }

    #[test]
    fn collapsed_transform_falls_back_to_natural_size() {
        let metadata = VideoMetadata {
            natural_size: Size::new(640.0, 480.0),
            preferred_transform: AffineTransform::scale(0.0, 0.0),
            ..VideoMetadata::default()
        };
        assert_eq!(metadata.presentation_size(), Size::new(640.0, 480.0));
    }

    #[test]
    fn missing_frame_rate_uses_default() {
        assert_eq!(VideoMetadata::default().detected_fps(), DEFAULT_FRAME_RATE);
        let metadata = VideoMetadata {
            nominal_frame_rate: 29.97,
            ..VideoMetadata::default()
        };
        assert_eq!(metadata.detected_fps(), 29.97);
    }
}
