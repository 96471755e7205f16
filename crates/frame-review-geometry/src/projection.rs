use frame_review_types::{FrameAnnotationSet, OverlayId, OverlayStatus, Point, Rect, Size};

use crate::config::{Configuration, RenderMode};
use crate::fit::{ViewportGeometry, aspect_fit};
use crate::palette::OverlayStyle;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    pub const IDENTITY: Scale = Scale { x: 1.0, y: 1.0 };

    fn between(from: Size, to: Size) -> Option<Scale> {
        if from.is_degenerate() || to.is_degenerate() {
            return None;
        }
        Some(Scale {
            x: to.width / from.width,
            y: to.height / from.height,
        })
    }
}

/// Processed-image pixels -> presentation pixels -> viewport points.
///
/// In processed-direct mode the first stage is the identity and the second
/// scales straight from the processed image into the fit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleChain {
    pub image_to_presentation: Scale,
    pub presentation_to_viewport: Scale,
    pub origin: Point,
}

impl ScaleChain {
    pub fn presentation(
        processed: Size,
        presentation: Size,
        viewport: &ViewportGeometry,
    ) -> Option<Self> {
        let image_to_presentation = Scale::between(processed, presentation)?;
        let presentation_to_viewport = Scale::between(presentation, viewport.fitted_size)?;
        Some(Self {
            image_to_presentation,
            presentation_to_viewport,
            origin: viewport.fitted_origin,
        })
    }

    pub fn processed_direct(processed: Size, viewport: &ViewportGeometry) -> Option<Self> {
        let presentation_to_viewport = Scale::between(processed, viewport.fitted_size)?;
        Some(Self {
            image_to_presentation: Scale::IDENTITY,
            presentation_to_viewport,
            origin: viewport.fitted_origin,
        })
    }

    pub fn to_presentation(&self, rect: Rect) -> Rect {
        let k = self.image_to_presentation;
        Rect::new(rect.x * k.x, rect.y * k.y, rect.width * k.x, rect.height * k.y)
    }

    pub fn to_viewport(&self, rect: Rect) -> Rect {
        let presented = self.to_presentation(rect);
        let s = self.presentation_to_viewport;
        Rect::new(
            self.origin.x + presented.x * s.x,
            self.origin.y + presented.y * s.y,
            presented.width * s.x,
            presented.height * s.y,
        )
    }
}

/// Anchor (center point) of a label drawn above a viewport-space box.
pub fn label_anchor(rect: Rect, offset: f64) -> Point {
    Point::new(rect.center_x(), rect.y.max(0.0) - offset)
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayLabel {
    pub text: String,
    pub anchor: Point,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedOverlay {
    pub id: OverlayId,
    pub status: OverlayStatus,
    pub rect: Rect,
    pub label: Option<OverlayLabel>,
    pub style: OverlayStyle,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectedFrame {
    pub viewport: ViewportGeometry,
    pub overlays: Vec<ProjectedOverlay>,
}

pub fn project_frame(
    frame: &FrameAnnotationSet,
    presentation_size: Size,
    container: Size,
    config: &Configuration,
) -> ProjectedFrame {
    let processed = frame.processed_size();
    let (viewport, chain) = match config.mode {
        RenderMode::Presentation => {
            let viewport = aspect_fit(presentation_size, container);
            let chain = ScaleChain::presentation(processed, presentation_size, &viewport);
            (viewport, chain)
        }
        RenderMode::ProcessedDirect => {
            let viewport = aspect_fit(processed, container);
            let chain = ScaleChain::processed_direct(processed, &viewport);
            (viewport, chain)
        }
    };

    let Some(chain) = chain else {
        return ProjectedFrame {
            viewport,
            overlays: Vec::new(),
        };
    };

    let overlays = frame
        .overlays
        .iter()
        .map(|overlay| {
            let rect = chain.to_viewport(overlay.rect);
            let label = (!overlay.text.is_empty()).then(|| OverlayLabel {
                text: overlay.text.clone(),
                anchor: label_anchor(rect, config.label_offset),
            });
            ProjectedOverlay {
                id: overlay.id,
                status: overlay.status,
                rect,
                label,
                style: OverlayStyle::for_status(overlay.status, config),
            }
        })
        .collect();

    ProjectedFrame { viewport, overlays }
}
