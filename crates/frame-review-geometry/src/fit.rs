use frame_review_types::{Point, Rect, Size};

/// Placement of an aspect-fitted picture inside its container, recomputed on
/// every layout pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportGeometry {
    pub container_size: Size,
    pub fitted_size: Size,
    pub fitted_origin: Point,
}

impl ViewportGeometry {
    pub fn empty(container_size: Size) -> Self {
        Self {
            container_size,
            fitted_size: Size::ZERO,
            fitted_origin: Point::ZERO,
        }
    }

    /// Nothing can be drawn into a zero-sized fit.
    pub fn is_empty(&self) -> bool {
        self.fitted_size.is_degenerate()
    }

    pub fn fitted_rect(&self) -> Rect {
        Rect::new(
            self.fitted_origin.x,
            self.fitted_origin.y,
            self.fitted_size.width,
            self.fitted_size.height,
        )
    }
}

/// Largest aspect-preserving size of `source` that fits `container`, centered.
pub fn aspect_fit(source: Size, container: Size) -> ViewportGeometry {
    if source.is_degenerate() || container.is_degenerate() {
        return ViewportGeometry::empty(container);
    }

    let scale = (container.width / source.width).min(container.height / source.height);
    if !scale.is_finite() || scale <= 0.0 {
        return ViewportGeometry::empty(container);
    }

    let fitted_size = source.scaled(scale);
    let fitted_origin = Point::new(
        (container.width - fitted_size.width) / 2.0,
        (container.height - fitted_size.height) / 2.0,
    );
    ViewportGeometry {
        container_size: container,
        fitted_size,
        fitted_origin,
    }
}
