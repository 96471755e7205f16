use frame_review_geometry::severity_color;
use frame_review_types::{FrameAnnotationSet, Rgba, Severity};

/// Upper bound on timeline markers drawn for one item.
pub const MAX_MARKERS: usize = 300;

pub fn index_for_x(x: f64, frame_count: usize, width: f64) -> usize {
    if frame_count <= 1 {
        return 0;
    }
    let width = if width.is_finite() { width.max(1.0) } else { 1.0 };
    let ratio = if x.is_finite() {
        (x / width).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let last = frame_count - 1;
    ((ratio * last as f64).round() as usize).min(last)
}

pub fn x_for_index(index: usize, frame_count: usize, width: f64) -> f64 {
    if frame_count <= 1 {
        return 0.0;
    }
    ratio_for_index(index, frame_count) * width
}

/// Position of `index` along the item, in `[0, 1]`.
pub fn ratio_for_index(index: usize, frame_count: usize) -> f64 {
    if frame_count <= 1 {
        return 0.0;
    }
    let last = frame_count - 1;
    index.min(last) as f64 / last as f64
}

/// Frame indices that get a marker. Every frame when there are at most
/// `max_markers`, otherwise `max_markers` evenly strided indices.
pub fn marker_indices(frame_count: usize, max_markers: usize) -> Vec<usize> {
    if frame_count <= max_markers {
        return (0..frame_count).collect();
    }
    (0..max_markers)
        .map(|i| i * frame_count / max_markers)
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineMarker {
    pub index: usize,
    pub x: f64,
    pub severity: Severity,
    pub color: Rgba,
}

pub fn timeline_markers(
    frames: &[FrameAnnotationSet],
    max_markers: usize,
    width: f64,
) -> Vec<TimelineMarker> {
    let count = frames.len();
    marker_indices(count, max_markers)
        .into_iter()
        .map(|index| {
            let severity = frames[index].severity();
            TimelineMarker {
                index,
                x: x_for_index(index, count, width),
                severity,
                color: severity_color(severity),
            }
        })
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeline {
    pub markers: Vec<TimelineMarker>,
    pub playhead_x: f64,
}

/// Outcome of a scrub gesture: the index to select and, when the item has
/// more than one frame, where to seek as a fraction of the duration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrubTarget {
    pub frame_index: usize,
    pub seek_ratio: Option<f64>,
}

#[derive(Debug, Default)]
pub struct Scrubber {
    scrubbing: bool,
}

impl Scrubber {
    pub fn drag_to(&mut self, x: f64, width: f64, frame_count: usize) -> ScrubTarget {
        self.scrubbing = true;
        self.target(index_for_x(x, frame_count, width), frame_count)
    }

    pub fn to_frame(&mut self, index: usize, frame_count: usize) -> ScrubTarget {
        self.target(index.min(frame_count.saturating_sub(1)), frame_count)
    }

    pub fn release(&mut self) -> bool {
        std::mem::take(&mut self.scrubbing)
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    fn target(&self, frame_index: usize, frame_count: usize) -> ScrubTarget {
        ScrubTarget {
            frame_index,
            seek_ratio: (frame_count > 1).then(|| ratio_for_index(frame_index, frame_count)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_review_types::{FrameImage, Overlay, OverlayStatus, Rect};

    fn frame(statuses: &[OverlayStatus]) -> FrameAnnotationSet {
        let overlays = statuses
            .iter()
            .enumerate()
            .map(|(id, status)| Overlay {
                id: id as u64,
                rect: Rect::new(0.0, 0.0, 4.0, 4.0),
                status: *status,
                text: String::new(),
            })
            .collect();
        FrameAnnotationSet::new(FrameImage::blank(16, 9), overlays)
    }

    #[test]
    fn markers_downsample_when_dense() {
        for n in [0usize, 1, 7, 300, 301, 1000, 12_345] {
            let indices = marker_indices(n, MAX_MARKERS);
            assert_eq!(indices.len(), n.min(MAX_MARKERS));
            assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));
            assert!(indices.iter().all(|index| *index < n));
        }
        assert_eq!(&marker_indices(600, 300)[..3], &[0, 2, 4]);
    }

    #[test]
    fn pointer_maps_to_rounded_index() {
        assert_eq!(index_for_x(50.0, 11, 100.0), 5);
        assert_eq!(index_for_x(-10.0, 11, 100.0), 0);
        assert_eq!(index_for_x(140.0, 11, 100.0), 10);
        assert_eq!(index_for_x(0.4, 11, 0.0), 4);
        assert_eq!(index_for_x(30.0, 1, 100.0), 0);
        for ratio in [0.0, 0.13, 0.5, 0.77, 1.0] {
            assert_eq!(
                index_for_x(ratio * 640.0, 101, 640.0),
                (ratio * 100.0_f64).round() as usize
            );
        }
    }

    #[test]
    fn index_and_x_invert() {
        let (n, width) = (400usize, 600.0);
        for index in [0, 1, 57, 200, 399] {
            assert_eq!(index_for_x(x_for_index(index, n, width), n, width), index);
        }
        for x in [0.0, 12.3, 300.0, 599.0] {
            let back = x_for_index(index_for_x(x, n, width), n, width);
            assert!((back - x).abs() <= 1.0);
        }
        assert_eq!(x_for_index(3, 1, 600.0), 0.0);
    }

    #[test]
    fn marker_color_follows_worst_status() {
        let frames = vec![
            frame(&[]),
            frame(&[OverlayStatus::Pass]),
            frame(&[OverlayStatus::Pass, OverlayStatus::Fail, OverlayStatus::Warn]),
        ];
        let markers = timeline_markers(&frames, MAX_MARKERS, 200.0);
        let severities: Vec<_> = markers.iter().map(|marker| marker.severity).collect();
        assert_eq!(severities, vec![Severity::None, Severity::Pass, Severity::Fail]);
        assert_eq!(markers[1].x, 100.0);
        assert_eq!(markers[0].color.a, 0.25);
    }

    #[test]
    fn scrubbing_flag_tracks_gesture() {
        let mut scrubber = Scrubber::default();
        let target = scrubber.drag_to(75.0, 100.0, 5);
        assert!(scrubber.is_scrubbing());
        assert_eq!(
            target,
            ScrubTarget {
                frame_index: 3,
                seek_ratio: Some(0.75)
            }
        );
        assert!(scrubber.release());
        assert!(!scrubber.is_scrubbing());
        assert_eq!(scrubber.to_frame(9, 1).seek_ratio, None);
        assert_eq!(scrubber.to_frame(9, 4).frame_index, 3);
    }
}
