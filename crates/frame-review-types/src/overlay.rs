use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{FrameImage, Rect, Size};

pub type OverlayId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayStatus {
    Pass,
    Warn,
    Fail,
    /// Any status label the analysis pipeline emits that this tool does not know.
    #[serde(other)]
    Unknown,
}

impl OverlayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OverlayStatus::Pass => "pass",
            OverlayStatus::Warn => "warn",
            OverlayStatus::Fail => "fail",
            OverlayStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OverlayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One annotated region, in processed-image pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub id: OverlayId,
    pub rect: Rect,
    pub status: OverlayStatus,
    #[serde(default)]
    pub text: String,
}

/// Worst-case status of a frame-set, ordered `None < Pass < Warn < Fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    #[default]
    None,
    Pass,
    Warn,
    Fail,
}

impl Severity {
    pub fn of_status(status: OverlayStatus) -> Severity {
        match status {
            OverlayStatus::Pass => Severity::Pass,
            OverlayStatus::Warn => Severity::Warn,
            OverlayStatus::Fail => Severity::Fail,
            OverlayStatus::Unknown => Severity::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Pass => "pass",
            Severity::Warn => "warn",
            Severity::Fail => "fail",
        }
    }
}

/// Per-status overlay counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSummary {
    pub pass: usize,
    pub warn: usize,
    pub fail: usize,
    pub unknown: usize,
}

impl FrameSummary {
    pub fn record(&mut self, status: OverlayStatus) {
        match status {
            OverlayStatus::Pass => self.pass += 1,
            OverlayStatus::Warn => self.warn += 1,
            OverlayStatus::Fail => self.fail += 1,
            OverlayStatus::Unknown => self.unknown += 1,
        }
    }

    pub fn merge(self, other: FrameSummary) -> FrameSummary {
        FrameSummary {
            pass: self.pass + other.pass,
            warn: self.warn + other.warn,
            fail: self.fail + other.fail,
            unknown: self.unknown + other.unknown,
        }
    }

    pub fn total(&self) -> usize {
        self.pass + self.warn + self.fail + self.unknown
    }
}

/// Overlays produced for one analyzed frame together with the processed image
/// they were computed on.
#[derive(Debug, Clone)]
pub struct FrameAnnotationSet {
    pub image: FrameImage,
    pub overlays: Vec<Overlay>,
}

impl FrameAnnotationSet {
    pub fn new(image: FrameImage, overlays: Vec<Overlay>) -> Self {
        Self { image, overlays }
    }

    pub fn processed_size(&self) -> Size {
        self.image.pixel_size()
    }

    pub fn severity(&self) -> Severity {
        self.overlays
            .iter()
            .map(|overlay| Severity::of_status(overlay.status))
            .max()
            .unwrap_or(Severity::None)
    }

    pub fn summary(&self) -> FrameSummary {
        let mut summary = FrameSummary::default();
        for overlay in &self.overlays {
            summary.record(overlay.status);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(id: OverlayId, status: OverlayStatus) -> Overlay {
        Overlay {
            id,
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            status,
            text: String::new(),
        }
    }

    fn frame(statuses: &[OverlayStatus]) -> FrameAnnotationSet {
        let overlays = statuses
            .iter()
            .enumerate()
            .map(|(idx, status)| overlay(idx as OverlayId, *status))
            .collect();
        FrameAnnotationSet::new(FrameImage::blank(16, 9), overlays)
    }

    #[test]
    fn single_fail_dominates() {
        let set = frame(&[
            OverlayStatus::Pass,
            OverlayStatus::Warn,
            OverlayStatus::Fail,
            OverlayStatus::Pass,
        ]);
        assert_eq!(set.severity(), Severity::Fail);
    }

    #[test]
    fn warn_beats_pass() {
        assert_eq!(
            frame(&[OverlayStatus::Pass, OverlayStatus::Warn]).severity(),
            Severity::Warn
        );
    }

    #[test]
    fn empty_and_unknown_frames_have_no_severity() {
        assert_eq!(frame(&[]).severity(), Severity::None);
        assert_eq!(frame(&[OverlayStatus::Unknown]).severity(), Severity::None);
    }

    #[test]
    fn summary_counts_each_status() {
        let summary = frame(&[
            OverlayStatus::Pass,
            OverlayStatus::Pass,
            OverlayStatus::Fail,
            OverlayStatus::Unknown,
        ])
        .summary();
        assert_eq!(
            summary,
            FrameSummary {
                pass: 2,
                warn: 0,
                fail: 1,
                unknown: 1
            }
        );
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn unrecognized_status_deserializes_as_unknown() {
        let status: OverlayStatus = serde_json::from_str("\"skipped\"").unwrap();
        assert_eq!(status, OverlayStatus::Unknown);
        let status: OverlayStatus = serde_json::from_str("\"fail\"").unwrap();
        assert_eq!(status, OverlayStatus::Fail);
    }
}
