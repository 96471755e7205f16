use std::io::Write;
use std::sync::Arc;

use frame_review_geometry::{ProjectedFrame, RenderMode};
use frame_review_sync::{
    BatchHandle, ClockTick, DynPlaybackClock, ItemReport, MockClock, PlaybackClock, ReviewItem,
    ReviewSession, ReviewSnapshot, TransportStatus, sample_interval, sample_rate_hz,
};
use indicatif::ProgressBar;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::error::AppError;
use crate::settings::EffectiveSettings;

/// How fast the mock clock is driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pacing {
    /// Wait one sampling interval between ticks.
    RealTime,
    /// Advance without waiting.
    Immediate,
}

#[derive(Clone, Debug)]
pub struct ReplayOptions {
    pub scrub: Option<f64>,
    pub show_markers: bool,
    /// Also list each overlay of the shown frame in processed coordinates.
    pub inspect: bool,
    pub pacing: Pacing,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReplaySummary {
    pub frames_shown: usize,
    pub final_time: f64,
    pub final_index: usize,
}

/// Plays `item` from start to end on a mock clock, printing the projected
/// overlays every time the selected frame changes.
pub async fn run<W: Write>(
    item: Arc<ReviewItem>,
    settings: &EffectiveSettings,
    options: &ReplayOptions,
    progress: &ProgressBar,
    out: &mut W,
) -> Result<ReplaySummary, AppError> {
    let clock = Arc::new(MockClock::new(0.0));
    let (mut session, mut ticks) = ReviewSession::new(settings.sync.clone());
    let mut updates = session.subscribe();

    let player: DynPlaybackClock = clock.clone();
    let Some(request) = session.select(Some(item.clone()), Some(player)) else {
        return Ok(ReplaySummary::default());
    };
    let resolution = tokio::spawn(request.resolve()).await?;
    session.apply_metadata(resolution);
    let snapshot = session.snapshot();
    clock.set_duration(snapshot.video_duration);

    writeln!(
        out,
        "{}: {} frames, {:.3}s, {}x{} presented, {:.2} fps",
        item.label,
        snapshot.frame_count,
        snapshot.video_duration,
        snapshot.presentation_size.width,
        snapshot.presentation_size.height,
        snapshot.detected_fps,
    )?;

    if options.show_markers {
        write_markers(&session, settings.timeline_width, out)?;
    }

    if let Some(ratio) = options.scrub {
        session.scrub_to_x(ratio * settings.timeline_width, settings.timeline_width);
        drain_ticks(&mut session, &mut ticks);
        session.end_scrub();
    }

    let mut summary = ReplaySummary::default();
    let mut last_index = None;
    print_if_changed(&session, settings, options, &mut last_index, &mut summary, out)?;
    updates.mark_unchanged();

    let duration = snapshot.video_duration;
    if duration <= 0.0 || snapshot.frame_count == 0 {
        info!(item = item.id, "nothing to play");
        summary.final_time = session.snapshot().current_time;
        return Ok(summary);
    }

    progress.set_length(snapshot.frame_count as u64);
    progress.set_position(session.snapshot().selected_frame_index as u64 + 1);
    progress.set_message(item.label.clone());

    let rate_hz = sample_rate_hz(snapshot.detected_fps, settings.sync.min_sample_rate_hz);
    let interval = clock.observer_interval().unwrap_or(sample_interval(rate_hz));
    let step = interval.as_secs_f64() * settings.playback.speed;
    debug!(rate_hz, step, "starting playback");

    session.toggle_play();
    while clock.status() == TransportStatus::Playing {
        if options.pacing == Pacing::RealTime {
            tokio::time::sleep(interval).await;
        }
        clock.advance(step);
        drain_ticks(&mut session, &mut ticks);
        if updates.has_changed().unwrap_or(false) {
            let index = updates.borrow_and_update().selected_frame_index;
            progress.set_position(index as u64 + 1);
            print_if_changed(&session, settings, options, &mut last_index, &mut summary, out)?;
        }
    }
    progress.finish_and_clear();

    let end = session.snapshot();
    summary.final_time = end.current_time;
    summary.final_index = end.selected_frame_index;
    info!(
        item = item.id,
        frames_shown = summary.frames_shown,
        "replay finished"
    );
    Ok(summary)
}

fn drain_ticks(session: &mut ReviewSession, ticks: &mut UnboundedReceiver<ClockTick>) {
    while let Ok(tick) = ticks.try_recv() {
        session.handle_tick(tick);
    }
}

fn print_if_changed<W: Write>(
    session: &ReviewSession,
    settings: &EffectiveSettings,
    options: &ReplayOptions,
    last_index: &mut Option<usize>,
    summary: &mut ReplaySummary,
    out: &mut W,
) -> std::io::Result<()> {
    let snapshot = session.snapshot();
    if *last_index == Some(snapshot.selected_frame_index) {
        return Ok(());
    }
    *last_index = Some(snapshot.selected_frame_index);
    summary.frames_shown += 1;
    summary.final_index = snapshot.selected_frame_index;
    let projected = session.project_selected(&settings.geometry, settings.viewport);
    write_frame(&snapshot, settings.geometry.mode, &projected, out)?;
    if options.inspect {
        write_inspector(session, out)?;
    }
    Ok(())
}

/// Overlays of the selected frame as analyzed, in processed-image pixels.
fn write_inspector<W: Write>(session: &ReviewSession, out: &mut W) -> std::io::Result<()> {
    let Some(frame) = session.selected_frame() else {
        return Ok(());
    };
    if frame.overlays.is_empty() {
        return writeln!(out, "    no overlays");
    }
    for overlay in &frame.overlays {
        let rect = overlay.rect;
        writeln!(
            out,
            "    {:<7} {:<24} x:{} y:{} w:{} h:{}",
            overlay.status.as_str().to_uppercase(),
            format!("\"{}\"", overlay.text),
            rect.x as i64,
            rect.y as i64,
            rect.width as i64,
            rect.height as i64,
        )?;
    }
    Ok(())
}

fn write_frame<W: Write>(
    snapshot: &ReviewSnapshot,
    mode: RenderMode,
    projected: &ProjectedFrame,
    out: &mut W,
) -> std::io::Result<()> {
    let fitted = projected.viewport.fitted_rect();
    writeln!(
        out,
        "[{:>8.3}s] frame {}/{} ({mode}) viewport {:.1},{:.1} {:.1}x{:.1}",
        snapshot.current_time,
        snapshot.selected_frame_index + 1,
        snapshot.frame_count,
        fitted.x,
        fitted.y,
        fitted.width,
        fitted.height,
    )?;
    for overlay in &projected.overlays {
        let rect = overlay.rect;
        write!(
            out,
            "    #{} {:<7} {:.1},{:.1} {:.1}x{:.1} {}",
            overlay.id,
            overlay.status.as_str(),
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            overlay.style.stroke.to_hex(),
        )?;
        if let Some(label) = &overlay.label {
            write!(
                out,
                " \"{}\" @ {:.1},{:.1}",
                label.text, label.anchor.x, label.anchor.y
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_markers<W: Write>(
    session: &ReviewSession,
    width: f64,
    out: &mut W,
) -> std::io::Result<()> {
    let timeline = session.timeline(width);
    writeln!(
        out,
        "timeline: {} markers, playhead at {:.1}",
        timeline.markers.len(),
        timeline.playhead_x
    )?;
    for marker in &timeline.markers {
        writeln!(
            out,
            "    {:>6} x={:<8.1} {:<4} {}",
            marker.index,
            marker.x,
            marker.severity.as_str(),
            marker.color.to_hex()
        )?;
    }
    Ok(())
}

/// Prints every item in the batch with its overlay totals and per-frame
/// summaries.
pub fn print_listing<W: Write>(batch: &BatchHandle, out: &mut W) -> std::io::Result<()> {
    for (position, entry) in batch.items_snapshot().iter().enumerate() {
        let report = ItemReport::for_item(&entry.item);
        let totals = report.totals;
        writeln!(
            out,
            "{}. [{}] {} ({}) frames={} pass={} warn={} fail={} other={}",
            position + 1,
            if entry.checked { "x" } else { " " },
            entry.item.label,
            entry.item.source.display(),
            report.frame_count(),
            totals.pass,
            totals.warn,
            totals.fail,
            totals.unknown,
        )?;
        if let Some(ms) = report.processing_time_ms {
            writeln!(out, "    analyzed in {ms} ms")?;
        }
        for (index, frame) in report.frames.iter().enumerate() {
            if frame.total() == 0 {
                continue;
            }
            let heading = report.frame_heading(index).unwrap_or_default();
            writeln!(
                out,
                "    {heading}: pass={} warn={} fail={} other={}",
                frame.pass, frame.warn, frame.fail, frame.unknown
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{DEFAULT_VIEWPORT, PlaybackSettings};
    use frame_review_sync::{AnalyzedItem, StaticAsset};
    use frame_review_types::{FrameAnnotationSet, FrameImage, Overlay, OverlayStatus, Rect, Size};
    use std::path::PathBuf;

    fn settings() -> EffectiveSettings {
        EffectiveSettings {
            sync: frame_review_sync::Configuration::default(),
            geometry: frame_review_geometry::Configuration::default(),
            playback: PlaybackSettings { speed: 1.0 },
            timeline_width: 800.0,
            viewport: DEFAULT_VIEWPORT,
        }
    }

    fn item(frame_count: usize, asset: StaticAsset) -> (BatchHandle, Arc<ReviewItem>) {
        let frames = (0..frame_count)
            .map(|index| {
                FrameAnnotationSet::new(
                    FrameImage::blank(320, 180),
                    vec![Overlay {
                        id: index as u64,
                        rect: Rect::new(10.0, 10.0, 50.0, 20.0),
                        status: if index % 2 == 0 {
                            OverlayStatus::Pass
                        } else {
                            OverlayStatus::Fail
                        },
                        text: "line".into(),
                    }],
                )
            })
            .collect();
        let batch = BatchHandle::new();
        let id = batch.add(AnalyzedItem {
            source: PathBuf::from("/clips/sample.mp4"),
            frames,
            checked: false,
            asset: Arc::new(asset),
            processing_time_ms: Some(42),
        });
        let item = batch.select(id).unwrap();
        (batch, item)
    }

    fn options() -> ReplayOptions {
        ReplayOptions {
            scrub: None,
            show_markers: false,
            inspect: false,
            pacing: Pacing::Immediate,
        }
    }

    #[tokio::test]
    async fn replay_visits_every_frame_once() {
        let (_batch, item) = item(5, StaticAsset::new(2.0, Size::new(1920.0, 1080.0), 30.0));
        let mut out = Vec::new();
        let summary = run(item, &settings(), &options(), &ProgressBar::hidden(), &mut out)
            .await
            .unwrap();
        assert_eq!(summary.frames_shown, 5);
        assert_eq!(summary.final_index, 4);
        assert_eq!(summary.final_time, 2.0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("frame 1/5"));
        assert!(text.contains("frame 5/5"));
        assert!(text.contains("30.0,30.0 150.0x60.0"));
        assert!(text.contains("\"line\" @ 105.0,20.0"));
    }

    #[tokio::test]
    async fn scrub_starts_mid_item() {
        let (_batch, item) = item(5, StaticAsset::new(2.0, Size::new(1920.0, 1080.0), 30.0));
        let mut out = Vec::new();
        let opts = ReplayOptions {
            scrub: Some(0.5),
            show_markers: true,
            inspect: false,
            pacing: Pacing::Immediate,
        };
        let summary = run(item, &settings(), &opts, &ProgressBar::hidden(), &mut out)
            .await
            .unwrap();
        assert_eq!(summary.frames_shown, 3);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("timeline: 5 markers"));
        assert!(text.contains("frame 3/5"));
        assert!(!text.contains("frame 1/5"));
    }

    #[tokio::test]
    async fn zero_duration_prints_first_frame_only() {
        let asset = StaticAsset {
            duration: None,
            ..StaticAsset::new(0.0, Size::new(640.0, 360.0), 25.0)
        };
        let (_batch, item) = item(3, asset);
        let mut out = Vec::new();
        let summary = run(item, &settings(), &options(), &ProgressBar::hidden(), &mut out)
            .await
            .unwrap();
        assert_eq!(summary.frames_shown, 1);
        assert_eq!(summary.final_index, 0);
    }

    #[test]
    fn listing_includes_reports() {
        let (batch, _item) = item(2, StaticAsset::new(1.0, Size::new(320.0, 180.0), 25.0));
        let mut out = Vec::new();
        print_listing(&batch, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("1. [ ] sample.mp4"));
        assert!(text.contains("pass=1 warn=0 fail=1"));
        assert!(text.contains("frame 2 of 2: pass=0 warn=0 fail=1"));
        assert!(text.contains("analyzed in 42 ms"));
    }

    #[tokio::test]
    async fn inspector_lists_overlays_in_processed_pixels() {
        let (_batch, item) = item(2, StaticAsset::new(1.0, Size::new(1920.0, 1080.0), 30.0));
        let mut out = Vec::new();
        let opts = ReplayOptions {
            inspect: true,
            ..options()
        };
        let summary = run(item, &settings(), &opts, &ProgressBar::hidden(), &mut out)
            .await
            .unwrap();
        assert_eq!(summary.frames_shown, 2);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("PASS"));
        assert!(text.contains("FAIL"));
        assert!(text.contains("\"line\""));
        assert_eq!(text.matches("x:10 y:10 w:50 h:20").count(), 2);
    }
}
