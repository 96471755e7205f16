use std::sync::Arc;

use frame_review_geometry::ProjectedFrame;
use frame_review_types::{FrameAnnotationSet, Size};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

use crate::batch::{ItemId, ReviewItem};
use crate::clock::{ClockTick, DynPlaybackClock, TransportStatus};
use crate::config::Configuration;
use crate::metadata::{MetadataRequest, MetadataResolution};
use crate::scrub::{ScrubTarget, Scrubber, Timeline, timeline_markers, x_for_index};
use crate::time_sync::{TimeSync, frame_index_for_time};

/// Identifies one selection. Metadata resolved for an older session is stale.
pub type SessionId = u64;

const MIN_STEP_SECONDS: f64 = 0.001;

/// Observable state of the review session.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReviewSnapshot {
    pub session: SessionId,
    pub item: Option<ItemId>,
    pub frame_count: usize,
    pub current_time: f64,
    pub video_duration: f64,
    pub presentation_size: Size,
    pub detected_fps: f64,
    pub selected_frame_index: usize,
    pub metadata_ready: bool,
    pub scrubbing: bool,
}

struct ActiveSession {
    id: SessionId,
    item: Option<Arc<ReviewItem>>,
    clock: Option<DynPlaybackClock>,
}

/// Single owner of playback-to-annotation synchronization for the selected
/// item. All mutation happens through `&mut self` on the control task; the
/// resulting state is published on a watch channel.
pub struct ReviewSession {
    config: Configuration,
    active: Option<ActiveSession>,
    next_session: SessionId,
    time_sync: TimeSync,
    scrubber: Scrubber,
    ticks: UnboundedSender<ClockTick>,
    state_tx: watch::Sender<ReviewSnapshot>,
}

impl ReviewSession {
    /// Creates a session and the receiver that clock ticks arrive on. The
    /// caller drains the receiver into [`ReviewSession::handle_tick`].
    pub fn new(config: Configuration) -> (Self, UnboundedReceiver<ClockTick>) {
        let (ticks, tick_rx) = unbounded_channel();
        let (state_tx, _) = watch::channel(ReviewSnapshot {
            detected_fps: config.fallback_fps,
            ..ReviewSnapshot::default()
        });
        let session = Self {
            time_sync: TimeSync::new(config.min_sample_rate_hz),
            config,
            active: None,
            next_session: 0,
            scrubber: Scrubber::default(),
            ticks,
            state_tx,
        };
        (session, tick_rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<ReviewSnapshot> {
        self.state_tx.subscribe()
    }

    pub fn updates(&self) -> WatchStream<ReviewSnapshot> {
        WatchStream::new(self.state_tx.subscribe())
    }

    pub fn snapshot(&self) -> ReviewSnapshot {
        *self.state_tx.borrow()
    }

    /// Switches to `item` played by `clock`. The previous subscription is torn
    /// down before anything else. Returns the metadata load to run when both
    /// an item and a clock are present.
    pub fn select(
        &mut self,
        item: Option<Arc<ReviewItem>>,
        clock: Option<DynPlaybackClock>,
    ) -> Option<MetadataRequest> {
        self.time_sync.teardown();
        self.scrubber.release();
        self.next_session = self.next_session.saturating_add(1);
        let id = self.next_session;

        let item_id = item.as_ref().map(|item| item.id);
        let frame_count = item.as_ref().map_or(0, |item| item.frame_count());
        let fallback_fps = self.config.fallback_fps;
        self.update(|state| {
            *state = ReviewSnapshot {
                session: id,
                item: item_id,
                frame_count,
                detected_fps: fallback_fps,
                ..ReviewSnapshot::default()
            };
        });

        let request = match (&item, &clock) {
            (Some(item), Some(_)) => Some(MetadataRequest {
                session: id,
                asset: item.asset.clone(),
            }),
            _ => None,
        };
        if let Some(item) = &item {
            info!(session = id, item = item.id, frames = frame_count, label = %item.label, "selected item");
        } else {
            info!(session = id, "cleared selection");
        }
        self.active = Some(ActiveSession {
            id,
            item,
            clock,
        });
        request
    }

    pub fn close(&mut self) {
        self.select(None, None);
    }

    /// Publishes resolved metadata and installs the periodic observer.
    /// Resolutions for a superseded session are dropped.
    pub fn apply_metadata(&mut self, resolution: MetadataResolution) -> bool {
        let fallback_fps = self.config.fallback_fps;
        let Some(active) = self
            .active
            .as_ref()
            .filter(|active| active.id == resolution.session)
        else {
            debug!(session = resolution.session, "dropping stale metadata");
            return false;
        };

        let metadata = resolution.metadata;
        let fps = metadata.frame_rate_or(fallback_fps);
        let clock = active.clock.clone();

        self.update(|state| {
            state.video_duration = metadata.duration;
            state.presentation_size = metadata.presentation_size();
            state.detected_fps = fps;
            state.metadata_ready = true;
        });
        if let Some(clock) = clock {
            self.time_sync.install(clock, fps, self.ticks.clone());
        }
        true
    }

    /// Applies a clock tick. Returns whether the published state changed.
    pub fn handle_tick(&mut self, tick: ClockTick) -> bool {
        if !self.time_sync.accepts(&tick) {
            return false;
        }
        self.update(|state| {
            state.current_time = tick.time;
            if let Some(index) =
                frame_index_for_time(tick.time, state.video_duration, state.frame_count)
            {
                state.selected_frame_index = index;
            }
        })
    }

    pub fn toggle_play(&mut self) -> Option<TransportStatus> {
        let clock = self.clock()?;
        match clock.status() {
            TransportStatus::Playing => clock.pause(),
            TransportStatus::Paused => clock.play(),
        }
        Some(clock.status())
    }

    pub fn stop(&mut self) {
        let Some(clock) = self.clock() else {
            return;
        };
        clock.pause();
        clock.seek(0.0);
        self.update(|state| state.current_time = 0.0);
    }

    /// Seeks by `frames` frame durations from the current time.
    pub fn step(&mut self, frames: f64) {
        let Some(clock) = self.clock() else {
            return;
        };
        let snapshot = self.snapshot();
        let frame_duration = (1.0 / snapshot.detected_fps.max(1.0)).max(MIN_STEP_SECONDS);
        let target = snapshot.current_time + frames * frame_duration;
        clock.seek(target.clamp(0.0, snapshot.video_duration.max(0.0)));
    }

    pub fn seek_to_ratio(&mut self, ratio: f64) {
        let Some(clock) = self.clock() else {
            return;
        };
        let duration = self.snapshot().video_duration;
        if duration <= 0.0 || !ratio.is_finite() {
            return;
        }
        clock.seek(ratio.clamp(0.0, 1.0) * duration);
    }

    /// Pointer drag on a timeline of `width` pixels.
    pub fn scrub_to_x(&mut self, x: f64, width: f64) -> Option<usize> {
        let frame_count = self.current_item()?.frame_count();
        let target = self.scrubber.drag_to(x, width, frame_count);
        Some(self.apply_scrub(target))
    }

    pub fn scrub_to_frame(&mut self, index: usize) -> Option<usize> {
        let frame_count = self.current_item()?.frame_count();
        let target = self.scrubber.to_frame(index, frame_count);
        Some(self.apply_scrub(target))
    }

    pub fn end_scrub(&mut self) {
        if self.scrubber.release() {
            self.update(|state| state.scrubbing = false);
        }
    }

    fn apply_scrub(&mut self, target: ScrubTarget) -> usize {
        let scrubbing = self.scrubber.is_scrubbing();
        self.update(|state| {
            state.selected_frame_index = target.frame_index;
            state.scrubbing = scrubbing;
        });
        if let Some(ratio) = target.seek_ratio {
            self.seek_to_ratio(ratio);
        }
        target.frame_index
    }

    pub fn current_item(&self) -> Option<&Arc<ReviewItem>> {
        self.active.as_ref()?.item.as_ref()
    }

    pub fn is_subscribed(&self) -> bool {
        self.time_sync.is_subscribed()
    }

    /// Frame-set at the selected index, clamped to the last frame.
    pub fn selected_frame(&self) -> Option<&FrameAnnotationSet> {
        let frames = &self.current_item()?.frames;
        let last = frames.len().checked_sub(1)?;
        frames.get(self.snapshot().selected_frame_index.min(last))
    }

    /// Viewport-space overlays for the selected frame inside `container`.
    pub fn project_selected(
        &self,
        geometry: &frame_review_geometry::Configuration,
        container: Size,
    ) -> ProjectedFrame {
        match self.selected_frame() {
            Some(frame) => geometry.project(frame, self.snapshot().presentation_size, container),
            None => ProjectedFrame::default(),
        }
    }

    pub fn timeline(&self, width: f64) -> Timeline {
        let Some(item) = self.current_item() else {
            return Timeline::default();
        };
        let count = item.frame_count();
        Timeline {
            markers: timeline_markers(&item.frames, self.config.max_markers, width),
            playhead_x: x_for_index(self.snapshot().selected_frame_index, count, width),
        }
    }

    fn clock(&self) -> Option<DynPlaybackClock> {
        self.active.as_ref()?.clock.clone()
    }

    fn update(&self, update: impl FnOnce(&mut ReviewSnapshot)) -> bool {
        self.state_tx.send_if_modified(|state| {
            let before = *state;
            update(state);
            *state != before
        })
    }
}
