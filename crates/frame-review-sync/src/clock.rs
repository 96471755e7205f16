use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

pub mod mock;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Handle returned by [`PlaybackClock::add_periodic_observer`].
///
/// Ids are unique across every clock in the process, so a tick still queued
/// from a replaced clock never matches the live subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocates a fresh id. Clock implementations call this once per
    /// registered observer.
    pub fn next() -> Self {
        Self(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Playback time delivered to one periodic observer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockTick {
    pub subscription: SubscriptionId,
    pub time: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportStatus {
    #[default]
    Paused,
    Playing,
}

/// Transport and time source for the selected video.
///
/// Observers receive ticks on the channel they register with until they are
/// removed. Seeking delivers a tick as well so paused scrubbing still moves
/// the frame index.
pub trait PlaybackClock: Send + Sync {
    fn seek(&self, time: f64);
    fn play(&self);
    fn pause(&self);
    fn status(&self) -> TransportStatus;
    fn add_periodic_observer(
        &self,
        interval: Duration,
        ticks: UnboundedSender<ClockTick>,
    ) -> SubscriptionId;
    fn remove_periodic_observer(&self, subscription: SubscriptionId);
}

pub type DynPlaybackClock = Arc<dyn PlaybackClock>;
