use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::clock::{ClockTick, DynPlaybackClock, SubscriptionId};

/// Floor for the periodic sampling rate so the index keeps up with
/// high-frame-rate playback.
pub const MIN_SAMPLE_RATE_HZ: u32 = 60;

pub fn sample_rate_hz(fps: f64, min_rate_hz: u32) -> u32 {
    let rounded = if fps.is_finite() && fps > 0.0 {
        fps.round().min(u32::MAX as f64) as u32
    } else {
        0
    };
    rounded.max(min_rate_hz).max(1)
}

pub fn sample_interval(rate_hz: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(rate_hz.max(1)))
}

/// Maps playback time onto an index into `frame_count` evenly spaced frames.
///
/// Returns `None` when there is nothing to map: no frames or no positive
/// duration.
pub fn frame_index_for_time(time: f64, duration: f64, frame_count: usize) -> Option<usize> {
    if frame_count == 0 || !duration.is_finite() || duration <= 0.0 {
        return None;
    }
    let progress = if time.is_finite() {
        (time / duration).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let last = (frame_count - 1) as f64;
    let index = (progress * last).round() as usize;
    Some(index.min(frame_count - 1))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Unsubscribed,
    Subscribed {
        subscription: SubscriptionId,
        rate_hz: u32,
    },
}

/// Owns at most one periodic observer on one clock.
pub struct TimeSync {
    clock: Option<DynPlaybackClock>,
    state: SyncState,
    min_rate_hz: u32,
}

impl TimeSync {
    pub fn new(min_rate_hz: u32) -> Self {
        Self {
            clock: None,
            state: SyncState::Unsubscribed,
            min_rate_hz,
        }
    }

    /// Replaces any existing subscription with one on `clock` sampled at the
    /// rate derived from `fps`.
    pub fn install(
        &mut self,
        clock: DynPlaybackClock,
        fps: f64,
        ticks: UnboundedSender<ClockTick>,
    ) -> SubscriptionId {
        self.teardown();
        let rate_hz = sample_rate_hz(fps, self.min_rate_hz);
        let subscription = clock.add_periodic_observer(sample_interval(rate_hz), ticks);
        info!(
            subscription = subscription.raw(),
            rate_hz, fps, "installed playback time observer"
        );
        self.clock = Some(clock);
        self.state = SyncState::Subscribed {
            subscription,
            rate_hz,
        };
        subscription
    }

    pub fn teardown(&mut self) {
        let state = std::mem::take(&mut self.state);
        let clock = self.clock.take();
        if let SyncState::Subscribed { subscription, .. } = state
            && let Some(clock) = clock
        {
            clock.remove_periodic_observer(subscription);
            info!(
                subscription = subscription.raw(),
                "removed playback time observer"
            );
        }
    }

    /// Whether `tick` came from the live subscription.
    pub fn accepts(&self, tick: &ClockTick) -> bool {
        match self.state {
            SyncState::Subscribed { subscription, .. } if subscription == tick.subscription => {
                true
            }
            _ => {
                debug!(
                    subscription = tick.subscription.raw(),
                    "ignoring tick from stale observer"
                );
                false
            }
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_subscribed(&self) -> bool {
        matches!(self.state, SyncState::Subscribed { .. })
    }
}

impl Drop for TimeSync {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::mock::{MockClock, ObserverEvent};
    use std::sync::Arc;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn frame_index_rounds_to_nearest_frame() {
        assert_eq!(frame_index_for_time(0.0, 10.0, 5), Some(0));
        assert_eq!(frame_index_for_time(5.0, 10.0, 5), Some(2));
        assert_eq!(frame_index_for_time(10.0, 10.0, 5), Some(4));
        assert_eq!(frame_index_for_time(6.4, 10.0, 5), Some(3));
        assert_eq!(frame_index_for_time(12.0, 10.0, 5), Some(4));
        assert_eq!(frame_index_for_time(-1.0, 10.0, 5), Some(0));
        assert_eq!(frame_index_for_time(3.0, 10.0, 1), Some(0));
    }

    #[test]
    fn frame_index_requires_duration_and_frames() {
        assert_eq!(frame_index_for_time(1.0, 0.0, 5), None);
        assert_eq!(frame_index_for_time(1.0, -2.0, 5), None);
        assert_eq!(frame_index_for_time(1.0, 10.0, 0), None);
    }

    #[test]
    fn sample_rate_has_a_floor() {
        assert_eq!(sample_rate_hz(25.0, MIN_SAMPLE_RATE_HZ), 60);
        assert_eq!(sample_rate_hz(119.88, MIN_SAMPLE_RATE_HZ), 120);
        assert_eq!(sample_rate_hz(0.0, MIN_SAMPLE_RATE_HZ), 60);
        assert_eq!(sample_interval(120), Duration::from_secs_f64(1.0 / 120.0));
    }

    #[test]
    fn install_replaces_previous_subscription() {
        let clock = Arc::new(MockClock::new(5.0));
        let (tx, _rx) = unbounded_channel();
        let mut sync = TimeSync::new(MIN_SAMPLE_RATE_HZ);
        let first = sync.install(clock.clone(), 30.0, tx.clone());
        let second = sync.install(clock.clone(), 240.0, tx);
        assert_ne!(first, second);
        assert_eq!(clock.observer_count(), 1);
        assert_eq!(
            clock.observer_interval(),
            Some(Duration::from_secs_f64(1.0 / 240.0))
        );
        assert!(!sync.accepts(&ClockTick {
            subscription: first,
            time: 0.0
        }));
        assert!(sync.accepts(&ClockTick {
            subscription: second,
            time: 0.0
        }));
        drop(sync);
        assert_eq!(
            clock.observer_log(),
            vec![
                ObserverEvent::Added(first),
                ObserverEvent::Removed(first),
                ObserverEvent::Added(second),
                ObserverEvent::Removed(second),
            ]
        );
    }
}
