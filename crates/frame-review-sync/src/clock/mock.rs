use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use super::{ClockTick, PlaybackClock, SubscriptionId, TransportStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObserverEvent {
    Added(SubscriptionId),
    Removed(SubscriptionId),
}

struct Observer {
    id: SubscriptionId,
    interval: Duration,
    ticks: UnboundedSender<ClockTick>,
}

#[derive(Default)]
struct State {
    time: f64,
    duration: f64,
    status: TransportStatus,
    observers: Vec<Observer>,
    seeks: Vec<f64>,
    log: Vec<ObserverEvent>,
}

impl State {
    fn emit(&mut self) {
        let time = self.time;
        self.observers.retain(|observer| {
            observer
                .ticks
                .send(ClockTick {
                    subscription: observer.id,
                    time,
                })
                .is_ok()
        });
    }
}

/// Deterministic clock driven by explicit `advance` calls.
pub struct MockClock {
    state: Mutex<State>,
}

impl MockClock {
    pub fn new(duration: f64) -> Self {
        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        };
        Self {
            state: Mutex::new(State {
                duration,
                ..State::default()
            }),
        }
    }

    /// Updates the item length once it is known. The current time is clamped
    /// into the new range.
    pub fn set_duration(&self, duration: f64) {
        let mut state = self.state.lock();
        state.duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        };
        state.time = state.time.min(state.duration);
    }

    /// Moves playback forward by `delta` seconds while playing. Reaching the
    /// end pauses the transport. Returns the new time.
    pub fn advance(&self, delta: f64) -> f64 {
        let mut state = self.state.lock();
        if state.status != TransportStatus::Playing || !delta.is_finite() {
            return state.time;
        }
        state.time = (state.time + delta.max(0.0)).min(state.duration);
        if state.time >= state.duration {
            state.status = TransportStatus::Paused;
        }
        state.emit();
        state.time
    }

    /// Delivers the current time to every observer without moving it.
    pub fn emit(&self) {
        self.state.lock().emit();
    }

    pub fn current_time(&self) -> f64 {
        self.state.lock().time
    }

    pub fn duration(&self) -> f64 {
        self.state.lock().duration
    }

    pub fn observer_count(&self) -> usize {
        self.state.lock().observers.len()
    }

    pub fn observer_interval(&self) -> Option<Duration> {
        self.state
            .lock()
            .observers
            .last()
            .map(|observer| observer.interval)
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.state.lock().seeks.clone()
    }

    pub fn observer_log(&self) -> Vec<ObserverEvent> {
        self.state.lock().log.clone()
    }
}

impl PlaybackClock for MockClock {
    fn seek(&self, time: f64) {
        let mut state = self.state.lock();
        let target = if time.is_finite() {
            time.clamp(0.0, state.duration)
        } else {
            0.0
        };
        state.time = target;
        state.seeks.push(target);
        state.emit();
    }

    fn play(&self) {
        let mut state = self.state.lock();
        if state.time >= state.duration {
            state.time = 0.0;
        }
        state.status = TransportStatus::Playing;
    }

    fn pause(&self) {
        self.state.lock().status = TransportStatus::Paused;
    }

    fn status(&self) -> TransportStatus {
        self.state.lock().status
    }

    fn add_periodic_observer(
        &self,
        interval: Duration,
        ticks: UnboundedSender<ClockTick>,
    ) -> SubscriptionId {
        let mut state = self.state.lock();
        let id = SubscriptionId::next();
        state.observers.push(Observer {
            id,
            interval,
            ticks,
        });
        state.log.push(ObserverEvent::Added(id));
        id
    }

    fn remove_periodic_observer(&self, subscription: SubscriptionId) {
        let mut state = self.state.lock();
        let before = state.observers.len();
        state.observers.retain(|observer| observer.id != subscription);
        if state.observers.len() != before {
            state.log.push(ObserverEvent::Removed(subscription));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn advance_only_moves_while_playing() {
        let clock = MockClock::new(2.0);
        assert_eq!(clock.advance(0.5), 0.0);
        clock.play();
        assert_eq!(clock.advance(0.5), 0.5);
        assert_eq!(clock.advance(5.0), 2.0);
        assert_eq!(clock.status(), TransportStatus::Paused);
    }

    #[test]
    fn seek_clamps_and_notifies() {
        let clock = MockClock::new(4.0);
        let (tx, mut rx) = unbounded_channel();
        let id = clock.add_periodic_observer(Duration::from_millis(16), tx);
        clock.seek(9.0);
        clock.seek(-1.0);
        assert_eq!(clock.seeks(), vec![4.0, 0.0]);
        assert_eq!(
            rx.try_recv().ok(),
            Some(ClockTick {
                subscription: id,
                time: 4.0
            })
        );
        assert_eq!(rx.try_recv().map(|tick| tick.time).ok(), Some(0.0));
    }

    #[test]
    fn removed_observers_stop_receiving() {
        let clock = MockClock::new(1.0);
        let (tx, mut rx) = unbounded_channel();
        let id = clock.add_periodic_observer(Duration::from_millis(10), tx);
        clock.remove_periodic_observer(id);
        clock.remove_periodic_observer(id);
        clock.emit();
        assert!(rx.try_recv().is_err());
        assert_eq!(
            clock.observer_log(),
            vec![ObserverEvent::Added(id), ObserverEvent::Removed(id)]
        );
    }
}
