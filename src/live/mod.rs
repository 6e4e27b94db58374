//! Live fleet refresh.
//!
//! A single-threaded polling loop that keeps the map fed with fresh
//! vehicle snapshots, plus the timer abstraction it sleeps on.

mod clock;
mod refresh;

pub use clock::{ManualClock, Timer};
pub use refresh::{EntitySource, LiveRefreshLoop, RefreshError, RefreshStats, StopHandle};

use crate::fleet::TrackedEntity;
use crate::geo::BoundingBox;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A failed fetch. Never fatal to the refresh loop.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The request did not complete.
    Transport(String),
    /// The response could not be decoded.
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "Fetch failed: {}", msg),
            FetchError::Decode(msg) => write!(f, "Invalid fleet data: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}

/// Something the refresh loop produced for the UI.
#[derive(Debug, Clone)]
pub enum RefreshEvent {
    Updated {
        entities: Vec<TrackedEntity>,
        bounds: BoundingBox,
    },
    Failed(FetchError),
}

/// Queue between the refresh loop callbacks and the UI frame that drains
/// them. Clones share one queue.
#[derive(Clone, Default)]
pub struct RefreshInbox {
    events: Rc<RefCell<VecDeque<RefreshEvent>>>,
}

impl RefreshInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: RefreshEvent) {
        self.events.borrow_mut().push_back(event);
    }

    pub fn try_recv(&self) -> Option<RefreshEvent> {
        self.events.borrow_mut().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Starts `refresh_loop` with this inbox receiving updates and failures.
    pub fn attach<S, T, Sp>(
        &self,
        refresh_loop: LiveRefreshLoop<S, T>,
        interval: std::time::Duration,
        spawner: &Sp,
    ) -> Result<StopHandle, RefreshError>
    where
        S: EntitySource + 'static,
        T: Timer + 'static,
        Sp: futures_util::task::LocalSpawn + ?Sized,
    {
        let errors = self.clone();
        let updates = self.clone();
        refresh_loop
            .on_error(move |e| errors.push(RefreshEvent::Failed(e.clone())))
            .start(
                interval,
                move |entities, bounds| updates.push(RefreshEvent::Updated { entities, bounds }),
                spawner,
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::{decode_entities, SimulatedFleet};
    use crate::geo::{GeoPoint, ViewportFitter};
    use futures_executor::LocalPool;
    use std::time::Duration;

    #[test]
    fn test_decode_errors_map_to_fetch_error() {
        let err: FetchError = decode_entities("{not json").unwrap_err().into();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_inbox_receives_updates_and_failures() {
        let mut pool = LocalPool::new();
        let clock = ManualClock::new();
        let fleet = SimulatedFleet::new(GeoPoint::new(40.7128, -74.006).unwrap(), 10)
            .with_failures_every(2);
        let inbox = RefreshInbox::new();

        let handle = inbox
            .attach(
                LiveRefreshLoop::new(fleet, clock.clone(), ViewportFitter::default()),
                Duration::from_secs(5),
                &pool.spawner(),
            )
            .unwrap();
        pool.run_until_stalled();
        clock.advance(Duration::from_secs(5));
        pool.run_until_stalled();

        assert!(matches!(
            inbox.try_recv(),
            Some(RefreshEvent::Updated { ref entities, .. }) if entities.len() == 10
        ));
        assert!(matches!(inbox.try_recv(), Some(RefreshEvent::Failed(_))));
        assert!(inbox.is_empty());
        handle.stop();
    }
}
