//! Periodic fleet refresh.
//!
//! The loop fetches immediately, then once per interval: fetch, filter,
//! fit a box, hand both to the caller. It waits on an injected [`Timer`],
//! so it never blocks the UI thread and can be driven by a fake clock.
//! Fetch failures are reported and the next tick is the retry.

use super::clock::Timer;
use super::FetchError;
use crate::fleet::{EntityFilter, TrackedEntity};
use crate::geo::{BoundingBox, ViewportFitter};
use chrono::{DateTime, Utc};
use futures_channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures_util::future::{self, Either, FutureExt, LocalBoxFuture};
use futures_util::task::{LocalSpawn, LocalSpawnExt};
use futures_util::StreamExt;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

/// Async supplier of fleet snapshots. The loop performs no transport
/// itself; callers inject a REST client, a file reader, or a simulation.
pub trait EntitySource {
    fn fetch(&self) -> LocalBoxFuture<'_, Result<Vec<TrackedEntity>, FetchError>>;
}

impl<F, Fut> EntitySource for F
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Vec<TrackedEntity>, FetchError>> + 'static,
{
    fn fetch(&self) -> LocalBoxFuture<'_, Result<Vec<TrackedEntity>, FetchError>> {
        (self)().boxed_local()
    }
}

/// Errors starting the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshError {
    /// The interval must be positive.
    InvalidInterval(Duration),
    /// The executor refused the task.
    Spawn(String),
}

impl std::fmt::Display for RefreshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshError::InvalidInterval(d) => {
                write!(f, "Refresh interval must be positive, got {:?}", d)
            }
            RefreshError::Spawn(msg) => write!(f, "Failed to spawn refresh loop: {}", msg),
        }
    }
}

impl std::error::Error for RefreshError {}

/// Bookkeeping for the status panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshStats {
    /// Fetches started.
    pub ticks: u64,
    pub successes: u64,
    pub failures: u64,
    /// Message of the most recent failure, cleared by the next success.
    pub last_error: Option<String>,
    /// Wall time the last update was delivered.
    pub last_update: Option<DateTime<Utc>>,
    pub last_fetch_ms: f64,
}

impl RefreshStats {
    /// The most recent tick failed, so the map shows older data.
    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }
}

enum Signal {
    Stop,
    Refresh,
}

#[derive(Default)]
struct LoopShared {
    running: bool,
    stopped: bool,
    stats: RefreshStats,
}

/// Controls a started loop. Clones control the same loop.
#[derive(Clone)]
pub struct StopHandle {
    shared: Rc<RefCell<LoopShared>>,
    signals: UnboundedSender<Signal>,
}

impl StopHandle {
    /// Cancels the pending tick and all future ticks. Safe to call twice.
    pub fn stop(&self) {
        let first = {
            let mut shared = self.shared.borrow_mut();
            let first = !shared.stopped;
            shared.stopped = true;
            first
        };
        if first {
            log::debug!("Stop requested for live refresh");
            let _ = self.signals.unbounded_send(Signal::Stop);
        }
    }

    pub fn is_running(&self) -> bool {
        let shared = self.shared.borrow();
        shared.running && !shared.stopped
    }

    /// Runs the next tick now instead of waiting out the interval. Has no
    /// effect while a fetch is in flight beyond queueing one early tick.
    pub fn request_refresh(&self) {
        if self.is_running() {
            let _ = self.signals.unbounded_send(Signal::Refresh);
        }
    }

    pub fn stats(&self) -> RefreshStats {
        self.shared.borrow().stats.clone()
    }
}

type ErrorCallback = Box<dyn FnMut(&FetchError)>;

/// Periodic fetch-fit-update loop.
pub struct LiveRefreshLoop<S, T> {
    source: S,
    timer: T,
    fitter: ViewportFitter,
    filter: EntityFilter,
    on_error: Option<ErrorCallback>,
}

impl<S, T> LiveRefreshLoop<S, T>
where
    S: EntitySource + 'static,
    T: Timer + 'static,
{
    pub fn new(source: S, timer: T, fitter: ViewportFitter) -> Self {
        Self {
            source,
            timer,
            fitter,
            filter: EntityFilter::All,
            on_error: None,
        }
    }

    /// Drops entities the filter rejects before the box is fitted.
    pub fn with_filter(mut self, filter: EntityFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Called for every failed fetch. Failures are logged regardless.
    pub fn on_error(mut self, callback: impl FnMut(&FetchError) + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Spawns the loop. The first fetch starts as soon as the executor
    /// polls the task.
    pub fn start<Sp>(
        self,
        interval: Duration,
        on_update: impl FnMut(Vec<TrackedEntity>, BoundingBox) + 'static,
        spawner: &Sp,
    ) -> Result<StopHandle, RefreshError>
    where
        Sp: LocalSpawn + ?Sized,
    {
        if interval.is_zero() {
            return Err(RefreshError::InvalidInterval(interval));
        }

        let (tx, rx) = mpsc::unbounded();
        let shared = Rc::new(RefCell::new(LoopShared {
            running: true,
            ..Default::default()
        }));
        let handle = StopHandle {
            shared: shared.clone(),
            signals: tx,
        };

        spawner
            .spawn_local(self.run(interval, on_update, shared, rx))
            .map_err(|e| RefreshError::Spawn(e.to_string()))?;
        Ok(handle)
    }

    async fn run(
        mut self,
        interval: Duration,
        mut on_update: impl FnMut(Vec<TrackedEntity>, BoundingBox),
        shared: Rc<RefCell<LoopShared>>,
        mut signals: UnboundedReceiver<Signal>,
    ) {
        log::info!("Live refresh started, interval {} ms", interval.as_millis());

        while !shared.borrow().stopped {
            self.tick(&shared, &mut on_update).await;
            if shared.borrow().stopped {
                break;
            }

            let sleep = self.timer.sleep(interval);
            match future::select(sleep, signals.next()).await {
                Either::Left(((), _)) => {}
                Either::Right((Some(Signal::Refresh), _)) => {
                    log::debug!("Manual refresh");
                }
                Either::Right((Some(Signal::Stop), _)) => break,
                // Every handle is gone; nobody can stop us early any more
                Either::Right((None, sleep)) => sleep.await,
            }
        }

        let ticks = {
            let mut shared = shared.borrow_mut();
            shared.running = false;
            shared.stats.ticks
        };
        log::info!("Live refresh stopped after {} ticks", ticks);
    }

    async fn tick(
        &mut self,
        shared: &Rc<RefCell<LoopShared>>,
        on_update: &mut impl FnMut(Vec<TrackedEntity>, BoundingBox),
    ) {
        let tick = {
            let mut shared = shared.borrow_mut();
            shared.stats.ticks += 1;
            shared.stats.ticks
        };

        let start = web_time::Instant::now();
        let result = self.source.fetch().await;
        let fetch_ms = start.elapsed().as_secs_f64() * 1000.0;

        if shared.borrow().stopped {
            log::debug!("Tick {} finished after stop, discarding result", tick);
            return;
        }

        match result {
            Ok(entities) => {
                let entities = self.filter.apply(entities);
                let bounds = self.fitter.compute_bounds(&entities);
                log::debug!(
                    "Tick {}: {} entities, fetch {:.0} ms",
                    tick,
                    entities.len(),
                    fetch_ms
                );
                {
                    let mut shared = shared.borrow_mut();
                    let stats = &mut shared.stats;
                    stats.successes += 1;
                    stats.last_error = None;
                    stats.last_update = Some(Utc::now());
                    stats.last_fetch_ms = fetch_ms;
                }
                on_update(entities, bounds);
            }
            Err(err) => {
                log::warn!("Tick {}: fetch failed, keeping previous data: {}", tick, err);
                {
                    let mut shared = shared.borrow_mut();
                    let stats = &mut shared.stats;
                    stats.failures += 1;
                    stats.last_error = Some(err.to_string());
                    stats.last_fetch_ms = fetch_ms;
                }
                if let Some(callback) = self.on_error.as_mut() {
                    callback(&err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::VehicleStatus;
    use crate::geo::GeoPoint;
    use crate::live::ManualClock;
    use futures_executor::LocalPool;
    use std::cell::Cell;

    const INTERVAL: Duration = Duration::from_millis(5000);

    fn vehicle(id: &str, lat: f64, status: VehicleStatus) -> TrackedEntity {
        TrackedEntity::new(id, GeoPoint::new(lat, -74.0).unwrap(), status)
    }

    /// Source whose n-th call (1-based) fails when `n` is in `fail_on`.
    fn flaky_source(
        fail_on: &'static [u32],
    ) -> (
        Rc<Cell<u32>>,
        impl Fn() -> future::Ready<Result<Vec<TrackedEntity>, FetchError>>,
    ) {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let source = move || {
            let n = counter.get() + 1;
            counter.set(n);
            if fail_on.contains(&n) {
                future::ready(Err(FetchError::Transport(format!("outage on call {}", n))))
            } else {
                future::ready(Ok(vec![vehicle("V1", 40.7 + n as f64 * 0.001, VehicleStatus::InUse)]))
            }
        };
        (calls, source)
    }

    fn update_log() -> (
        Rc<RefCell<Vec<(Vec<TrackedEntity>, BoundingBox)>>>,
        impl FnMut(Vec<TrackedEntity>, BoundingBox),
    ) {
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = received.clone();
        (received, move |entities: Vec<TrackedEntity>, bounds: BoundingBox| {
            sink.borrow_mut().push((entities, bounds))
        })
    }

    #[test]
    fn test_first_fetch_is_immediate() {
        let mut pool = LocalPool::new();
        let clock = ManualClock::new();
        let (calls, source) = flaky_source(&[]);
        let (updates, on_update) = update_log();

        let handle = LiveRefreshLoop::new(source, clock.clone(), ViewportFitter::default())
            .start(INTERVAL, on_update, &pool.spawner())
            .unwrap();
        pool.run_until_stalled();

        assert_eq!(calls.get(), 1);
        assert_eq!(updates.borrow().len(), 1);
        assert_eq!(clock.next_deadline(), Some(INTERVAL));
        assert!(handle.is_running());
    }

    #[test]
    fn test_failed_tick_does_not_stop_loop() {
        let mut pool = LocalPool::new();
        let clock = ManualClock::new();
        let (calls, source) = flaky_source(&[2]);
        let (updates, on_update) = update_log();
        let errors = Rc::new(Cell::new(0));
        let error_count = errors.clone();

        let handle = LiveRefreshLoop::new(source, clock.clone(), ViewportFitter::default())
            .on_error(move |_| error_count.set(error_count.get() + 1))
            .start(INTERVAL, on_update, &pool.spawner())
            .unwrap();
        pool.run_until_stalled();
        for _ in 0..4 {
            clock.advance(INTERVAL);
            pool.run_until_stalled();
        }

        assert_eq!(calls.get(), 5);
        assert_eq!(errors.get(), 1);
        // Ticks 1, 3, 4 and 5 delivered; each carries that tick's latitude
        let lats: Vec<f64> = updates
            .borrow()
            .iter()
            .map(|(e, _)| ((e[0].position.latitude - 40.7) * 1000.0).round())
            .collect();
        assert_eq!(lats, vec![1.0, 3.0, 4.0, 5.0]);
        assert!(handle.is_running());

        let stats = handle.stats();
        assert_eq!(stats.ticks, 5);
        assert_eq!(stats.successes, 4);
        assert_eq!(stats.failures, 1);
        assert!(!stats.is_stale());
        assert!(stats.last_update.is_some());
    }

    #[test]
    fn test_stop_cancels_pending_timer_and_is_idempotent() {
        let mut pool = LocalPool::new();
        let clock = ManualClock::new();
        let (calls, source) = flaky_source(&[]);
        let (updates, on_update) = update_log();

        let handle = LiveRefreshLoop::new(source, clock.clone(), ViewportFitter::default())
            .start(INTERVAL, on_update, &pool.spawner())
            .unwrap();
        pool.run_until_stalled();
        assert_eq!(clock.pending_timers(), 1);

        handle.stop();
        handle.stop();
        pool.run_until_stalled();
        assert_eq!(clock.pending_timers(), 0);
        assert!(!handle.is_running());

        clock.advance(INTERVAL * 3);
        pool.run_until_stalled();
        assert_eq!(calls.get(), 1);
        assert_eq!(updates.borrow().len(), 1);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let pool = LocalPool::new();
        let (_, source) = flaky_source(&[]);
        let result = LiveRefreshLoop::new(source, ManualClock::new(), ViewportFitter::default())
            .start(Duration::ZERO, |_, _| {}, &pool.spawner());
        assert!(matches!(result, Err(RefreshError::InvalidInterval(_))));
    }

    #[test]
    fn test_manual_refresh_ticks_early() {
        let mut pool = LocalPool::new();
        let clock = ManualClock::new();
        let (calls, source) = flaky_source(&[]);

        let handle = LiveRefreshLoop::new(source, clock.clone(), ViewportFitter::default())
            .start(INTERVAL, |_, _| {}, &pool.spawner())
            .unwrap();
        pool.run_until_stalled();

        handle.request_refresh();
        pool.run_until_stalled();
        assert_eq!(calls.get(), 2);
        // The new sleep starts from the manual tick
        assert_eq!(clock.pending_timers(), 1);
        assert_eq!(clock.next_deadline(), Some(INTERVAL));
    }

    #[test]
    fn test_filter_applies_before_fitting() {
        let mut pool = LocalPool::new();
        let source = || {
            future::ready(Ok::<_, FetchError>(vec![
                vehicle("A", 40.70, VehicleStatus::Available),
                vehicle("B", 41.50, VehicleStatus::Maintenance),
            ]))
        };
        let (updates, on_update) = update_log();

        let _handle = LiveRefreshLoop::new(source, ManualClock::new(), ViewportFitter::default())
            .with_filter(EntityFilter::active_only())
            .start(INTERVAL, on_update, &pool.spawner())
            .unwrap();
        pool.run_until_stalled();

        let updates = updates.borrow();
        let (entities, bounds) = &updates[0];
        assert_eq!(entities.len(), 1);
        assert!(bounds.max_lat < 41.0);
    }

    #[test]
    fn test_stop_from_update_callback() {
        let mut pool = LocalPool::new();
        let clock = ManualClock::new();
        let (calls, source) = flaky_source(&[]);
        let slot: Rc<RefCell<Option<StopHandle>>> = Rc::new(RefCell::new(None));
        let inner = slot.clone();

        let handle = LiveRefreshLoop::new(source, clock.clone(), ViewportFitter::default())
            .start(
                INTERVAL,
                move |_, _| {
                    if let Some(h) = inner.borrow().as_ref() {
                        h.stop();
                    }
                },
                &pool.spawner(),
            )
            .unwrap();
        *slot.borrow_mut() = Some(handle.clone());

        pool.run_until_stalled();
        assert_eq!(calls.get(), 1);
        assert!(!handle.is_running());
        assert_eq!(clock.pending_timers(), 0);
    }
}
