//! Timers for the refresh loop.
//!
//! The loop only needs "wake me after this long". [`ManualClock`] answers
//! that from a clock that moves only when told to: tests step it directly,
//! and the workbench advances it once per UI frame.

use futures_util::future::{FutureExt, LocalBoxFuture};
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

/// Source of async sleeps.
pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

struct Sleeper {
    id: u64,
    deadline: Duration,
    waker: Option<Waker>,
}

#[derive(Default)]
struct ClockInner {
    now: Duration,
    next_id: u64,
    sleepers: Vec<Sleeper>,
}

/// A clock that advances only through [`ManualClock::advance`].
///
/// Clones share the same time and pending sleeps.
#[derive(Clone, Default)]
pub struct ManualClock {
    inner: Rc<RefCell<ClockInner>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on this clock.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Moves time forward and wakes every sleep that has expired.
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        self.advance_to(target);
    }

    /// Moves time to `target`. Going backwards is ignored.
    pub fn advance_to(&self, target: Duration) {
        let wakers: Vec<Waker> = {
            let mut inner = self.inner.borrow_mut();
            if target <= inner.now {
                return;
            }
            inner.now = target;
            inner
                .sleepers
                .iter_mut()
                .filter(|s| s.deadline <= target)
                .filter_map(|s| s.waker.take())
                .collect()
        };
        // Wake outside the borrow; a woken task may poll synchronously.
        for waker in wakers {
            waker.wake();
        }
    }

    /// Earliest pending deadline, if any sleep is outstanding.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner.borrow().sleepers.iter().map(|s| s.deadline).min()
    }

    /// Number of sleeps that have not completed or been dropped.
    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().sleepers.len()
    }
}

impl Timer for ManualClock {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            let deadline = inner.now + duration;
            inner.sleepers.push(Sleeper {
                id,
                deadline,
                waker: None,
            });
            id
        };
        Sleep {
            inner: self.inner.clone(),
            id,
        }
        .boxed_local()
    }
}

/// A pending sleep. Dropping it cancels the timer.
struct Sleep {
    inner: Rc<RefCell<ClockInner>>,
    id: u64,
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut inner = self.inner.borrow_mut();
        let now = inner.now;
        let Some(pos) = inner.sleepers.iter().position(|s| s.id == self.id) else {
            return Poll::Ready(());
        };
        if inner.sleepers[pos].deadline <= now {
            inner.sleepers.remove(pos);
            Poll::Ready(())
        } else {
            inner.sleepers[pos].waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.sleepers.retain(|s| s.id != self.id);
        }
    }
}
