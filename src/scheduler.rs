//! Timer and task capability for the widgets.
//!
//! Everything runs on one thread, so callbacks and futures are not `Send`.
//! Two timers exist per bound widget at most (a debounce one-shot and a carousel
//! interval); both are re-armable and are cancelled through [`TimerSlot`] before
//! being armed again so they never double-fire.
//!
//! Implementations:
//! - [`ManualScheduler`]: virtual clock for tests, advanced explicitly.
//! - [`TokioScheduler`]: `spawn_local` tasks on a tokio `LocalSet` (native only).
//! - `BrowserScheduler` in `browser.rs`: `setTimeout` / `setInterval` (wasm only).

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::future::LocalBoxFuture;

/// A future driven to completion by the scheduler.
pub type LocalTask = LocalBoxFuture<'static, ()>;

/// Opaque handle for a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

pub trait Scheduler {
    /// Run `f` once after `delay`.
    fn after(&self, delay: Duration, f: Box<dyn FnOnce()>) -> TimerId;

    /// Run `f` every `period`, first firing one `period` from now.
    fn every(&self, period: Duration, f: Box<dyn FnMut()>) -> TimerId;

    /// Cancel a timer. Unknown or already-fired ids are ignored.
    fn cancel(&self, id: TimerId);

    /// Drive a local future in the background (fire-and-forget).
    fn spawn(&self, task: LocalTask);
}

/// Holds at most one armed timer; arming always cancels the previous one first.
#[derive(Debug, Default)]
pub struct TimerSlot {
    id: Cell<Option<TimerId>>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel whatever this slot holds.
    pub fn clear(&self, scheduler: &dyn Scheduler) {
        if let Some(id) = self.id.take() {
            scheduler.cancel(id);
        }
    }

    pub fn arm_after(&self, scheduler: &dyn Scheduler, delay: Duration, f: Box<dyn FnOnce()>) {
        self.clear(scheduler);
        self.id.set(Some(scheduler.after(delay, f)));
    }

    pub fn arm_every(&self, scheduler: &dyn Scheduler, period: Duration, f: Box<dyn FnMut()>) {
        self.clear(scheduler);
        self.id.set(Some(scheduler.every(period, f)));
    }

    /// Whether a timer id is held. A one-shot that already fired still counts.
    pub fn is_armed(&self) -> bool {
        self.id.get().is_some()
    }
}

// ---------------------------------------------------------------------------
// ManualScheduler
// ---------------------------------------------------------------------------

enum TimerKind {
    Once(Box<dyn FnOnce()>),
    Every {
        period: Duration,
        f: Rc<RefCell<Box<dyn FnMut()>>>,
    },
}

struct Timer {
    id: TimerId,
    due: Duration,
    kind: TimerKind,
}

#[derive(Default)]
struct ManualInner {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer>,
    tasks: Vec<LocalTask>,
}

/// Deterministic scheduler: time only moves when [`advance`](Self::advance) is called.
///
/// Timers fire in deadline order (ties by creation order). After every timer
/// callback, spawned tasks are polled until none of them can make progress.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualInner>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since construction.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of timers still pending.
    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Number of spawned tasks not yet finished.
    pub fn pending_tasks(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// Move the clock forward by `by`, firing everything that comes due.
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                let pos = inner
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(i, _)| i);
                match pos {
                    None => None,
                    Some(i) => {
                        let timer = inner.timers.remove(i);
                        inner.now = timer.due;
                        match timer.kind {
                            TimerKind::Once(f) => Some(Fire::Once(f)),
                            TimerKind::Every { period, f } => {
                                // Zero periods would spin forever inside one advance.
                                let step = period.max(Duration::from_millis(1));
                                inner.timers.push(Timer {
                                    id: timer.id,
                                    due: timer.due + step,
                                    kind: TimerKind::Every {
                                        period,
                                        f: Rc::clone(&f),
                                    },
                                });
                                Some(Fire::Every(f))
                            }
                        }
                    }
                }
            };

            match next {
                None => break,
                Some(Fire::Once(f)) => f(),
                Some(Fire::Every(f)) => (f.borrow_mut())(),
            }
            self.run_until_stalled();
        }
        self.inner.borrow_mut().now = target;
        self.run_until_stalled();
    }

    /// Poll spawned tasks until every remaining one is pending and no new
    /// ones were spawned.
    pub fn run_until_stalled(&self) {
        let waker = futures_util::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        loop {
            let tasks = std::mem::take(&mut self.inner.borrow_mut().tasks);
            if tasks.is_empty() {
                break;
            }
            let mut pending = Vec::with_capacity(tasks.len());
            let mut progressed = false;
            for mut task in tasks {
                match Pin::new(&mut task).poll(&mut cx) {
                    Poll::Ready(()) => progressed = true,
                    Poll::Pending => pending.push(task),
                }
            }
            let mut inner = self.inner.borrow_mut();
            let spawned_more = !inner.tasks.is_empty();
            pending.append(&mut inner.tasks);
            inner.tasks = pending;
            if !progressed && !spawned_more {
                break;
            }
        }
    }
}

enum Fire {
    Once(Box<dyn FnOnce()>),
    Every(Rc<RefCell<Box<dyn FnMut()>>>),
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay: Duration, f: Box<dyn FnOnce()>) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = TimerId(inner.next_id);
        let due = inner.now + delay;
        inner.timers.push(Timer {
            id,
            due,
            kind: TimerKind::Once(f),
        });
        id
    }

    fn every(&self, period: Duration, f: Box<dyn FnMut()>) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = TimerId(inner.next_id);
        let due = inner.now + period;
        inner.timers.push(Timer {
            id,
            due,
            kind: TimerKind::Every {
                period,
                f: Rc::new(RefCell::new(f)),
            },
        });
        id
    }

    fn cancel(&self, id: TimerId) {
        self.inner.borrow_mut().timers.retain(|t| t.id != id);
    }

    fn spawn(&self, task: LocalTask) {
        self.inner.borrow_mut().tasks.push(task);
    }
}

// ---------------------------------------------------------------------------
// TokioScheduler
// ---------------------------------------------------------------------------

/// Scheduler backed by `tokio::task::spawn_local`.
///
/// Must be used from inside a `tokio::task::LocalSet`; spawning outside one panics.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Default)]
pub struct TokioScheduler {
    handles: Rc<RefCell<std::collections::HashMap<TimerId, tokio::task::JoinHandle<()>>>>,
    next_id: Rc<Cell<u64>>,
}

#[cfg(not(target_arch = "wasm32"))]
impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> TimerId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        TimerId(id)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, f: Box<dyn FnOnce()>) -> TimerId {
        let id = self.next();
        let handles = Rc::clone(&self.handles);
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            handles.borrow_mut().remove(&id);
            f();
        });
        self.handles.borrow_mut().insert(id, handle);
        id
    }

    fn every(&self, period: Duration, mut f: Box<dyn FnMut()>) -> TimerId {
        let id = self.next();
        let handle = tokio::task::spawn_local(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                f();
            }
        });
        self.handles.borrow_mut().insert(id, handle);
        id
    }

    fn cancel(&self, id: TimerId) {
        if let Some(handle) = self.handles.borrow_mut().remove(&id) {
            handle.abort();
        }
    }

    fn spawn(&self, task: LocalTask) {
        tokio::task::spawn_local(task);
    }
}
