//! Single-threaded cooperative main loop
//!
//! The host application drives everything by calling [`MainLoop::iterate`]
//! repeatedly. There are no worker threads: timers are one-shot callbacks
//! that run on the thread calling `iterate`, in deadline order.
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use std::time::Duration;
//! use sipauth_infra_common::main_loop::MainLoop;
//!
//! let main_loop = MainLoop::new();
//! let fired = Rc::new(Cell::new(false));
//! let flag = fired.clone();
//! main_loop.add_timer("example", Duration::ZERO, Box::new(move || flag.set(true)));
//!
//! assert_eq!(main_loop.iterate(), 1);
//! assert!(fired.get());
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::trace;

/// One-shot timer callback
pub type TimerCallback = Box<dyn FnOnce()>;

/// Handle of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Something able to run a callback later on the owning thread
pub trait Scheduler {
    /// Schedule `task` to run once after `delay`
    fn schedule(&self, name: &str, delay: Duration, task: TimerCallback) -> TimerId;

    /// Cancel a timer that has not fired yet; returns whether it was pending
    fn cancel(&self, id: TimerId) -> bool;
}

struct ScheduledTimer {
    id: TimerId,
    name: String,
    deadline: Instant,
    callback: TimerCallback,
}

#[derive(Default)]
struct LoopState {
    next_id: u64,
    timers: Vec<ScheduledTimer>,
}

/// Timer queue pumped by the host application
///
/// Shared as `Rc<MainLoop>`; the type is neither `Send` nor `Sync`, so all
/// scheduling happens on the thread that owns the loop.
#[derive(Default)]
pub struct MainLoop {
    state: RefCell<LoopState>,
}

impl MainLoop {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Register a one-shot timer
    pub fn add_timer(&self, name: &str, delay: Duration, callback: TimerCallback) -> TimerId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = TimerId(state.next_id);
        state.timers.push(ScheduledTimer {
            id,
            name: name.to_string(),
            deadline: Instant::now() + delay,
            callback,
        });
        trace!(%id, name, ?delay, "Timer armed");
        id
    }

    /// Drop a timer before it fires
    pub fn cancel_timer(&self, id: TimerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.timers.len();
        state.timers.retain(|t| t.id != id);
        let cancelled = state.timers.len() != before;
        if cancelled {
            trace!(%id, "Timer cancelled");
        }
        cancelled
    }

    /// Number of timers not fired yet
    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Fire every timer whose deadline has passed and return how many ran.
    ///
    /// Callbacks run without any internal borrow held, so they may add or
    /// cancel timers. A due timer cancelled by an earlier callback of the
    /// same iteration does not fire. Timers added by a callback fire on a
    /// later iteration.
    pub fn iterate(&self) -> usize {
        let now = Instant::now();
        let mut due: Vec<(Instant, TimerId)> = self
            .state
            .borrow()
            .timers
            .iter()
            .filter(|t| t.deadline <= now)
            .map(|t| (t.deadline, t.id))
            .collect();
        due.sort();

        let mut fired = 0;
        for (_, id) in due {
            let timer = {
                let mut state = self.state.borrow_mut();
                match state.timers.iter().position(|t| t.id == id) {
                    Some(index) => state.timers.remove(index),
                    None => continue,
                }
            };
            trace!(id = %timer.id, name = %timer.name, "Timer fired");
            (timer.callback)();
            fired += 1;
        }
        fired
    }

    /// Iterate until no timer is due, bounded by `max_iterations`
    pub fn run_until_idle(&self, max_iterations: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_iterations {
            let fired = self.iterate();
            if fired == 0 {
                break;
            }
            total += fired;
        }
        total
    }
}

impl Scheduler for MainLoop {
    fn schedule(&self, name: &str, delay: Duration, task: TimerCallback) -> TimerId {
        self.add_timer(name, delay, task)
    }

    fn cancel(&self, id: TimerId) -> bool {
        self.cancel_timer(id)
    }
}

impl fmt::Debug for MainLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainLoop")
            .field("pending_timers", &self.pending_timers())
            .finish()
    }
}
