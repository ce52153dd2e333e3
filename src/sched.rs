//! Cancellable timers keyed by session
//!
//! Every delayed or periodic callback is a timer owned by a session. Closing a
//! session cancels all of its timers at once, so nothing armed for a finished
//! session can fire afterwards.
//!
//! Time only moves when the host calls [`Scheduler::advance`]; due timers are
//! then drained one at a time with [`Scheduler::pop_due`] so that a handler may
//! close sessions before the next timer is looked at.

use std::collections::BTreeSet;

use serde::Serialize;

/// Key grouping the timers of one session (a transition, a flow stage, a game)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(u64);

/// Handle to a single armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Timer<E> {
    handle: TimerHandle,
    session: SessionId,
    due_ms: u64,
    /// `Some` for repeating timers
    period_ms: Option<u64>,
    event: E,
}

/// A timer that came due
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub handle: TimerHandle,
    pub session: SessionId,
    pub at_ms: u64,
    pub event: E,
}

/// Single-threaded timer queue
#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    now_ms: u64,
    /// Time the current `advance` is draining towards
    target_ms: u64,
    next_session: u64,
    next_timer: u64,
    live: BTreeSet<SessionId>,
    timers: Vec<Timer<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            target_ms: 0,
            next_session: 1,
            next_timer: 1,
            live: BTreeSet::new(),
            timers: Vec::new(),
        }
    }

    /// Current scheduler time in milliseconds
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Allocate a fresh session key. Keys are never reused.
    pub fn open_session(&mut self) -> SessionId {
        let id = SessionId(self.next_session);
        self.next_session += 1;
        self.live.insert(id);
        id
    }

    /// True until the session is closed
    pub fn is_live(&self, session: SessionId) -> bool {
        self.live.contains(&session)
    }

    /// Number of timers still armed for a session
    pub fn pending(&self, session: SessionId) -> usize {
        self.timers.iter().filter(|t| t.session == session).count()
    }

    /// Arm a one-shot timer `delay_ms` from now.
    ///
    /// Arming on a closed session is ignored and returns `None`.
    pub fn once(&mut self, session: SessionId, delay_ms: u64, event: E) -> Option<TimerHandle> {
        self.arm(session, delay_ms, None, event)
    }

    /// Arm a repeating timer whose first firing is one period from now.
    /// A zero period is treated as 1 ms.
    pub fn every(&mut self, session: SessionId, period_ms: u64, event: E) -> Option<TimerHandle> {
        let period = period_ms.max(1);
        self.arm(session, period, Some(period), event)
    }

    fn arm(
        &mut self,
        session: SessionId,
        delay_ms: u64,
        period_ms: Option<u64>,
        event: E,
    ) -> Option<TimerHandle> {
        if !self.is_live(session) {
            log::debug!("Ignoring timer armed on closed session {:?}", session);
            return None;
        }
        let handle = TimerHandle(self.next_timer);
        self.next_timer += 1;
        self.timers.push(Timer {
            handle,
            session,
            due_ms: self.now_ms + delay_ms,
            period_ms,
            event,
        });
        Some(handle)
    }

    /// Cancel a single timer. Returns false if it was not armed.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        self.timers.len() != before
    }

    /// Close a session and cancel every timer it owns. Returns the number cancelled.
    pub fn close_session(&mut self, session: SessionId) -> usize {
        self.live.remove(&session);
        let before = self.timers.len();
        self.timers.retain(|t| t.session != session);
        let cancelled = before - self.timers.len();
        if cancelled > 0 {
            log::debug!("Closed session {:?}, cancelled {} timers", session, cancelled);
        }
        cancelled
    }

    /// Move the drain target forward by `dt_ms`
    pub fn advance(&mut self, dt_ms: u64) {
        self.target_ms = self.target_ms.max(self.now_ms) + dt_ms;
    }
}

impl<E: Clone> Scheduler<E> {
    /// Pop the next timer due at or before the drain target.
    ///
    /// Timers come out ordered by due time, ties broken by arming order. The
    /// clock moves to each timer's due time as it is popped and to the target
    /// once nothing else is due.
    pub fn pop_due(&mut self) -> Option<Fired<E>> {
        let target = self.target_ms;
        let next = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= target)
            .min_by_key(|(_, t)| (t.due_ms, t.handle))
            .map(|(i, _)| i);

        let Some(index) = next else {
            self.now_ms = self.now_ms.max(target);
            return None;
        };

        let timer = &self.timers[index];
        let fired = Fired {
            handle: timer.handle,
            session: timer.session,
            at_ms: timer.due_ms,
            event: timer.event.clone(),
        };
        let period = timer.period_ms;
        self.now_ms = fired.at_ms;

        match period {
            Some(period) => self.timers[index].due_ms += period,
            None => {
                self.timers.swap_remove(index);
            }
        }

        Some(fired)
    }
}
