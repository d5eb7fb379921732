use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;

/// Identity of one scheduled timer task.
///
/// A task is told its id when spawned and must `claim` it from its slot
/// before acting. Whoever removes the id first (the task claiming it, or
/// an early resolution cancelling the slot) wins; the other side backs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

impl TimerId {
    pub fn next() -> Self {
        Self(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Owned handle to a spawned timer task. Dropping it aborts the task.
#[derive(Debug)]
pub struct TimerHandle {
    task: Option<JoinHandle<()>>,
}

impl TimerHandle {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            task: Some(tokio::spawn(future)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Lets the task run to completion without holding on to it.
    /// Used by a task that claimed its own slot.
    fn detach(mut self) {
        self.task.take();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Single-flight slot holding at most one timer.
#[derive(Debug, Default)]
pub enum TimerSlot {
    #[default]
    Idle,
    Running(TimerId, TimerHandle),
}

impl TimerSlot {
    /// Arms the slot, cancelling whatever was running before.
    pub fn arm(&mut self, id: TimerId, handle: TimerHandle) {
        if let TimerSlot::Running(_, previous) = std::mem::replace(self, TimerSlot::Running(id, handle)) {
            previous.cancel();
        }
    }

    pub fn cancel(&mut self) {
        if let TimerSlot::Running(_, handle) = std::mem::take(self) {
            handle.cancel();
        }
    }

    pub fn owns(&self, id: TimerId) -> bool {
        matches!(self, TimerSlot::Running(current, _) if *current == id)
    }

    /// Called by the timer task itself. Returns false when the slot was
    /// cancelled or re-armed in the meantime, in which case the task must stop.
    pub fn claim(&mut self, id: TimerId) -> bool {
        if !self.owns(id) {
            return false;
        }
        if let TimerSlot::Running(_, handle) = std::mem::take(self) {
            handle.detach();
        }
        true
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TimerSlot::Running(..))
    }
}

/// Every timer a room can have running.
#[derive(Debug, Default)]
pub struct RoomTimers {
    /// 1 Hz round countdown.
    pub round_clock: TimerSlot,
    /// 1 Hz vote countdown that resolves the vote when it runs out.
    pub vote_clock: TimerSlot,
    /// Delayed round end (after a passing fix) or delayed next round start.
    pub round_transition: TimerSlot,
    /// Deletion of the room once its reconnection grace expires.
    pub empty_room: TimerSlot,
}

impl RoomTimers {
    pub fn cancel_game_timers(&mut self) {
        self.round_clock.cancel();
        self.vote_clock.cancel();
        self.round_transition.cancel();
    }

    pub fn cancel_all(&mut self) {
        self.cancel_game_timers();
        self.empty_room.cancel();
    }
}
