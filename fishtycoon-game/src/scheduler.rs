//! Virtual-time task scheduler for periodic timers and catch-action phases.
//!
//! Single-threaded and cooperative: nothing ever blocks. The caller advances
//! time explicitly and due tasks fire in `(due, insertion)` order, including
//! tasks scheduled by a handler while the same advance is in progress.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Handle to a scheduled task. Periodic tasks keep their handle across fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

impl TimerId {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Phases of one catch action, in order. A task tagged with a phase fires
/// when that phase ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatchPhase {
    Casting,
    Splashing,
    Reeling,
    Settling,
}

impl CatchPhase {
    /// Phase that follows this one, `None` after settling.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Casting => Some(Self::Splashing),
            Self::Splashing => Some(Self::Reeling),
            Self::Reeling => Some(Self::Settling),
            Self::Settling => None,
        }
    }

    /// The catch resolves when the splash ends.
    #[must_use]
    pub const fn resolves_catch(self) -> bool {
        matches!(self, Self::Splashing)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Casting => "casting",
            Self::Splashing => "splashing",
            Self::Reeling => "reeling",
            Self::Settling => "settling",
        }
    }
}

impl fmt::Display for CatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    AutoFish,
    AutoSell,
    CatchPhase(CatchPhase),
}

/// A task that came due during [`Scheduler::pop_due`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTask {
    pub id: TimerId,
    pub kind: TaskKind,
    pub due_ms: u64,
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    id: TimerId,
    kind: TaskKind,
    period_ms: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_seq: u64,
    queue: BTreeMap<(u64, u64), ScheduledTask>,
}

impl Scheduler {
    #[must_use]
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn now(&self) -> u64 {
        self.now_ms
    }

    /// Schedule a one-shot task `delay_ms` from now.
    pub fn schedule_once(&mut self, delay_ms: u64, kind: TaskKind) -> TimerId {
        let id = TimerId(self.bump_seq());
        self.insert(self.now_ms.saturating_add(delay_ms), id, kind, None);
        id
    }

    /// Schedule a repeating task; the first fire is one interval from now.
    pub fn schedule_every(&mut self, interval_ms: u64, kind: TaskKind) -> TimerId {
        let interval_ms = interval_ms.max(1);
        let id = TimerId(self.bump_seq());
        self.insert(
            self.now_ms.saturating_add(interval_ms),
            id,
            kind,
            Some(interval_ms),
        );
        id
    }

    /// Returns whether the task was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|_, task| task.id != id);
        self.queue.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.queue.clear();
    }

    #[must_use]
    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.queue.values().any(|task| task.id == id)
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Due time of the earliest pending task.
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Pop the earliest task due at or before `until_ms`, moving the clock to
    /// its due time. Periodic tasks are re-armed before returning.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<FiredTask> {
        let (&(due_ms, _), _) = self.queue.first_key_value()?;
        if due_ms > until_ms {
            return None;
        }
        let ((due_ms, _), task) = self.queue.pop_first()?;
        self.now_ms = self.now_ms.max(due_ms);
        if let Some(period) = task.period_ms {
            self.insert(due_ms.saturating_add(period), task.id, task.kind, Some(period));
        }
        Some(FiredTask {
            id: task.id,
            kind: task.kind,
            due_ms,
        })
    }

    /// Move the clock forward without firing anything. Time never goes back.
    pub fn advance_to(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    fn insert(&mut self, due_ms: u64, id: TimerId, kind: TaskKind, period_ms: Option<u64>) {
        let order = self.bump_seq();
        self.queue.insert(
            (due_ms, order),
            ScheduledTask {
                id,
                kind,
                period_ms,
            },
        );
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq = self.next_seq.saturating_add(1);
        self.next_seq
    }
}

/// An in-flight catch action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchAction {
    pub timer: TimerId,
    pub phase: CatchPhase,
    pub automatic: bool,
}

/// Handles to every outstanding task, owned by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerHandles {
    pub auto_fish: Option<TimerId>,
    pub auto_sell: Option<TimerId>,
    pub catch_action: Option<CatchAction>,
}

impl TimerHandles {
    #[must_use]
    pub const fn is_fishing(&self) -> bool {
        self.catch_action.is_some()
    }

    /// Cancel every handle and forget them.
    pub fn cancel_all(&mut self, scheduler: &mut Scheduler) {
        scheduler.cancel_all();
        *self = Self::default();
    }
}

/// Clear then re-arm the periodic timers from the current inputs, so there is
/// never more than one live auto-fish or auto-sell timer.
pub fn reconcile_timers(
    handles: &mut TimerHandles,
    scheduler: &mut Scheduler,
    auto_fish_rate: f64,
    auto_sell: bool,
    timers: &crate::config::TimerConfig,
) {
    rearm_auto_fish(handles, scheduler, auto_fish_rate, timers);
    rearm_auto_sell(handles, scheduler, auto_sell, timers);
}

/// Replace the auto-fish timer. None is armed at a zero rate.
pub fn rearm_auto_fish(
    handles: &mut TimerHandles,
    scheduler: &mut Scheduler,
    auto_fish_rate: f64,
    timers: &crate::config::TimerConfig,
) {
    if let Some(id) = handles.auto_fish.take() {
        scheduler.cancel(id);
    }
    if auto_fish_rate > 0.0 {
        handles.auto_fish =
            Some(scheduler.schedule_every(timers.auto_fish_interval_ms, TaskKind::AutoFish));
    }
}

pub fn rearm_auto_sell(
    handles: &mut TimerHandles,
    scheduler: &mut Scheduler,
    auto_sell: bool,
    timers: &crate::config::TimerConfig,
) {
    if let Some(id) = handles.auto_sell.take() {
        scheduler.cancel(id);
    }
    if auto_sell {
        handles.auto_sell =
            Some(scheduler.schedule_every(timers.auto_sell_interval_ms, TaskKind::AutoSell));
    }
}
