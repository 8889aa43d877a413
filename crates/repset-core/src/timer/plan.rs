//! Workout plan: the ordered list of timer definitions.
//!
//! A plan is pure data. Field names serialize in camelCase so the
//! persisted blob stays readable by older `training-timer-state`
//! payloads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Work duration new timers start with, in seconds.
pub const DEFAULT_WORK_SECS: u32 = 60;
/// Interval duration the default plan starts with, in seconds.
pub const DEFAULT_INTERVAL_SECS: u32 = 30;

/// One work block definition: a named exercise with its own durations
/// and set count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerItem {
    /// Stable opaque identifier; survives reorders.
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Work phase length in seconds, always > 0.
    pub work_duration: u32,
    /// Rest phase length in seconds, may be 0.
    pub interval_duration: u32,
    /// Older payloads predate the sets field.
    #[serde(default = "default_sets")]
    pub sets: u32,
}

fn default_sets() -> u32 {
    1
}

impl TimerItem {
    pub fn new(work_duration: u32, interval_duration: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            work_duration,
            interval_duration,
            sets: 1,
        }
    }

    /// Display label: the explicit name, or a positional fallback.
    pub fn label(&self, index: usize) -> String {
        if self.name.is_empty() {
            format!("Timer {}", index + 1)
        } else {
            self.name.clone()
        }
    }

    /// Seconds one full set takes, rest included.
    pub fn set_secs(&self) -> u64 {
        self.work_duration as u64 + self.interval_duration as u64
    }

    pub(crate) fn apply(&mut self, field: TimerField) {
        match field {
            TimerField::Name(name) => self.name = name,
            TimerField::WorkDuration(secs) => self.work_duration = secs,
            TimerField::IntervalDuration(secs) => self.interval_duration = secs,
            TimerField::Sets(n) => self.sets = n,
        }
    }
}

/// One tagged field of a timer edit.
///
/// Edits are submitted as a list of these instead of an untyped partial
/// object, so an update payload is statically checkable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum TimerField {
    Name(String),
    WorkDuration(u32),
    IntervalDuration(u32),
    Sets(u32),
}

impl TimerField {
    /// Whether the payload satisfies the numeric constraints
    /// (`work_duration > 0`, `sets >= 1`).
    ///
    /// Callers filter with this before dispatching; the engine applies
    /// fields as given.
    pub fn is_valid(&self) -> bool {
        match self {
            TimerField::WorkDuration(secs) => *secs > 0,
            TimerField::Sets(n) => *n >= 1,
            TimerField::Name(_) | TimerField::IntervalDuration(_) => true,
        }
    }
}

/// The full ordered plan plus the default-interval setting.
///
/// Order is execution order. A plan always holds at least one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Seconds of rest seeded into newly added timers.
    #[serde(default = "default_interval_seed")]
    pub default_interval: u32,
    #[serde(default)]
    pub timers: Vec<TimerItem>,
}

fn default_interval_seed() -> u32 {
    DEFAULT_INTERVAL_SECS
}

impl Plan {
    /// A single-item plan with the given seed durations.
    pub fn single(work_duration: u32, interval_duration: u32) -> Self {
        Self {
            default_interval: interval_duration,
            timers: vec![TimerItem::new(work_duration, interval_duration)],
        }
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.timers.iter().position(|t| t.id == id)
    }

    /// Append a fresh timer seeded from the default interval.
    pub fn add_timer(&mut self) -> &TimerItem {
        self.timers
            .push(TimerItem::new(DEFAULT_WORK_SECS, self.default_interval));
        &self.timers[self.timers.len() - 1]
    }

    /// Remove the matching item. Returns the removed index, or `None`
    /// when the id is unknown or the item is the last one remaining.
    pub fn remove_timer(&mut self, id: &str) -> Option<usize> {
        if self.timers.len() <= 1 {
            return None;
        }
        let idx = self.index_of(id)?;
        self.timers.remove(idx);
        Some(idx)
    }

    /// Splice one item from `source` to `destination`, shifting the
    /// others. Out-of-range source is a no-op; destination clamps to
    /// the end of the list.
    pub fn reorder_timer(&mut self, source: usize, destination: usize) -> bool {
        if source >= self.timers.len() {
            return false;
        }
        let item = self.timers.remove(source);
        let dest = destination.min(self.timers.len());
        self.timers.insert(dest, item);
        true
    }

    /// Total seconds a full run of the plan takes. The final set of the
    /// final timer has no trailing interval.
    pub fn total_secs(&self) -> u64 {
        let sum: u64 = self
            .timers
            .iter()
            .map(|t| t.sets as u64 * t.set_secs())
            .sum();
        let trailing = self
            .timers
            .last()
            .map(|t| t.interval_duration as u64)
            .unwrap_or(0);
        sum.saturating_sub(trailing)
    }
}
