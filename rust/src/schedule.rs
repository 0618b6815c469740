//! Computed schedules: one entry per task with its start and end.
//!
//! The same containers serve both resolution modes through [`Timeline`]:
//! relative schedules place tasks at [`Duration`] offsets from zero, absolute
//! schedules at calendar [`Date`]s.

use rustc_hash::FxHashMap;
use std::fmt;

use crate::date::Date;
use crate::duration::Duration;
use crate::error::{Result, ScheduleError};
use crate::models::{Anchor, Task};

/// A point on a schedule's time axis.
pub trait Timeline: Copy + Ord + fmt::Debug + fmt::Display {
    /// The point `span` later.
    fn advance(&self, span: &Duration) -> Result<Self>;
}

impl Timeline for Duration {
    fn advance(&self, span: &Duration) -> Result<Self> {
        self.checked_add(span)
    }
}

impl Timeline for Date {
    fn advance(&self, span: &Duration) -> Result<Self> {
        self.checked_add(span)
    }
}

/// A task placed on a time axis.
///
/// Always satisfies `start <= end` and `start + task duration <= end`.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry<T> {
    task: Task,
    start: T,
    end: T,
}

/// Entry of a relative schedule.
pub type Activity = Entry<Duration>;
/// Entry of an absolute schedule.
pub type Datation = Entry<Date>;

impl<T: Timeline> Entry<T> {
    /// # Returns
    /// * `Err(ScheduleError::OrderingViolation)` if the end precedes the start or
    ///   leaves less room than the task's duration
    pub fn new(task: Task, start: T, end: T) -> Result<Self> {
        if end < start {
            return Err(ScheduleError::OrderingViolation {
                task: task.name().to_string(),
                reason: format!("ends at {} before starting at {}", end, start),
            });
        }
        let earliest_end = start.advance(&task.duration())?;
        if end < earliest_end {
            return Err(ScheduleError::OrderingViolation {
                task: task.name().to_string(),
                reason: format!(
                    "runs from {} to {}, shorter than its duration {}",
                    start,
                    end,
                    task.duration()
                ),
            });
        }
        Ok(Self { task, start, end })
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    pub fn start(&self) -> T {
        self.start
    }

    pub fn end(&self) -> T {
        self.end
    }

    pub fn anchor_value(&self, anchor: Anchor) -> T {
        match anchor {
            Anchor::Start => self.start,
            Anchor::End => self.end,
        }
    }

    /// Whether the start respects every prerequisite already placed in `schedule`.
    ///
    /// A prerequisite missing from the schedule counts as a violation.
    fn respects_prerequisites(&self, schedule: &Schedule<T>) -> bool {
        self.task.prerequisites().iter().all(|prerequisite| {
            schedule
                .anchor_value(&prerequisite.target, prerequisite.anchor)
                .and_then(|anchor| anchor.advance(&prerequisite.latency).ok())
                .is_some_and(|earliest| self.start >= earliest)
        })
    }
}

impl<T: Timeline> fmt::Display for Entry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.task.name(), self.start, self.end)
    }
}

/// Insertion-ordered entries keyed by task name.
#[derive(Clone, Debug)]
pub struct Schedule<T> {
    entries: Vec<Entry<T>>,
    index: FxHashMap<String, usize>,
}

/// Schedule of elapsed-time offsets from zero.
pub type RelativeSchedule = Schedule<Duration>;
/// Schedule of calendar instants.
pub type AbsoluteSchedule = Schedule<Date>;

impl<T> Default for Schedule<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<T: Timeline> Schedule<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Append an entry.
    ///
    /// # Returns
    /// * `Err(ScheduleError::DuplicateTask)` if the task already has an entry
    pub fn insert(&mut self, entry: Entry<T>) -> Result<()> {
        if self.index.contains_key(entry.name()) {
            return Err(ScheduleError::DuplicateTask(entry.name().to_string()));
        }
        self.index.insert(entry.name().to_string(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Entry<T>> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry<T>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start or end of an already placed task.
    pub fn anchor_value(&self, name: &str, anchor: Anchor) -> Option<T> {
        self.get(name).map(|entry| entry.anchor_value(anchor))
    }

    /// Whether every entry starts no earlier than each of its prerequisites'
    /// anchor plus latency.
    pub fn is_consistent(&self) -> bool {
        self.entries
            .iter()
            .all(|entry| entry.respects_prerequisites(self))
    }
}

impl<T: PartialEq> PartialEq for Schedule<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<'s, T> IntoIterator for &'s Schedule<T> {
    type Item = &'s Entry<T>;
    type IntoIter = std::slice::Iter<'s, Entry<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<T: Timeline> fmt::Display for Schedule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}
