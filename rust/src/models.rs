//! Core data types describing a scheduling problem.

use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

use crate::duration::Duration;
use crate::error::{Result, ScheduleError};

/// Label given to a task that was described without one.
pub const DEFAULT_LABEL: &str = " ";

/// Separators of the description language, which a task name cannot contain.
const RESERVED_NAME_CHARS: [char; 4] = ['/', '|', '(', ')'];

/// Which moment of a prerequisite task the latency is measured from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Anchor {
    Start,
    End,
}

impl Anchor {
    /// Keyword used in problem descriptions.
    pub fn keyword(&self) -> &'static str {
        match self {
            Anchor::Start => "debut",
            Anchor::End => "fin",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A task may not start before `anchor` of `target` plus `latency`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prerequisite {
    pub target: String,
    pub anchor: Anchor,
    pub latency: Duration,
}

impl Prerequisite {
    pub fn new(target: impl Into<String>, anchor: Anchor, latency: Duration) -> Self {
        Self {
            target: target.into(),
            anchor,
            latency,
        }
    }

    /// Prerequisite with no latency.
    pub fn immediate(target: impl Into<String>, anchor: Anchor) -> Self {
        Self::new(target, anchor, Duration::ZERO)
    }
}

/// `<target> <anchor> [(<latency>)]`, as in a description.
impl fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.target, self.anchor)?;
        if !self.latency.is_zero() {
            write!(f, " ({})", self.latency)?;
        }
        Ok(())
    }
}

/// A unit of work to be scheduled.
///
/// Fields are private so a `Task` always satisfies its invariants: a
/// positive duration and prerequisites on distinct tasks other than itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    name: String,
    duration: Duration,
    prerequisites: Vec<Prerequisite>,
    label: String,
}

impl Task {
    /// Create a validated task.
    ///
    /// # Returns
    /// * `Err(ScheduleError::MalformedInput)` if the name is blank, contains
    ///   whitespace or a description-language separator
    /// * `Err(ScheduleError::InvalidValue)` if the duration is zero
    /// * `Err(ScheduleError::DuplicateName)` if two prerequisites share a target
    /// * `Err(ScheduleError::SelfReference)` if a prerequisite targets the task itself
    pub fn new(
        name: impl Into<String>,
        duration: Duration,
        prerequisites: Vec<Prerequisite>,
        label: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ScheduleError::MalformedInput(
                "task name must not be empty".to_string(),
            ));
        }
        if name
            .chars()
            .any(|c| c.is_whitespace() || RESERVED_NAME_CHARS.contains(&c))
        {
            return Err(ScheduleError::MalformedInput(format!(
                "task name {:?} must be a single word without '/', '|', '(' or ')'",
                name
            )));
        }
        if duration.is_zero() {
            return Err(ScheduleError::InvalidValue(format!(
                "task {:?} must have a non-zero duration",
                name
            )));
        }

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for prerequisite in &prerequisites {
            if prerequisite.target == name {
                return Err(ScheduleError::SelfReference(name));
            }
            if !seen.insert(prerequisite.target.as_str()) {
                return Err(ScheduleError::DuplicateName(format!(
                    "task {:?} lists prerequisite {:?} more than once",
                    name, prerequisite.target
                )));
            }
        }

        let label = label.into();
        let label = if label.trim().is_empty() {
            DEFAULT_LABEL.to_string()
        } else {
            label
        };

        Ok(Self {
            name,
            duration,
            prerequisites,
            label,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn prerequisites(&self) -> &[Prerequisite] {
        &self.prerequisites
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// One description line: `<name> / <duration> / <prerequisites> / <label>`.
impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / ", self.name, self.duration)?;
        for (i, prerequisite) in self.prerequisites.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", prerequisite)?;
        }
        write!(f, " / {}", self.label.trim())
    }
}

/// A complete scheduling problem: uniquely named tasks whose prerequisites
/// all refer to tasks of the same problem.
///
/// Built once and read-only afterwards. Iteration follows insertion order.
#[derive(Clone, Debug, Default)]
pub struct Problem {
    tasks: Vec<Task>,
    index: FxHashMap<String, usize>,
}

impl Problem {
    /// Build a problem from its tasks.
    ///
    /// # Returns
    /// * `Err(ScheduleError::DuplicateName)` if two tasks share a name
    /// * `Err(ScheduleError::UnknownReference)` if a prerequisite names a missing task
    pub fn new(tasks: Vec<Task>) -> Result<Self> {
        let mut index: FxHashMap<String, usize> =
            FxHashMap::with_capacity_and_hasher(tasks.len(), Default::default());
        for (position, task) in tasks.iter().enumerate() {
            if index.insert(task.name.clone(), position).is_some() {
                return Err(ScheduleError::DuplicateName(format!(
                    "task name {:?} is used more than once",
                    task.name
                )));
            }
        }

        for task in &tasks {
            for prerequisite in &task.prerequisites {
                if !index.contains_key(&prerequisite.target) {
                    return Err(ScheduleError::UnknownReference {
                        task: task.name.clone(),
                        target: prerequisite.target.clone(),
                    });
                }
            }
        }

        Ok(Self { tasks, index })
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.index.get(name).map(|&position| &self.tasks[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name.as_str())
    }

    /// Task names paired with their labels.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tasks.iter().map(|t| (t.name.as_str(), t.label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl PartialEq for Problem {
    fn eq(&self, other: &Self) -> bool {
        self.tasks == other.tasks
    }
}

impl Eq for Problem {}

/// The problem written in the description language, one task per line.
impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for task in &self.tasks {
            writeln!(f, "{}", task)?;
        }
        Ok(())
    }
}
