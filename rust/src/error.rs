//! Error type shared by every stage of problem construction and resolution.

use thiserror::Error;

/// Errors raised while building a problem or resolving a schedule.
///
/// Every check is fail-fast: the first violation aborts the operation and no
/// partial schedule is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Task {task:?} has a prerequisite on unknown task {target:?}")]
    UnknownReference { task: String, target: String },
    #[error("Task {0:?} lists itself as a prerequisite")]
    SelfReference(String),
    #[error("Duplicate name: {0}")]
    DuplicateName(String),
    #[error("Task {0:?} is already present in the schedule")]
    DuplicateTask(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Circular dependency detected between tasks {0:?}")]
    Unschedulable(Vec<String>),
    #[error("Entry for task {task:?} is out of order: {reason}")]
    OrderingViolation { task: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
