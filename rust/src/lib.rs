//! Task scheduling engine.
//!
//! A [`Problem`] lists tasks with durations and prerequisites ("B may start
//! two days after A ends"). Resolution walks the tasks in dependency order
//! and places each one either at elapsed-time offsets from zero
//! ([`resolve_relative`]) or on the calendar from a commencement date
//! ([`resolve_calendar`]), stretching durations and moving instants to honor
//! working-time constraints.

// Allow clippy warning triggered by PyO3 macro expansion
#![cfg_attr(feature = "python", allow(clippy::useless_conversion))]

pub mod adjust;
pub mod config;
pub mod date;
pub mod duration;
pub mod error;
pub mod graph;
pub mod logging;
pub mod models;
pub mod parse;
pub mod schedule;
pub mod scheduler;

#[cfg(feature = "python")]
mod python;

pub use adjust::{
    CalendarConstraints, CapacityConstraints, DailyCap, HourWindow, RestDays, RestWeekdays,
};
pub use config::ResolveConfig;
pub use date::Date;
pub use duration::Duration;
pub use error::{Result, ScheduleError};
pub use graph::{DependencyGraph, Edge};
pub use models::{Anchor, Prerequisite, Problem, Task};
pub use parse::{parse_duration, parse_problem};
pub use schedule::{
    AbsoluteSchedule, Activity, Datation, Entry, RelativeSchedule, Schedule, Timeline,
};
pub use scheduler::{resolve_calendar, resolve_relative, Resolver};

/// The ordo_rust Python module.
#[cfg(feature = "python")]
#[pyo3::pymodule]
fn ordo_rust(m: &pyo3::Bound<'_, pyo3::types::PyModule>) -> pyo3::PyResult<()> {
    python::register(m)
}
