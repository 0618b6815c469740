//! Python bindings, enabled with the `python` feature.
//!
//! Errors surface as `ValueError` carrying the message.

use chrono::NaiveDateTime;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::adjust::{CalendarConstraints, CapacityConstraints};
use crate::config::ResolveConfig;
use crate::date::Date;
use crate::error::ScheduleError;
use crate::logging::VERBOSITY_SILENT;
use crate::models::Problem;
use crate::parse::parse_problem;
use crate::schedule::{Entry, Schedule, Timeline};
use crate::scheduler::Resolver;

impl From<ScheduleError> for PyErr {
    fn from(err: ScheduleError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[pymethods]
impl ResolveConfig {
    #[new]
    #[pyo3(signature = (verbosity=VERBOSITY_SILENT))]
    fn py_new(verbosity: u8) -> Self {
        Self::default().with_verbosity(verbosity)
    }

    fn __repr__(&self) -> String {
        format!("ResolveConfig(verbosity={})", self.verbosity)
    }
}

/// A parsed problem (PyO3 wrapper).
#[pyclass(name = "Problem", frozen)]
#[derive(Clone, Debug)]
pub struct PyProblem {
    inner: Problem,
}

#[pymethods]
impl PyProblem {
    #[new]
    fn new(text: &str) -> PyResult<Self> {
        Ok(Self {
            inner: parse_problem(text)?,
        })
    }

    /// Task names in description order.
    fn names(&self) -> Vec<String> {
        self.inner.names().map(str::to_string).collect()
    }

    /// (name, label) pairs in description order.
    fn labels(&self) -> Vec<(String, String)> {
        self.inner
            .labels()
            .map(|(name, label)| (name.to_string(), label.to_string()))
            .collect()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }

    fn __repr__(&self) -> String {
        format!("Problem({} tasks)", self.inner.len())
    }
}

/// One scheduled task (PyO3 wrapper).
///
/// `start` and `end` use the text forms of durations and dates; absolute
/// entries also carry them as datetimes.
#[pyclass(name = "Entry", frozen)]
#[derive(Clone, Debug)]
pub struct PyEntry {
    #[pyo3(get)]
    pub name: String,
    #[pyo3(get)]
    pub label: String,
    #[pyo3(get)]
    pub duration: String,
    #[pyo3(get)]
    pub start: String,
    #[pyo3(get)]
    pub end: String,
    #[pyo3(get)]
    pub start_datetime: Option<NaiveDateTime>,
    #[pyo3(get)]
    pub end_datetime: Option<NaiveDateTime>,
}

#[pymethods]
impl PyEntry {
    fn __repr__(&self) -> String {
        format!(
            "Entry(name={:?}, start={:?}, end={:?})",
            self.name, self.start, self.end
        )
    }
}

impl<T: Timeline> From<&Entry<T>> for PyEntry {
    fn from(entry: &Entry<T>) -> Self {
        Self {
            name: entry.name().to_string(),
            label: entry.task().label().to_string(),
            duration: entry.task().duration().to_string(),
            start: entry.start().to_string(),
            end: entry.end().to_string(),
            start_datetime: None,
            end_datetime: None,
        }
    }
}

fn relative_entries<T: Timeline>(schedule: &Schedule<T>) -> Vec<PyEntry> {
    schedule.iter().map(PyEntry::from).collect()
}

fn calendar_entries(schedule: &Schedule<Date>) -> Vec<PyEntry> {
    schedule
        .iter()
        .map(|entry| PyEntry {
            start_datetime: Some(entry.start().as_naive()),
            end_datetime: Some(entry.end().as_naive()),
            ..PyEntry::from(entry)
        })
        .collect()
}

/// Parse a problem description, one `name / duration / prerequisites / label` per line.
#[pyfunction]
fn parse_problem_text(text: &str) -> PyResult<PyProblem> {
    PyProblem::new(text)
}

/// Resolve a relative schedule.
///
/// # Raises
/// * ValueError if a parameter is out of range or the prerequisites form a cycle
#[pyfunction]
#[pyo3(signature = (problem, max_daily_hours=None, rest_days_per_week=None, config=None))]
fn resolve_relative(
    problem: &PyProblem,
    max_daily_hours: Option<f64>,
    rest_days_per_week: Option<u32>,
    config: Option<ResolveConfig>,
) -> PyResult<Vec<PyEntry>> {
    let capacity = CapacityConstraints::from_options(max_daily_hours, rest_days_per_week)?;
    let resolver = Resolver::new(config.unwrap_or_default());
    let schedule = resolver.relative(&problem.inner, &capacity)?;
    Ok(relative_entries(&schedule))
}

/// Resolve an absolute schedule from a `DD/MM/YYYY[/HH[:MM[:SS]]]` commencement date.
///
/// # Raises
/// * ValueError if a parameter or the date is invalid, or the prerequisites form a cycle
#[pyfunction]
#[pyo3(signature = (problem, commencement, hour_window=None, rest_weekdays=None, config=None))]
fn resolve_calendar(
    problem: &PyProblem,
    commencement: &str,
    hour_window: Option<&str>,
    rest_weekdays: Option<&str>,
    config: Option<ResolveConfig>,
) -> PyResult<Vec<PyEntry>> {
    let calendar = CalendarConstraints::parse(hour_window, rest_weekdays)?;
    let commencement: Date = commencement.parse()?;
    let resolver = Resolver::new(config.unwrap_or_default());
    let schedule = resolver.calendar(&problem.inner, commencement, &calendar)?;
    Ok(calendar_entries(&schedule))
}

pub(crate) fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyProblem>()?;
    m.add_class::<PyEntry>()?;
    m.add_class::<ResolveConfig>()?;

    m.add_function(wrap_pyfunction!(parse_problem_text, m)?)?;
    m.add_function(wrap_pyfunction!(resolve_relative, m)?)?;
    m.add_function(wrap_pyfunction!(resolve_calendar, m)?)?;
    Ok(())
}
