//! Reader for the problem description language.
//!
//! One task per line:
//!
//! ```text
//! <name> / <duration> / <prerequisites> / <label>
//! ```
//!
//! - `<duration>`: `N unit [+ N unit ...]` with French unit names
//!   (`seconde`, `minute`, `heure`, `jour`, `semaine`, `mois`, `an`/`annee`)
//! - `<prerequisites>`: `<name> <debut|fin> [(<duration>)]` separated by `|`,
//!   possibly empty; a missing duration means no latency
//! - `<label>`: free text, a single space when empty
//!
//! Blank lines are skipped.

use std::str::FromStr;

use crate::duration::Duration;
use crate::error::{Result, ScheduleError};
use crate::models::{Anchor, Prerequisite, Problem, Task};

/// Parse a duration expression such as `2 jours + 3 heures`.
pub fn parse_duration(expr: &str) -> Result<Duration> {
    if expr.trim().is_empty() {
        return Err(ScheduleError::MalformedInput(
            "duration expression is empty".to_string(),
        ));
    }

    let mut total = Duration::ZERO;
    for term in expr.split('+') {
        let words: Vec<&str> = term.split_whitespace().collect();
        let [amount, unit] = words.as_slice() else {
            return Err(ScheduleError::MalformedInput(format!(
                "duration term {:?} must be an amount followed by a unit",
                term.trim()
            )));
        };
        let amount: i64 = amount.parse().map_err(|_| {
            ScheduleError::MalformedInput(format!("amount {:?} is not numeric", amount))
        })?;
        total = total.checked_add(&unit_duration(amount, unit)?)?;
    }
    Ok(total)
}

/// One `amount unit` term as a duration.
fn unit_duration(amount: i64, unit: &str) -> Result<Duration> {
    let fields = match unit.to_lowercase().as_str() {
        "seconde" | "secondes" => [amount, 0, 0, 0, 0, 0, 0],
        "minute" | "minutes" => [0, amount, 0, 0, 0, 0, 0],
        "heure" | "heures" => [0, 0, amount, 0, 0, 0, 0],
        "jour" | "jours" => [0, 0, 0, amount, 0, 0, 0],
        "semaine" | "semaines" => [0, 0, 0, 0, amount, 0, 0],
        "mois" => [0, 0, 0, 0, 0, amount, 0],
        "an" | "ans" | "annee" | "annees" | "année" | "années" => [0, 0, 0, 0, 0, 0, amount],
        _ => {
            return Err(ScheduleError::MalformedInput(format!(
                "unknown time unit {:?}",
                unit
            )))
        }
    };
    let [seconds, minutes, hours, days, weeks, months, years] = fields;
    Duration::new(seconds, minutes, hours, days, weeks, months, years)
}

/// Parse `debut`/`début` or `fin`.
pub fn parse_anchor(word: &str) -> Result<Anchor> {
    match word.to_lowercase().as_str() {
        "debut" | "début" => Ok(Anchor::Start),
        "fin" => Ok(Anchor::End),
        _ => Err(ScheduleError::MalformedInput(format!(
            "prerequisite anchor {:?} must be 'debut' or 'fin'",
            word
        ))),
    }
}

/// Parse a single prerequisite such as `A fin (2 jours)`.
pub fn parse_prerequisite(text: &str) -> Result<Prerequisite> {
    let (head, latency) = match text.split_once('(') {
        None => (text, Duration::ZERO),
        Some((head, tail)) => {
            let inner = tail.trim().strip_suffix(')').ok_or_else(|| {
                ScheduleError::MalformedInput(format!(
                    "latency in prerequisite {:?} is missing its closing parenthesis",
                    text.trim()
                ))
            })?;
            let latency = if inner.trim().is_empty() {
                Duration::ZERO
            } else {
                parse_duration(inner)?
            };
            (head, latency)
        }
    };

    let words: Vec<&str> = head.split_whitespace().collect();
    let [target, anchor] = words.as_slice() else {
        return Err(ScheduleError::MalformedInput(format!(
            "prerequisite {:?} must be a task name followed by 'debut' or 'fin'",
            text.trim()
        )));
    };
    Ok(Prerequisite::new(*target, parse_anchor(anchor)?, latency))
}

/// Parse a `|`-separated prerequisite list; blank means none.
pub fn parse_prerequisites(list: &str) -> Result<Vec<Prerequisite>> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }
    list.split('|').map(parse_prerequisite).collect()
}

/// Parse one task line.
pub fn parse_task(line: &str) -> Result<Task> {
    let fields: Vec<&str> = line.splitn(4, '/').collect();
    let [name, duration, prerequisites, label] = fields.as_slice() else {
        return Err(ScheduleError::MalformedInput(format!(
            "task line {:?} must have the form 'name / duration / prerequisites / label'",
            line.trim()
        )));
    };

    let name = name.trim();
    if duration.trim().is_empty() {
        return Err(ScheduleError::MalformedInput(format!(
            "task {:?} has no duration",
            name
        )));
    }

    Task::new(
        name,
        parse_duration(duration)?,
        parse_prerequisites(prerequisites)?,
        label.trim(),
    )
}

/// Parse a whole problem description.
///
/// Malformed-input errors are prefixed with the 1-based line number.
pub fn parse_problem(text: &str) -> Result<Problem> {
    let mut tasks = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let task = parse_task(line).map_err(|err| match err {
            ScheduleError::MalformedInput(msg) => {
                ScheduleError::MalformedInput(format!("line {}: {}", number + 1, msg))
            }
            other => other,
        })?;
        tasks.push(task);
    }
    Problem::new(tasks)
}

impl FromStr for Duration {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        parse_duration(s)
    }
}

impl FromStr for Problem {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        parse_problem(s)
    }
}
