//! Topological scheduler shared by relative and absolute resolution.
//!
//! Tasks are visited once, in dependency order. Each task starts at the
//! latest of its prerequisites' anchors plus latency (or at the schedule's
//! origin when it has none), and its span is stretched by whatever working
//! time constraints apply.

use crate::adjust::{CalendarConstraints, CapacityConstraints};
use crate::config::ResolveConfig;
use crate::date::Date;
use crate::duration::Duration;
use crate::error::{Result, ScheduleError};
use crate::graph::DependencyGraph;
use crate::models::{Problem, Task};
use crate::schedule::{AbsoluteSchedule, Entry, RelativeSchedule, Schedule, Timeline};
use crate::{log_changes, log_checks, log_debug};

/// How one resolution mode places a task on its time axis.
trait Placement {
    type Time: Timeline;

    /// Start of tasks without prerequisites.
    fn origin(&self) -> Self::Time;

    /// Start and end of `task` given the earliest start its prerequisites allow.
    fn place(&self, task: &Task, earliest: Self::Time, verbosity: u8) -> Result<(Self::Time, Self::Time)>;
}

/// Elapsed-time placement from zero, stretched by capacity constraints.
struct RelativePlacement<'c> {
    capacity: &'c CapacityConstraints,
}

impl Placement for RelativePlacement<'_> {
    type Time = Duration;

    fn origin(&self) -> Duration {
        Duration::ZERO
    }

    fn place(&self, task: &Task, earliest: Duration, verbosity: u8) -> Result<(Duration, Duration)> {
        let span = self.capacity.stretch(&task.duration());
        if self.capacity.is_active() {
            log_checks!(
                verbosity,
                "  {}: {} stretched to {}",
                task.name(),
                task.duration(),
                span
            );
        }
        Ok((earliest, earliest.advance(&span)?))
    }
}

/// Calendar placement from a commencement date.
///
/// The nominal end is the unadjusted start plus the stretched span; start and
/// end are then moved into working time independently. An end that would
/// leave less than the nominal duration after the adjusted start is re-derived
/// from that start.
struct CalendarPlacement<'c> {
    commencement: Date,
    calendar: &'c CalendarConstraints,
    capacity: CapacityConstraints,
}

impl<'c> CalendarPlacement<'c> {
    fn new(commencement: Date, calendar: &'c CalendarConstraints) -> Self {
        Self {
            commencement,
            calendar,
            capacity: calendar.capacity(),
        }
    }

    fn adjust(&self, name: &str, what: &str, date: Date, verbosity: u8) -> Result<Date> {
        let adjusted = self.calendar.adjust(&date)?;
        if adjusted != date {
            log_checks!(verbosity, "  {}: {} moved from {} to {}", name, what, date, adjusted);
        }
        Ok(adjusted)
    }
}

impl Placement for CalendarPlacement<'_> {
    type Time = Date;

    fn origin(&self) -> Date {
        self.commencement
    }

    fn place(&self, task: &Task, earliest: Date, verbosity: u8) -> Result<(Date, Date)> {
        let name = task.name();
        let span = self.capacity.stretch(&task.duration());
        if self.capacity.is_active() {
            log_checks!(verbosity, "  {}: {} stretched to {}", name, task.duration(), span);
        }
        let nominal_end = earliest.checked_add(&span)?;

        let start = self.adjust(name, "start", earliest, verbosity)?;
        let mut end = self.adjust(name, "end", nominal_end, verbosity)?;

        let floor = start.checked_add(&task.duration())?;
        if end < floor {
            end = self.calendar.adjust(&floor)?;
            log_checks!(
                verbosity,
                "  {}: end raised to {} to fit duration {}",
                name,
                end,
                task.duration()
            );
        }
        Ok((start, end))
    }
}

/// Resolves problems into schedules.
#[derive(Clone, Debug, Default)]
pub struct Resolver {
    config: ResolveConfig,
}

impl Resolver {
    pub fn new(config: ResolveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    /// Relative schedule: tasks placed at elapsed-time offsets from zero.
    ///
    /// # Returns
    /// * `Err(ScheduleError::Unschedulable)` if the prerequisites form a cycle
    pub fn relative(&self, problem: &Problem, capacity: &CapacityConstraints) -> Result<RelativeSchedule> {
        self.run(problem, &RelativePlacement { capacity })
    }

    /// Absolute schedule: tasks placed on the calendar from `commencement`.
    ///
    /// # Returns
    /// * `Err(ScheduleError::Unschedulable)` if the prerequisites form a cycle
    /// * `Err(ScheduleError::InvalidDate)` if a computed date leaves the supported range
    pub fn calendar(
        &self,
        problem: &Problem,
        commencement: Date,
        calendar: &CalendarConstraints,
    ) -> Result<AbsoluteSchedule> {
        self.run(problem, &CalendarPlacement::new(commencement, calendar))
    }

    fn run<P: Placement>(&self, problem: &Problem, placement: &P) -> Result<Schedule<P::Time>> {
        let verbosity = self.config.verbosity;

        let graph = DependencyGraph::new(problem);
        log_debug!(
            verbosity,
            "Dependency graph: {} tasks, {} edges",
            graph.node_count(),
            graph.edges().len()
        );
        for edge in graph.edges() {
            log_debug!(
                verbosity,
                "  {} {} ({}) -> {}",
                edge.prerequisite,
                edge.anchor,
                edge.latency,
                edge.dependent
            );
        }

        let order = graph.topological_order()?;
        log_debug!(verbosity, "Topological order: {}", order.join(", "));

        let mut schedule = Schedule::with_capacity(order.len());
        for name in order {
            let task = problem.get(name).ok_or_else(|| {
                ScheduleError::MalformedInput(format!("task {:?} vanished from the problem", name))
            })?;

            let earliest = earliest_start(task, &schedule, placement.origin())?;
            let (start, end) = placement.place(task, earliest, verbosity)?;
            log_changes!(verbosity, "{}: {} -> {}", name, start, end);

            schedule.insert(Entry::new(task.clone(), start, end)?)?;
        }
        Ok(schedule)
    }
}

/// Latest prerequisite anchor plus latency, or `origin` without prerequisites.
fn earliest_start<T: Timeline>(task: &Task, schedule: &Schedule<T>, origin: T) -> Result<T> {
    let mut earliest: Option<T> = None;
    for prerequisite in task.prerequisites() {
        let anchor = schedule
            .anchor_value(&prerequisite.target, prerequisite.anchor)
            .ok_or_else(|| ScheduleError::UnknownReference {
                task: task.name().to_string(),
                target: prerequisite.target.clone(),
            })?;
        let candidate = anchor.advance(&prerequisite.latency)?;
        earliest = Some(earliest.map_or(candidate, |current| current.max(candidate)));
    }
    Ok(earliest.unwrap_or(origin))
}

/// Resolve a relative schedule with silent logging.
///
/// # Arguments
/// * `max_daily_hours` - Productive hours per day, strictly between 0 and 24
/// * `rest_days_per_week` - Rest days per week, between 1 and 6
///
/// # Returns
/// * `Err(ScheduleError::InvalidParameter)` if a parameter is out of range,
///   checked before anything else
/// * `Err(ScheduleError::Unschedulable)` if the prerequisites form a cycle
pub fn resolve_relative(
    problem: &Problem,
    max_daily_hours: Option<f64>,
    rest_days_per_week: Option<u32>,
) -> Result<RelativeSchedule> {
    let capacity = CapacityConstraints::from_options(max_daily_hours, rest_days_per_week)?;
    Resolver::default().relative(problem, &capacity)
}

/// Resolve an absolute schedule with silent logging.
///
/// # Arguments
/// * `commencement` - Start date, `DD/MM/YYYY[/HH[:MM[:SS]]]`
/// * `hour_window` - Daily working hours as `H-H`, e.g. `9-18`
/// * `rest_weekdays` - Weekday names, e.g. `samedi dimanche`
///
/// # Returns
/// * `Err(ScheduleError::InvalidParameter)` for a bad window or weekday set
/// * `Err(ScheduleError::MalformedInput)` / `Err(ScheduleError::InvalidDate)`
///   for a bad commencement date
/// * `Err(ScheduleError::Unschedulable)` if the prerequisites form a cycle
pub fn resolve_calendar(
    problem: &Problem,
    commencement: &str,
    hour_window: Option<&str>,
    rest_weekdays: Option<&str>,
) -> Result<AbsoluteSchedule> {
    let calendar = CalendarConstraints::parse(hour_window, rest_weekdays)?;
    let commencement: Date = commencement.parse()?;
    Resolver::default().calendar(problem, commencement, &calendar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::VERBOSITY_DEBUG;
    use crate::models::Anchor;
    use crate::parse::parse_problem;

    const SCENARIO_A: &str = "
        A / 1 an / B fin (1 an) | C debut / cA
        B / 2 ans / C fin / cB
        C / 4 ans / / cC
    ";

    const DEMO: &str = "
A / 3 ans + 2 semaines / / Decryptage du probleme
B / 2 semaine + 4 jours / A fin (2 jours + 3 heures) / Developpement du projet
C / 2 heures + 23 minutes / B debut (2 jours + 3 heures) / Envoyer la requête à l'agence
D / 3 ans / A fin | C fin (10 mois) / Developpement de la plateforme publique
E / 1 seconde / D fin / Ouverture du projet
";

    const CYCLE: &str = "
        A / 1 an / B fin (1 an) | C debut / cA
        B / 2 ans / C fin / cB
        C / 4 ans / A fin / cC
    ";

    fn years(n: u64) -> Duration {
        Duration::from_years(n)
    }

    fn span(schedule: &RelativeSchedule, name: &str) -> (Duration, Duration) {
        let entry = schedule.get(name).unwrap();
        (entry.start(), entry.end())
    }

    fn dates(schedule: &AbsoluteSchedule, name: &str) -> (String, String) {
        let entry = schedule.get(name).unwrap();
        (entry.start().to_string(), entry.end().to_string())
    }

    fn at(day: u32, month: u32, year: i32, hour: u32, minute: u32) -> Date {
        Date::new(day, month, year, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_relative_scenario_a() {
        let problem = parse_problem(SCENARIO_A).unwrap();
        let schedule = resolve_relative(&problem, None, None).unwrap();

        assert_eq!(schedule.len(), 3);
        assert_eq!(span(&schedule, "C"), (years(0), years(4)));
        assert_eq!(span(&schedule, "B"), (years(4), years(6)));
        assert_eq!(span(&schedule, "A"), (years(7), years(8)));
        assert_eq!(
            schedule.iter().map(|e| e.name()).collect::<Vec<_>>(),
            vec!["C", "B", "A"]
        );
        assert!(schedule.is_consistent());
    }

    #[test]
    fn test_relative_start_is_latest_prerequisite() {
        let problem = parse_problem(DEMO).unwrap();
        let schedule = resolve_relative(&problem, Some(12.0), Some(2)).unwrap();

        for entry in &schedule {
            let expected = entry
                .task()
                .prerequisites()
                .iter()
                .map(|p| {
                    schedule
                        .anchor_value(&p.target, p.anchor)
                        .unwrap()
                        .advance(&p.latency)
                        .unwrap()
                })
                .max()
                .unwrap_or(Duration::ZERO);
            assert_eq!(entry.start(), expected, "start of {}", entry.name());
        }
        assert!(schedule.is_consistent());
    }

    #[test]
    fn test_relative_unconstrained_span_equals_duration() {
        let problem = parse_problem(DEMO).unwrap();
        let schedule = resolve_relative(&problem, None, None).unwrap();
        for entry in &schedule {
            assert_eq!(
                entry.end(),
                entry.start() + entry.task().duration(),
                "{}",
                entry.name()
            );
        }
    }

    #[test]
    fn test_relative_constrained_span_is_longer() {
        let problem = parse_problem(DEMO).unwrap();
        for (daily, rest) in [(Some(12.0), None), (None, Some(2)), (Some(8.0), Some(1))] {
            let schedule = resolve_relative(&problem, daily, rest).unwrap();
            for entry in &schedule {
                assert!(entry.end() >= entry.start() + entry.task().duration());
            }
            // Sub-day remainders pass through, so only multi-day tasks must grow
            let a = schedule.get("A").unwrap();
            assert!(a.end() > a.start() + a.task().duration());
        }
    }

    #[test]
    fn test_relative_capacity_composition() {
        let problem = parse_problem("A / 60 heures / / a\nB / 1 heure / A fin / b").unwrap();
        let schedule = resolve_relative(&problem, Some(12.0), Some(2)).unwrap();
        // 60h at 12h/day is 5 days, then 5 active days a week is one week
        assert_eq!(span(&schedule, "A"), (Duration::ZERO, Duration::from_weeks(1)));
        assert_eq!(schedule.get("B").unwrap().start(), Duration::from_weeks(1));

        let daily_only = resolve_relative(&problem, Some(12.0), None).unwrap();
        assert_eq!(daily_only.get("A").unwrap().end(), Duration::from_days(5));
    }

    #[test]
    fn test_relative_idempotent() {
        let problem = parse_problem(DEMO).unwrap();
        assert_eq!(
            resolve_relative(&problem, Some(9.5), Some(3)).unwrap(),
            resolve_relative(&problem, Some(9.5), Some(3)).unwrap()
        );
    }

    #[test]
    fn test_relative_rejects_parameters() {
        let problem = parse_problem(SCENARIO_A).unwrap();
        for (daily, rest) in [(Some(0.0), None), (Some(24.0), None), (None, Some(0)), (None, Some(7))] {
            assert!(matches!(
                resolve_relative(&problem, daily, rest),
                Err(ScheduleError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_parameters_checked_before_graph() {
        let problem = parse_problem(CYCLE).unwrap();
        assert!(matches!(
            resolve_relative(&problem, Some(24.0), None),
            Err(ScheduleError::InvalidParameter(_))
        ));
        assert!(matches!(
            resolve_calendar(&problem, "23/12/1998", Some("9-9"), None),
            Err(ScheduleError::InvalidParameter(_))
        ));
        assert!(matches!(
            resolve_calendar(&problem, "23-12-1998", None, None),
            Err(ScheduleError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_cycle_rejected_in_both_modes() {
        let problem = parse_problem(CYCLE).unwrap();
        let expected = ScheduleError::Unschedulable(vec![
            "A".to_string(),
            "B".to_string(),
            "C".to_string(),
        ]);
        assert_eq!(resolve_relative(&problem, None, None), Err(expected.clone()));
        assert_eq!(
            resolve_calendar(&problem, "23/12/1998", None, None),
            Err(expected)
        );
    }

    #[test]
    fn test_calendar_scenario_a() {
        let problem = parse_problem(SCENARIO_A).unwrap();
        let schedule = resolve_calendar(&problem, "23/12/1998", None, None).unwrap();

        let midnight = |d: &str| format!("{}/00:00:00", d);
        assert_eq!(
            dates(&schedule, "C"),
            (midnight("23/12/1998"), midnight("23/12/2002"))
        );
        assert_eq!(
            dates(&schedule, "B"),
            (midnight("23/12/2002"), midnight("23/12/2004"))
        );
        assert_eq!(
            dates(&schedule, "A"),
            (midnight("23/12/2005"), midnight("23/12/2006"))
        );
        assert!(schedule.is_consistent());
    }

    #[test]
    fn test_calendar_demo_latencies() {
        let problem = parse_problem(DEMO).unwrap();
        let schedule = resolve_calendar(&problem, "23/12/1998", None, None).unwrap();

        let a = schedule.get("A").unwrap();
        assert_eq!((a.start(), a.end()), (at(23, 12, 1998, 0, 0), at(6, 1, 2002, 0, 0)));
        let b = schedule.get("B").unwrap();
        assert_eq!((b.start(), b.end()), (at(8, 1, 2002, 3, 0), at(26, 1, 2002, 3, 0)));
        let c = schedule.get("C").unwrap();
        assert_eq!((c.start(), c.end()), (at(10, 1, 2002, 6, 0), at(10, 1, 2002, 8, 23)));
        assert!(schedule.is_consistent());
    }

    #[test]
    fn test_calendar_window_moves_start() {
        let problem = parse_problem("A / 2 heures / / a").unwrap();
        // 12 October 1998 was a Monday
        let schedule = resolve_calendar(&problem, "12/10/1998/12:00", Some("13-18"), None).unwrap();
        let a = schedule.get("A").unwrap();
        assert_eq!(a.start(), at(12, 10, 1998, 13, 0));
        assert!(a.end() >= a.start().checked_add(&Duration::from_hours(2)).unwrap());
    }

    #[test]
    fn test_calendar_rest_weekdays_skip_start() {
        let problem = parse_problem("A / 1 jour / / a").unwrap();
        let schedule =
            resolve_calendar(&problem, "12/10/1998/12:00", None, Some("lundi mardi")).unwrap();
        let a = schedule.get("A").unwrap();
        assert_eq!(a.start(), at(14, 10, 1998, 12, 0));
        assert!(!matches!(
            a.end().weekday(),
            chrono::Weekday::Mon | chrono::Weekday::Tue
        ));
    }

    #[test]
    fn test_calendar_entries_stay_in_working_time() {
        let problem = parse_problem(DEMO).unwrap();
        let calendar = CalendarConstraints::parse(Some("9-18"), Some("samedi dimanche")).unwrap();
        let schedule = Resolver::default()
            .calendar(&problem, at(23, 12, 1998, 0, 0), &calendar)
            .unwrap();

        for entry in &schedule {
            for instant in [entry.start(), entry.end()] {
                assert!((9..18).contains(&instant.hour()), "{} at {}", entry.name(), instant);
                assert!(!matches!(
                    instant.weekday(),
                    chrono::Weekday::Sat | chrono::Weekday::Sun
                ));
            }
            assert!(entry.end() >= entry.start().checked_add(&entry.task().duration()).unwrap());
        }
    }

    #[test]
    fn test_calendar_window_stretches_span() {
        // Eight hours of work in a 9-17 window take a full day
        let problem = parse_problem("A / 8 heures / / a").unwrap();
        let schedule = resolve_calendar(&problem, "12/10/1998/09:00", Some("9-17"), None).unwrap();
        let a = schedule.get("A").unwrap();
        assert_eq!((a.start(), a.end()), (at(12, 10, 1998, 9, 0), at(13, 10, 1998, 9, 0)));
    }

    #[test]
    fn test_calendar_rest_weekdays_stretch_span() {
        let weekend = Some("samedi dimanche");

        // Five working days from a Monday span the whole week
        let problem = parse_problem("A / 5 jours / / a").unwrap();
        let schedule = resolve_calendar(&problem, "12/10/1998/09:00", None, weekend).unwrap();
        let a = schedule.get("A").unwrap();
        assert_eq!((a.start(), a.end()), (at(12, 10, 1998, 9, 0), at(19, 10, 1998, 9, 0)));

        // Three days from a Thursday end on Sunday, pushed to Monday
        let problem = parse_problem("B / 3 jours / / b").unwrap();
        let schedule = resolve_calendar(&problem, "15/10/1998/09:00", None, weekend).unwrap();
        let b = schedule.get("B").unwrap();
        assert_eq!((b.start(), b.end()), (at(15, 10, 1998, 9, 0), at(19, 10, 1998, 9, 0)));
    }

    #[test]
    fn test_calendar_window_opening_late_in_day() {
        let problem = parse_problem("A / 1 heure / / a").unwrap();
        let schedule =
            resolve_calendar(&problem, "12/10/1998/12:00", Some("23.99999-5"), None).unwrap();
        let a = schedule.get("A").unwrap();
        assert_eq!(a.start(), Date::new(12, 10, 1998, 23, 59, 59).unwrap());
        assert!(a.end() >= a.start().checked_add(&Duration::from_hours(1)).unwrap());
    }

    #[test]
    fn test_calendar_end_floor() {
        // Starts at the window opening; the nominal end computed from the
        // unadjusted start would be too early.
        let problem = parse_problem("A / 1 heure / / a").unwrap();
        let schedule = resolve_calendar(&problem, "12/10/1998/06:00", Some("9-17"), None).unwrap();
        let a = schedule.get("A").unwrap();
        assert_eq!(a.start(), at(12, 10, 1998, 9, 0));
        assert_eq!(a.end(), at(12, 10, 1998, 10, 0));
    }

    #[test]
    fn test_calendar_idempotent() {
        let problem = parse_problem(DEMO).unwrap();
        let resolve = || resolve_calendar(&problem, "23/12/1998/08:30", Some("8-16"), Some("dimanche"));
        assert_eq!(resolve().unwrap(), resolve().unwrap());
    }

    #[test]
    fn test_resolver_with_logging() {
        let problem = parse_problem(SCENARIO_A).unwrap();
        let resolver = Resolver::new(ResolveConfig::default().with_verbosity(VERBOSITY_DEBUG));
        let capacity = CapacityConstraints::from_options(Some(12.0), None).unwrap();
        let schedule = resolver.relative(&problem, &capacity).unwrap();
        assert_eq!(
            schedule.anchor_value("C", Anchor::End),
            Some(Duration::from_years(8))
        );
    }
}
