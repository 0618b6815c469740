//! Dependency graph of a problem and its topological ordering.

use rustc_hash::FxHashMap;
use std::collections::VecDeque;

use crate::duration::Duration;
use crate::error::{Result, ScheduleError};
use crate::models::{Anchor, Problem};

/// Edge from a prerequisite task to the task that waits on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge<'a> {
    pub prerequisite: &'a str,
    pub dependent: &'a str,
    pub anchor: Anchor,
    pub latency: Duration,
}

/// Directed graph whose nodes are the task names of a problem.
///
/// Every task is a node, including tasks without any prerequisite or
/// dependent.
#[derive(Clone, Debug)]
pub struct DependencyGraph<'a> {
    /// Node names in problem insertion order
    nodes: Vec<&'a str>,
    edges: Vec<Edge<'a>>,
    /// Node -> indices into `edges` leaving it
    outgoing: FxHashMap<&'a str, Vec<usize>>,
    /// Node -> number of prerequisites
    in_degree: FxHashMap<&'a str, usize>,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(problem: &'a Problem) -> Self {
        let nodes: Vec<&'a str> = problem.names().collect();
        let mut edges: Vec<Edge<'a>> = Vec::new();
        let mut outgoing: FxHashMap<&'a str, Vec<usize>> = FxHashMap::default();
        let mut in_degree: FxHashMap<&'a str, usize> = nodes.iter().map(|&n| (n, 0)).collect();

        for task in problem.tasks() {
            for prerequisite in task.prerequisites() {
                outgoing
                    .entry(prerequisite.target.as_str())
                    .or_default()
                    .push(edges.len());
                *in_degree.entry(task.name()).or_insert(0) += 1;
                edges.push(Edge {
                    prerequisite: prerequisite.target.as_str(),
                    dependent: task.name(),
                    anchor: prerequisite.anchor,
                    latency: prerequisite.latency,
                });
            }
        }

        Self {
            nodes,
            edges,
            outgoing,
            in_degree,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[Edge<'a>] {
        &self.edges
    }

    /// Tasks that list `name` as a prerequisite.
    pub fn dependents(&self, name: &str) -> impl Iterator<Item = &'a str> + '_ {
        self.outgoing
            .get(name)
            .into_iter()
            .flatten()
            .map(|&i| self.edges[i].dependent)
    }

    /// Order task names so every prerequisite precedes its dependents.
    ///
    /// Uses Kahn's algorithm seeded in problem order, so the result is the
    /// same on every call.
    ///
    /// # Returns
    /// * `Err(ScheduleError::Unschedulable)` naming the tasks left on or behind a cycle
    pub fn topological_order(&self) -> Result<Vec<&'a str>> {
        let mut in_degree = self.in_degree.clone();

        let mut queue: VecDeque<&'a str> = self
            .nodes
            .iter()
            .copied()
            .filter(|n| in_degree.get(n).copied().unwrap_or(0) == 0)
            .collect();

        let mut order: Vec<&'a str> = Vec::with_capacity(self.nodes.len());

        while let Some(name) = queue.pop_front() {
            order.push(name);

            for dependent in self.dependents(name) {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            let mut blocked: Vec<String> = in_degree
                .into_iter()
                .filter(|&(_, degree)| degree > 0)
                .map(|(name, _)| name.to_string())
                .collect();
            blocked.sort();
            return Err(ScheduleError::Unschedulable(blocked));
        }

        Ok(order)
    }

    pub fn is_acyclic(&self) -> bool {
        self.topological_order().is_ok()
    }
}
