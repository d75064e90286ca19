//! Subtask dependency graph and level partitioning.
//!
//! The `DependencyGraph` maps each subtask to the subtasks it waits on and
//! partitions them into `ParallelGroup` levels: every member of a level has
//! all of its dependencies in strictly earlier levels.

use crate::core::task::{SubTask, TaskId};
use crate::error::{Error, Result};
use crate::wlog_warn;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One level of the dependency DAG. Members may run concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelGroup {
    /// Zero-based position in execution order.
    pub level: usize,
    pub subtask_ids: Vec<TaskId>,
}

impl ParallelGroup {
    pub fn len(&self) -> usize {
        self.subtask_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subtask_ids.is_empty()
    }
}

/// Result of partitioning a dependency graph into levels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouping {
    pub groups: Vec<ParallelGroup>,
    /// Subtasks whose dependencies could never be satisfied.
    pub unresolved: Vec<TaskId>,
}

/// Mapping from subtask id to the ids it depends on.
///
/// Insertion order of subtasks is preserved so level extraction is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    order: Vec<TaskId>,
    edges: HashMap<TaskId, Vec<TaskId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph straight from each subtask's `dependencies` field.
    pub fn from_subtasks(subtasks: &[SubTask]) -> Self {
        let mut graph = Self::new();
        for subtask in subtasks {
            graph.insert(subtask.id, subtask.dependencies.clone());
        }
        graph
    }

    /// Insert or replace the dependency list of `id`.
    pub fn insert(&mut self, id: TaskId, dependencies: Vec<TaskId>) {
        if !self.edges.contains_key(&id) {
            self.order.push(id);
        }
        self.edges.insert(id, dependencies);
    }

    pub fn dependencies_of(&self, id: &TaskId) -> Option<&[TaskId]> {
        self.edges.get(id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.edges.contains_key(id)
    }

    /// Subtask ids in insertion order.
    pub fn ids(&self) -> &[TaskId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of dependency edges.
    pub fn dependency_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Check that every dependency is known and the graph is acyclic.
    ///
    /// # Errors
    /// - `UnresolvedDependency` listing subtasks that reference unknown ids
    /// - `DependencyCycle` naming a subtask on a cycle (self edges included)
    pub fn validate(&self) -> Result<()> {
        let dangling: Vec<String> = self
            .order
            .iter()
            .filter(|id| {
                self.edges[*id]
                    .iter()
                    .any(|dep| !self.edges.contains_key(dep))
            })
            .map(|id| id.short())
            .collect();
        if !dangling.is_empty() {
            return Err(Error::UnresolvedDependency(dangling));
        }

        let mut graph: DiGraph<TaskId, ()> = DiGraph::new();
        let index: HashMap<TaskId, NodeIndex> = self
            .order
            .iter()
            .map(|id| (*id, graph.add_node(*id)))
            .collect();
        for id in &self.order {
            for dep in &self.edges[id] {
                graph.add_edge(index[dep], index[id], ());
            }
        }

        toposort(&graph, None).map(|_| ()).map_err(|cycle| {
            let id = graph
                .node_weight(cycle.node_id())
                .map(TaskId::short)
                .unwrap_or_else(|| "unknown".to_string());
            Error::DependencyCycle(id)
        })
    }

    /// Partition the graph into levels by repeated extraction.
    ///
    /// Each pass takes every unscheduled subtask whose dependencies are all
    /// scheduled in earlier passes. A pass that schedules nothing while
    /// subtasks remain stops the partitioning; the leftovers are returned in
    /// `unresolved` and the levels found so far are kept.
    pub fn parallel_groups(&self) -> Grouping {
        let mut scheduled: HashSet<TaskId> = HashSet::new();
        let mut remaining: Vec<TaskId> = self.order.clone();
        let mut groups = Vec::new();

        while !remaining.is_empty() {
            let (ready, blocked): (Vec<TaskId>, Vec<TaskId>) =
                remaining.into_iter().partition(|id| {
                    self.edges[id]
                        .iter()
                        .all(|dep| dep != id && scheduled.contains(dep))
                });

            if ready.is_empty() {
                wlog_warn!(
                    "Unresolved dependencies, dropping {} subtask(s): {:?}",
                    blocked.len(),
                    blocked.iter().map(TaskId::short).collect::<Vec<_>>()
                );
                return Grouping {
                    groups,
                    unresolved: blocked,
                };
            }

            scheduled.extend(ready.iter().copied());
            groups.push(ParallelGroup {
                level: groups.len(),
                subtask_ids: ready,
            });
            remaining = blocked;
        }

        Grouping {
            groups,
            unresolved: Vec::new(),
        }
    }
}
