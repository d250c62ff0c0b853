//! Task graph blueprints.
//!
//! A `TaskGraph` is the validated shape a job's tasks are built from. Each
//! task has at most one predecessor, so the graph is a forest of chains and
//! fan-outs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::dependency::detect_cycle;
use super::ids::{ResourceRef, TaskKey};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("graph has no tasks")]
    Empty,

    #[error("duplicate task key {0}")]
    DuplicateKey(TaskKey),

    #[error("duplicate output key {0:?}")]
    DuplicateOutputKey(String),

    #[error("task {task} depends on unknown task {depends_on}")]
    UnknownDependency { task: TaskKey, depends_on: TaskKey },

    #[error("dependency cycle: {0:?}")]
    Cycle(Vec<TaskKey>),
}

/// One task of a graph, before it is instantiated for a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskBlueprint {
    pub key: TaskKey,
    pub name: String,

    /// `None` for human-in-the-loop tasks.
    pub resource: Option<ResourceRef>,

    pub depends_on: Option<TaskKey>,
    pub undoable: bool,

    /// Context key the task's result is merged under.
    pub output_key: String,
}

impl TaskBlueprint {
    pub fn resource(
        key: &str,
        name: &str,
        resource: &str,
        depends_on: Option<&str>,
        undoable: bool,
        output_key: &str,
    ) -> Self {
        Self {
            key: TaskKey::new(key),
            name: name.to_string(),
            resource: Some(ResourceRef::new(resource)),
            depends_on: depends_on.map(TaskKey::new),
            undoable,
            output_key: output_key.to_string(),
        }
    }

    pub fn human(
        key: &str,
        name: &str,
        depends_on: Option<&str>,
        undoable: bool,
        output_key: &str,
    ) -> Self {
        Self {
            key: TaskKey::new(key),
            name: name.to_string(),
            resource: None,
            depends_on: depends_on.map(TaskKey::new),
            undoable,
            output_key: output_key.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskGraph {
    blueprints: Vec<TaskBlueprint>,
}

impl TaskGraph {
    /// Validate and build a graph. Declaration order is kept; it is the
    /// order the scheduler scans for the next pending task.
    pub fn new(blueprints: Vec<TaskBlueprint>) -> Result<Self, GraphError> {
        if blueprints.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut keys = HashSet::new();
        let mut outputs = HashSet::new();
        for bp in &blueprints {
            if !keys.insert(bp.key.clone()) {
                return Err(GraphError::DuplicateKey(bp.key.clone()));
            }
            if !outputs.insert(bp.output_key.clone()) {
                return Err(GraphError::DuplicateOutputKey(bp.output_key.clone()));
            }
        }

        for bp in &blueprints {
            if let Some(dep) = &bp.depends_on
                && !keys.contains(dep)
            {
                return Err(GraphError::UnknownDependency {
                    task: bp.key.clone(),
                    depends_on: dep.clone(),
                });
            }
        }

        let edges = blueprints
            .iter()
            .map(|bp| (bp.key.clone(), bp.depends_on.clone()));
        if let Some(cycle) = detect_cycle(edges) {
            return Err(GraphError::Cycle(cycle));
        }

        Ok(Self { blueprints })
    }

    /// draft -> publish (human) -> {thread, summary, repost}
    pub fn content_pipeline() -> Self {
        let blueprints = vec![
            TaskBlueprint::resource("t1", "Draft post", "llm.draft", None, false, "draft"),
            TaskBlueprint::human("t2", "Publish post", Some("t1"), true, "publication"),
            TaskBlueprint::resource(
                "t3",
                "Thread follow-up",
                "social.thread",
                Some("t2"),
                true,
                "thread",
            ),
            TaskBlueprint::resource(
                "t4",
                "Newsletter summary",
                "llm.summarize",
                Some("t2"),
                true,
                "summary",
            ),
            TaskBlueprint::resource(
                "t5",
                "Schedule repost",
                "social.repost",
                Some("t2"),
                true,
                "repost",
            ),
        ];
        Self { blueprints }
    }

    pub fn blueprints(&self) -> &[TaskBlueprint] {
        &self.blueprints
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::content_pipeline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(pairs: &[(&str, Option<&str>)]) -> Vec<TaskBlueprint> {
        pairs
            .iter()
            .map(|(key, dep)| TaskBlueprint::resource(key, key, "r", *dep, true, key))
            .collect()
    }

    #[test]
    fn content_pipeline_is_valid() {
        let graph = TaskGraph::content_pipeline();
        let rebuilt = TaskGraph::new(graph.blueprints().to_vec()).unwrap();
        assert_eq!(rebuilt, graph);
    }

    #[test]
    fn content_pipeline_has_single_root_and_gating_middle() {
        let graph = TaskGraph::content_pipeline();
        let roots: Vec<_> = graph
            .blueprints()
            .iter()
            .filter(|bp| bp.depends_on.is_none())
            .collect();
        assert_eq!(roots.len(), 1);

        let gated_by_t2 = graph
            .blueprints()
            .iter()
            .filter(|bp| bp.depends_on.as_ref().map(TaskKey::as_str) == Some("t2"))
            .count();
        assert_eq!(gated_by_t2, 3);

        let publish = &graph.blueprints()[1];
        assert!(publish.resource.is_none());
    }

    #[test]
    fn rejects_empty_graph() {
        assert_eq!(TaskGraph::new(vec![]), Err(GraphError::Empty));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = TaskGraph::new(chain(&[("a", None), ("a", None)])).unwrap_err();
        assert_eq!(err, GraphError::DuplicateKey(TaskKey::new("a")));
    }

    #[test]
    fn rejects_unknown_dependency() {
        let err = TaskGraph::new(chain(&[("a", None), ("b", Some("zzz"))])).unwrap_err();
        assert!(matches!(err, GraphError::UnknownDependency { .. }));
    }

    #[test]
    fn rejects_cycles_and_self_dependency() {
        let err = TaskGraph::new(chain(&[("a", Some("b")), ("b", Some("a"))])).unwrap_err();
        assert!(matches!(err, GraphError::Cycle(_)));

        let err = TaskGraph::new(chain(&[("a", Some("a"))])).unwrap_err();
        assert!(matches!(err, GraphError::Cycle(_)));
    }

    #[test]
    fn accepts_dependency_declared_later() {
        // Declaration order is scan order, not topological order.
        let graph = TaskGraph::new(chain(&[("b", Some("a")), ("a", None)])).unwrap();
        assert_eq!(graph.len(), 2);
    }
}
