//! Dependency resolution over a job's task list.
//!
//! Design:
//! - Forward edge: task -> the single task it depends on (`depends_on`)
//! - Reverse edges are derived on demand ("who is waiting for this task?")
//! - Resolution never reorders tasks; declaration order is the scan order

use std::collections::{HashMap, HashSet, VecDeque};

use super::ids::TaskKey;
use super::state::TaskStatus;
use super::task::Task;

/// Unblock every `blocked` task whose dependency is `completed`.
///
/// Completion is read from the statuses as they are when the pass starts, so
/// a task unblocked here cannot unblock its own dependents in the same pass.
/// Calling this again with no intervening completion changes nothing.
///
/// Returns the number of tasks promoted to `pending`.
pub fn resolve(tasks: &mut [Task]) -> usize {
    let completed: HashSet<TaskKey> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .map(|t| t.id.clone())
        .collect();

    let mut promoted = 0;
    for task in tasks.iter_mut() {
        let unblocked = task.status == TaskStatus::Blocked
            && task
                .depends_on
                .as_ref()
                .is_some_and(|dep| completed.contains(dep));
        if unblocked {
            task.status = TaskStatus::Pending;
            promoted += 1;
        }
    }
    promoted
}

/// Whether `task`'s dependency (if any) has completed.
pub fn dependency_met(tasks: &[Task], task: &Task) -> bool {
    match &task.depends_on {
        None => true,
        Some(dep) => tasks
            .iter()
            .any(|t| &t.id == dep && t.status == TaskStatus::Completed),
    }
}

/// All tasks that transitively wait on `root`, in declaration order.
pub fn transitive_dependents(tasks: &[Task], root: &TaskKey) -> Vec<TaskKey> {
    let mut reverse_edges: HashMap<&TaskKey, Vec<&TaskKey>> = HashMap::new();
    for task in tasks {
        if let Some(dep) = &task.depends_on {
            reverse_edges.entry(dep).or_default().push(&task.id);
        }
    }

    let mut found: HashSet<&TaskKey> = HashSet::new();
    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        for &waiting in reverse_edges.get(node).into_iter().flatten() {
            if found.insert(waiting) {
                queue.push_back(waiting);
            }
        }
    }

    tasks
        .iter()
        .filter(|t| found.contains(&t.id))
        .map(|t| t.id.clone())
        .collect()
}

/// Detect a cycle among single-predecessor edges `(task, depends_on)`.
///
/// Returns the first cycle found (closing node repeated at the end), or
/// `None` if the edges form a forest. Edges pointing at unknown keys are
/// treated as roots.
pub fn detect_cycle<I>(edges: I) -> Option<Vec<TaskKey>>
where
    I: IntoIterator<Item = (TaskKey, Option<TaskKey>)>,
{
    let parent: HashMap<TaskKey, Option<TaskKey>> = edges.into_iter().collect();
    let mut explored: HashSet<TaskKey> = HashSet::new();

    for start in parent.keys() {
        let mut path: Vec<TaskKey> = Vec::new();
        let mut on_path: HashSet<TaskKey> = HashSet::new();
        let mut current = Some(start.clone());

        while let Some(node) = current {
            if explored.contains(&node) {
                break;
            }
            if !on_path.insert(node.clone()) {
                let pos = path.iter().position(|k| *k == node).unwrap_or(0);
                let mut cycle = path[pos..].to_vec();
                cycle.push(node);
                return Some(cycle);
            }
            path.push(node.clone());
            current = parent.get(&node).cloned().flatten();
        }

        explored.extend(path);
    }
    None
}
