//! Tri-state consistency propagation.
//!
//! One mutation entry point keeps the whole tree consistent: setting a column
//! on a node pushes the value down through its subtree, then recomputes every
//! ancestor from its immediate children on the way back up to the root.

use crate::tree::file_tree::{FileNode, FileTree, NodeId};
use crate::tree::state::{ColumnValue, TriState};

/// Set `value`'s column on `target` and restore tri-state consistency.
///
/// Phase 1 walks the target's subtree and overrides every node's column with
/// the new concrete value. Phase 2 walks parent links to the root; each
/// ancestor takes its first child's value as candidate and flips to Mixed at
/// the first disagreeing sibling. Children below the current level are
/// already consistent when their parent is recomputed, so one pass suffices.
///
/// The untouched column is left alone, and calling this twice with the same
/// arguments leaves the tree unchanged the second time.
pub fn set_column(tree: &mut FileTree, target: NodeId, value: ColumnValue) {
    match value {
        ColumnValue::Enabled(v) => propagate(
            tree,
            target,
            v,
            |node| node.enabled,
            |node, state| node.enabled = state,
        ),
        ColumnValue::Priority(v) => propagate(
            tree,
            target,
            v,
            |node| node.priority,
            |node, state| node.priority = state,
        ),
    }
}

fn propagate<T, G, S>(tree: &mut FileTree, target: NodeId, new_value: T, get: G, set: S)
where
    T: Copy + Eq,
    G: Fn(&FileNode) -> TriState<T>,
    S: Fn(&mut FileNode, TriState<T>),
{
    // Phase 1: downward override of the whole subtree
    let mut stack = vec![target];
    while let Some(id) = stack.pop() {
        set(tree.node_mut(id), TriState::Value(new_value));
        stack.extend_from_slice(tree.children(id));
    }

    // Phase 2: upward recomputation from immediate children
    let mut current = target;
    while let Some(parent) = tree.parent(current) {
        let mut candidate: Option<TriState<T>> = None;
        for &child in tree.children(parent) {
            let child_state = get(tree.node(child));
            match candidate {
                None => candidate = Some(child_state),
                Some(seed) if seed != child_state => {
                    candidate = Some(TriState::Mixed);
                    break;
                }
                Some(_) => {}
            }
        }
        let computed = candidate.unwrap_or(TriState::Value(new_value));
        set(tree.node_mut(parent), computed);
        current = parent;
    }
}
