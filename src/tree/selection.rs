//! Turns a single user activation on a node/column into one propagation call.

use crate::tree::file_tree::{FileTree, NodeId};
use crate::tree::propagate::set_column;
use crate::tree::state::{Column, ColumnValue, Priority, TriState};

/// Apply one activation to `target`'s `column` and return the value written.
///
/// Enabled negates the target's own current value. A Mixed directory
/// deliberately toggles to true: the activation pulls the subtree out of its
/// inconsistent state by selecting everything beneath it.
///
/// Priority cycles Normal -> High -> Low -> Normal; Mixed also lands on
/// Normal, so a disagreeing directory resets its subtree on first touch.
///
/// Exactly one propagation per activation.
pub fn handle_activation(tree: &mut FileTree, target: NodeId, column: Column) -> ColumnValue {
    let value = match column {
        Column::Enabled => {
            let next = match tree.node(target).enabled {
                TriState::Value(current) => !current,
                TriState::Mixed => true,
            };
            ColumnValue::Enabled(next)
        }
        Column::Priority => {
            let next = match tree.node(target).priority {
                TriState::Value(Priority::Normal) => Priority::High,
                TriState::Value(Priority::High) => Priority::Low,
                _ => Priority::Normal,
            };
            ColumnValue::Priority(next)
        }
    };
    set_column(tree, target, value);
    value
}
