pub mod file_tree;
pub mod propagate;
pub mod selection;
pub mod state;

pub use file_tree::{FileTree, NodeId};
pub use propagate::set_column;
pub use selection::handle_activation;
pub use state::{Column, ColumnValue, Priority, TriState};
