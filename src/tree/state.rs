use strum::{Display, EnumString};

/// Concrete per-file bandwidth priority.
///
/// Uses Transmission's scale when it goes on the wire: low is -1, normal 0,
/// high 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn to_rpc(self) -> i64 {
        match self {
            Priority::Low => -1,
            Priority::Normal => 0,
            Priority::High => 1,
        }
    }
}

/// A displayed column state: either every descendant leaf agrees on a value,
/// or the subtree disagrees and the state is Mixed.
///
/// Mixed is only ever derived by aggregation; writes into the tree take a
/// bare `T`, so an inconsistent state can never be requested directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriState<T> {
    Value(T),
    Mixed,
}

impl<T: Copy> TriState<T> {
    pub fn value(self) -> Option<T> {
        match self {
            TriState::Value(v) => Some(v),
            TriState::Mixed => None,
        }
    }

    pub fn is_mixed(self) -> bool {
        matches!(self, TriState::Mixed)
    }
}

impl<T: std::fmt::Display> std::fmt::Display for TriState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriState::Value(v) => v.fmt(f),
            TriState::Mixed => write!(f, "Mixed"),
        }
    }
}

/// Which editable column an activation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Enabled,
    Priority,
}

/// A concrete (never Mixed) write for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnValue {
    Enabled(bool),
    Priority(Priority),
}

impl ColumnValue {
    pub fn column(self) -> Column {
        match self {
            ColumnValue::Enabled(_) => Column::Enabled,
            ColumnValue::Priority(_) => Column::Priority,
        }
    }
}
