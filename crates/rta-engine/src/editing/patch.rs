use crate::dom::{NodeId, Range};

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Top-level nodes the command created
    pub changed: Vec<NodeId>,
    pub new_selection: Option<Range>,
    pub version: u64,
}
