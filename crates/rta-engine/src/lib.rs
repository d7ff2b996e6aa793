pub mod dom;
pub mod editing;
pub mod selection;

// Re-export key types for easier usage
pub use dom::{Document, DomError, MarkerId, NodeId, NodeKind, Point, Range};
pub use editing::{Cmd, CommandError, Patch};
pub use selection::{SelectionPreserver, SelectionSnapshot};
