/*!
 * # Editing Module
 *
 * Edit commands applied to a [`Document`](crate::dom::Document), and the
 * undo/redo history they feed.
 *
 * ## Architecture Overview
 *
 * ### 1. Command-Based Editing
 * - All edits are represented as **Commands** (`Cmd` enum)
 * - `Document::apply` runs a command against the live selection and returns a **Patch**
 * - A command that fails leaves the document and its history untouched where possible
 *
 * ### 2. Markup History
 * - Every successful command records one history entry holding the markup before and after
 * - Undo/redo replace the document content from those entries
 * - Markup never contains selection markers, so saving and restoring a selection
 *   around a command can never show up as an extra undo step
 *
 * ## Module Structure
 *
 * - **`commands`**: `Cmd` enum and the tree edits for each command
 * - **`history`**: bounded undo/redo stacks
 * - **`patch`**: edit result metadata including created nodes and new selection
 *
 * ## Usage Pattern
 *
 * ```rust
 * use rta_engine::dom::{Document, Point, Range};
 * use rta_engine::editing::Cmd;
 *
 * let mut doc = Document::from_html("bluebird").unwrap();
 * let text = doc.child(doc.root(), 0).unwrap();
 * doc.set_selection(Range::new(Point::new(text, 0), Point::new(text, 4)));
 *
 * let patch = doc.apply(Cmd::Bold).unwrap();
 * assert_eq!(doc.to_html(), "<strong>blue</strong>bird");
 * assert_eq!(patch.version, 1);
 *
 * doc.undo().unwrap();
 * assert_eq!(doc.to_html(), "bluebird");
 * ```
 */

pub mod commands;
pub mod history;
pub mod patch;

pub use commands::{Cmd, CommandError};
pub use history::History;
pub use patch::Patch;
