//! Keeping the user's selection across arbitrary document mutations.
//!
//! A save turns each end of the live range into a [`Boundary`]:
//!
//! - a text position gets an invisible marker node, splitting text if needed
//! - a control selection (one atomic element, like an image) records the
//!   element itself plus edge markers bracketing it
//!
//! Both kinds remember a [`FallbackPath`] of ancestor positions. Whatever
//! happens to the tree before the restore, decoding yields a valid point:
//! the marker or node if it survived, otherwise the nearest surviving
//! ancestor position, otherwise an edge of the root.
//!
//! Markers never reach [`Document::to_html`](crate::dom::Document::to_html)
//! or the selection text, and restore releases them unconditionally.

mod boundary;
mod marker;
mod preserver;
mod snapshot;

pub use boundary::{Boundary, Edge, FallbackPath};
pub use marker::Marker;
pub use preserver::{SelectionPreserver, discard, restore, save};
pub use snapshot::SelectionSnapshot;
