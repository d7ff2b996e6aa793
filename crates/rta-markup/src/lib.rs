//! # rta-markup
//!
//! A small, forgiving parser for the HTML fragments a rich text area accepts
//! (`set_html`, "insert HTML" commands), built on [Logos].
//!
//! [Logos]: https://docs.rs/logos
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → MarkupNode forest
//!               (Logos)          (tag stack)
//! ```
//!
//! The output is a plain owned tree. Consumers copy it into whatever document
//! model they keep; nothing here knows about selections or editing.
//!
//! ## Quick Start
//!
//! ```
//! use rta_markup::{parse_fragment, MarkupNode};
//!
//! let nodes = parse_fragment("<ins>the</ins> <em>To</em>").unwrap();
//! assert_eq!(nodes.len(), 3);
//!
//! let text: String = nodes.iter().map(MarkupNode::text_content).collect();
//! assert_eq!(text, "the To");
//! ```

pub mod lexer;
pub mod parser;
pub mod serialize;

pub use parser::{MarkupError, MarkupNode, parse_fragment};
pub use serialize::{VOID_ELEMENTS, is_void_element};
