//! Element tree and attribute contract.
//!
//! Everything the engine knows about the page lives here: the retained
//! [`Document`] arena, the [`attrs`] names the engine reads and writes, and
//! the visibility/focus helpers built on top of them.

pub mod attrs;
mod document;

pub use document::{Document, DomError, DomResult, ElementId, VisibilityChannel};
