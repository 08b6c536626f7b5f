//! Selector parsing and matching for Louver.
//!
//! This crate provides the selector machinery Louver's scoped side effects
//! are declared with:
//!
//! - **Selectors**: Tag, class, ID, and combinator selectors
//! - **Lists**: Comma-separated selector groups with preserved authored order
//! - **Parsing**: `cssparser`-based tokenization with fail-fast errors
//! - **Matching**: Store-agnostic structural matching via [`selector::TreeContext`]
//!
//! # Example
//!
//! ```
//! use louver_style::selector::parse_selector_list;
//!
//! let list = parse_selector_list(".sidebar, main > .content").unwrap();
//! assert_eq!(list.len(), 2);
//!
//! // Malformed selectors fail fast instead of half-applying a scope.
//! assert!(parse_selector_list(".sidebar, > p").is_err());
//! ```

pub mod selector;

mod error;

pub use error::{Error, Result};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::selector::{
        any_matches, matches, parse_selector, parse_selector_list, Combinator, MatchContext,
        Selector, SelectorList, SelectorMatcher, SelectorPart, TagSelector, TreeContext,
    };
    pub use crate::{Error, Result};
}
