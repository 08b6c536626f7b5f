//! Selector types, parsing, and matching.

mod matcher;
mod parser;
mod types;

pub use matcher::{any_matches, matches, MatchContext, SelectorMatcher, TreeContext};
pub use parser::{parse_selector, parse_selector_list};
pub use types::*;
