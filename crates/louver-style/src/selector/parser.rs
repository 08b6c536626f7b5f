//! Selector parsing using the `cssparser` crate.
//!
//! This module tokenizes selector strings and constructs [`Selector`] and
//! [`SelectorList`] values. Parsing fails fast: a malformed selector anywhere
//! in a list is an authoring error and poisons the whole list, because a
//! half-applied scope is worse than none.

use cssparser::{Parser, ParserInput, Token};

use super::{Combinator, Selector, SelectorList, SelectorPart, TagSelector};
use crate::{Error, Result};

/// Parse a comma-separated selector list.
///
/// Tag names are normalized to lowercase; class names and IDs keep their
/// authored case. Whitespace between parts is the descendant combinator,
/// `>` `+` `~` are the explicit combinators.
///
/// # Example
///
/// ```
/// use louver_style::selector::parse_selector_list;
///
/// let list = parse_selector_list("nav .sidebar, main > .content").unwrap();
/// assert_eq!(list.len(), 2);
/// assert_eq!(list.to_string(), "nav .sidebar, main > .content");
/// ```
pub fn parse_selector_list(input: &str) -> Result<SelectorList> {
    let mut parser_input = ParserInput::new(input);
    let mut parser = Parser::new(&mut parser_input);

    let mut selectors = Vec::new();
    let mut builder = SelectorBuilder::default();

    loop {
        let token = match parser.next_including_whitespace() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };

        match &token {
            Token::WhiteSpace(_) => builder.whitespace(),

            Token::Delim('>') => builder.combinator(input, Combinator::Child)?,
            Token::Delim('+') => builder.combinator(input, Combinator::AdjacentSibling)?,
            Token::Delim('~') => builder.combinator(input, Combinator::GeneralSibling)?,

            Token::Delim('*') => builder.simple(|part| {
                part.tag = Some(TagSelector::Universal);
                Ok(())
            })?,

            Token::Ident(name) => {
                let tag = name.to_string().to_ascii_lowercase();
                builder.simple(|part| {
                    part.tag = Some(TagSelector::Named(tag));
                    Ok(())
                })?;
            }

            Token::Delim('.') => {
                let class = parser
                    .expect_ident()
                    .map_err(|_| Error::invalid_selector(input, "Expected class name after '.'"))?
                    .to_string();
                builder.simple(|part| {
                    part.classes.push(class);
                    Ok(())
                })?;
            }

            Token::IDHash(id) => {
                let id = id.to_string();
                builder.simple(|part| {
                    if part.id.is_some() {
                        return Err(Error::invalid_selector(input, "Duplicate ID in one part"));
                    }
                    part.id = Some(id);
                    Ok(())
                })?;
            }

            Token::Hash(_) => {
                return Err(Error::invalid_selector(input, "Invalid ID selector"));
            }

            Token::Comma => {
                let selector = builder.finish(input)?;
                selectors.push(selector);
                builder = SelectorBuilder::default();
            }

            Token::Colon => {
                return Err(Error::invalid_selector(
                    input,
                    "Pseudo-classes are not supported",
                ));
            }

            other => {
                return Err(Error::invalid_selector(
                    input,
                    format!("Unexpected token {:?}", other),
                ));
            }
        }
    }

    let selector = builder.finish(input)?;
    selectors.push(selector);

    tracing::debug!(
        target: "louver_style::parser",
        input,
        selector_count = selectors.len(),
        "parsed selector list"
    );
    Ok(SelectorList::new(selectors))
}

/// Parse exactly one selector.
///
/// Fails if the input is empty or contains a comma-separated list.
pub fn parse_selector(input: &str) -> Result<Selector> {
    let mut list = parse_selector_list(input)?;
    if list.selectors.len() != 1 {
        return Err(Error::invalid_selector(input, "Expected a single selector"));
    }
    Ok(list.selectors.remove(0))
}

/// Accumulates parts and combinators for one selector in a list.
#[derive(Default)]
struct SelectorBuilder {
    parts: Vec<SelectorPart>,
    combinators: Vec<Combinator>,
    current: SelectorPart,
    /// Combinator awaiting the next part. Whitespace records a descendant
    /// here; an explicit combinator may upgrade it, but never the reverse.
    pending: Option<Combinator>,
}

impl SelectorBuilder {
    fn whitespace(&mut self) {
        if self.pending.is_none() && !self.current.is_empty() {
            self.pending = Some(Combinator::Descendant);
        }
    }

    fn combinator(&mut self, input: &str, combinator: Combinator) -> Result<()> {
        if self.current.is_empty() && self.parts.is_empty() {
            return Err(Error::invalid_selector(input, "Selector starts with a combinator"));
        }
        match self.pending {
            None | Some(Combinator::Descendant) => {
                self.pending = Some(combinator);
                Ok(())
            }
            Some(_) => Err(Error::invalid_selector(input, "Two combinators in a row")),
        }
    }

    /// Apply a simple-selector token to the current part, flushing the part
    /// first when a combinator separates it from the previous one.
    fn simple<F>(&mut self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut SelectorPart) -> Result<()>,
    {
        if let Some(combinator) = self.pending.take() {
            self.parts.push(std::mem::take(&mut self.current));
            self.combinators.push(combinator);
        }
        apply(&mut self.current)
    }

    fn finish(mut self, input: &str) -> Result<Selector> {
        if self.pending.is_some() {
            return Err(Error::invalid_selector(input, "Selector ends with a combinator"));
        }
        if !self.current.is_empty() {
            self.parts.push(self.current);
        }
        if self.parts.is_empty() {
            return Err(Error::invalid_selector(input, "Empty selector"));
        }
        Ok(Selector {
            parts: self.parts,
            combinators: self.combinators,
        })
    }
}
