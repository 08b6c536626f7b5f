//! Selector matching algorithm.

use super::{Combinator, Selector, SelectorList, SelectorPart, TagSelector};

/// Element state for selector matching.
#[derive(Debug, Clone, Default)]
pub struct MatchContext<'a> {
    /// Element tag name, lowercase (e.g., "button", "section").
    pub tag: &'a str,
    /// Element ID (for #id selectors).
    pub id: Option<&'a str>,
    /// Element's classes.
    pub classes: &'a [String],
}

/// Tree navigation for combinator matching.
///
/// The matcher stays independent of any concrete element store; the store
/// implements this trait over its own node handle type and the matcher walks
/// it right-to-left through the selector's combinators.
pub trait TreeContext {
    /// Handle identifying a node in the tree.
    type Node: Copy;

    /// Match context for a node.
    fn context(&self, node: Self::Node) -> MatchContext<'_>;

    /// The node's parent, if any.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// The node's immediately preceding sibling, if any.
    fn previous_sibling(&self, node: Self::Node) -> Option<Self::Node>;
}

/// Selector matching engine.
pub struct SelectorMatcher;

impl SelectorMatcher {
    /// Check if a selector's subject (rightmost part) matches the element.
    ///
    /// This only checks the final selector part. For full matching with
    /// combinators, use [`matches`].
    pub fn matches_subject(selector: &Selector, context: &MatchContext<'_>) -> bool {
        if let Some(subject) = selector.subject() {
            Self::part_matches(subject, context)
        } else {
            false
        }
    }

    /// Check if a selector part matches the element.
    pub fn part_matches(part: &SelectorPart, context: &MatchContext<'_>) -> bool {
        // Check tag selector
        if let Some(tag_sel) = &part.tag {
            match tag_sel {
                TagSelector::Universal => {} // Always matches
                TagSelector::Named(name) => {
                    if name != context.tag {
                        return false;
                    }
                }
            }
        }

        // Check ID selector
        if let Some(id) = &part.id {
            match context.id {
                Some(element_id) if element_id == id => {}
                _ => return false,
            }
        }

        // Check class selectors (all must match)
        for class in &part.classes {
            if !context.classes.iter().any(|c| c == class) {
                return false;
            }
        }

        true
    }
}

/// Check if a full selector matches a node, considering combinators.
///
/// This walks the selector from right to left: the subject part must match
/// the node itself, then each combinator steers which related node the next
/// part is tried against. Descendant and general-sibling combinators
/// backtrack through every candidate.
pub fn matches<T: TreeContext>(selector: &Selector, tree: &T, node: T::Node) -> bool {
    if selector.parts.is_empty() {
        return false;
    }
    matches_from(selector, tree, node, selector.parts.len() - 1)
}

/// Check if any member of a selector list matches a node.
pub fn any_matches<T: TreeContext>(list: &SelectorList, tree: &T, node: T::Node) -> bool {
    list.iter().any(|selector| matches(selector, tree, node))
}

fn matches_from<T: TreeContext>(
    selector: &Selector,
    tree: &T,
    node: T::Node,
    part_index: usize,
) -> bool {
    if !SelectorMatcher::part_matches(&selector.parts[part_index], &tree.context(node)) {
        return false;
    }
    if part_index == 0 {
        return true;
    }

    match selector.combinators[part_index - 1] {
        Combinator::Child => match tree.parent(node) {
            Some(parent) => matches_from(selector, tree, parent, part_index - 1),
            None => false,
        },

        Combinator::Descendant => {
            let mut current = tree.parent(node);
            while let Some(ancestor) = current {
                if matches_from(selector, tree, ancestor, part_index - 1) {
                    return true;
                }
                current = tree.parent(ancestor);
            }
            false
        }

        Combinator::AdjacentSibling => match tree.previous_sibling(node) {
            Some(sibling) => matches_from(selector, tree, sibling, part_index - 1),
            None => false,
        },

        Combinator::GeneralSibling => {
            let mut current = tree.previous_sibling(node);
            while let Some(sibling) = current {
                if matches_from(selector, tree, sibling, part_index - 1) {
                    return true;
                }
                current = tree.previous_sibling(sibling);
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parse_selector;

    /// Minimal tree for matcher tests: nodes indexed by position.
    struct TestTree {
        nodes: Vec<TestNode>,
    }

    struct TestNode {
        tag: &'static str,
        id: Option<&'static str>,
        classes: Vec<String>,
        parent: Option<usize>,
        prev: Option<usize>,
    }

    impl TreeContext for TestTree {
        type Node = usize;

        fn context(&self, node: usize) -> MatchContext<'_> {
            let n = &self.nodes[node];
            MatchContext {
                tag: n.tag,
                id: n.id,
                classes: &n.classes,
            }
        }

        fn parent(&self, node: usize) -> Option<usize> {
            self.nodes[node].parent
        }

        fn previous_sibling(&self, node: usize) -> Option<usize> {
            self.nodes[node].prev
        }
    }

    fn classes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// body > nav.sidebar > ul > li.item (x3), plus main > p#intro.
    fn sample_tree() -> TestTree {
        TestTree {
            nodes: vec![
                // 0: body
                TestNode { tag: "body", id: None, classes: vec![], parent: None, prev: None },
                // 1: nav.sidebar
                TestNode { tag: "nav", id: None, classes: classes(&["sidebar"]), parent: Some(0), prev: None },
                // 2: ul
                TestNode { tag: "ul", id: None, classes: vec![], parent: Some(1), prev: None },
                // 3-5: li.item siblings
                TestNode { tag: "li", id: None, classes: classes(&["item", "first"]), parent: Some(2), prev: None },
                TestNode { tag: "li", id: None, classes: classes(&["item"]), parent: Some(2), prev: Some(3) },
                TestNode { tag: "li", id: None, classes: classes(&["item", "last"]), parent: Some(2), prev: Some(4) },
                // 6: main
                TestNode { tag: "main", id: None, classes: vec![], parent: Some(0), prev: Some(1) },
                // 7: p#intro
                TestNode { tag: "p", id: Some("intro"), classes: vec![], parent: Some(6), prev: None },
            ],
        }
    }

    #[test]
    fn part_matches_tag_class_id() {
        let tree = sample_tree();
        let ctx = tree.context(7);

        assert!(SelectorMatcher::part_matches(&SelectorPart::named("p"), &ctx));
        assert!(!SelectorMatcher::part_matches(&SelectorPart::named("div"), &ctx));
        assert!(SelectorMatcher::part_matches(&SelectorPart::id_only("intro"), &ctx));
        assert!(SelectorMatcher::part_matches(&SelectorPart::universal(), &ctx));

        let ctx = tree.context(3);
        assert!(SelectorMatcher::part_matches(&SelectorPart::class_only("item"), &ctx));
        assert!(!SelectorMatcher::part_matches(&SelectorPart::class_only("missing"), &ctx));
    }

    #[test]
    fn all_classes_must_match() {
        let tree = sample_tree();
        let ctx = tree.context(3);
        let part = SelectorPart::class_only("item").with_class("first");
        assert!(SelectorMatcher::part_matches(&part, &ctx));

        let part = SelectorPart::class_only("item").with_class("last");
        assert!(!SelectorMatcher::part_matches(&part, &ctx));
    }

    #[test]
    fn child_combinator() {
        let tree = sample_tree();
        let sel = parse_selector("ul > li.item").unwrap();
        assert!(matches(&sel, &tree, 4));

        let sel = parse_selector("nav > li").unwrap();
        assert!(!matches(&sel, &tree, 4)); // li's parent is ul, not nav
    }

    #[test]
    fn descendant_combinator_searches_all_ancestors() {
        let tree = sample_tree();
        let sel = parse_selector(".sidebar li").unwrap();
        assert!(matches(&sel, &tree, 5));

        let sel = parse_selector("body nav ul li").unwrap();
        assert!(matches(&sel, &tree, 3));

        let sel = parse_selector("main li").unwrap();
        assert!(!matches(&sel, &tree, 3));
    }

    #[test]
    fn sibling_combinators() {
        let tree = sample_tree();

        let sel = parse_selector("li + li").unwrap();
        assert!(matches(&sel, &tree, 4));
        assert!(!matches(&sel, &tree, 3)); // first li has no previous sibling

        let sel = parse_selector(".first ~ .last").unwrap();
        assert!(matches(&sel, &tree, 5));

        let sel = parse_selector("nav + main").unwrap();
        assert!(matches(&sel, &tree, 6));
    }

    #[test]
    fn mixed_chain_backtracks() {
        let tree = sample_tree();
        // "body > nav li.last": subject at 5, child step must pass through
        // the descendant search without sticking on the first candidate.
        let sel = parse_selector("body > nav li.last").unwrap();
        assert!(matches(&sel, &tree, 5));
    }

    #[test]
    fn list_matches_any_member() {
        let tree = sample_tree();
        let list = crate::selector::parse_selector_list("header, #intro, footer").unwrap();
        assert!(any_matches(&list, &tree, 7));
        assert!(!any_matches(&list, &tree, 3));
    }

    #[test]
    fn empty_selector_never_matches() {
        let tree = sample_tree();
        let sel = Selector { parts: vec![], combinators: vec![] };
        assert!(!matches(&sel, &tree, 0));
    }
}
