//! Retained element tree.
//!
//! Provides the arena-backed document the engine targets:
//! - Unique element identifiers via arena-based storage
//! - Parent-child structure with cascade removal
//! - Attribute and class storage with an id-attribute index
//! - Visibility channels, focusables, and selector queries
//!
//! The engine never holds element references across calls; everything is
//! re-resolved through [`ElementId`] handles, which stay stable while the
//! tree changes around them.
//!
//! # Key Types
//!
//! - [`ElementId`] - Unique stable identifier for each element
//! - [`Document`] - The element tree and all lookups over it
//! - [`VisibilityChannel`] - Which attribute expresses hidden state

use std::collections::HashMap;
use std::fmt;

use slotmap::{new_key_type, SlotMap};

use louver_style::selector::{any_matches, matches, MatchContext, Selector, SelectorList, TreeContext};

use super::attrs;

new_key_type! {
    /// A unique identifier for an element in a [`Document`].
    ///
    /// `ElementId`s are stable handles that remain valid even as the tree
    /// changes. They become invalid when the element is removed.
    pub struct ElementId;
}

/// Errors that can occur during element tree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The element ID is invalid or has been removed.
    InvalidElementId,
    /// Attempted to make an element its own descendant.
    CircularParentage,
    /// The reference element is not a child of the given parent.
    NotAChild,
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidElementId => write!(f, "Invalid or removed element ID"),
            Self::CircularParentage => {
                write!(f, "Cannot insert an element into its own subtree")
            }
            Self::NotAChild => write!(f, "Reference element is not a child of the parent"),
        }
    }
}

impl std::error::Error for DomError {}

/// Result type for element tree operations.
pub type DomResult<T> = std::result::Result<T, DomError>;

/// Which attribute expresses an element's hidden state.
///
/// Detected per element: an element carrying `aria-hidden` uses
/// [`VisibilityChannel::AriaHidden`], everything else the boolean `hidden`
/// attribute. The update rules never write the other channel's attribute, so
/// the detection is stable for the element's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityChannel {
    /// Presence/absence of the boolean `hidden` attribute.
    Hidden,
    /// The `aria-hidden` attribute holding `"true"`/`"false"`.
    AriaHidden,
}

/// Tags focusable without an explicit `tabindex`.
const INTRINSIC_FOCUSABLE: &[&str] = &["button", "input", "select", "textarea", "summary", "iframe"];

/// Internal data stored for each element.
struct ElementData {
    /// Tag name, lowercase.
    tag: String,
    /// Attributes in authored order. The `class` entry mirrors `classes`.
    attributes: Vec<(String, String)>,
    /// Class list, kept in sync with the `class` attribute.
    classes: Vec<String>,
    /// Parent element (if any).
    parent: Option<ElementId>,
    /// Child elements, in document order.
    children: Vec<ElementId>,
}

impl ElementData {
    fn new(tag: String) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
            classes: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// The element tree the engine reads and mutates.
///
/// Uses arena-based storage via SlotMap for stable element IDs. An embedder
/// builds the tree through this API, hands the document to the engine, and
/// mirrors attribute changes back out to its real surface.
pub struct Document {
    elements: SlotMap<ElementId, ElementData>,
    /// Top-level elements in insertion order.
    roots: Vec<ElementId>,
    /// Incrementally maintained id-attribute index (first claimant wins).
    ids: HashMap<String, ElementId>,
    /// The currently focused element, if any.
    focused: Option<ElementId>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            elements: SlotMap::with_key(),
            roots: Vec::new(),
            ids: HashMap::new(),
            focused: None,
        }
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Create a detached element with the given tag (normalized lowercase).
    ///
    /// The element starts as a root until appended elsewhere.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        let id = self
            .elements
            .insert(ElementData::new(tag.to_ascii_lowercase()));
        self.roots.push(id);
        tracing::trace!(target: "louver::dom", ?id, tag, "created element");
        id
    }

    /// Check if an element exists in the document.
    #[inline]
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    /// The element's tag name, lowercase.
    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.elements.get(id).map(|d| d.tag.as_str())
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// Detaches `child` from its previous position first.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference` (append when `None`).
    pub fn insert_before(
        &mut self,
        parent: ElementId,
        child: ElementId,
        reference: Option<ElementId>,
    ) -> DomResult<()> {
        if !self.elements.contains_key(parent) || !self.elements.contains_key(child) {
            return Err(DomError::InvalidElementId);
        }
        if parent == child || self.is_ancestor_of(child, parent) {
            return Err(DomError::CircularParentage);
        }

        let index = match reference {
            Some(reference) => {
                let siblings = &self.elements[parent].children;
                match siblings.iter().position(|&c| c == reference) {
                    Some(index) => index,
                    None => return Err(DomError::NotAChild),
                }
            }
            None => usize::MAX, // append
        };

        self.detach(child);

        self.elements[child].parent = Some(parent);
        let siblings = &mut self.elements[parent].children;
        if index >= siblings.len() {
            siblings.push(child);
        } else {
            siblings.insert(index, child);
        }
        Ok(())
    }

    /// Remove an element and its whole subtree from the document.
    pub fn remove(&mut self, id: ElementId) -> DomResult<()> {
        if !self.elements.contains_key(id) {
            return Err(DomError::InvalidElementId);
        }

        let doomed = self.depth_first_preorder(id);
        tracing::trace!(target: "louver::dom", ?id, subtree_size = doomed.len(), "removing element subtree");
        self.detach(id);

        for el in doomed {
            if let Some(data) = self.elements.remove(el) {
                if let Some(attr_id) = data.attribute(attrs::ID)
                    && self.ids.get(attr_id) == Some(&el)
                {
                    self.ids.remove(attr_id);
                }
            }
            if self.focused == Some(el) {
                self.focused = None;
            }
        }
        Ok(())
    }

    /// Remove the element from its parent's child list or the root list.
    fn detach(&mut self, id: ElementId) {
        match self.elements[id].parent.take() {
            Some(parent) => {
                if let Some(parent_data) = self.elements.get_mut(parent) {
                    parent_data.children.retain(|&c| c != id);
                }
            }
            None => self.roots.retain(|&r| r != id),
        }
    }

    /// Check if `potential_ancestor` is an ancestor of `id`.
    fn is_ancestor_of(&self, potential_ancestor: ElementId, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            if current_id == potential_ancestor {
                return true;
            }
            current = self.elements.get(current_id).and_then(|d| d.parent);
        }
        false
    }

    // =========================================================================
    // Tree Traversal
    // =========================================================================

    /// Top-level elements in insertion order.
    #[inline]
    pub fn roots(&self) -> &[ElementId] {
        &self.roots
    }

    /// The element's parent, if any.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(id).and_then(|d| d.parent)
    }

    /// The element's children in document order.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.elements
            .get(id)
            .map(|d| d.children.as_slice())
            .unwrap_or(&[])
    }

    /// All ancestors from immediate parent to root.
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(current_id) = current {
            result.push(current_id);
            current = self.parent(current_id);
        }
        result
    }

    /// All siblings sharing the element's parent, excluding the element.
    ///
    /// Root elements are each other's siblings.
    pub fn siblings(&self, id: ElementId) -> Vec<ElementId> {
        let list = match self.parent(id) {
            Some(parent) => self.children(parent),
            None if self.contains(id) => &self.roots,
            None => &[],
        };
        list.iter().filter(|&&c| c != id).copied().collect()
    }

    /// The sibling immediately before the element, if any.
    pub fn previous_sibling(&self, id: ElementId) -> Option<ElementId> {
        let list = match self.parent(id) {
            Some(parent) => self.children(parent),
            None => self.roots.as_slice(),
        };
        let position = list.iter().position(|&c| c == id)?;
        position.checked_sub(1).map(|i| list[i])
    }

    /// The sibling immediately after the element, if any.
    pub fn next_sibling(&self, id: ElementId) -> Option<ElementId> {
        let list = match self.parent(id) {
            Some(parent) => self.children(parent),
            None => self.roots.as_slice(),
        };
        let position = list.iter().position(|&c| c == id)?;
        list.get(position + 1).copied()
    }

    /// Depth-first pre-order traversal, the element itself first.
    pub fn depth_first_preorder(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        self.preorder_recursive(id, &mut result);
        result
    }

    fn preorder_recursive(&self, id: ElementId, result: &mut Vec<ElementId>) {
        let Some(data) = self.elements.get(id) else {
            return;
        };
        result.push(id);
        for &child in &data.children {
            self.preorder_recursive(child, result);
        }
    }

    // =========================================================================
    // Attributes and Classes
    // =========================================================================

    /// Get an attribute value.
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.elements.get(id).and_then(|d| d.attribute(name))
    }

    /// Check attribute presence (boolean attributes carry empty values).
    pub fn has_attribute(&self, id: ElementId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Set an attribute, replacing any previous value.
    ///
    /// Writing `class` resyncs the class list; writing `id` maintains the
    /// id index. Unknown elements are ignored.
    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) {
        if !self.elements.contains_key(id) {
            return;
        }

        if name == attrs::ID {
            self.unindex_id(id);
        }

        let data = &mut self.elements[id];
        match data.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => data.attributes.push((name.to_string(), value.to_string())),
        }

        if name == "class" {
            data.classes = value.split_whitespace().map(str::to_string).collect();
        } else if name == attrs::ID {
            self.index_id(id, value);
        }
    }

    /// Remove an attribute. Returns whether it was present.
    pub fn remove_attribute(&mut self, id: ElementId, name: &str) -> bool {
        if !self.elements.contains_key(id) {
            return false;
        }
        if name == attrs::ID {
            self.unindex_id(id);
        }

        let data = &mut self.elements[id];
        let before = data.attributes.len();
        data.attributes.retain(|(n, _)| n != name);
        if name == "class" {
            data.classes.clear();
        }
        data.attributes.len() != before
    }

    /// Drop the id-index entry if it points at this element.
    fn unindex_id(&mut self, id: ElementId) {
        if let Some(old) = self.elements[id].attribute(attrs::ID).map(str::to_string)
            && self.ids.get(&old) == Some(&id)
        {
            self.ids.remove(&old);
        }
    }

    /// Index an id value, first live claimant wins.
    fn index_id(&mut self, id: ElementId, value: &str) {
        match self.ids.get(value) {
            Some(&existing)
                if self.contains(existing) && self.attribute(existing, attrs::ID) == Some(value) => {}
            _ => {
                self.ids.insert(value.to_string(), id);
            }
        }
    }

    /// The element's class list.
    pub fn classes(&self, id: ElementId) -> &[String] {
        self.elements
            .get(id)
            .map(|d| d.classes.as_slice())
            .unwrap_or(&[])
    }

    /// Check for a class.
    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.classes(id).iter().any(|c| c == class)
    }

    /// Add a class if not already present.
    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if !self.elements.contains_key(id) || self.has_class(id, class) {
            return;
        }
        self.elements[id].classes.push(class.to_string());
        self.sync_class_attribute(id);
    }

    /// Remove a class. Returns whether it was present.
    pub fn remove_class(&mut self, id: ElementId, class: &str) -> bool {
        if !self.has_class(id, class) {
            return false;
        }
        self.elements[id].classes.retain(|c| c != class);
        self.sync_class_attribute(id);
        true
    }

    /// Mirror the class list back into the `class` attribute.
    fn sync_class_attribute(&mut self, id: ElementId) {
        let data = &mut self.elements[id];
        if data.classes.is_empty() {
            data.attributes.retain(|(n, _)| n != "class");
        } else {
            let value = data.classes.join(" ");
            match data.attributes.iter_mut().find(|(n, _)| n == "class") {
                Some((_, v)) => *v = value,
                None => data.attributes.push(("class".to_string(), value)),
            }
        }
    }

    // =========================================================================
    // Lookup and Queries
    // =========================================================================

    /// Resolve an id-attribute value to an element.
    ///
    /// Uses the incremental index, falling back to a document-order scan when
    /// the indexed entry went stale (e.g. a removed duplicate).
    pub fn element_by_id(&self, value: &str) -> Option<ElementId> {
        if let Some(&el) = self.ids.get(value)
            && self.contains(el)
            && self.attribute(el, attrs::ID) == Some(value)
        {
            return Some(el);
        }
        self.roots
            .iter()
            .flat_map(|&root| self.depth_first_preorder(root))
            .find(|&el| self.attribute(el, attrs::ID) == Some(value))
    }

    /// All elements matching any member of a selector list, document order.
    pub fn query_all(&self, list: &SelectorList) -> Vec<ElementId> {
        self.roots
            .iter()
            .flat_map(|&root| self.depth_first_preorder(root))
            .filter(|&el| any_matches(list, self, el))
            .collect()
    }

    /// Check a single selector against an element.
    pub fn matches(&self, id: ElementId, selector: &Selector) -> bool {
        self.contains(id) && matches(selector, self, id)
    }

    /// Check a selector list against an element.
    pub fn matches_any(&self, id: ElementId, list: &SelectorList) -> bool {
        self.contains(id) && any_matches(list, self, id)
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    /// Which attribute expresses this element's hidden state.
    pub fn visibility_channel(&self, id: ElementId) -> VisibilityChannel {
        if self.has_attribute(id, attrs::ARIA_HIDDEN) {
            VisibilityChannel::AriaHidden
        } else {
            VisibilityChannel::Hidden
        }
    }

    /// Whether the element itself is visible (ancestors not considered).
    pub fn is_visible(&self, id: ElementId) -> bool {
        if !self.contains(id) {
            return false;
        }
        match self.visibility_channel(id) {
            VisibilityChannel::Hidden => !self.has_attribute(id, attrs::HIDDEN),
            VisibilityChannel::AriaHidden => self.attribute(id, attrs::ARIA_HIDDEN) != Some("true"),
        }
    }

    /// Show or hide the element on its visibility channel.
    ///
    /// Only the detected channel's attribute is ever written.
    pub fn set_visible(&mut self, id: ElementId, visible: bool) {
        if !self.contains(id) {
            return;
        }
        match self.visibility_channel(id) {
            VisibilityChannel::Hidden => {
                if visible {
                    self.remove_attribute(id, attrs::HIDDEN);
                } else {
                    self.set_attribute(id, attrs::HIDDEN, "");
                }
            }
            VisibilityChannel::AriaHidden => {
                let value = if visible { "false" } else { "true" };
                self.set_attribute(id, attrs::ARIA_HIDDEN, value);
            }
        }
    }

    // =========================================================================
    // Focus
    // =========================================================================

    /// Whether the element can take focus.
    pub fn is_focusable(&self, id: ElementId) -> bool {
        let Some(data) = self.elements.get(id) else {
            return false;
        };
        if data.attribute("disabled").is_some() {
            return false;
        }
        if data.attribute(attrs::TABINDEX).is_some() {
            return true;
        }
        match data.tag.as_str() {
            "a" | "area" => data.attribute("href").is_some(),
            tag => INTRINSIC_FOCUSABLE.contains(&tag),
        }
    }

    /// Focusable descendants of an element, in document order.
    ///
    /// Skips any branch that is itself hidden, so content nested inside a
    /// separately collapsed region keeps whatever tab order it had.
    pub fn focusable_descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        for &child in self.children(id) {
            self.collect_focusables(child, &mut result);
        }
        result
    }

    fn collect_focusables(&self, id: ElementId, result: &mut Vec<ElementId>) {
        if !self.is_visible(id) {
            return;
        }
        if self.is_focusable(id) {
            result.push(id);
        }
        for &child in self.children(id) {
            self.collect_focusables(child, result);
        }
    }

    /// Move document focus to an element. Returns `false` for unknown IDs.
    pub fn set_focus(&mut self, id: ElementId) -> bool {
        if !self.contains(id) {
            return false;
        }
        tracing::trace!(target: "louver::dom", ?id, "focus moved");
        self.focused = Some(id);
        true
    }

    /// The currently focused element, if any.
    #[inline]
    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    /// Clear document focus.
    pub fn clear_focus(&mut self) {
        self.focused = None;
    }

    // =========================================================================
    // Debug / Diagnostics
    // =========================================================================

    /// Debug dump of an element subtree.
    pub fn dump_tree(&self, id: ElementId) -> DomResult<String> {
        if !self.contains(id) {
            return Err(DomError::InvalidElementId);
        }
        let mut output = String::new();
        self.dump_tree_recursive(id, 0, &mut output);
        Ok(output)
    }

    fn dump_tree_recursive(&self, id: ElementId, depth: usize, output: &mut String) {
        use std::fmt::Write as _;

        let Some(data) = self.elements.get(id) else {
            return;
        };
        let indent = "  ".repeat(depth);
        let _ = write!(output, "{}{}", indent, data.tag);
        if let Some(attr_id) = data.attribute(attrs::ID) {
            let _ = write!(output, "#{}", attr_id);
        }
        for class in &data.classes {
            let _ = write!(output, ".{}", class);
        }
        let _ = write!(output, " [{:?}]", id);
        if !self.is_visible(id) {
            output.push_str(" (hidden)");
        }
        output.push('\n');
        for &child in &data.children {
            self.dump_tree_recursive(child, depth + 1, output);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeContext for Document {
    type Node = ElementId;

    fn context(&self, node: ElementId) -> MatchContext<'_> {
        match self.elements.get(node) {
            Some(data) => MatchContext {
                tag: &data.tag,
                id: data.attribute(attrs::ID),
                classes: &data.classes,
            },
            None => MatchContext::default(),
        }
    }

    fn parent(&self, node: ElementId) -> Option<ElementId> {
        Document::parent(self, node)
    }

    fn previous_sibling(&self, node: ElementId) -> Option<ElementId> {
        Document::previous_sibling(self, node)
    }
}
