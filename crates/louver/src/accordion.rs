//! Accordion: a container of disclosures under one policy.
//!
//! An accordion discovers the trigger-class elements inside a container and
//! composes their disclosures. Single-select is not a separate coordinator:
//! it just sets the sibling-collapse flag on every discovered trigger and
//! lets the disclosure layer do what it already does. On top of that the
//! accordion adds roving-tabindex keyboard navigation, re-emits each item's
//! settled toggles with group context, and offers a programmatic surface
//! over item indices.
//!
//! # Example
//!
//! ```
//! use louver::{accordion::AccordionOptions, dom::attrs, Engine};
//!
//! let mut engine = Engine::new();
//! let doc = engine.document_mut();
//! let container = doc.create_element("div");
//! for name in ["a", "b"] {
//!     let trigger = doc.create_element("button");
//!     doc.add_class(trigger, attrs::TRIGGER_CLASS);
//!     doc.set_attribute(trigger, attrs::ARIA_CONTROLS, name);
//!     let panel = doc.create_element("div");
//!     doc.set_attribute(panel, attrs::ID, name);
//!     doc.set_visible(panel, false);
//!     doc.append_child(container, trigger)?;
//!     doc.append_child(container, panel)?;
//! }
//!
//! let accordion = engine.accordion(container, AccordionOptions::default())?;
//! engine.open_item(accordion, 0)?;
//! assert_eq!(engine.accordion_state(accordion)?, vec![true, false]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;

use slotmap::new_key_type;

use louver_core::ConnectionId;
use louver_style::selector::parse_selector_list;

use crate::disclosure::DisclosureId;
use crate::dom::{attrs, ElementId};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::events::{AccordionSignals, GroupEvent, ItemEvent, Key, NavEvent};

new_key_type! {
    /// Handle to an accordion instance owned by an [`Engine`].
    pub struct AccordionId;
}

/// Accordion construction options.
///
/// Container attributes override these at construction: `data-accordion`
/// (`"single"`/`"multi"`) wins over [`multi_select`], `data-keyboard`
/// (`"true"`/`"false"`) wins over [`keyboard`]. Other values leave the
/// option as passed.
///
/// [`multi_select`]: AccordionOptions::multi_select
/// [`keyboard`]: AccordionOptions::keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccordionOptions {
    /// Allow several items open at once. Off by default: construction sets
    /// the sibling-collapse flag on every discovered trigger.
    pub multi_select: bool,
    /// Roving-tabindex arrow navigation across triggers. On by default.
    pub keyboard: bool,
}

impl Default for AccordionOptions {
    fn default() -> Self {
        Self {
            multi_select: false,
            keyboard: true,
        }
    }
}

impl AccordionOptions {
    pub fn with_multi_select(mut self, multi_select: bool) -> Self {
        self.multi_select = multi_select;
        self
    }

    pub fn with_keyboard(mut self, keyboard: bool) -> Self {
        self.keyboard = keyboard;
        self
    }
}

/// One accordion: ordered items plus policy.
pub(crate) struct Accordion {
    pub(crate) container: ElementId,
    /// Trigger element and its disclosure, in document order at discovery.
    pub(crate) items: Vec<(ElementId, DisclosureId)>,
    pub(crate) options: AccordionOptions,
    pub(crate) signals: Arc<AccordionSignals>,
    /// Index of the roving-tabindex holder.
    pub(crate) focus: usize,
    /// Connections on item `after_toggle` signals, dropped on destroy.
    pub(crate) subscriptions: Vec<(DisclosureId, ConnectionId)>,
}

impl Engine {
    /// Get or create the accordion for a container element.
    ///
    /// Idempotent per container. Discovery walks the container's subtree in
    /// document order and takes every element carrying the trigger class;
    /// triggers that already own a disclosure keep it. With
    /// `multi_select = false` every discovered trigger gets the
    /// sibling-collapse flag; an authored flag is never removed in multi
    /// mode.
    ///
    /// # Errors
    ///
    /// [`Error::Lookup`] when the container is not in the document.
    pub fn accordion(&mut self, container: ElementId, options: AccordionOptions) -> Result<AccordionId> {
        if let Some(&existing) = self.accordion_lookup.get(container) {
            return Ok(existing);
        }
        if !self.doc.contains(container) {
            return Err(Error::lookup("accordion container is not in the document"));
        }

        let mut options = options;
        match self.doc.attribute(container, attrs::ACCORDION_MODE) {
            Some("multi") => options.multi_select = true,
            Some("single") => options.multi_select = false,
            _ => {}
        }
        match self.doc.attribute(container, attrs::ACCORDION_KEYBOARD) {
            Some("true") => options.keyboard = true,
            Some("false") => options.keyboard = false,
            _ => {}
        }

        let triggers: Vec<ElementId> = self
            .doc
            .depth_first_preorder(container)
            .into_iter()
            .skip(1)
            .filter(|&el| self.doc.has_class(el, attrs::TRIGGER_CLASS))
            .collect();

        let mut items = Vec::with_capacity(triggers.len());
        for trigger in triggers {
            items.push((trigger, self.disclosure(trigger)?));
        }

        if !options.multi_select {
            for &(trigger, _) in &items {
                self.doc.set_attribute(trigger, attrs::AUTO_COLLAPSE, "");
            }
        }

        let signals = Arc::new(AccordionSignals::new());
        let handle = self.accordions.insert(Accordion {
            container,
            items: items.clone(),
            options,
            signals: Arc::clone(&signals),
            focus: 0,
            subscriptions: Vec::new(),
        });
        self.accordion_lookup.insert(container, handle);

        if options.keyboard {
            for (index, &(trigger, _)) in items.iter().enumerate() {
                self.doc
                    .set_attribute(trigger, attrs::TABINDEX, if index == 0 { "0" } else { "-1" });
                self.keyboard_lookup.insert(trigger, handle);
            }
        }

        // Re-emission: every settled item toggle surfaces on the group
        // signals with the item's index attached.
        let mut subscriptions = Vec::with_capacity(items.len());
        for (index, &(item, disclosure)) in items.iter().enumerate() {
            if let Some(instance) = self.disclosures.get(disclosure) {
                let signals = Arc::clone(&signals);
                let connection = instance.signals.after_toggle.connect(move |event| {
                    let item_event = ItemEvent {
                        accordion: handle,
                        item,
                        index,
                        expanded: event.expanded,
                    };
                    signals.item_toggle.emit(item_event);
                    if item_event.expanded {
                        signals.item_open.emit(item_event);
                    } else {
                        signals.item_close.emit(item_event);
                    }
                });
                subscriptions.push((disclosure, connection));
            }
        }
        if let Some(accordion) = self.accordions.get_mut(handle) {
            accordion.subscriptions = subscriptions;
        }

        tracing::debug!(
            target: "louver::accordion",
            ?handle,
            ?container,
            items = items.len(),
            multi_select = options.multi_select,
            keyboard = options.keyboard,
            "accordion created"
        );
        Ok(handle)
    }

    /// [`accordion`](Engine::accordion) addressed by selector instead of
    /// handle; the first match in document order is the container.
    ///
    /// # Errors
    ///
    /// [`Error::Selector`] on a malformed selector, [`Error::Lookup`] when
    /// nothing matches.
    pub fn accordion_by_selector(&mut self, selector: &str, options: AccordionOptions) -> Result<AccordionId> {
        let list = parse_selector_list(selector)?;
        let container = self
            .doc
            .query_all(&list)
            .into_iter()
            .next()
            .ok_or_else(|| Error::lookup(format!("no element matches {selector:?}")))?;
        self.accordion(container, options)
    }

    /// Route a key press on an element through accordion navigation.
    ///
    /// Returns `true` when the key was consumed, in which case the embedder
    /// should suppress its platform default. Arrow keys move the roving
    /// tabindex with wraparound, `Home`/`End` jump to the edges, and
    /// `Enter`/`Space` activate the trigger through the same path as
    /// [`click`](Engine::click). Elements without keyboard navigation and
    /// keys outside the table return `false`.
    pub fn key_down(&mut self, element: ElementId, key: Key) -> Result<bool> {
        let Some(&handle) = self.keyboard_lookup.get(element) else {
            return Ok(false);
        };
        let accordion = self
            .accordions
            .get(handle)
            .ok_or_else(|| Error::detached("accordion"))?;
        let Some(from) = accordion.items.iter().position(|&(trigger, _)| trigger == element) else {
            return Ok(false);
        };
        let count = accordion.items.len();

        let to = match key {
            Key::ArrowDown => (from + 1) % count,
            Key::ArrowUp => (from + count - 1) % count,
            Key::Home => 0,
            Key::End => count - 1,
            Key::Enter | Key::Space => return self.click(element),
            _ => return Ok(false),
        };
        self.move_accordion_focus(handle, from, to);
        Ok(true)
    }

    /// Move the roving tabindex. A same-index move is consumed but emits
    /// nothing.
    fn move_accordion_focus(&mut self, handle: AccordionId, from: usize, to: usize) {
        if from == to {
            return;
        }
        let Some(accordion) = self.accordions.get(handle) else {
            return;
        };
        let from_el = accordion.items[from].0;
        let to_el = accordion.items[to].0;
        let signals = Arc::clone(&accordion.signals);

        self.doc.set_attribute(from_el, attrs::TABINDEX, "-1");
        self.doc.set_attribute(to_el, attrs::TABINDEX, "0");
        self.doc.set_focus(to_el);
        if let Some(accordion) = self.accordions.get_mut(handle) {
            accordion.focus = to;
        }
        tracing::trace!(target: "louver::accordion", ?handle, from, to, "roving focus moved");
        signals.keyboard_navigation.emit(NavEvent {
            accordion: handle,
            from: from_el,
            to: to_el,
            to_index: to,
        });
    }

    /// Toggle the item at `index`.
    ///
    /// # Errors
    ///
    /// [`Error::Detached`] on a dead handle, [`Error::Lookup`] when the
    /// index is out of range.
    pub fn toggle_item(&mut self, handle: AccordionId, index: usize) -> Result<()> {
        let disclosure = self.item_disclosure(handle, index)?;
        self.toggle(disclosure)
    }

    /// Open the item at `index`; no signals when it is already open.
    pub fn open_item(&mut self, handle: AccordionId, index: usize) -> Result<()> {
        let disclosure = self.item_disclosure(handle, index)?;
        self.open(disclosure)
    }

    /// Close the item at `index`; no signals when it is already closed.
    pub fn close_item(&mut self, handle: AccordionId, index: usize) -> Result<()> {
        let disclosure = self.item_disclosure(handle, index)?;
        self.close(disclosure)
    }

    /// Open every item and emit `all_open` once, even when nothing changed.
    /// On a single-select accordion this is wholly inert: no items move and
    /// no event fires.
    pub fn open_all(&mut self, handle: AccordionId) -> Result<()> {
        let accordion = self
            .accordions
            .get(handle)
            .ok_or_else(|| Error::detached("accordion"))?;
        if !accordion.options.multi_select {
            tracing::debug!(target: "louver::accordion", ?handle, "open_all ignored in single-select mode");
            return Ok(());
        }
        let disclosures: Vec<DisclosureId> = accordion.items.iter().map(|&(_, d)| d).collect();
        let signals = Arc::clone(&accordion.signals);
        for disclosure in disclosures {
            self.open(disclosure)?;
        }
        signals.all_open.emit(GroupEvent { accordion: handle });
        Ok(())
    }

    /// Close every item, in any mode, and emit `all_close` once, even when
    /// nothing changed.
    pub fn close_all(&mut self, handle: AccordionId) -> Result<()> {
        let accordion = self
            .accordions
            .get(handle)
            .ok_or_else(|| Error::detached("accordion"))?;
        let disclosures: Vec<DisclosureId> = accordion.items.iter().map(|&(_, d)| d).collect();
        let signals = Arc::clone(&accordion.signals);
        for disclosure in disclosures {
            self.close(disclosure)?;
        }
        signals.all_close.emit(GroupEvent { accordion: handle });
        Ok(())
    }

    /// Per-item expanded states, read live from the triggers, in item
    /// order. Never cached.
    pub fn accordion_state(&self, handle: AccordionId) -> Result<Vec<bool>> {
        let accordion = self
            .accordions
            .get(handle)
            .ok_or_else(|| Error::detached("accordion"))?;
        accordion
            .items
            .iter()
            .map(|&(_, disclosure)| self.is_expanded(disclosure))
            .collect()
    }

    /// Index of the roving-tabindex holder; `None` for an itemless
    /// accordion.
    pub fn focused_index(&self, handle: AccordionId) -> Result<Option<usize>> {
        let accordion = self
            .accordions
            .get(handle)
            .ok_or_else(|| Error::detached("accordion"))?;
        if accordion.items.is_empty() {
            return Ok(None);
        }
        Ok(Some(accordion.focus))
    }

    /// The signal bundle of an accordion.
    pub fn accordion_signals(&self, handle: AccordionId) -> Result<&AccordionSignals> {
        self.accordions
            .get(handle)
            .map(|a| a.signals.as_ref())
            .ok_or_else(|| Error::detached("accordion"))
    }

    /// Tear an accordion down: drop keyboard routing for its triggers,
    /// disconnect the re-emission subscriptions and every handler on the
    /// group signals, and free the container for a fresh construction. The
    /// item disclosures and their attributes stay as they are.
    pub fn destroy_accordion(&mut self, handle: AccordionId) -> Result<()> {
        let accordion = self
            .accordions
            .remove(handle)
            .ok_or_else(|| Error::detached("accordion"))?;
        self.accordion_lookup.remove(accordion.container);
        for &(trigger, _) in &accordion.items {
            self.keyboard_lookup.remove(trigger);
        }
        for (disclosure, connection) in accordion.subscriptions {
            if let Some(instance) = self.disclosures.get(disclosure) {
                instance.signals.after_toggle.disconnect(connection);
            }
        }

        accordion.signals.shutdown();

        tracing::debug!(target: "louver::accordion", ?handle, "accordion destroyed");
        Ok(())
    }

    fn item_disclosure(&self, handle: AccordionId, index: usize) -> Result<DisclosureId> {
        let accordion = self
            .accordions
            .get(handle)
            .ok_or_else(|| Error::detached("accordion"))?;
        accordion
            .items
            .get(index)
            .map(|&(_, disclosure)| disclosure)
            .ok_or_else(|| Error::lookup(format!("accordion has no item {index}")))
    }
}
