//! Event payloads and per-widget signal bundles.
//!
//! Every observable state change flows out through [`Signal`]s grouped into
//! bundles, one bundle per disclosure or accordion. Handlers connect to the
//! public signal fields directly or through the [`DisclosureSignals::on`] and
//! [`AccordionSignals::on`] conveniences.
//!
//! # Key Types
//!
//! - [`Key`] - Keyboard keys the engine understands
//! - [`ToggleEvent`] - Payload for disclosure lifecycle signals
//! - [`ItemEvent`] / [`GroupEvent`] / [`NavEvent`] - Accordion payloads
//! - [`DisclosureSignals`] / [`AccordionSignals`] - Signal bundles
//! - [`Diagnostic`] - Non-fatal conditions reported out of band

use louver_core::{ConnectionId, Signal};
use static_assertions::assert_impl_all;

use crate::accordion::AccordionId;
use crate::disclosure::DisclosureId;
use crate::dom::ElementId;

/// Keyboard keys the engine understands.
///
/// Follows web `KeyboardEvent.code` naming. Anything outside the handled
/// set arrives as [`Key::Unknown`] and is passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Enter,
    Space,
    Tab,
    Escape,
    /// Unknown/unmapped key.
    Unknown(u16),
}

impl Key {
    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Key::ArrowUp | Key::ArrowDown | Key::ArrowLeft | Key::ArrowRight | Key::Home | Key::End
        )
    }

    /// Check if this key activates the element under focus.
    pub fn is_activation(&self) -> bool {
        matches!(self, Key::Enter | Key::Space)
    }
}

// =============================================================================
// Event Payloads
// =============================================================================

/// Payload carried by every disclosure lifecycle signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleEvent {
    /// The disclosure the toggle belongs to.
    pub disclosure: DisclosureId,
    /// The trigger element that owns the disclosure.
    pub trigger: ElementId,
    /// The resolved panel, `None` when the target could not be found.
    pub target: Option<ElementId>,
    /// On `before_*` signals: the state the disclosure still holds. On
    /// `after_*` signals: the state it settled into.
    pub expanded: bool,
}

/// Payload for per-item accordion signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemEvent {
    /// The accordion the item belongs to.
    pub accordion: AccordionId,
    /// The item's trigger element.
    pub item: ElementId,
    /// The item's position within the accordion, in document order.
    pub index: usize,
    /// The state the item settled into.
    pub expanded: bool,
}

/// Payload for whole-group accordion operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupEvent {
    /// The accordion the operation ran on.
    pub accordion: AccordionId,
}

/// Payload for accordion keyboard navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavEvent {
    /// The accordion focus moved within.
    pub accordion: AccordionId,
    /// The trigger that held focus before the move.
    pub from: ElementId,
    /// The trigger that holds focus after the move.
    pub to: ElementId,
    /// Index of `to` within the accordion.
    pub to_index: usize,
}

// =============================================================================
// Signal Bundles
// =============================================================================

/// The six phases of a disclosure toggle, for [`DisclosureSignals::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisclosureEvent {
    /// Fires before any toggle, either direction.
    BeforeToggle,
    /// Fires before an expand starts.
    BeforeExpand,
    /// Fires before a collapse starts.
    BeforeCollapse,
    /// Fires after any toggle settles, either direction.
    AfterToggle,
    /// Fires after an expand settles.
    AfterExpand,
    /// Fires after a collapse settles.
    AfterCollapse,
}

/// Signals emitted over a single disclosure's lifecycle.
///
/// The `before_*` signals fire while the trigger's state still reads the old
/// value; the `after_*` signals fire once the move (including any transition)
/// has settled. Directional and direction-agnostic signals both fire for
/// every toggle: `before_toggle` then `before_expand`/`before_collapse`, and
/// symmetrically on the after side.
#[derive(Default)]
pub struct DisclosureSignals {
    pub before_toggle: Signal<ToggleEvent>,
    pub before_expand: Signal<ToggleEvent>,
    pub before_collapse: Signal<ToggleEvent>,
    pub after_toggle: Signal<ToggleEvent>,
    pub after_expand: Signal<ToggleEvent>,
    pub after_collapse: Signal<ToggleEvent>,
}

impl DisclosureSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// The signal backing a lifecycle phase.
    pub fn signal(&self, event: DisclosureEvent) -> &Signal<ToggleEvent> {
        match event {
            DisclosureEvent::BeforeToggle => &self.before_toggle,
            DisclosureEvent::BeforeExpand => &self.before_expand,
            DisclosureEvent::BeforeCollapse => &self.before_collapse,
            DisclosureEvent::AfterToggle => &self.after_toggle,
            DisclosureEvent::AfterExpand => &self.after_expand,
            DisclosureEvent::AfterCollapse => &self.after_collapse,
        }
    }

    /// Connect a handler to one lifecycle phase.
    pub fn on<F>(&self, event: DisclosureEvent, handler: F) -> ConnectionId
    where
        F: Fn(&ToggleEvent) + Send + Sync + 'static,
    {
        self.signal(event).connect(handler)
    }

    /// Block every signal in the bundle and drop all handlers. A stray
    /// emitter holding the bundle past destroy finds nothing to call.
    pub(crate) fn shutdown(&self) {
        for signal in [
            &self.before_toggle,
            &self.before_expand,
            &self.before_collapse,
            &self.after_toggle,
            &self.after_expand,
            &self.after_collapse,
        ] {
            signal.set_blocked(true);
            signal.disconnect_all();
        }
    }
}

/// The item-level phases of accordion activity, for [`AccordionSignals::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccordionEvent {
    /// An item settled in either direction.
    ItemToggle,
    /// An item settled open.
    ItemOpen,
    /// An item settled closed.
    ItemClose,
}

/// Signals emitted by an accordion on top of its items' own signals.
///
/// Item-level signals re-emit the underlying disclosure activity with the
/// accordion's own coordinates attached; the item's [`DisclosureSignals`]
/// keep firing independently. The group and navigation signals carry their
/// own payload types and are connected directly on the fields.
#[derive(Default)]
pub struct AccordionSignals {
    /// An item settled in either direction.
    pub item_toggle: Signal<ItemEvent>,
    /// An item settled open.
    pub item_open: Signal<ItemEvent>,
    /// An item settled closed.
    pub item_close: Signal<ItemEvent>,
    /// A whole-group open finished. Fires once per call, regardless of how
    /// many items actually moved.
    pub all_open: Signal<GroupEvent>,
    /// A whole-group close finished. Fires once per call, regardless of how
    /// many items actually moved.
    pub all_close: Signal<GroupEvent>,
    /// Roving focus moved between triggers.
    pub keyboard_navigation: Signal<NavEvent>,
}

impl AccordionSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// The signal backing an item-level phase.
    pub fn signal(&self, event: AccordionEvent) -> &Signal<ItemEvent> {
        match event {
            AccordionEvent::ItemToggle => &self.item_toggle,
            AccordionEvent::ItemOpen => &self.item_open,
            AccordionEvent::ItemClose => &self.item_close,
        }
    }

    /// Connect a handler to one item-level phase.
    pub fn on<F>(&self, event: AccordionEvent, handler: F) -> ConnectionId
    where
        F: Fn(&ItemEvent) + Send + Sync + 'static,
    {
        self.signal(event).connect(handler)
    }

    /// Block every signal in the bundle and drop all handlers.
    pub(crate) fn shutdown(&self) {
        for signal in [&self.item_toggle, &self.item_open, &self.item_close] {
            signal.set_blocked(true);
            signal.disconnect_all();
        }
        for signal in [&self.all_open, &self.all_close] {
            signal.set_blocked(true);
            signal.disconnect_all();
        }
        self.keyboard_navigation.set_blocked(true);
        self.keyboard_navigation.disconnect_all();
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Non-fatal conditions the engine reports instead of failing.
///
/// Emitted on [`Engine::diagnostics`](crate::Engine::diagnostics); an
/// embedder that never connects simply misses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A trigger's `aria-controls` value matched no element at toggle time.
    /// The trigger's state still flips so the two cannot drift apart.
    UnresolvedTarget {
        disclosure: DisclosureId,
        trigger: ElementId,
        target_id: String,
    },
    /// A transition never reported an end and was force-settled at the
    /// deadline.
    SettleTimeout { element: ElementId },
    /// Sibling auto-collapse stopped at the recursion bound.
    CollapseDepthExceeded { origin: ElementId, depth: usize },
}

assert_impl_all!(DisclosureSignals: Send, Sync, Default);
assert_impl_all!(AccordionSignals: Send, Sync, Default);
assert_impl_all!(Diagnostic: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_key_classification() {
        assert!(Key::ArrowDown.is_navigation());
        assert!(Key::Home.is_navigation());
        assert!(!Key::Enter.is_navigation());
        assert!(Key::Space.is_activation());
        assert!(!Key::Tab.is_activation());
        assert!(!Key::Unknown(0x1e).is_navigation());
    }

    #[test]
    fn test_on_routes_to_matching_signal() {
        let signals = DisclosureSignals::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = Arc::clone(&count);
        signals.on(DisclosureEvent::AfterExpand, move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        let event = ToggleEvent {
            disclosure: DisclosureId::default(),
            trigger: ElementId::default(),
            target: None,
            expanded: true,
        };
        signals.before_toggle.emit(event);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        signals.after_expand.emit(event);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_on_connection_can_be_disconnected() {
        let signals = DisclosureSignals::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = Arc::clone(&count);
        let id = signals.on(DisclosureEvent::BeforeToggle, move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert!(signals.signal(DisclosureEvent::BeforeToggle).disconnect(id));

        signals.before_toggle.emit(ToggleEvent {
            disclosure: DisclosureId::default(),
            trigger: ElementId::default(),
            target: None,
            expanded: false,
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shutdown_blocks_and_empties() {
        let signals = DisclosureSignals::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = Arc::clone(&count);
        signals.on(DisclosureEvent::AfterToggle, move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        signals.shutdown();
        assert_eq!(signals.after_toggle.connection_count(), 0);

        // The block outlives the purge; a late connection hears nothing.
        let count_clone = Arc::clone(&count);
        signals.on(DisclosureEvent::AfterToggle, move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        signals.after_toggle.emit(ToggleEvent {
            disclosure: DisclosureId::default(),
            trigger: ElementId::default(),
            target: None,
            expanded: true,
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_accordion_on_routes_item_phases() {
        let signals = AccordionSignals::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = Arc::clone(&count);
        signals.on(AccordionEvent::ItemOpen, move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        let event = ItemEvent {
            accordion: AccordionId::default(),
            item: ElementId::default(),
            index: 0,
            expanded: true,
        };
        signals.item_close.emit(event);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        signals.item_open.emit(event);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
