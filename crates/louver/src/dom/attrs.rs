//! The attribute contract.
//!
//! Disclosure state lives in attributes on the element tree, never in
//! component fields, so any embedder that mirrors attributes out to a real
//! surface gets correct assistive-technology semantics for free. These
//! constants are the complete wire protocol.

/// Trigger attribute holding `"true"`/`"false"`; the source of truth for
/// expanded state.
pub const ARIA_EXPANDED: &str = "aria-expanded";

/// Trigger attribute naming the ID of the controlled panel.
pub const ARIA_CONTROLS: &str = "aria-controls";

/// Presence-only trigger attribute opting into sibling auto-collapse.
pub const AUTO_COLLAPSE: &str = "data-auto-collapse";

/// Target attribute naming the transition class family to run on
/// show/hide (e.g. `"fade"` yields `fade-enter-active` and friends).
pub const TRANSITION: &str = "data-transition";

/// Target attribute holding a comma-separated selector list; matching
/// elements are made inert while the panel is open.
pub const INERT_SCOPE: &str = "data-inert-scope";

/// Boolean visibility attribute (presence means hidden).
pub const HIDDEN: &str = "hidden";

/// Assistive-technology visibility attribute (`"true"`/`"false"`). An
/// element carrying it at first use stays on this channel; otherwise the
/// [`HIDDEN`] channel is used. Exactly one channel is ever written.
pub const ARIA_HIDDEN: &str = "aria-hidden";

/// Container attribute selecting accordion mode: `"single"` or `"multi"`.
/// Overrides the options passed at construction.
pub const ACCORDION_MODE: &str = "data-accordion";

/// Container attribute enabling/disabling accordion keyboard navigation:
/// `"true"` or `"false"`. Overrides the options passed at construction.
pub const ACCORDION_KEYBOARD: &str = "data-keyboard";

/// Tab-order attribute, written during roving focus and reachability
/// adjustment.
pub const TABINDEX: &str = "tabindex";

/// Inert side-effect attribute (presence-only), applied to elements matched
/// by an open panel's [`INERT_SCOPE`] list.
pub const INERT: &str = "inert";

/// The standard id attribute; [`ARIA_CONTROLS`] references resolve against it.
pub const ID: &str = "id";

/// Class marking an element as a disclosure trigger, used by bulk scanning
/// and accordion discovery.
pub const TRIGGER_CLASS: &str = "disclosure";
