//! Headless disclosure state engine.
//!
//! Louver drives expand/collapse widgets without owning a user interface:
//! triggers, the panels they control, and accordions composed of them. All
//! interaction state lives in DOM-shaped attributes on a retained
//! [`Document`]; an embedder mirrors that document into a real UI tree and
//! feeds platform activity (clicks, key presses, animation frames,
//! transition-end notifications) back through the [`Engine`].
//!
//! The crate provides:
//!
//! - **Document**: a retained element tree with attributes, classes,
//!   selector queries, visibility channels, and focus
//! - **Signals**: type-safe, strictly ordered lifecycle notifications
//! - **Motion**: two-phase enter/leave CSS class choreography with an
//!   exactly-once settle guarantee
//! - **Disclosure**: the trigger/panel primitive with accessibility-synced
//!   expand state, focus scoping, inert regions, and sibling auto-collapse
//! - **Accordion**: grouped disclosures with single-/multi-select policy,
//!   roving-tabindex keyboard navigation, and aggregated events
//!
//! Instrumented with `tracing`; Louver never installs a subscriber. The
//! filterable per-subsystem targets are listed in [`louver_core::logging`].
//!
//! # Disclosure Example
//!
//! ```
//! use louver::{dom::attrs, Engine};
//!
//! let mut engine = Engine::new();
//! let doc = engine.document_mut();
//! let trigger = doc.create_element("button");
//! doc.add_class(trigger, attrs::TRIGGER_CLASS);
//! doc.set_attribute(trigger, attrs::ARIA_CONTROLS, "details");
//! let panel = doc.create_element("div");
//! doc.set_attribute(panel, attrs::ID, "details");
//! doc.set_visible(panel, false);
//!
//! let disclosure = engine.disclosure(trigger)?;
//! engine.toggle(disclosure)?;
//! assert!(engine.is_expanded(disclosure)?);
//! assert!(engine.document().is_visible(panel));
//! # Ok::<(), louver::Error>(())
//! ```
//!
//! # Accordion Example
//!
//! ```
//! use louver::{accordion::AccordionOptions, dom::attrs, Engine, Key};
//!
//! let mut engine = Engine::new();
//! let doc = engine.document_mut();
//! let container = doc.create_element("section");
//! let mut triggers = Vec::new();
//! for name in ["shipping", "returns", "warranty"] {
//!     let trigger = doc.create_element("button");
//!     doc.add_class(trigger, attrs::TRIGGER_CLASS);
//!     doc.set_attribute(trigger, attrs::ARIA_CONTROLS, name);
//!     let panel = doc.create_element("div");
//!     doc.set_attribute(panel, attrs::ID, name);
//!     doc.set_visible(panel, false);
//!     doc.append_child(container, trigger)?;
//!     doc.append_child(container, panel)?;
//!     triggers.push(trigger);
//! }
//!
//! let accordion = engine.accordion(container, AccordionOptions::default())?;
//! engine.click(triggers[0])?;
//! engine.click(triggers[1])?; // single-select: the first item closes
//! assert_eq!(engine.accordion_state(accordion)?, vec![false, true, false]);
//!
//! engine.key_down(triggers[1], Key::ArrowDown)?;
//! assert_eq!(engine.focused_index(accordion)?, Some(2));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Animated Settle Example
//!
//! ```
//! use louver::{dom::attrs, Engine};
//!
//! let mut engine = Engine::new();
//! // Pretend the embedder's stylesheet styles every transition name.
//! engine.set_style_probe(Some(Box::new(|_, _, _| true)));
//! let doc = engine.document_mut();
//! let trigger = doc.create_element("button");
//! doc.set_attribute(trigger, attrs::ARIA_CONTROLS, "sheet");
//! let panel = doc.create_element("div");
//! doc.set_attribute(panel, attrs::ID, "sheet");
//! doc.set_attribute(panel, attrs::TRANSITION, "slide");
//! doc.set_visible(panel, false);
//!
//! let disclosure = engine.disclosure(trigger)?;
//! engine.toggle(disclosure)?;
//! assert!(engine.document().has_class(panel, "slide-enter-from"));
//!
//! engine.tick_frame(); // animation frame: -from swaps to -to
//! assert!(engine.document().has_class(panel, "slide-enter-to"));
//!
//! engine.notify_transition_end(panel); // the CSS transition finished
//! assert!(engine.document().classes(panel).is_empty());
//! assert!(engine.is_expanded(disclosure)?);
//! # Ok::<(), louver::Error>(())
//! ```

pub mod accordion;
pub mod disclosure;
pub mod dom;
pub mod engine;
mod error;
pub mod events;
pub mod motion;


pub use accordion::{AccordionId, AccordionOptions};
pub use disclosure::{DisclosureId, MAX_COLLAPSE_DEPTH};
pub use dom::{Document, DomError, DomResult, ElementId, VisibilityChannel};
pub use engine::Engine;
pub use error::{Error, Result};
pub use events::{
    AccordionEvent, AccordionSignals, Diagnostic, DisclosureEvent, DisclosureSignals, GroupEvent,
    ItemEvent, Key, NavEvent, ToggleEvent,
};
pub use motion::{
    ClassDriver, CompletionKind, FrameOutcome, StyleProbe, TransitionCoordinator,
    TransitionDirection, TransitionDriver, DEFAULT_SETTLE_DEADLINE,
};

pub use louver_core::{ConnectionGuard, ConnectionId, Signal};
