//! The disclosure primitive: one trigger, zero-or-one panel.
//!
//! A disclosure binds a trigger element to the panel its `aria-controls`
//! attribute names. Toggling flips the trigger's `aria-expanded` attribute
//! (the single source of truth; there is no shadow state), shows or hides
//! the panel on its visibility channel, rewrites `tabindex` on the panel's
//! focusable descendants, applies the panel's inert scope, and runs the
//! panel's named transition when it has one.
//!
//! The expanded attribute flips `"true"` *before* an entering transition
//! starts, so assistive technology perceives the content immediately, but
//! flips `"false"` only *after* the leaving transition settles, so content
//! stays perceivable on the way out. The asymmetry is load-bearing.
//!
//! Instances live in the [`Engine`] and are addressed by [`DisclosureId`].
//! The panel is never cached: it is re-resolved by id on every toggle, so
//! replacing panel content (or the panel itself, keeping the id) just works.
//!
//! # Example
//!
//! ```
//! use louver::{dom::attrs, Engine};
//!
//! let mut engine = Engine::new();
//! let doc = engine.document_mut();
//! let trigger = doc.create_element("button");
//! doc.set_attribute(trigger, attrs::ARIA_CONTROLS, "panel");
//! let panel = doc.create_element("div");
//! doc.set_attribute(panel, attrs::ID, "panel");
//!
//! let handle = engine.disclosure(trigger)?;
//! engine.toggle(handle)?;
//! assert!(engine.is_expanded(handle)?);
//! # Ok::<(), louver::Error>(())
//! ```

use std::sync::Arc;

use slotmap::new_key_type;

use louver_style::selector::{parse_selector, Selector, SelectorList};

use crate::dom::{attrs, Document, ElementId};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::events::{Diagnostic, DisclosureSignals, ToggleEvent};
use crate::motion::TransitionDirection;

/// Recursion bound for sibling auto-collapse.
///
/// Well-formed trees never get past depth two; the bound exists for authored
/// states with many expanded flagged siblings, where the collapse cascade
/// chains through each of them.
pub const MAX_COLLAPSE_DEPTH: usize = 32;

new_key_type! {
    /// Handle to a disclosure instance owned by an [`Engine`].
    pub struct DisclosureId;
}

/// One trigger/panel binding.
pub(crate) struct Disclosure {
    pub(crate) trigger: ElementId,
    pub(crate) signals: Arc<DisclosureSignals>,
}

fn expanded_value(expanded: bool) -> &'static str {
    if expanded {
        "true"
    } else {
        "false"
    }
}

impl Engine {
    /// Get or create the disclosure owned by a trigger element.
    ///
    /// Idempotent: a second call on the same element (or on one of the
    /// panel's registered close controls) returns the existing handle.
    /// Elements inside the resolved panel whose `aria-controls` names the
    /// same id are registered as close controls of this instance, so close
    /// buttons living in the panel route to it.
    ///
    /// # Errors
    ///
    /// [`Error::Lookup`] when the element is not in the document.
    pub fn disclosure(&mut self, trigger: ElementId) -> Result<DisclosureId> {
        if let Some(&existing) = self.disclosure_lookup.get(trigger) {
            return Ok(existing);
        }
        if !self.doc.contains(trigger) {
            return Err(Error::lookup("trigger element is not in the document"));
        }

        let handle = self.disclosures.insert(Disclosure {
            trigger,
            signals: Arc::new(DisclosureSignals::new()),
        });
        self.disclosure_lookup.insert(trigger, handle);
        tracing::debug!(target: "louver::disclosure", ?handle, ?trigger, "disclosure created");

        // Close controls: descendants of the panel that reference the same
        // target id. Bound once, here; elements that already own an
        // instance keep it.
        if let Some(target_id) = self.doc.attribute(trigger, attrs::ARIA_CONTROLS).map(str::to_string)
            && let Some(target) = self.doc.element_by_id(&target_id)
        {
            let descendants: Vec<ElementId> = self.doc.depth_first_preorder(target);
            for el in descendants.into_iter().skip(1) {
                if self.doc.attribute(el, attrs::ARIA_CONTROLS) == Some(target_id.as_str())
                    && !self.disclosure_lookup.contains_key(el)
                {
                    self.disclosure_lookup.insert(el, handle);
                    tracing::trace!(target: "louver::disclosure", ?handle, ?el, "close control registered");
                }
            }
        }

        Ok(handle)
    }

    /// The signal bundle of a disclosure.
    pub fn disclosure_signals(&self, handle: DisclosureId) -> Result<&DisclosureSignals> {
        self.disclosures
            .get(handle)
            .map(|d| d.signals.as_ref())
            .ok_or_else(|| Error::detached("disclosure"))
    }

    /// Whether the disclosure is currently expanded, read live from the
    /// trigger's `aria-expanded` attribute. Absence reads as collapsed.
    pub fn is_expanded(&self, handle: DisclosureId) -> Result<bool> {
        let disclosure = self
            .disclosures
            .get(handle)
            .ok_or_else(|| Error::detached("disclosure"))?;
        Ok(self.doc.attribute(disclosure.trigger, attrs::ARIA_EXPANDED) == Some("true"))
    }

    /// Toggle the disclosure to the opposite of its current state.
    pub fn toggle(&mut self, handle: DisclosureId) -> Result<()> {
        let trigger = self
            .disclosures
            .get(handle)
            .ok_or_else(|| Error::detached("disclosure"))?
            .trigger;
        self.toggle_disclosure(handle, trigger, trigger, 0)
    }

    /// Expand if collapsed; silent no-op (no signals) when already expanded.
    pub fn open(&mut self, handle: DisclosureId) -> Result<()> {
        if self.is_expanded(handle)? {
            return Ok(());
        }
        self.toggle(handle)
    }

    /// Collapse if expanded; silent no-op (no signals) when already
    /// collapsed.
    pub fn close(&mut self, handle: DisclosureId) -> Result<()> {
        if self.is_expanded(handle)? {
            return self.toggle(handle);
        }
        Ok(())
    }

    /// Tear a disclosure down.
    ///
    /// Unregisters the trigger and every close control, disconnects all
    /// signal handlers, and drops any in-flight transition on the panel
    /// without settling it. Instances are never destroyed implicitly.
    pub fn destroy_disclosure(&mut self, handle: DisclosureId) -> Result<()> {
        let disclosure = self
            .disclosures
            .remove(handle)
            .ok_or_else(|| Error::detached("disclosure"))?;

        let registered: Vec<ElementId> = self
            .disclosure_lookup
            .iter()
            .filter(|&(_, &owner)| owner == handle)
            .map(|(el, _)| el)
            .collect();
        for el in registered {
            self.disclosure_lookup.remove(el);
        }

        if let Some(target_id) = self.doc.attribute(disclosure.trigger, attrs::ARIA_CONTROLS).map(str::to_string)
            && let Some(target) = self.doc.element_by_id(&target_id)
        {
            self.transitions.cancel(&mut self.doc, target);
        }

        disclosure.signals.shutdown();

        tracing::debug!(target: "louver::disclosure", ?handle, "disclosure destroyed");
        Ok(())
    }

    /// Resolve the trigger's `aria-controls` reference, reporting a
    /// diagnostic when the reference dangles. No reference means no panel
    /// and is not a miss.
    fn resolve_target(&self, handle: DisclosureId, trigger: ElementId) -> Option<ElementId> {
        let target_id = self.doc.attribute(trigger, attrs::ARIA_CONTROLS)?;
        match self.doc.element_by_id(target_id) {
            Some(target) => Some(target),
            None => {
                tracing::debug!(
                    target: "louver::disclosure",
                    ?trigger,
                    target_id,
                    "aria-controls does not resolve"
                );
                self.diagnostics.emit(Diagnostic::UnresolvedTarget {
                    disclosure: handle,
                    trigger,
                    target_id: target_id.to_string(),
                });
                None
            }
        }
    }

    /// The toggle pipeline. `origin` is the trigger that started a sibling
    /// collapse cascade (the trigger itself outside one); `depth` is the
    /// cascade recursion depth.
    pub(crate) fn toggle_disclosure(
        &mut self,
        handle: DisclosureId,
        trigger: ElementId,
        origin: ElementId,
        depth: usize,
    ) -> Result<()> {
        let signals = Arc::clone(
            &self
                .disclosures
                .get(handle)
                .ok_or_else(|| Error::detached("disclosure"))?
                .signals,
        );

        let current = self.doc.attribute(trigger, attrs::ARIA_EXPANDED) == Some("true");
        let next = !current;
        let target = self.resolve_target(handle, trigger);
        tracing::debug!(target: "louver::disclosure", ?handle, current, next, "toggle");

        // The before signals carry the pre-toggle state.
        let before = ToggleEvent {
            disclosure: handle,
            trigger,
            target,
            expanded: current,
        };
        signals.before_toggle.emit(before);
        if next {
            signals.before_expand.emit(before);
        } else {
            signals.before_collapse.emit(before);
        }

        if self.doc.has_attribute(trigger, attrs::AUTO_COLLAPSE) {
            self.collapse_expanded_siblings(trigger, origin, depth)?;
        }

        match target {
            Some(target) => self.apply_target_visibility(handle, trigger, target, next, signals)?,
            None => {
                // No panel: the trigger still owns its flag, so state can
                // never drift behind a broken reference.
                Self::settle_toggle(&mut self.doc, &signals, handle, trigger, None, next);
            }
        }
        Ok(())
    }

    /// Close every currently-expanded sibling that shares the parent and the
    /// `data-auto-collapse` flag. This is the whole single-select mechanism;
    /// there is no separate coordinator.
    ///
    /// Collapse happens by direct internal toggle, excluding the trigger
    /// itself and the cascade origin (which is mid-flip and would read as
    /// expanded on its own close path), with instances created lazily for
    /// siblings nobody initialized yet.
    fn collapse_expanded_siblings(
        &mut self,
        trigger: ElementId,
        origin: ElementId,
        depth: usize,
    ) -> Result<()> {
        if depth >= MAX_COLLAPSE_DEPTH {
            tracing::warn!(
                target: "louver::disclosure",
                ?origin,
                depth,
                "sibling collapse stopped at recursion bound"
            );
            self.diagnostics
                .emit(Diagnostic::CollapseDepthExceeded { origin, depth });
            return Ok(());
        }
        let Some(parent) = self.doc.parent(trigger) else {
            return Ok(());
        };

        for sibling in self.doc.children(parent).to_vec() {
            if sibling == trigger || sibling == origin {
                continue;
            }
            if !self.doc.has_attribute(sibling, attrs::AUTO_COLLAPSE) {
                continue;
            }
            // Read live: a sibling collapsed earlier in this walk is done.
            if self.doc.attribute(sibling, attrs::ARIA_EXPANDED) != Some("true") {
                continue;
            }
            tracing::trace!(target: "louver::disclosure", ?sibling, ?origin, "auto-collapsing sibling");
            let handle = self.disclosure(sibling)?;
            self.toggle_disclosure(handle, sibling, origin, depth + 1)?;
        }
        Ok(())
    }

    /// Show or hide the panel with all side effects.
    fn apply_target_visibility(
        &mut self,
        handle: DisclosureId,
        trigger: ElementId,
        target: ElementId,
        show: bool,
        signals: Arc<DisclosureSignals>,
    ) -> Result<()> {
        // Focus scoping: descendants become tab-reachable with the panel.
        // Branches hidden in their own right are skipped so nested
        // disclosures keep the tab order they manage themselves.
        let tabindex = if show { "0" } else { "-1" };
        for el in self.doc.focusable_descendants(target) {
            self.doc.set_attribute(el, attrs::TABINDEX, tabindex);
        }

        self.apply_inert_scoping(target, show)?;

        let transition = self.doc.attribute(target, attrs::TRANSITION).map(str::to_string);
        match transition {
            Some(name) if show => {
                // Expanded flips before the entering transition: the content
                // must be perceivable from the first animated frame.
                self.doc
                    .set_attribute(trigger, attrs::ARIA_EXPANDED, expanded_value(true));
                self.doc.set_visible(target, true);
                self.transitions.run(
                    &mut self.doc,
                    target,
                    &name,
                    TransitionDirection::Enter,
                    move |doc| {
                        Self::settle_toggle(doc, &signals, handle, trigger, Some(target), true);
                    },
                );
            }
            Some(name) => {
                // Leaving content stays perceivable until the transition
                // settles; only then does the panel hide and the flag flip.
                self.transitions.run(
                    &mut self.doc,
                    target,
                    &name,
                    TransitionDirection::Leave,
                    move |doc| {
                        doc.set_visible(target, false);
                        Self::settle_toggle(doc, &signals, handle, trigger, Some(target), false);
                    },
                );
            }
            None => {
                self.doc.set_visible(target, show);
                Self::settle_toggle(&mut self.doc, &signals, handle, trigger, Some(target), show);
            }
        }
        Ok(())
    }

    /// Inert side effects for one panel.
    ///
    /// Every selector in the panel's comma-separated `data-inert-scope` list
    /// marks its matches inert while the panel is open, document-wide. A
    /// selector is skipped, in both directions, when an ancestor panel
    /// declares the identical (trimmed, verbatim) selector; the ancestor
    /// owns that scope and clearing it here would free it early.
    ///
    /// The whole list is parsed before anything mutates, so a malformed
    /// entry fails the toggle without leaving a half-applied scope.
    fn apply_inert_scoping(&mut self, target: ElementId, show: bool) -> Result<()> {
        let Some(raw) = self.doc.attribute(target, attrs::INERT_SCOPE).map(str::to_string) else {
            return Ok(());
        };

        let mut rules: Vec<(String, Selector)> = Vec::new();
        for part in raw.split(',') {
            let text = part.trim().to_string();
            let selector = parse_selector(&text)?;
            rules.push((text, selector));
        }

        let ancestors = self.doc.ancestors(target);
        for (text, selector) in &rules {
            let declared_above = ancestors.iter().any(|&ancestor| {
                self.doc
                    .attribute(ancestor, attrs::INERT_SCOPE)
                    .is_some_and(|list| list.split(',').any(|part| part.trim() == text.as_str()))
            });
            if declared_above {
                tracing::trace!(
                    target: "louver::disclosure",
                    selector = %text,
                    "inert selector owned by an ancestor panel; skipping"
                );
                continue;
            }

            let list = SelectorList::new(vec![selector.clone()]);
            for el in self.doc.query_all(&list) {
                if show {
                    self.doc.set_attribute(el, attrs::INERT, "");
                } else {
                    self.doc.remove_attribute(el, attrs::INERT);
                }
            }
        }
        Ok(())
    }

    /// The settle step shared by every path out of a toggle: make the flag
    /// match the settled state (the open path already flipped it early) and
    /// emit the after signals.
    fn settle_toggle(
        doc: &mut Document,
        signals: &DisclosureSignals,
        handle: DisclosureId,
        trigger: ElementId,
        target: Option<ElementId>,
        expanded: bool,
    ) {
        doc.set_attribute(trigger, attrs::ARIA_EXPANDED, expanded_value(expanded));
        let event = ToggleEvent {
            disclosure: handle,
            trigger,
            target,
            expanded,
        };
        signals.after_toggle.emit(event);
        if expanded {
            signals.after_expand.emit(event);
        } else {
            signals.after_collapse.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DisclosureEvent;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Trigger + hidden panel with a focusable button inside.
    fn engine_with_panel() -> (Engine, ElementId, ElementId) {
        let mut engine = Engine::new();
        let doc = engine.document_mut();
        let root = doc.create_element("div");
        let trigger = doc.create_element("button");
        doc.add_class(trigger, attrs::TRIGGER_CLASS);
        doc.set_attribute(trigger, attrs::ARIA_CONTROLS, "panel");
        doc.set_attribute(trigger, attrs::ARIA_EXPANDED, "false");
        let panel = doc.create_element("div");
        doc.set_attribute(panel, attrs::ID, "panel");
        doc.set_visible(panel, false);
        let inner = doc.create_element("button");
        doc.append_child(root, trigger).unwrap();
        doc.append_child(root, panel).unwrap();
        doc.append_child(panel, inner).unwrap();
        (engine, trigger, panel)
    }

    fn record_signals(signals: &DisclosureSignals) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let phases = [
            ("before_toggle", DisclosureEvent::BeforeToggle),
            ("before_expand", DisclosureEvent::BeforeExpand),
            ("before_collapse", DisclosureEvent::BeforeCollapse),
            ("after_toggle", DisclosureEvent::AfterToggle),
            ("after_expand", DisclosureEvent::AfterExpand),
            ("after_collapse", DisclosureEvent::AfterCollapse),
        ];
        for (name, phase) in phases {
            let log = Arc::clone(&log);
            signals.on(phase, move |event| {
                log.lock().unwrap().push(format!("{name}:{}", event.expanded));
            });
        }
        log
    }

    #[test]
    fn test_construction_is_idempotent() {
        let (mut engine, trigger, _) = engine_with_panel();
        let first = engine.disclosure(trigger).unwrap();
        let second = engine.disclosure(trigger).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_construction_fails_for_missing_element() {
        let (mut engine, trigger, _) = engine_with_panel();
        engine.document_mut().remove(trigger).unwrap();
        assert!(matches!(engine.disclosure(trigger), Err(Error::Lookup { .. })));
    }

    #[test]
    fn test_toggle_without_transition_settles_synchronously() {
        let (mut engine, trigger, panel) = engine_with_panel();
        let handle = engine.disclosure(trigger).unwrap();

        engine.toggle(handle).unwrap();
        assert!(engine.is_expanded(handle).unwrap());
        assert_eq!(engine.document().attribute(trigger, attrs::ARIA_EXPANDED), Some("true"));
        assert!(engine.document().is_visible(panel));

        engine.toggle(handle).unwrap();
        assert!(!engine.is_expanded(handle).unwrap());
        assert!(!engine.document().is_visible(panel));
    }

    #[test]
    fn test_signal_order_and_payload_states() {
        let (mut engine, trigger, _) = engine_with_panel();
        let handle = engine.disclosure(trigger).unwrap();
        let log = record_signals(engine.disclosure_signals(handle).unwrap());

        engine.toggle(handle).unwrap();
        // Befores carry the pre-toggle state, afters the settled state.
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "before_toggle:false",
                "before_expand:false",
                "after_toggle:true",
                "after_expand:true",
            ]
        );

        log.lock().unwrap().clear();
        engine.toggle(handle).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "before_toggle:true",
                "before_collapse:true",
                "after_toggle:false",
                "after_collapse:false",
            ]
        );
    }

    #[test]
    fn test_open_and_close_are_conditional() {
        let (mut engine, trigger, _) = engine_with_panel();
        let handle = engine.disclosure(trigger).unwrap();
        let log = record_signals(engine.disclosure_signals(handle).unwrap());

        engine.close(handle).unwrap();
        assert!(log.lock().unwrap().is_empty());

        engine.open(handle).unwrap();
        assert!(engine.is_expanded(handle).unwrap());
        let emitted = log.lock().unwrap().len();

        engine.open(handle).unwrap();
        assert_eq!(log.lock().unwrap().len(), emitted);
    }

    #[test]
    fn test_close_control_inside_panel_routes_to_same_instance() {
        let (mut engine, trigger, panel) = engine_with_panel();
        let close = engine.document_mut().create_element("button");
        engine.document_mut().set_attribute(close, attrs::ARIA_CONTROLS, "panel");
        engine.document_mut().append_child(panel, close).unwrap();

        let handle = engine.disclosure(trigger).unwrap();
        assert_eq!(engine.disclosure(close).unwrap(), handle);

        engine.toggle(handle).unwrap();
        assert!(engine.click(close).unwrap());
        assert!(!engine.is_expanded(handle).unwrap());
    }

    #[test]
    fn test_targetless_trigger_still_flips_and_settles() {
        let mut engine = Engine::new();
        let trigger = engine.document_mut().create_element("button");
        let handle = engine.disclosure(trigger).unwrap();
        let log = record_signals(engine.disclosure_signals(handle).unwrap());
        let misses = Arc::new(AtomicUsize::new(0));
        let misses_clone = Arc::clone(&misses);
        engine.diagnostics().connect(move |d| {
            if matches!(d, Diagnostic::UnresolvedTarget { .. }) {
                misses_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        engine.toggle(handle).unwrap();
        assert!(engine.is_expanded(handle).unwrap());
        assert_eq!(log.lock().unwrap().len(), 4);
        // Absent aria-controls is not a dangling reference.
        assert_eq!(misses.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dangling_target_reference_reports_a_diagnostic() {
        let (mut engine, trigger, panel) = engine_with_panel();
        engine.document_mut().remove(panel).unwrap();
        let handle = engine.disclosure(trigger).unwrap();
        let misses = Arc::new(AtomicUsize::new(0));
        let misses_clone = Arc::clone(&misses);
        engine.diagnostics().connect(move |d| {
            if matches!(d, Diagnostic::UnresolvedTarget { .. }) {
                misses_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        engine.toggle(handle).unwrap();
        // The flag flips anyway so state cannot drift behind the reference.
        assert!(engine.is_expanded(handle).unwrap());
        assert_eq!(misses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panel_replacement_is_picked_up_by_id() {
        let (mut engine, trigger, panel) = engine_with_panel();
        let handle = engine.disclosure(trigger).unwrap();

        engine.document_mut().remove(panel).unwrap();
        let replacement = engine.document_mut().create_element("section");
        engine.document_mut().set_attribute(replacement, attrs::ID, "panel");
        engine.document_mut().set_visible(replacement, false);

        engine.toggle(handle).unwrap();
        assert!(engine.document().is_visible(replacement));
    }

    #[test]
    fn test_animated_open_flips_expanded_before_settle() {
        let (mut engine, trigger, panel) = engine_with_panel();
        engine.set_style_probe(Some(Box::new(|_, _, _| true)));
        engine.document_mut().set_attribute(panel, attrs::TRANSITION, "fade");
        let handle = engine.disclosure(trigger).unwrap();
        let log = record_signals(engine.disclosure_signals(handle).unwrap());

        engine.toggle(handle).unwrap();
        let doc = engine.document();
        assert_eq!(doc.attribute(trigger, attrs::ARIA_EXPANDED), Some("true"));
        assert!(doc.is_visible(panel));
        assert!(doc.has_class(panel, "fade-enter-active"));
        assert!(doc.has_class(panel, "fade-enter-from"));
        assert_eq!(log.lock().unwrap().len(), 2); // befores only

        engine.tick_frame();
        assert!(engine.document().has_class(panel, "fade-enter-to"));
        assert_eq!(log.lock().unwrap().len(), 2);

        engine.notify_transition_end(panel);
        assert!(engine.document().classes(panel).is_empty());
        assert_eq!(
            log.lock().unwrap()[2..],
            ["after_toggle:true", "after_expand:true"]
        );
    }

    #[test]
    fn test_animated_close_flips_expanded_only_after_settle() {
        let (mut engine, trigger, panel) = engine_with_panel();
        engine.set_style_probe(Some(Box::new(|_, _, _| true)));
        engine.document_mut().set_attribute(panel, attrs::TRANSITION, "fade");
        let handle = engine.disclosure(trigger).unwrap();
        engine.toggle(handle).unwrap();
        engine.tick_frame();
        engine.notify_transition_end(panel);

        engine.toggle(handle).unwrap();
        // Content stays perceivable through the leave transition.
        let doc = engine.document();
        assert_eq!(doc.attribute(trigger, attrs::ARIA_EXPANDED), Some("true"));
        assert!(doc.is_visible(panel));
        assert!(doc.has_class(panel, "fade-leave-active"));

        engine.tick_frame();
        engine.notify_transition_end(panel);
        let doc = engine.document();
        assert_eq!(doc.attribute(trigger, attrs::ARIA_EXPANDED), Some("false"));
        assert!(!doc.is_visible(panel));
        assert!(doc.classes(panel).is_empty());
    }

    #[test]
    fn test_reversing_mid_transition_settles_exactly_once() {
        let (mut engine, trigger, panel) = engine_with_panel();
        engine.set_style_probe(Some(Box::new(|_, _, _| true)));
        engine.document_mut().set_attribute(panel, attrs::TRANSITION, "fade");
        let handle = engine.disclosure(trigger).unwrap();
        let log = record_signals(engine.disclosure_signals(handle).unwrap());

        engine.toggle(handle).unwrap(); // open, in flight
        engine.tick_frame();
        engine.toggle(handle).unwrap(); // reverse before the open settles
        engine.tick_frame();
        engine.notify_transition_end(panel);

        let log = log.lock().unwrap();
        let afters: Vec<_> = log.iter().filter(|l| l.starts_with("after_toggle")).collect();
        // The superseded open never settles; only the close does.
        assert_eq!(afters, vec!["after_toggle:false"]);
        assert!(!engine.document().is_visible(panel));
    }

    #[test]
    fn test_tabindex_scoping_skips_separately_hidden_branches() {
        let (mut engine, trigger, panel) = engine_with_panel();
        let doc = engine.document_mut();
        let nested_panel = doc.create_element("div");
        doc.set_visible(nested_panel, false);
        let nested_button = doc.create_element("button");
        doc.set_attribute(nested_button, attrs::TABINDEX, "-1");
        doc.append_child(panel, nested_panel).unwrap();
        doc.append_child(nested_panel, nested_button).unwrap();
        let direct = doc.children(panel)[0];

        let handle = engine.disclosure(trigger).unwrap();
        engine.toggle(handle).unwrap();
        let doc = engine.document();
        assert_eq!(doc.attribute(direct, attrs::TABINDEX), Some("0"));
        // Inside a branch hidden in its own right: untouched.
        assert_eq!(doc.attribute(nested_button, attrs::TABINDEX), Some("-1"));

        engine.toggle(handle).unwrap();
        assert_eq!(engine.document().attribute(direct, attrs::TABINDEX), Some("-1"));
    }

    #[test]
    fn test_inert_scope_applies_document_wide() {
        let (mut engine, trigger, panel) = engine_with_panel();
        let doc = engine.document_mut();
        let sidebar = doc.create_element("nav");
        doc.add_class(sidebar, "sidebar");
        let footer = doc.create_element("footer");
        doc.set_attribute(panel, attrs::INERT_SCOPE, ".sidebar, footer");

        let handle = engine.disclosure(trigger).unwrap();
        engine.toggle(handle).unwrap();
        assert!(engine.document().has_attribute(sidebar, attrs::INERT));
        assert!(engine.document().has_attribute(footer, attrs::INERT));

        engine.toggle(handle).unwrap();
        assert!(!engine.document().has_attribute(sidebar, attrs::INERT));
        assert!(!engine.document().has_attribute(footer, attrs::INERT));
    }

    #[test]
    fn test_inert_selector_owned_by_ancestor_panel_is_skipped() {
        let mut engine = Engine::new();
        let doc = engine.document_mut();
        let chrome = doc.create_element("header");
        doc.add_class(chrome, "chrome");
        let extra = doc.create_element("aside");
        doc.add_class(extra, "extra");

        let outer_panel = doc.create_element("div");
        doc.set_attribute(outer_panel, attrs::INERT_SCOPE, ".chrome");
        let trigger = doc.create_element("button");
        doc.set_attribute(trigger, attrs::ARIA_CONTROLS, "inner");
        let inner_panel = doc.create_element("div");
        doc.set_attribute(inner_panel, attrs::ID, "inner");
        doc.set_attribute(inner_panel, attrs::INERT_SCOPE, ".chrome, .extra");
        doc.set_visible(inner_panel, false);
        doc.append_child(outer_panel, trigger).unwrap();
        doc.append_child(outer_panel, inner_panel).unwrap();

        let handle = engine.disclosure(trigger).unwrap();
        engine.toggle(handle).unwrap();
        // The ancestor panel owns ".chrome"; only ".extra" is ours.
        assert!(!engine.document().has_attribute(chrome, attrs::INERT));
        assert!(engine.document().has_attribute(extra, attrs::INERT));
    }

    #[test]
    fn test_malformed_inert_scope_fails_fast() {
        let (mut engine, trigger, panel) = engine_with_panel();
        let doc = engine.document_mut();
        let sidebar = doc.create_element("nav");
        doc.add_class(sidebar, "sidebar");
        doc.set_attribute(panel, attrs::INERT_SCOPE, ".sidebar, >");

        let handle = engine.disclosure(trigger).unwrap();
        assert!(matches!(engine.toggle(handle), Err(Error::Selector(_))));
        // Nothing was applied: the list is validated before any mutation.
        assert!(!engine.document().has_attribute(sidebar, attrs::INERT));
    }

    #[test]
    fn test_sibling_collapse_creates_instances_lazily() {
        let mut engine = Engine::new();
        let doc = engine.document_mut();
        let group = doc.create_element("div");
        let mut triggers = Vec::new();
        for (id, expanded) in [("a", true), ("b", false)] {
            let t = doc.create_element("button");
            doc.set_attribute(t, attrs::AUTO_COLLAPSE, "");
            doc.set_attribute(t, attrs::ARIA_CONTROLS, id);
            doc.set_attribute(t, attrs::ARIA_EXPANDED, expanded_value(expanded));
            let p = doc.create_element("div");
            doc.set_attribute(p, attrs::ID, id);
            doc.set_visible(p, expanded);
            doc.append_child(group, t).unwrap();
            doc.append_child(group, p).unwrap();
            triggers.push(t);
        }
        let (first, second) = (triggers[0], triggers[1]);

        // Only the second trigger is initialized explicitly.
        let handle = engine.disclosure(second).unwrap();
        engine.toggle(handle).unwrap();

        let doc = engine.document();
        assert_eq!(doc.attribute(second, attrs::ARIA_EXPANDED), Some("true"));
        assert_eq!(doc.attribute(first, attrs::ARIA_EXPANDED), Some("false"));
        // The first trigger got a lazily-created instance on the way.
        assert!(engine.click(first).unwrap());
    }

    #[test]
    fn test_collapse_cascade_is_depth_bounded() {
        let mut engine = Engine::new();
        let doc = engine.document_mut();
        let group = doc.create_element("div");
        let mut triggers = Vec::new();
        for _ in 0..(MAX_COLLAPSE_DEPTH + 4) {
            let t = doc.create_element("button");
            doc.set_attribute(t, attrs::AUTO_COLLAPSE, "");
            doc.set_attribute(t, attrs::ARIA_EXPANDED, "true");
            doc.append_child(group, t).unwrap();
            triggers.push(t);
        }
        let opener = doc.create_element("button");
        doc.set_attribute(opener, attrs::AUTO_COLLAPSE, "");
        doc.set_attribute(opener, attrs::ARIA_EXPANDED, "false");
        doc.append_child(group, opener).unwrap();

        let depth_hits = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&depth_hits);
        engine.diagnostics().connect(move |d| {
            if matches!(d, Diagnostic::CollapseDepthExceeded { .. }) {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        });

        let handle = engine.disclosure(opener).unwrap();
        engine.toggle(handle).unwrap();

        assert!(depth_hits.load(Ordering::SeqCst) >= 1);
        let doc = engine.document();
        for t in triggers {
            assert_eq!(doc.attribute(t, attrs::ARIA_EXPANDED), Some("false"));
        }
        assert_eq!(doc.attribute(opener, attrs::ARIA_EXPANDED), Some("true"));
    }

    #[test]
    fn test_destroy_unregisters_and_disconnects() {
        let (mut engine, trigger, panel) = engine_with_panel();
        let close = engine.document_mut().create_element("button");
        engine.document_mut().set_attribute(close, attrs::ARIA_CONTROLS, "panel");
        engine.document_mut().append_child(panel, close).unwrap();

        let handle = engine.disclosure(trigger).unwrap();
        let signals = Arc::clone(&engine.disclosures[handle].signals);
        let log = record_signals(&signals);

        engine.destroy_disclosure(handle).unwrap();
        assert!(!engine.click(trigger).unwrap());
        assert!(!engine.click(close).unwrap());
        assert_eq!(signals.after_toggle.connection_count(), 0);
        assert!(log.lock().unwrap().is_empty());
        assert!(matches!(engine.toggle(handle), Err(Error::Detached { .. })));
        assert!(matches!(
            engine.destroy_disclosure(handle),
            Err(Error::Detached { .. })
        ));
    }

    #[test]
    fn test_destroy_drops_in_flight_transition_without_settling() {
        let (mut engine, trigger, panel) = engine_with_panel();
        engine.set_style_probe(Some(Box::new(|_, _, _| true)));
        engine.document_mut().set_attribute(panel, attrs::TRANSITION, "fade");
        let handle = engine.disclosure(trigger).unwrap();
        let log = record_signals(engine.disclosure_signals(handle).unwrap());

        engine.toggle(handle).unwrap();
        engine.tick_frame();
        engine.destroy_disclosure(handle).unwrap();

        assert!(engine.document().classes(panel).is_empty());
        engine.notify_transition_end(panel);
        let afters = log.lock().unwrap().iter().filter(|l| l.starts_with("after")).count();
        assert_eq!(afters, 0);
    }
}
