//! The engine: one document, every instance, one diagnostics stream.
//!
//! [`Engine`] owns the [`Document`], the transition coordinator, and all
//! disclosure and accordion instances, addressed by handle. An embedder
//! feeds platform activity in through four seams and everything else
//! follows:
//!
//! - [`click`](Engine::click) for activations of registered elements,
//! - [`key_down`](Engine::key_down) for key presses on accordion triggers,
//! - [`tick_frame`](Engine::tick_frame) once per animation frame,
//! - the `notify_*` methods for transition/animation end and cancel.
//!
//! Runtime anomalies (dangling panel references, settle deadline hits,
//! collapse recursion bounds) surface on the [`diagnostics`] signal rather
//! than as errors, so authoring mistakes degrade instead of breaking the
//! embedder's loop.
//!
//! [`diagnostics`]: Engine::diagnostics

use std::time::Duration;

use slotmap::{SecondaryMap, SlotMap};
use static_assertions::assert_impl_all;

use louver_core::Signal;

use crate::accordion::{Accordion, AccordionId};
use crate::disclosure::{Disclosure, DisclosureId};
use crate::dom::{attrs, Document, ElementId};
use crate::error::{Error, Result};
use crate::events::Diagnostic;
use crate::motion::{CompletionKind, StyleProbe, TransitionCoordinator};

/// Headless disclosure engine over one document.
pub struct Engine {
    pub(crate) doc: Document,
    pub(crate) transitions: TransitionCoordinator,
    pub(crate) disclosures: SlotMap<DisclosureId, Disclosure>,
    pub(crate) accordions: SlotMap<AccordionId, Accordion>,
    /// Trigger and close-control elements to their owning disclosure.
    pub(crate) disclosure_lookup: SecondaryMap<ElementId, DisclosureId>,
    /// Container elements to their accordion.
    pub(crate) accordion_lookup: SecondaryMap<ElementId, AccordionId>,
    /// Trigger elements with keyboard navigation to their accordion.
    pub(crate) keyboard_lookup: SecondaryMap<ElementId, AccordionId>,
    pub(crate) diagnostics: Signal<Diagnostic>,
}

impl Engine {
    /// An engine over an empty document.
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }

    /// An engine over a pre-built document.
    pub fn with_document(doc: Document) -> Self {
        Self {
            doc,
            transitions: TransitionCoordinator::new(),
            disclosures: SlotMap::with_key(),
            accordions: SlotMap::with_key(),
            disclosure_lookup: SecondaryMap::new(),
            accordion_lookup: SecondaryMap::new(),
            keyboard_lookup: SecondaryMap::new(),
            diagnostics: Signal::new(),
        }
    }

    #[inline]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    #[inline]
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Stream of runtime anomalies. Emission never implies failure of the
    /// operation that reported it.
    #[inline]
    pub fn diagnostics(&self) -> &Signal<Diagnostic> {
        &self.diagnostics
    }

    /// Route an activation on an element to the disclosure registered for
    /// it, whether trigger or close control. Returns `false` when no
    /// instance is registered there.
    pub fn click(&mut self, element: ElementId) -> Result<bool> {
        let Some(&handle) = self.disclosure_lookup.get(element) else {
            return Ok(false);
        };
        tracing::trace!(target: "louver::engine", ?element, ?handle, "click routed");
        self.toggle(handle)?;
        Ok(true)
    }

    /// Create disclosures for every trigger-class element that does not
    /// have one yet, under `root` or across the whole document, and return
    /// the newly created handles. Idempotent: a second scan over the same
    /// tree returns nothing.
    ///
    /// # Errors
    ///
    /// [`Error::Lookup`] when `root` is not in the document.
    pub fn scan_and_init(&mut self, root: Option<ElementId>) -> Result<Vec<DisclosureId>> {
        let scope: Vec<ElementId> = match root {
            Some(root) => {
                if !self.doc.contains(root) {
                    return Err(Error::lookup("scan root is not in the document"));
                }
                self.doc.depth_first_preorder(root)
            }
            None => {
                let roots = self.doc.roots().to_vec();
                roots
                    .into_iter()
                    .flat_map(|root| self.doc.depth_first_preorder(root))
                    .collect()
            }
        };

        let mut created = Vec::new();
        for element in scope {
            if !self.doc.has_class(element, attrs::TRIGGER_CLASS) {
                continue;
            }
            if self.disclosure_lookup.contains_key(element) {
                continue;
            }
            created.push(self.disclosure(element)?);
        }
        tracing::debug!(target: "louver::engine", created = created.len(), "scan finished");
        Ok(created)
    }

    /// Advance every in-flight transition by one animation frame. Panels
    /// whose transition produced no style and panels past the settle
    /// deadline settle here; a deadline hit additionally reports
    /// [`Diagnostic::SettleTimeout`].
    pub fn tick_frame(&mut self) {
        for element in self.transitions.tick_frame(&mut self.doc) {
            self.diagnostics.emit(Diagnostic::SettleTimeout { element });
        }
    }

    /// A `transitionend` arrived for the element. Returns `true` when it
    /// settled an in-flight transition.
    pub fn notify_transition_end(&mut self, element: ElementId) -> bool {
        self.transitions
            .complete(&mut self.doc, element, CompletionKind::TransitionEnd)
    }

    /// A `transitioncancel` arrived for the element.
    pub fn notify_transition_cancel(&mut self, element: ElementId) -> bool {
        self.transitions
            .complete(&mut self.doc, element, CompletionKind::TransitionCancel)
    }

    /// An `animationend` arrived for the element.
    pub fn notify_animation_end(&mut self, element: ElementId) -> bool {
        self.transitions
            .complete(&mut self.doc, element, CompletionKind::AnimationEnd)
    }

    /// An `animationcancel` arrived for the element.
    pub fn notify_animation_cancel(&mut self, element: ElementId) -> bool {
        self.transitions
            .complete(&mut self.doc, element, CompletionKind::AnimationCancel)
    }

    /// Install or clear the probe that decides whether a transition name
    /// produced any computed style. Without one, every run settles on its
    /// activation frame.
    pub fn set_style_probe(&mut self, probe: Option<StyleProbe>) {
        self.transitions.set_style_probe(probe);
    }

    /// Adjust the settle deadline for transitions whose end notification
    /// never arrives. `None` disables the deadline.
    pub fn set_settle_deadline(&mut self, deadline: Option<Duration>) {
        self.transitions.set_settle_deadline(deadline);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

assert_impl_all!(Engine: Send);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn doc_with_triggers(count: usize) -> (Document, ElementId, Vec<ElementId>) {
        let mut doc = Document::new();
        let root = doc.create_element("main");
        let mut triggers = Vec::new();
        for i in 0..count {
            let trigger = doc.create_element("button");
            doc.add_class(trigger, attrs::TRIGGER_CLASS);
            doc.set_attribute(trigger, attrs::ARIA_CONTROLS, &format!("p{i}"));
            let panel = doc.create_element("div");
            doc.set_attribute(panel, attrs::ID, &format!("p{i}"));
            doc.set_visible(panel, false);
            doc.append_child(root, trigger).unwrap();
            doc.append_child(root, panel).unwrap();
            triggers.push(trigger);
        }
        (doc, root, triggers)
    }

    #[test]
    fn test_click_without_instance_is_unhandled() {
        let mut engine = Engine::new();
        let el = engine.document_mut().create_element("button");
        assert!(!engine.click(el).unwrap());
    }

    #[test]
    fn test_scan_covers_every_root() {
        let (mut doc, _, _) = doc_with_triggers(2);
        let orphan = doc.create_element("button");
        doc.add_class(orphan, attrs::TRIGGER_CLASS);
        let mut engine = Engine::with_document(doc);

        let created = engine.scan_and_init(None).unwrap();
        assert_eq!(created.len(), 3);
    }

    #[test]
    fn test_scan_is_idempotent_and_scoped() {
        let (doc, root, triggers) = doc_with_triggers(3);
        let mut engine = Engine::with_document(doc);
        engine.disclosure(triggers[0]).unwrap();

        let created = engine.scan_and_init(Some(root)).unwrap();
        assert_eq!(created.len(), 2);
        assert!(engine.scan_and_init(Some(root)).unwrap().is_empty());
    }

    #[test]
    fn test_scan_with_stale_root_fails() {
        let (doc, root, _) = doc_with_triggers(1);
        let mut engine = Engine::with_document(doc);
        engine.document_mut().remove(root).unwrap();
        assert!(matches!(
            engine.scan_and_init(Some(root)),
            Err(Error::Lookup { .. })
        ));
    }

    #[test]
    fn test_scan_does_not_scope_to_close_controls() {
        let (doc, root, triggers) = doc_with_triggers(1);
        let mut engine = Engine::with_document(doc);
        let panel = engine.document().element_by_id("p0").unwrap();
        let close = engine.document_mut().create_element("button");
        engine.document_mut().add_class(close, attrs::TRIGGER_CLASS);
        engine.document_mut().set_attribute(close, attrs::ARIA_CONTROLS, "p0");
        engine.document_mut().append_child(panel, close).unwrap();
        engine.disclosure(triggers[0]).unwrap();

        // The close control already owns a side-table entry; the scan must
        // not wrap a second instance around it.
        assert!(engine.scan_and_init(Some(root)).unwrap().is_empty());
    }

    #[test]
    fn test_settle_deadline_reports_a_diagnostic() {
        let (doc, _, triggers) = doc_with_triggers(1);
        let mut engine = Engine::with_document(doc);
        engine.set_style_probe(Some(Box::new(|_, _, _| true)));
        engine.set_settle_deadline(Some(Duration::ZERO));
        let panel = engine.document().element_by_id("p0").unwrap();
        engine.document_mut().set_attribute(panel, attrs::TRANSITION, "fade");

        let timeouts = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&timeouts);
        engine.diagnostics().connect(move |d| {
            if matches!(d, Diagnostic::SettleTimeout { .. }) {
                inner.fetch_add(1, Ordering::SeqCst);
            }
        });

        let handle = engine.disclosure(triggers[0]).unwrap();
        engine.toggle(handle).unwrap();
        engine.tick_frame(); // activation frame, deadline armed
        engine.tick_frame(); // deadline already elapsed
        assert_eq!(timeouts.load(Ordering::SeqCst), 1);
        assert!(engine.document().classes(panel).is_empty());
        // The end notification arriving late finds nothing to settle.
        assert!(!engine.notify_transition_end(panel));
    }

    #[test]
    fn test_animation_notifications_settle_too() {
        let (doc, _, triggers) = doc_with_triggers(1);
        let mut engine = Engine::with_document(doc);
        engine.set_style_probe(Some(Box::new(|_, _, _| true)));
        let panel = engine.document().element_by_id("p0").unwrap();
        engine.document_mut().set_attribute(panel, attrs::TRANSITION, "pulse");

        let handle = engine.disclosure(triggers[0]).unwrap();
        engine.toggle(handle).unwrap();
        engine.tick_frame();
        assert!(engine.notify_animation_end(panel));
        assert!(engine.is_expanded(handle).unwrap());
        assert!(engine.document().classes(panel).is_empty());
    }
}
