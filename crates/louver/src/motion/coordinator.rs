//! In-flight transition tracking.

use std::time::{Duration, Instant};

use slotmap::SecondaryMap;
use static_assertions::assert_impl_all;

use crate::dom::{Document, ElementId};

use super::{ClassDriver, CompletionKind, FrameOutcome, StyleProbe, TransitionDirection, TransitionDriver};

/// How long a run may wait for an end notification before being settled
/// anyway. Guards against authored effects whose end event never arrives
/// (`display: none` mid-flight, detached subtrees).
pub const DEFAULT_SETTLE_DEADLINE: Duration = Duration::from_secs(3);

/// Where an in-flight run is in its life.
enum Stage {
    /// Started; waiting for the next animation frame.
    AwaitingFrame,
    /// Activated; waiting for an end/cancel notification.
    AwaitingEnd { since: Instant },
}

struct ActiveRun {
    name: String,
    direction: TransitionDirection,
    stage: Stage,
    on_settled: Option<Box<dyn FnOnce(&mut Document) + Send>>,
}

enum TickAction {
    Keep,
    Settle,
    TimedOut,
}

/// Tracks every in-flight transition and settles each exactly once.
///
/// At most one run per element: starting a new run on an element that
/// already has one replaces it, and the replaced run's callback is dropped
/// without firing. End notifications that arrive before a run's activation
/// frame belong to a replaced run (the new run's effect cannot have started
/// yet) and are ignored.
pub struct TransitionCoordinator {
    driver: Box<dyn TransitionDriver>,
    runs: SecondaryMap<ElementId, ActiveRun>,
    deadline: Option<Duration>,
}

impl TransitionCoordinator {
    /// Create a coordinator backed by the CSS class scheme.
    pub fn new() -> Self {
        Self::with_driver(Box::new(ClassDriver::new()))
    }

    /// Create a coordinator with a custom backend.
    pub fn with_driver(driver: Box<dyn TransitionDriver>) -> Self {
        Self {
            driver,
            runs: SecondaryMap::new(),
            deadline: Some(DEFAULT_SETTLE_DEADLINE),
        }
    }

    /// Install or clear the backend's style probe.
    pub fn set_style_probe(&mut self, probe: Option<StyleProbe>) {
        self.driver.set_style_probe(probe);
    }

    /// Change the settle deadline. `None` waits indefinitely.
    pub fn set_settle_deadline(&mut self, deadline: Option<Duration>) {
        self.deadline = deadline;
    }

    /// Whether the element has a run in flight.
    #[inline]
    pub fn is_active(&self, el: ElementId) -> bool {
        self.runs.contains_key(el)
    }

    /// Start a run, replacing any run already in flight on the element.
    ///
    /// `on_settled` fires exactly once when the run settles, and never if
    /// the run is replaced or cancelled first.
    pub fn run<F>(
        &mut self,
        doc: &mut Document,
        el: ElementId,
        name: &str,
        direction: TransitionDirection,
        on_settled: F,
    ) where
        F: FnOnce(&mut Document) + Send + 'static,
    {
        if let Some(old) = self.runs.remove(el) {
            tracing::trace!(
                target: "louver::motion",
                ?el,
                name = %old.name,
                "superseding in-flight transition"
            );
            self.driver.finish(doc, el, &old.name, old.direction);
        }
        self.driver.start(doc, el, name, direction);
        self.runs.insert(
            el,
            ActiveRun {
                name: name.to_string(),
                direction,
                stage: Stage::AwaitingFrame,
                on_settled: Some(Box::new(on_settled)),
            },
        );
        tracing::debug!(target: "louver::motion", ?el, name, ?direction, "transition started");
    }

    /// Advance runs waiting on the animation frame and enforce the deadline.
    ///
    /// Runs whose backend reports no effect settle here. Returns the
    /// elements whose runs were force-settled at the deadline.
    pub fn tick_frame(&mut self, doc: &mut Document) -> Vec<ElementId> {
        let mut timed_out = Vec::new();
        let pending: Vec<ElementId> = self.runs.keys().collect();
        for el in pending {
            let action = {
                let Some(run) = self.runs.get_mut(el) else {
                    continue;
                };
                match run.stage {
                    Stage::AwaitingFrame => {
                        let name = run.name.clone();
                        let direction = run.direction;
                        match self.driver.frame(doc, el, &name, direction) {
                            FrameOutcome::AwaitEnd => {
                                run.stage = Stage::AwaitingEnd {
                                    since: Instant::now(),
                                };
                                TickAction::Keep
                            }
                            FrameOutcome::SettleNow => TickAction::Settle,
                        }
                    }
                    Stage::AwaitingEnd { since } => match self.deadline {
                        Some(deadline) if since.elapsed() >= deadline => TickAction::TimedOut,
                        _ => TickAction::Keep,
                    },
                }
            };
            match action {
                TickAction::Keep => {}
                TickAction::Settle => self.settle(doc, el),
                TickAction::TimedOut => {
                    tracing::warn!(
                        target: "louver::motion",
                        ?el,
                        "transition never reported an end; settling at deadline"
                    );
                    self.settle(doc, el);
                    timed_out.push(el);
                }
            }
        }
        timed_out
    }

    /// Settle the awaited run on an element, if any. Returns whether a run
    /// settled.
    pub fn complete(&mut self, doc: &mut Document, el: ElementId, kind: CompletionKind) -> bool {
        match self.runs.get(el) {
            Some(run) if matches!(run.stage, Stage::AwaitingEnd { .. }) => {
                tracing::trace!(target: "louver::motion", ?el, ?kind, "end notification");
                self.settle(doc, el);
                true
            }
            Some(_) => {
                // Still awaiting the activation frame: this notification is
                // a straggler from a replaced run.
                tracing::trace!(target: "louver::motion", ?el, ?kind, "stale end notification ignored");
                false
            }
            None => false,
        }
    }

    /// Drop an element's run without settling. The callback never fires.
    pub fn cancel(&mut self, doc: &mut Document, el: ElementId) -> bool {
        let Some(run) = self.runs.remove(el) else {
            return false;
        };
        self.driver.finish(doc, el, &run.name, run.direction);
        tracing::trace!(target: "louver::motion", ?el, name = %run.name, "transition cancelled");
        true
    }

    /// Remove the run, clear its classes, fire its callback.
    fn settle(&mut self, doc: &mut Document, el: ElementId) {
        let Some(run) = self.runs.remove(el) else {
            return;
        };
        self.driver.finish(doc, el, &run.name, run.direction);
        tracing::debug!(
            target: "louver::motion",
            ?el,
            name = %run.name,
            direction = ?run.direction,
            "transition settled"
        );
        if let Some(on_settled) = run.on_settled {
            on_settled(doc);
        }
    }
}

impl Default for TransitionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

assert_impl_all!(TransitionCoordinator: Send);
