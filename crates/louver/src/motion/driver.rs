//! Transition backends.

use crate::dom::{Document, ElementId};

use super::{phase_class, TransitionDirection, TransitionPhase};

/// Embedder hook answering whether a CSS effect is actually running.
///
/// Called once per run, right after the activation frame, with the element
/// and the transition name. Returning `false` (or installing no probe at
/// all) settles the run at that frame instead of waiting for an end
/// notification that would never come on an unstyled element.
pub type StyleProbe = Box<dyn Fn(&Document, ElementId, &str) -> bool + Send + Sync>;

/// What the activation frame decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// An effect is running; wait for an end/cancel notification.
    AwaitEnd,
    /// Nothing is animating; settle now.
    SettleNow,
}

/// The three phases every transition backend must express.
///
/// [`ClassDriver`] implements this with the CSS class scheme; a backend
/// that drives styles some other way implements the same interface and the
/// coordinator never knows the difference.
pub trait TransitionDriver: Send {
    /// Apply the run's starting state.
    fn start(&self, doc: &mut Document, el: ElementId, name: &str, direction: TransitionDirection);

    /// Advance to the run's destination state on the next animation frame
    /// and report whether an effect is now in flight.
    fn frame(
        &self,
        doc: &mut Document,
        el: ElementId,
        name: &str,
        direction: TransitionDirection,
    ) -> FrameOutcome;

    /// Remove every trace of the run.
    fn finish(&self, doc: &mut Document, el: ElementId, name: &str, direction: TransitionDirection);

    /// Install or clear the style probe. Backends that do not consult
    /// computed style ignore this.
    fn set_style_probe(&mut self, probe: Option<StyleProbe>) {
        let _ = probe;
    }
}

/// The CSS class-scheme backend.
///
/// Start applies `{name}-{dir}-active` + `{name}-{dir}-from`; the activation
/// frame swaps `-from` for `-to`; finish removes whatever of the three is
/// still present.
#[derive(Default)]
pub struct ClassDriver {
    probe: Option<StyleProbe>,
}

impl ClassDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

const ALL_PHASES: [TransitionPhase; 3] = [
    TransitionPhase::Active,
    TransitionPhase::From,
    TransitionPhase::To,
];

impl TransitionDriver for ClassDriver {
    fn start(&self, doc: &mut Document, el: ElementId, name: &str, direction: TransitionDirection) {
        // Authored markup may carry leftovers from either direction.
        for dir in [TransitionDirection::Enter, TransitionDirection::Leave] {
            for phase in ALL_PHASES {
                doc.remove_class(el, &phase_class(name, dir, phase));
            }
        }
        doc.add_class(el, &phase_class(name, direction, TransitionPhase::Active));
        doc.add_class(el, &phase_class(name, direction, TransitionPhase::From));
    }

    fn frame(
        &self,
        doc: &mut Document,
        el: ElementId,
        name: &str,
        direction: TransitionDirection,
    ) -> FrameOutcome {
        doc.remove_class(el, &phase_class(name, direction, TransitionPhase::From));
        doc.add_class(el, &phase_class(name, direction, TransitionPhase::To));

        match &self.probe {
            Some(probe) if probe(doc, el, name) => FrameOutcome::AwaitEnd,
            Some(_) => FrameOutcome::SettleNow,
            None => FrameOutcome::SettleNow,
        }
    }

    fn finish(&self, doc: &mut Document, el: ElementId, name: &str, direction: TransitionDirection) {
        for phase in ALL_PHASES {
            doc.remove_class(el, &phase_class(name, direction, phase));
        }
    }

    fn set_style_probe(&mut self, probe: Option<StyleProbe>) {
        self.probe = probe;
    }
}
