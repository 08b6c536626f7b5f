//! Two-phase CSS class transitions.
//!
//! A transition run walks an element through a fixed class choreography:
//!
//! 1. **start** - `{name}-{dir}-active` and `{name}-{dir}-from` are applied
//!    together, before styles have a chance to land.
//! 2. **frame** - on the next animation frame `-from` is swapped for `-to`,
//!    which is what actually animates.
//! 3. **settle** - once the effect ends (or immediately, when no effect is
//!    running) all phase classes are removed and the run's callback fires.
//!
//! The engine never sees wall-clock animation time. The embedder drives the
//! timeline by calling [`Engine::tick_frame`](crate::Engine::tick_frame)
//! once per animation frame and forwarding end/cancel notifications.
//!
//! # Key Types
//!
//! - [`TransitionCoordinator`] - Tracks in-flight runs, settles exactly once
//! - [`TransitionDriver`] - The phase interface; [`ClassDriver`] is the
//!   CSS class scheme
//! - [`StyleProbe`] - Embedder hook answering "is an effect running here?"

mod coordinator;
mod driver;

pub use coordinator::{TransitionCoordinator, DEFAULT_SETTLE_DEADLINE};
pub use driver::{ClassDriver, FrameOutcome, StyleProbe, TransitionDriver};

/// Which way a transition moves the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionDirection {
    /// The element is being revealed.
    Enter,
    /// The element is being concealed.
    Leave,
}

impl TransitionDirection {
    /// The class-name segment for this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Leave => "leave",
        }
    }
}

/// The three class slots of a transition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionPhase {
    /// Present for the whole run.
    Active,
    /// The pre-activation snapshot, removed at the first frame.
    From,
    /// The destination, applied at the first frame.
    To,
}

impl TransitionPhase {
    /// The class-name segment for this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::From => "from",
            Self::To => "to",
        }
    }
}

/// Compose one class of the `{name}-{direction}-{phase}` family.
pub fn phase_class(name: &str, direction: TransitionDirection, phase: TransitionPhase) -> String {
    format!("{}-{}-{}", name, direction.as_str(), phase.as_str())
}

/// End-of-effect notifications an embedder can forward.
///
/// All four settle an awaited run; cancellations count as completion because
/// the element has already jumped to its final styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionKind {
    TransitionEnd,
    TransitionCancel,
    AnimationEnd,
    AnimationCancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_class_composition() {
        assert_eq!(
            phase_class("fade", TransitionDirection::Enter, TransitionPhase::Active),
            "fade-enter-active"
        );
        assert_eq!(
            phase_class("fade", TransitionDirection::Enter, TransitionPhase::From),
            "fade-enter-from"
        );
        assert_eq!(
            phase_class("slide-down", TransitionDirection::Leave, TransitionPhase::To),
            "slide-down-leave-to"
        );
    }
}
