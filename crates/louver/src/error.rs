//! Error types for the widget engine.

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while wiring or driving widgets.
///
/// Runtime conditions that should not abort an interaction (missing toggle
/// targets, transitions that never report an end) are not errors; they are
/// reported on [`Engine::diagnostics`](crate::Engine::diagnostics) instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An element required at construction time could not be found.
    #[error("Element lookup failed: {what}")]
    Lookup { what: String },

    /// A selector string failed to parse.
    #[error("Selector error: {0}")]
    Selector(#[from] louver_style::Error),

    /// A handle refers to a widget that no longer exists.
    #[error("{kind} handle is detached")]
    Detached { kind: &'static str },
}

impl Error {
    /// Create a lookup error.
    pub fn lookup(what: impl Into<String>) -> Self {
        Self::Lookup { what: what.into() }
    }

    /// Create a detached-handle error.
    pub fn detached(kind: &'static str) -> Self {
        Self::Detached { kind }
    }
}
