//! Logging facilities for Louver.
//!
//! Louver uses the `tracing` crate for instrumentation. The library never
//! installs a subscriber; to see logs, install one in the embedding
//! application:
//!
//! ```ignore
//! use tracing_subscriber;
//!
//! fn main() {
//!     // Initialize tracing (you can customize this)
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! Every subsystem logs under a fixed target so noise can be filtered per
//! area, e.g. `RUST_LOG=louver::motion=trace,louver=info`. The [`targets`]
//! module lists the directive strings.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "louver_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "louver_core::signal";
    /// Element tree target.
    pub const DOM: &str = "louver::dom";
    /// Transition coordinator target.
    pub const MOTION: &str = "louver::motion";
    /// Disclosure primitive target.
    pub const DISCLOSURE: &str = "louver::disclosure";
    /// Accordion composition target.
    pub const ACCORDION: &str = "louver::accordion";
    /// Engine facade target.
    pub const ENGINE: &str = "louver::engine";
    /// Selector parser target.
    pub const SELECTOR: &str = "louver_style::parser";
}
