//! Core systems for Louver.
//!
//! This crate provides the foundational components of the Louver disclosure
//! engine:
//!
//! - **Signal/Slot System**: Type-safe, strictly ordered lifecycle
//!   notifications
//! - **Logging**: Per-subsystem `tracing` targets for filtered diagnostics
//!
//! # Signal/Slot Example
//!
//! ```
//! use louver_core::Signal;
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Scoped Connections
//!
//! ```
//! use louver_core::Signal;
//!
//! let opened = Signal::<String>::new();
//! {
//!     let _guard = opened.connect_scoped(|name| {
//!         println!("opened: {name}");
//!     });
//!     opened.emit("details".to_string());
//! } // guard dropped, slot disconnected
//! assert_eq!(opened.connection_count(), 0);
//! ```

pub mod logging;
pub mod signal;

pub use signal::{ConnectionGuard, ConnectionId, Signal};
