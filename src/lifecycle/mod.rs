//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Store → Cache → Event publisher → OrderService
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Trigger → HTTP server stops accepting and drains → background tasks exit
//! ```
//!
//! Startup is ordered and fails fast: any backend that cannot be reached is
//! fatal, and the listener binds only after the service is built.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_service, StartupError};
