//! Observability for gather sessions
//!
//! Structured logging with format/level selection via environment variables,
//! plus span macros for the session, drain, and queue scopes.

pub mod logging;

// Re-export for convenience
pub use logging::{init_default_logging, init_logging, LogFormat};

// Span macros for structured logging
pub use logging::{drain_span, queue_span, session_span};
