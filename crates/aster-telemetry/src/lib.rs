//! Structured logging for the Aster webhook relay.
//!
//! JSON logs in production, pretty logs during development. Never logs
//! secrets: callers pass only redacted or public values as fields.

pub mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogFormat};
