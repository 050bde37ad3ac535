//! Aster webhook relay.
//!
//! Receives trading-alert webhooks, turns each into a signed Aster futures
//! order and forwards it to the exchange (or echoes it in test mode).

pub mod app;
pub mod config;
pub mod error;
pub mod forwarder;
pub mod server;

pub use crate::app::Application;
pub use crate::config::AppConfig;
pub use crate::error::{AppError, AppResult};
pub use crate::forwarder::{ExchangeReply, OrderForwarder};
pub use crate::server::{create_router, AppState};
