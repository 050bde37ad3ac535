//! Core domain types for the Aster webhook relay.
//!
//! This crate provides the pure, I/O-free half of order signing:
//! - `OrderIntent`: validated trade instruction parsed from a webhook body
//! - `ParamValue`: tagged JSON value with a total stringification rule
//! - `CanonicalParams` / `ParamBuilder`: the flat, sorted parameter map both
//!   signing schemes consume
//! - `Clock`: time source, swappable in tests

pub mod clock;
pub mod error;
pub mod json;
pub mod order;
pub mod params;
pub mod value;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreResult, ValidationError};
pub use json::AsciiJson;
pub use order::{
    OrderIntent, OrderSide, OrderType, DEFAULT_POSITION_SIDE, DEFAULT_TIME_IN_FORCE,
    RESERVED_KEYS,
};
pub use params::{CanonicalParams, ParamBuilder, DEFAULT_RECV_WINDOW};
pub use value::ParamValue;
