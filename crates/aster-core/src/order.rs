//! Order intent as received from the alerting service.
//!
//! Provides order side and type enums plus [`OrderIntent`], the typed,
//! validated form of a webhook body.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreResult, ValidationError};
use crate::value::ParamValue;

/// Default time-in-force when the alert does not specify one.
pub const DEFAULT_TIME_IN_FORCE: &str = "GTC";
/// Default position side (one-way mode).
pub const DEFAULT_POSITION_SIDE: &str = "BOTH";

/// Keys the signer and assembler own. An alert may never set them.
pub const RESERVED_KEYS: [&str; 4] = ["signature", "nonce", "user", "signer"];

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = ValidationError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            other => Err(ValidationError::invalid(
                "side",
                format!("expected BUY or SELL, got {other:?}"),
            )),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::Limit => "LIMIT",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = ValidationError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MARKET" => Ok(Self::Market),
            "LIMIT" => Ok(Self::Limit),
            other => Err(ValidationError::invalid(
                "orderType",
                format!("expected MARKET or LIMIT, got {other:?}"),
            )),
        }
    }
}

/// A validated trade instruction.
///
/// Built from the raw webhook JSON with [`OrderIntent::from_value`]; fields
/// stay public so callers can also construct one directly (the builder
/// re-checks the invariants it depends on).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    /// Decimal text exactly as the alert sent it.
    pub quantity: String,
    /// Decimal text; required iff `order_type == Limit`.
    pub price: Option<String>,
    pub time_in_force: String,
    pub position_side: String,
    /// Caller-supplied receive window (ms), if any.
    pub recv_window: Option<u64>,
    /// Any other fields, carried through stringification.
    pub extra: BTreeMap<String, ParamValue>,
}

impl OrderIntent {
    /// Minimal market/limit intent with defaults for the optional fields.
    pub fn new(
        symbol: impl Into<String>,
        side: OrderSide,
        order_type: OrderType,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type,
            quantity: quantity.into(),
            price: None,
            time_in_force: DEFAULT_TIME_IN_FORCE.to_string(),
            position_side: DEFAULT_POSITION_SIDE.to_string(),
            recv_window: None,
            extra: BTreeMap::new(),
        }
    }

    /// Set the limit price.
    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    /// Parse and validate a webhook body.
    ///
    /// `type` and `orderType` are both accepted for the order type (`type`
    /// wins when both are set). A caller-supplied `timestamp` is discarded
    /// because the builder always stamps its own clock reading.
    ///
    /// # Errors
    /// Returns `ValidationError` if a required field is missing or empty,
    /// `side`/`orderType` are unknown, `quantity`/`price` are not decimals,
    /// a LIMIT order has no price, or a reserved key is present.
    pub fn from_value(value: Value) -> CoreResult<Self> {
        let Value::Object(mut body) = value else {
            return Err(ValidationError::NotAnObject);
        };

        let symbol =
            take_text(&mut body, "symbol")?.ok_or(ValidationError::MissingField("symbol"))?;
        let side: OrderSide = take_text(&mut body, "side")?
            .ok_or(ValidationError::MissingField("side"))?
            .parse()?;

        let type_field = take_text(&mut body, "type")?;
        let order_type_field = take_text(&mut body, "orderType")?;
        let order_type: OrderType = type_field
            .or(order_type_field)
            .ok_or(ValidationError::MissingField("orderType"))?
            .parse()?;

        let quantity = take_text(&mut body, "quantity")?
            .ok_or(ValidationError::MissingField("quantity"))?;
        check_decimal("quantity", &quantity)?;

        let price = take_text(&mut body, "price")?;
        if let Some(ref p) = price {
            check_decimal("price", p)?;
        }
        if order_type == OrderType::Limit && price.is_none() {
            return Err(ValidationError::LimitWithoutPrice);
        }

        let time_in_force = take_text(&mut body, "timeInForce")?
            .unwrap_or_else(|| DEFAULT_TIME_IN_FORCE.to_string());
        let position_side = take_text(&mut body, "positionSide")?
            .unwrap_or_else(|| DEFAULT_POSITION_SIDE.to_string());

        let recv_window = match take_text(&mut body, "recvWindow")? {
            Some(text) => Some(text.parse::<u64>().map_err(|e| {
                ValidationError::invalid("recvWindow", format!("{text:?}: {e}"))
            })?),
            None => None,
        };

        body.remove("timestamp");

        let mut extra = BTreeMap::new();
        for (key, value) in body {
            if RESERVED_KEYS.contains(&key.as_str()) {
                return Err(ValidationError::ReservedField(key));
            }
            let value = ParamValue::from(value);
            if !value.is_null() {
                extra.insert(key, value);
            }
        }

        Ok(Self {
            symbol,
            side,
            order_type,
            quantity,
            price,
            time_in_force,
            position_side,
            recv_window,
            extra,
        })
    }
}

impl TryFrom<Value> for OrderIntent {
    type Error = ValidationError;

    fn try_from(value: Value) -> CoreResult<Self> {
        Self::from_value(value)
    }
}

/// Remove `key` and return its scalar text form.
///
/// Absent, `null` and empty/blank strings all count as "not provided".
fn take_text(
    body: &mut serde_json::Map<String, Value>,
    key: &'static str,
) -> CoreResult<Option<String>> {
    match body.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(ValidationError::invalid(
            key,
            format!("expected a string or number, got {other}"),
        )),
    }
}

pub(crate) fn check_decimal(field: &'static str, text: &str) -> CoreResult<()> {
    let parsed = Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|e| ValidationError::invalid(field, format!("{text:?} is not a decimal: {e}")))?;
    if parsed.is_sign_negative() || parsed.is_zero() {
        return Err(ValidationError::invalid(
            field,
            format!("{text:?} must be positive"),
        ));
    }
    Ok(())
}
