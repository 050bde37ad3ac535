//! Canonical, string-valued order parameters.
//!
//! [`ParamBuilder::build`] turns an [`OrderIntent`] into [`CanonicalParams`]:
//! a lexicographically ordered map whose values are all plain strings. Both
//! signing schemes consume this map, so its textual forms are the contract
//! with the exchange:
//!
//! - [`CanonicalParams::query_string`]: `k=v&k2=v2`, sorted, unencoded (HMAC input)
//! - [`CanonicalParams::canonical_json`]: compact JSON object, sorted keys (ECDSA input)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreResult, ValidationError};
use crate::json::AsciiJson;
use crate::order::{check_decimal, OrderIntent, OrderType};

/// Default exchange receive window (ms).
pub const DEFAULT_RECV_WINDOW: u64 = 50_000;

/// Flat, sorted `name -> string value` map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalParams(BTreeMap<String, String>);

impl CanonicalParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in lexicographic key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `key=value` pairs joined with `&`, sorted by key, values raw.
    ///
    /// No percent-encoding: the HMAC is computed over this exact text and
    /// encoding only happens when the wire body is assembled.
    pub fn query_string(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Compact JSON object with sorted keys and double-quoted string values.
    /// Characters above U+007F are written as `\uXXXX` escapes.
    ///
    /// This byte string is what the delegated signer hashes; any change to
    /// key order, spacing, quoting or escaping changes the signature.
    pub fn canonical_json(&self) -> String {
        let mut object = Map::new();
        for (k, v) in self.iter() {
            object.insert(k.to_string(), Value::String(v.to_string()));
        }
        AsciiJson(&Value::Object(object)).to_string()
    }

    /// Parse a JSON object of strings back into params.
    ///
    /// `from_canonical_json(p.canonical_json())` reproduces `p`, and
    /// re-serializing yields the identical string.
    pub fn from_canonical_json(text: &str) -> CoreResult<Self> {
        Ok(Self(serde_json::from_str(text)?))
    }
}

impl FromIterator<(String, String)> for CanonicalParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Builds [`CanonicalParams`] from an [`OrderIntent`].
///
/// Holds only the configured defaults; the clock reading is passed in so the
/// build stays a pure function.
#[derive(Debug, Clone, Copy)]
pub struct ParamBuilder {
    default_recv_window: u64,
}

impl Default for ParamBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_RECV_WINDOW)
    }
}

impl ParamBuilder {
    pub fn new(default_recv_window: u64) -> Self {
        Self {
            default_recv_window,
        }
    }

    pub fn default_recv_window(&self) -> u64 {
        self.default_recv_window
    }

    /// Build the canonical parameter map.
    ///
    /// `timestamp` is always `now_ms`, even if the intent carried one.
    /// `price` is only emitted for LIMIT orders.
    ///
    /// # Errors
    /// Returns `ValidationError` if `symbol` or `quantity` is empty, or a
    /// LIMIT order has no price.
    pub fn build(&self, intent: &OrderIntent, now_ms: u64) -> CoreResult<CanonicalParams> {
        if intent.symbol.trim().is_empty() {
            return Err(ValidationError::MissingField("symbol"));
        }
        if intent.quantity.trim().is_empty() {
            return Err(ValidationError::MissingField("quantity"));
        }
        check_decimal("quantity", intent.quantity.trim())?;

        let mut params = CanonicalParams::new();

        // Extras first so the typed fields below always win on key clashes.
        for (key, value) in &intent.extra {
            if !value.is_null() {
                params.insert(key.clone(), value.stringify());
            }
        }

        params.insert("symbol", intent.symbol.trim());
        params.insert("side", intent.side.as_str());
        params.insert("type", intent.order_type.as_str());
        params.insert("quantity", intent.quantity.trim());
        params.insert("timeInForce", intent.time_in_force.as_str());
        params.insert("positionSide", intent.position_side.as_str());

        if intent.order_type == OrderType::Limit {
            let price = intent
                .price
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .ok_or(ValidationError::LimitWithoutPrice)?;
            check_decimal("price", price)?;
            params.insert("price", price);
        }

        let recv_window = intent.recv_window.unwrap_or(self.default_recv_window);
        params.insert("recvWindow", recv_window.to_string());
        params.insert("timestamp", now_ms.to_string());

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderSide;
    use crate::value::ParamValue;
    use serde_json::json;

    const NOW_MS: u64 = 1_700_000_000_000;

    fn market_buy() -> OrderIntent {
        OrderIntent::new("BTCUSDT", OrderSide::Buy, OrderType::Market, "0.01")
    }

    #[test]
    fn test_build_market_order() {
        let params = ParamBuilder::default().build(&market_buy(), NOW_MS).unwrap();

        assert_eq!(
            params.query_string(),
            "positionSide=BOTH&quantity=0.01&recvWindow=50000&side=BUY&symbol=BTCUSDT\
             &timeInForce=GTC&timestamp=1700000000000&type=MARKET"
        );
        assert!(!params.contains_key("price"));
    }

    #[test]
    fn test_build_limit_requires_price() {
        let intent = OrderIntent::new("BTCUSDT", OrderSide::Sell, OrderType::Limit, "1");
        let err = ParamBuilder::default().build(&intent, NOW_MS).unwrap_err();
        assert!(matches!(err, ValidationError::LimitWithoutPrice));

        let params = ParamBuilder::default()
            .build(&intent.with_price("42000.5"), NOW_MS)
            .unwrap();
        assert_eq!(params.get("price"), Some("42000.5"));
        assert_eq!(params.get("type"), Some("LIMIT"));
    }

    #[test]
    fn test_build_rejects_empty_required_fields() {
        let mut intent = market_buy();
        intent.symbol = "  ".to_string();
        assert!(matches!(
            ParamBuilder::default().build(&intent, NOW_MS),
            Err(ValidationError::MissingField("symbol"))
        ));

        let mut intent = market_buy();
        intent.quantity = String::new();
        assert!(matches!(
            ParamBuilder::default().build(&intent, NOW_MS),
            Err(ValidationError::MissingField("quantity"))
        ));
    }

    #[test]
    fn test_recv_window_caller_value_wins() {
        let mut intent = market_buy();
        intent.recv_window = Some(5_000);
        let params = ParamBuilder::new(60_000).build(&intent, NOW_MS).unwrap();
        assert_eq!(params.get("recvWindow"), Some("5000"));

        let params = ParamBuilder::new(60_000).build(&market_buy(), NOW_MS).unwrap();
        assert_eq!(params.get("recvWindow"), Some("60000"));
    }

    #[test]
    fn test_timestamp_always_overwritten() {
        let mut intent = market_buy();
        intent
            .extra
            .insert("timestamp".to_string(), ParamValue::from("1"));
        let params = ParamBuilder::default().build(&intent, NOW_MS).unwrap();
        assert_eq!(params.get("timestamp"), Some("1700000000000"));
    }

    #[test]
    fn test_build_is_deterministic_for_fixed_clock() {
        let a = ParamBuilder::default().build(&market_buy(), NOW_MS).unwrap();
        let b = ParamBuilder::default().build(&market_buy(), NOW_MS).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_nested_extras_are_reparseable_json() {
        let intent = OrderIntent::from_value(json!({
            "symbol": "BTCUSDT", "side": "BUY", "type": "MARKET", "quantity": "1",
            "tags": ["a", "b"],
            "meta": {"strategy": "ema", "len": 20}
        }))
        .unwrap();
        let params = ParamBuilder::default().build(&intent, NOW_MS).unwrap();

        let tags: Vec<String> = serde_json::from_str(params.get("tags").unwrap()).unwrap();
        assert_eq!(tags, vec!["a", "b"]);

        let meta: BTreeMap<String, String> =
            serde_json::from_str(params.get("meta").unwrap()).unwrap();
        assert_eq!(meta["strategy"], "ema");
        assert_eq!(meta["len"], "20");
    }

    #[test]
    fn test_canonical_json_sorted_and_compact() {
        let params: CanonicalParams = [
            ("symbol".to_string(), "BTCUSDT".to_string()),
            ("quantity".to_string(), "1".to_string()),
            ("side".to_string(), "BUY".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            params.canonical_json(),
            r#"{"quantity":"1","side":"BUY","symbol":"BTCUSDT"}"#
        );
    }

    #[test]
    fn test_canonical_json_idempotent() {
        let intent = OrderIntent::from_value(json!({
            "symbol": "BTCUSDT", "side": "BUY", "type": "LIMIT", "quantity": "1",
            "price": "100", "tags": ["x", {"k": "v"}]
        }))
        .unwrap();
        let params = ParamBuilder::default().build(&intent, NOW_MS).unwrap();

        let once = params.canonical_json();
        let reparsed = CanonicalParams::from_canonical_json(&once).unwrap();
        let twice = reparsed.canonical_json();

        assert_eq!(reparsed, params);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_canonical_json_escapes_non_ascii() {
        let params: CanonicalParams = [
            ("symbol", "\u{5e01}\u{5b89}\u{4eba}\u{751f}USDT"),
            ("quantity", "1"),
            ("side", "BUY"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(
            params.canonical_json(),
            r#"{"quantity":"1","side":"BUY","symbol":"\u5e01\u5b89\u4eba\u751fUSDT"}"#
        );
        // The HMAC input is not JSON and keeps the raw text.
        assert!(params
            .query_string()
            .ends_with("symbol=\u{5e01}\u{5b89}\u{4eba}\u{751f}USDT"));
    }
}
