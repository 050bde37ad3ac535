//! HTTP client for submitting signed orders to the exchange.

use std::time::Duration;

use aster_signer::WireRequest;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

/// Exchange reply to an accepted order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeReply {
    pub status: u16,
    pub body: Value,
}

/// Posts form-encoded order requests to a single endpoint.
#[derive(Debug, Clone)]
pub struct OrderForwarder {
    client: Client,
    order_url: String,
}

impl OrderForwarder {
    /// Create a forwarder with a per-request timeout.
    pub fn new(order_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            order_url: order_url.into(),
        })
    }

    pub fn order_url(&self) -> &str {
        &self.order_url
    }

    /// Send one order. No retries.
    ///
    /// Only HTTP 200 and 201 with a JSON body count as accepted. Any other
    /// status with a JSON body is a rejection carrying that body; a body
    /// that is not JSON is reported verbatim with the exchange status.
    pub async fn send(&self, request: &WireRequest) -> AppResult<ExchangeReply> {
        let mut builder = self
            .client
            .post(&self.order_url)
            .header(CONTENT_TYPE, request.content_type)
            .body(request.body.clone());
        if let Some((name, value)) = request.api_key_header() {
            builder = builder.header(name, value);
        }

        info!(url = %self.order_url, "Submitting order");

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Order request failed");
            AppError::ExchangeUnreachable(format!("HTTP request failed: {e}"))
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::ExchangeUnreachable(format!("Failed to read response: {e}")))?;

        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) => {
                warn!(status, "Exchange returned a non-JSON body");
                return Err(AppError::NonJsonResponse { status, text });
            }
        };

        if status != 200 && status != 201 {
            warn!(status, detail = %body, "Order rejected");
            return Err(AppError::OrderRejected {
                status,
                detail: body,
            });
        }

        debug!(status, "Order accepted");
        Ok(ExchangeReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keeps_url() {
        let forwarder =
            OrderForwarder::new("http://127.0.0.1:9/order", Duration::from_secs(1)).unwrap();
        assert_eq!(forwarder.order_url(), "http://127.0.0.1:9/order");
    }

    #[tokio::test]
    async fn test_unreachable_exchange() {
        // Port 9 (discard) is closed on loopback in test environments.
        let forwarder =
            OrderForwarder::new("http://127.0.0.1:9/order", Duration::from_secs(2)).unwrap();
        let request = WireRequest {
            body: "symbol=BTCUSDT".into(),
            content_type: aster_signer::FORM_CONTENT_TYPE,
            api_key: None,
        };
        let err = forwarder.send(&request).await.unwrap_err();
        assert!(matches!(err, AppError::ExchangeUnreachable(_)));
        assert_eq!(err.status_code(), 502);
    }
}
