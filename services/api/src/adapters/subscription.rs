//! services/api/src/adapters/subscription.rs
//!
//! This module contains the adapter for the external subscription
//! entitlement service. It implements the `SubscriptionService` port from
//! the `core` crate.
//!
//! The check is fail-closed: a timeout, transport error, non-success status,
//! or malformed body all mean "not a subscriber". Premium content then shows
//! as locked rather than the request failing.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use opencourse_core::ports::SubscriptionService;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that verifies premium entitlement against an HTTP endpoint.
#[derive(Clone)]
pub struct HttpSubscriptionAdapter {
    client: reqwest::Client,
    endpoint: Option<String>,
}

/// The entitlement service's response body.
#[derive(Deserialize)]
struct EntitlementResponse {
    active: bool,
}

impl HttpSubscriptionAdapter {
    /// Creates a new adapter. `endpoint` unset means no entitlement
    /// provider is configured and every check answers `false`.
    ///
    /// The timeout is enforced by the underlying client on every call.
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

//=========================================================================================
// `SubscriptionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SubscriptionService for HttpSubscriptionAdapter {
    async fn is_active_subscriber(&self, email: &str) -> bool {
        let Some(endpoint) = &self.endpoint else {
            debug!("No subscription endpoint configured; treating viewer as unsubscribed");
            return false;
        };

        let response = match self
            .client
            .get(endpoint)
            .query(&[("email", email)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Subscription check failed, treating as unsubscribed: {}", e);
                return false;
            }
        };

        if !response.status().is_success() {
            warn!(
                status = %response.status(),
                "Subscription endpoint returned non-success, treating as unsubscribed"
            );
            return false;
        }

        match response.json::<EntitlementResponse>().await {
            Ok(body) => {
                debug!(active = body.active, "Subscription status verified");
                body.active
            }
            Err(e) => {
                warn!("Malformed entitlement response, treating as unsubscribed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_endpoint_fails_closed() {
        let adapter = HttpSubscriptionAdapter::new(None, Duration::from_secs(10)).unwrap();
        assert!(!adapter.is_active_subscriber("learner@example.com").await);
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_closed() {
        // Nothing listens on this port; the transport error must come back
        // as "not subscribed", not as a panic or a hang.
        let adapter = HttpSubscriptionAdapter::new(
            Some("http://127.0.0.1:1/entitlements".to_string()),
            Duration::from_millis(200),
        )
        .unwrap();
        assert!(!adapter.is_active_subscriber("learner@example.com").await);
    }
}
