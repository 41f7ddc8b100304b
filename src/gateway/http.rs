//! HTTP settlement gateway

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::traits::SettlementGateway;
use crate::types::GatewayError;

/// Settlement gateway backed by an HTTP endpoint.
///
/// The endpoint answers a JSON body of the form `{"error": <code>}`; code
/// zero authorizes the deposit, anything else declines it. Connection
/// failures, non-success statuses, and undecodable bodies all surface as
/// transport failures.
pub struct HttpSettlementGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSettlementGateway {
    /// Gateway with a default client.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Gateway with a preconfigured client (request timeouts, pools).
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SettlementResponse {
    error: i64,
}

impl SettlementResponse {
    fn into_result(self) -> Result<(), GatewayError> {
        if self.error != 0 {
            return Err(GatewayError::Declined { code: self.error });
        }
        Ok(())
    }
}

#[async_trait]
impl SettlementGateway for HttpSettlementGateway {
    async fn authorize(&self) -> Result<(), GatewayError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        info!(status = %response.status(), "settlement gateway responded");
        let response = response
            .error_for_status()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        let body: SettlementResponse = response
            .json()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        body.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_error_code_authorizes() {
        let body: SettlementResponse = serde_json::from_str(r#"{"error": 0}"#).unwrap();
        assert!(body.into_result().is_ok());
    }

    #[test]
    fn non_zero_error_code_declines() {
        let body: SettlementResponse = serde_json::from_str(r#"{"error": 7}"#).unwrap();
        assert!(matches!(
            body.into_result(),
            Err(GatewayError::Declined { code: 7 })
        ));
    }

    #[test]
    fn extra_fields_in_the_body_are_ignored() {
        let body: SettlementResponse =
            serde_json::from_str(r#"{"error": 0, "message": "ok"}"#).unwrap();
        assert!(body.into_result().is_ok());
    }
}
