use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info};

use super::gateway_trait::{GatewayError, PaymentGateway, PaymentInitiation, PaymentRequest};
use crate::config::GatewayEndpoint;
use crate::models::order::PaymentMethod;

/// Opérateur réel : POST {base_url}/payments avec une clé Bearer,
/// réponse attendue `{reference, status}`
pub struct HttpGateway {
    method: PaymentMethod,
    endpoint: GatewayEndpoint,
    client: Client,
    timeout: Duration,
}

impl HttpGateway {
    pub fn new(method: PaymentMethod, endpoint: GatewayEndpoint, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self { method, endpoint, client, timeout })
    }

    fn payments_url(&self) -> String {
        format!("{}/payments", self.endpoint.base_url)
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    fn method(&self) -> PaymentMethod {
        self.method
    }

    async fn initiate(&self, request: &PaymentRequest) -> Result<PaymentInitiation, GatewayError> {
        info!(method = ?self.method, order_id = %request.order_id, "Calling payment provider");

        let response = self
            .client
            .post(self.payments_url())
            .bearer_auth(&self.endpoint.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(self.timeout.as_secs())
                } else {
                    GatewayError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!("{}: {}", status, body)));
        }
        if !status.is_success() {
            error!(method = ?self.method, %status, "Payment provider returned an error");
            return Err(GatewayError::Transport(format!("provider answered {}", status)));
        }

        let initiation: PaymentInitiation = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if initiation.reference.trim().is_empty() {
            return Err(GatewayError::InvalidResponse("empty payment reference".to_string()));
        }

        Ok(initiation)
    }
}
