use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use super::gateway_trait::{GatewayError, PaymentGateway, PaymentInitiation, PaymentRequest};
use crate::models::order::PaymentMethod;

/// Opérateur simulé : répond immédiatement avec une référence synthétique
/// (MVOLA-<millis> / OM-<millis>). Utilisé quand aucune URL d'API n'est
/// configurée pour la méthode.
pub struct SimulatedGateway {
    method: PaymentMethod,
}

impl SimulatedGateway {
    pub fn new(method: PaymentMethod) -> Self {
        Self { method }
    }

    fn prefix(&self) -> &'static str {
        match self.method {
            PaymentMethod::Mvola => "MVOLA",
            PaymentMethod::OrangeMoney => "OM",
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    fn method(&self) -> PaymentMethod {
        self.method
    }

    async fn initiate(&self, request: &PaymentRequest) -> Result<PaymentInitiation, GatewayError> {
        info!(
            method = ?self.method,
            order_id = %request.order_id,
            amount = request.amount,
            "Simulated payment initiated"
        );

        Ok(PaymentInitiation {
            reference: format!("{}-{}", self.prefix(), Utc::now().timestamp_millis()),
            status: "pending".to_string(),
        })
    }
}
