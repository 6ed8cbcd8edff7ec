use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::order::PaymentMethod;

/// Demande de paiement transmise à l'opérateur
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub order_id: Uuid,
    pub amount: i64,
    pub phone: String,
    pub callback_url: Option<String>,
}

/// Réponse de l'opérateur. `status` garde le vocabulaire de l'opérateur
/// ("pending", "success", "failed"...), le résultat final arrive par webhook
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentInitiation {
    pub reference: String,
    pub status: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment provider did not answer within {0} seconds")]
    Timeout(u64),
    #[error("payment provider unreachable: {0}")]
    Transport(String),
    #[error("payment refused by provider: {0}")]
    Rejected(String),
    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
}

//trait = Interface, une implémentation par opérateur
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn method(&self) -> PaymentMethod;

    async fn initiate(&self, request: &PaymentRequest) -> Result<PaymentInitiation, GatewayError>;
}
