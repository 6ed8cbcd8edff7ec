pub mod gateway_trait;
pub mod http;
pub mod simulated;

use tracing::{info, warn};

pub use gateway_trait::{GatewayError, PaymentGateway, PaymentInitiation, PaymentRequest};

use crate::config::{AppConfig, GatewayEndpoint};
use crate::models::order::PaymentMethod;
use self::http::HttpGateway;
use self::simulated::SimulatedGateway;

/// Un adaptateur par méthode de paiement
pub struct PaymentGateways {
    mvola: Box<dyn PaymentGateway>,
    orange_money: Box<dyn PaymentGateway>,
}

impl PaymentGateways {
    pub fn new(mvola: Box<dyn PaymentGateway>, orange_money: Box<dyn PaymentGateway>) -> Self {
        Self { mvola, orange_money }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            mvola: build(PaymentMethod::Mvola, config.mvola.clone(), config)?,
            orange_money: build(PaymentMethod::OrangeMoney, config.orange_money.clone(), config)?,
        })
    }

    pub fn for_method(&self, method: PaymentMethod) -> &dyn PaymentGateway {
        match method {
            PaymentMethod::Mvola => self.mvola.as_ref(),
            PaymentMethod::OrangeMoney => self.orange_money.as_ref(),
        }
    }
}

fn build(
    method: PaymentMethod,
    endpoint: Option<GatewayEndpoint>,
    config: &AppConfig,
) -> Result<Box<dyn PaymentGateway>, GatewayError> {
    let gateway: Box<dyn PaymentGateway> = match endpoint {
        Some(endpoint) => Box::new(HttpGateway::new(method, endpoint, config.gateway_timeout)?),
        None => {
            warn!(?method, "No API URL configured, payments for this method are simulated");
            Box::new(SimulatedGateway::new(method))
        }
    };
    debug_assert_eq!(gateway.method(), method);
    info!(method = ?gateway.method(), "Payment gateway ready");
    Ok(gateway)
}
