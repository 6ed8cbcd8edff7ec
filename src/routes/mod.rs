pub mod admin;
pub mod cart;
pub mod catalog;
pub mod downloads;
pub mod health;
pub mod orders;
pub mod profile;
pub mod webhook;

use actix_web::web;

use crate::error::AppError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .configure(profile::profile_routes)
            .configure(catalog::catalog_routes)
            .configure(cart::cart_routes)
            .configure(orders::order_routes)
            .configure(webhook::webhook_routes)
            .configure(downloads::download_routes)
            .configure(admin::admin_routes)
    );
}

/// Corps JSON invalide -> 400 {"error": ...} comme les autres erreurs
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

#[cfg(test)]
pub mod test_support {
    use std::collections::HashMap;

    use uuid::Uuid;

    use crate::config::AppConfig;
    use crate::models::order::PaymentMethod;
    use crate::services::content_store::SignedUrlIssuer;
    use crate::services::gateways::simulated::SimulatedGateway;
    use crate::services::gateways::PaymentGateways;
    use crate::utils::jwt;

    pub const WEBHOOK_SECRET: &str = "webhook-secret";

    pub fn config() -> AppConfig {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_SECRET", "test-jwt-secret"),
            ("WEBHOOK_SECRET", WEBHOOK_SECRET),
            ("STORAGE_BASE_URL", "https://files.example.mg"),
            ("STORAGE_SIGNING_SECRET", "storage-secret"),
        ]);
        AppConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap()
    }

    pub fn gateways() -> PaymentGateways {
        PaymentGateways::new(
            Box::new(SimulatedGateway::new(PaymentMethod::Mvola)),
            Box::new(SimulatedGateway::new(PaymentMethod::OrangeMoney)),
        )
    }

    pub fn store(config: &AppConfig) -> SignedUrlIssuer {
        SignedUrlIssuer::from_config(config)
    }

    pub fn bearer(user_id: Uuid) -> (&'static str, String) {
        let token = jwt::generate_token(user_id, "client@example.mg", &config().jwt_secret).unwrap();
        ("Authorization", format!("Bearer {}", token))
    }

    /// App complète branchée sur une base de test
    macro_rules! test_app {
        ($db:expr) => {{
            let config = $crate::routes::test_support::config();
            actix_web::test::init_service(
                actix_web::App::new()
                    .app_data(actix_web::web::Data::new($db.clone()))
                    .app_data(actix_web::web::Data::new($crate::routes::test_support::store(&config)))
                    .app_data(actix_web::web::Data::new($crate::routes::test_support::gateways()))
                    .app_data(actix_web::web::Data::new(config))
                    .app_data($crate::routes::json_config())
                    .configure($crate::routes::configure_routes),
            )
            .await
        }};
    }
    pub(crate) use test_app;
}
