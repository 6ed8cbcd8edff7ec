use actix_web::{post, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::dto::WebhookResponse;
use crate::services::webhook_service::WebhookService;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// POST /api/webhooks/payment - Notification de la passerelle (PUBLIC, signée)
#[post("/payment")]
pub async fn payment_webhook(
    req: HttpRequest,
    body: web::Bytes,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    // La signature porte sur le corps brut, avant tout parsing
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    WebhookService::verify_signature(config.webhook_secret.as_deref(), &body, signature)?;

    let event = WebhookService::parse(&body)?;
    let outcome = WebhookService::handle(db.get_ref(), event).await?;

    Ok(HttpResponse::Ok().json(WebhookResponse {
        success: true,
        message: outcome.message(),
    }))
}

pub fn webhook_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhooks")
            .service(payment_webhook)
    );
}
