// ============================================================================
// WEBHOOK PAIEMENT
// ============================================================================
//
// Workflow:
//   1. Vérifier la signature HMAC du corps brut (X-Webhook-Signature)
//   2. Parser {reference, status, order_id}, champs manquants -> 400
//   3. Traduire le statut opérateur :
//        success | completed -> completed
//        failed  | error     -> failed
//        autre               -> ignoré (200, aucune écriture)
//   4. UPDATE conditionnel : id + référence + statut non terminal.
//      Une seule livraison peut gagner, les rejeux et les livraisons
//      tardives (failed après completed) ne modifient rien.
//
// ============================================================================

use chrono::Utc;
use sea_orm::*;
use sea_orm::sea_query::Expr;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::dto::WebhookPayload;
use crate::models::order::{self, OrderStatus};
use crate::services::order_service::OrderService;
use crate::utils::signature;

/// Données validées extraites du webhook
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub order_id: Uuid,
    pub reference: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// La transition a été appliquée
    Applied(OrderStatus),
    /// La commande est déjà dans ce statut (rejeu)
    Duplicate(OrderStatus),
    /// La commande est déjà terminée dans un autre statut, rien ne change
    Stale { current: OrderStatus, received: OrderStatus },
    /// Statut opérateur sans équivalent, rien à faire
    Ignored(String),
}

impl WebhookOutcome {
    pub fn message(&self) -> String {
        match self {
            WebhookOutcome::Applied(status) => format!("Order marked {}", status.as_str()),
            WebhookOutcome::Duplicate(status) => format!("Order already {}", status.as_str()),
            WebhookOutcome::Stale { current, .. } => {
                format!("Order already {}, update ignored", current.as_str())
            }
            WebhookOutcome::Ignored(status) => format!("Status '{}' ignored", status),
        }
    }
}

/// Vocabulaire opérateur -> statut interne
pub fn map_gateway_status(status: &str) -> Option<OrderStatus> {
    match status.trim().to_ascii_lowercase().as_str() {
        "success" | "completed" => Some(OrderStatus::Completed),
        "failed" | "error" => Some(OrderStatus::Failed),
        _ => None,
    }
}

pub struct WebhookService;

impl WebhookService {
    /// Sans secret configuré, aucun webhook n'est accepté
    pub fn verify_signature(secret: Option<&str>, body: &[u8], header: Option<&str>) -> Result<(), AppError> {
        let secret = secret.ok_or_else(|| {
            warn!("Webhook received but WEBHOOK_SECRET is not configured");
            AppError::Unauthorized("Webhook signature cannot be verified".to_string())
        })?;

        let header = header.ok_or_else(|| AppError::Unauthorized("Missing webhook signature".to_string()))?;

        if !signature::verify_hex(secret, body, header) {
            warn!("Webhook rejected: invalid signature");
            return Err(AppError::Unauthorized("Invalid webhook signature".to_string()));
        }
        Ok(())
    }

    pub fn parse(body: &[u8]) -> Result<WebhookEvent, AppError> {
        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {}", e)))?;

        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        match (
            non_empty(payload.reference),
            non_empty(payload.status),
            non_empty(payload.order_id),
        ) {
            (Some(reference), Some(status), Some(order_id)) => {
                let order_id = Uuid::parse_str(&order_id)
                    .map_err(|_| AppError::Validation(format!("Invalid order_id: {}", order_id)))?;
                Ok(WebhookEvent { order_id, reference, status })
            }
            _ => Err(AppError::Validation(
                "Webhook requires reference, status and order_id".to_string(),
            )),
        }
    }

    pub async fn handle(db: &DatabaseConnection, event: WebhookEvent) -> Result<WebhookOutcome, AppError> {
        let target = match map_gateway_status(&event.status) {
            Some(status) => status,
            None => {
                info!(order_id = %event.order_id, status = %event.status, "Webhook status ignored");
                return Ok(WebhookOutcome::Ignored(event.status));
            }
        };

        let now = Utc::now();
        let paid_at = (target == OrderStatus::Completed).then_some(now);

        let txn = db.begin().await?;

        let result = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(target))
            .col_expr(order::Column::PaidAt, Expr::value(paid_at))
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(event.order_id))
            .filter(order::Column::PaymentReference.eq(event.reference.as_str()))
            .filter(order::Column::Status.is_in(target.allowed_sources().iter().copied()))
            .exec(&txn)
            .await?;

        if result.rows_affected == 1 {
            if target == OrderStatus::Completed {
                OrderService::increment_sales(&txn, event.order_id).await?;
            }
            txn.commit().await?;

            info!(
                order_id = %event.order_id,
                reference = %event.reference,
                status = target.as_str(),
                "Webhook applied"
            );
            return Ok(WebhookOutcome::Applied(target));
        }

        // aucune ligne : mauvaise référence ou commande déjà terminée
        let current = order::Entity::find_by_id(event.order_id)
            .filter(order::Column::PaymentReference.eq(event.reference.as_str()))
            .one(&txn)
            .await?;

        match current {
            None => {
                warn!(
                    order_id = %event.order_id,
                    reference = %event.reference,
                    "Webhook does not match any order"
                );
                Err(AppError::WebhookMismatch)
            }
            Some(order) if order.status == target => {
                info!(order_id = %event.order_id, status = target.as_str(), "Duplicate webhook delivery");
                Ok(WebhookOutcome::Duplicate(target))
            }
            Some(order) => {
                warn!(
                    order_id = %event.order_id,
                    current = order.status.as_str(),
                    received = target.as_str(),
                    "Out-of-order webhook ignored"
                );
                Ok(WebhookOutcome::Stale { current: order.status, received: target })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_formation, insert_profile, setup_db};
    use crate::models::cart::CartItem;
    use crate::models::formation;
    use crate::models::order::PaymentMethod;
    use crate::models::profile::ProfileRole;

    async fn confirmed_order(db: &DatabaseConnection, reference: &str) -> (order::Model, formation::Model) {
        let customer = insert_profile(db, ProfileRole::Client).await;
        let rust = insert_formation(db, "Rust", 50000).await;
        let (order, _) = OrderService::create_order(db, &customer, "", PaymentMethod::Mvola, &[CartItem::from(&rust)])
            .await
            .unwrap();

        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Confirmed);
        active.payment_reference = Set(Some(reference.to_string()));
        (active.update(db).await.unwrap(), rust)
    }

    fn event(order: &order::Model, reference: &str, status: &str) -> WebhookEvent {
        WebhookEvent {
            order_id: order.id,
            reference: reference.to_string(),
            status: status.to_string(),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_gateway_status("success"), Some(OrderStatus::Completed));
        assert_eq!(map_gateway_status("completed"), Some(OrderStatus::Completed));
        assert_eq!(map_gateway_status("failed"), Some(OrderStatus::Failed));
        assert_eq!(map_gateway_status("error"), Some(OrderStatus::Failed));
        assert_eq!(map_gateway_status("processing"), None);
    }

    #[test]
    fn test_parse_requires_all_fields() {
        let missing = br#"{"reference":"MVOLA-123","status":"success"}"#;
        assert!(matches!(WebhookService::parse(missing), Err(AppError::Validation(_))));

        let blank = br#"{"reference":"","status":"success","order_id":"x"}"#;
        assert!(matches!(WebhookService::parse(blank), Err(AppError::Validation(_))));

        let id = Uuid::new_v4();
        let body = format!(r#"{{"reference":"MVOLA-123","status":"success","order_id":"{}"}}"#, id);
        let parsed = WebhookService::parse(body.as_bytes()).unwrap();
        assert_eq!(parsed.order_id, id);
        assert_eq!(parsed.reference, "MVOLA-123");
    }

    #[test]
    fn test_signature_required() {
        let body = b"{}";
        let good = signature::sign_hex("whsec", body).unwrap();

        assert!(WebhookService::verify_signature(Some("whsec"), body, Some(&good)).is_ok());
        assert!(WebhookService::verify_signature(Some("whsec"), body, Some("deadbeef")).is_err());
        assert!(WebhookService::verify_signature(Some("whsec"), body, None).is_err());
        assert!(WebhookService::verify_signature(None, body, Some(&good)).is_err());
    }

    #[tokio::test]
    async fn test_success_completes_order() {
        let db = setup_db().await;
        let (order, rust) = confirmed_order(&db, "MVOLA-123").await;

        let outcome = WebhookService::handle(&db, event(&order, "MVOLA-123", "success")).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Applied(OrderStatus::Completed));
        let stored = OrderService::find(&db, order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Completed);
        assert!(stored.paid_at.is_some());

        let sold = formation::Entity::find_by_id(rust.id).one(&db).await.unwrap().unwrap();
        assert_eq!(sold.sales_count, 1);
    }

    #[tokio::test]
    async fn test_replay_has_no_side_effects() {
        let db = setup_db().await;
        let (order, rust) = confirmed_order(&db, "MVOLA-123").await;

        WebhookService::handle(&db, event(&order, "MVOLA-123", "completed")).await.unwrap();
        let replay = WebhookService::handle(&db, event(&order, "MVOLA-123", "completed")).await.unwrap();

        assert_eq!(replay, WebhookOutcome::Duplicate(OrderStatus::Completed));
        let sold = formation::Entity::find_by_id(rust.id).one(&db).await.unwrap().unwrap();
        assert_eq!(sold.sales_count, 1);
    }

    #[tokio::test]
    async fn test_failed_after_completed_does_not_regress() {
        let db = setup_db().await;
        let (order, _) = confirmed_order(&db, "OM-77").await;

        WebhookService::handle(&db, event(&order, "OM-77", "success")).await.unwrap();
        let late = WebhookService::handle(&db, event(&order, "OM-77", "failed")).await.unwrap();

        assert_eq!(
            late,
            WebhookOutcome::Stale { current: OrderStatus::Completed, received: OrderStatus::Failed }
        );
        let stored = OrderService::find(&db, order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_wrong_reference_is_mismatch() {
        let db = setup_db().await;
        let (order, _) = confirmed_order(&db, "MVOLA-123").await;

        let result = WebhookService::handle(&db, event(&order, "MVOLA-999", "success")).await;

        assert!(matches!(result, Err(AppError::WebhookMismatch)));
        let stored = OrderService::find(&db, order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_unknown_status_ignored() {
        let db = setup_db().await;
        let (order, _) = confirmed_order(&db, "MVOLA-123").await;

        let outcome = WebhookService::handle(&db, event(&order, "MVOLA-123", "processing")).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Ignored("processing".to_string()));
        let stored = OrderService::find(&db, order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_failure_marks_order_failed() {
        let db = setup_db().await;
        let (order, _) = confirmed_order(&db, "MVOLA-123").await;

        let outcome = WebhookService::handle(&db, event(&order, "MVOLA-123", "error")).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Applied(OrderStatus::Failed));
        let stored = OrderService::find(&db, order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Failed);
        assert!(stored.paid_at.is_none());
    }
}
