use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use sea_orm::*;
use sea_orm::sea_query::Expr;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::{self, OrderStatus};
use crate::models::profile;
use crate::services::gateways::{GatewayError, PaymentGateways, PaymentRequest};
use crate::services::order_service::OrderService;

/// Paramètres d'une initiation de paiement côté client
pub struct PaymentInput {
    pub user_id: Uuid,
    pub order_id: Uuid,
    pub phone: Option<String>,
    pub amount: Option<i64>,
}

pub struct PaymentService;

impl PaymentService {
    /// Appelle l'opérateur de la commande puis passe pending -> confirmed
    /// en enregistrant la référence. En cas d'échec de l'opérateur la
    /// commande reste pending et le client peut réessayer.
    pub async fn initiate_payment(
        db: &DatabaseConnection,
        gateways: &PaymentGateways,
        timeout: Duration,
        callback_url: Option<String>,
        input: PaymentInput,
    ) -> Result<order::Model, AppError> {
        let order = OrderService::find(db, input.order_id).await?;
        if order.user_id != input.user_id {
            return Err(AppError::NotFound(format!("Order not found: {}", input.order_id)));
        }
        if order.status != OrderStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Order is {}, payment can only be initiated on a pending order",
                order.status.as_str()
            )));
        }
        if let Some(amount) = input.amount {
            if amount != order.total_price {
                return Err(AppError::Validation(format!(
                    "Amount {} does not match order total {}",
                    amount, order.total_price
                )));
            }
        }

        let phone = match input.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()) {
            Some(phone) => phone,
            None => profile::Entity::find_by_id(order.user_id)
                .one(db)
                .await?
                .map(|p| p.phone)
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| AppError::Validation("A phone number is required".to_string()))?,
        };

        let request = PaymentRequest {
            order_id: order.id,
            amount: order.total_price,
            phone,
            callback_url,
        };

        // Réserver la commande avant l'appel : une seule initiation à la fois.
        // Une réservation plus vieille que deux timeouts est considérée abandonnée.
        let claimed_at = Utc::now().trunc_subsecs(6);
        let abandoned_before = claimed_at - chrono::Duration::from_std(timeout * 2).unwrap_or_else(|_| chrono::Duration::minutes(1));

        let claim = order::Entity::update_many()
            .col_expr(order::Column::PaymentStartedAt, Expr::value(Some(claimed_at)))
            .filter(order::Column::Id.eq(order.id))
            .filter(order::Column::Status.eq(OrderStatus::Pending))
            .filter(
                Condition::any()
                    .add(order::Column::PaymentStartedAt.is_null())
                    .add(order::Column::PaymentStartedAt.lt(abandoned_before)),
            )
            .exec(db)
            .await?;

        if claim.rows_affected == 0 {
            warn!(order_id = %order.id, "Payment initiation already in progress");
            return Err(AppError::Conflict(
                "A payment is already being initiated for this order".to_string(),
            ));
        }

        let gateway = gateways.for_method(order.payment_method);
        let outcome = match tokio::time::timeout(timeout, gateway.initiate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(timeout.as_secs())),
        };

        let initiation = match outcome {
            Ok(initiation) if !matches!(initiation.status.as_str(), "failed" | "error") => initiation,
            Ok(initiation) => {
                Self::release_claim(db, order.id, claimed_at).await;
                return Err(AppError::UpstreamFailure(format!(
                    "payment refused by provider (reference {})",
                    initiation.reference
                )));
            }
            Err(e) => {
                error!(order_id = %order.id, error = %e, "Payment initiation failed");
                Self::release_claim(db, order.id, claimed_at).await;
                return Err(AppError::UpstreamFailure(e.to_string()));
            }
        };

        let result = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(OrderStatus::Confirmed))
            .col_expr(order::Column::PaymentReference, Expr::value(initiation.reference.clone()))
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(order::Column::Id.eq(order.id))
            .filter(order::Column::Status.is_in(OrderStatus::Confirmed.allowed_sources().iter().copied()))
            .filter(order::Column::PaymentStartedAt.eq(claimed_at))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(OrderService::transition_refused(db, order.id, OrderStatus::Confirmed).await);
        }

        info!(
            order_id = %order.id,
            reference = %initiation.reference,
            method = ?order.payment_method,
            "Payment initiated"
        );
        OrderService::find(db, order.id).await
    }

    /// Libère la réservation après un échec, la commande reste payable
    async fn release_claim(db: &DatabaseConnection, order_id: Uuid, claimed_at: DateTime<Utc>) {
        let released = order::Entity::update_many()
            .col_expr(order::Column::PaymentStartedAt, Expr::value(Option::<DateTime<Utc>>::None))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.eq(OrderStatus::Pending))
            .filter(order::Column::PaymentStartedAt.eq(claimed_at))
            .exec(db)
            .await;

        if let Err(e) = released {
            error!(order_id = %order_id, error = %e, "Failed to release payment claim");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::db::test_support::{insert_formation, insert_profile, setup_db};
    use crate::models::cart::CartItem;
    use crate::models::order::PaymentMethod;
    use crate::models::profile::ProfileRole;
    use crate::services::gateways::simulated::SimulatedGateway;
    use crate::services::gateways::{PaymentGateway, PaymentInitiation};

    struct DownGateway;

    #[async_trait]
    impl PaymentGateway for DownGateway {
        fn method(&self) -> PaymentMethod {
            PaymentMethod::Mvola
        }

        async fn initiate(&self, _request: &PaymentRequest) -> Result<PaymentInitiation, GatewayError> {
            Err(GatewayError::Transport("connection refused".to_string()))
        }
    }

    struct SlowGateway;

    #[async_trait]
    impl PaymentGateway for SlowGateway {
        fn method(&self) -> PaymentMethod {
            PaymentMethod::Mvola
        }

        async fn initiate(&self, _request: &PaymentRequest) -> Result<PaymentInitiation, GatewayError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(PaymentInitiation {
                reference: "MVOLA-LATE".to_string(),
                status: "pending".to_string(),
            })
        }
    }

    /// Compte les appels et répond après un court délai
    #[derive(Clone, Default)]
    struct CountingGateway {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PaymentGateway for CountingGateway {
        fn method(&self) -> PaymentMethod {
            PaymentMethod::Mvola
        }

        async fn initiate(&self, _request: &PaymentRequest) -> Result<PaymentInitiation, GatewayError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(PaymentInitiation {
                reference: format!("MVOLA-{}", call),
                status: "pending".to_string(),
            })
        }
    }

    fn simulated() -> PaymentGateways {
        PaymentGateways::new(
            Box::new(SimulatedGateway::new(PaymentMethod::Mvola)),
            Box::new(SimulatedGateway::new(PaymentMethod::OrangeMoney)),
        )
    }

    async fn pending_order(db: &DatabaseConnection) -> order::Model {
        let customer = insert_profile(db, ProfileRole::Client).await;
        let rust = insert_formation(db, "Rust", 50000).await;
        let (order, _) = OrderService::create_order(db, &customer, "", PaymentMethod::Mvola, &[CartItem::from(&rust)])
            .await
            .unwrap();
        order
    }

    fn input(order: &order::Model) -> PaymentInput {
        PaymentInput {
            user_id: order.user_id,
            order_id: order.id,
            phone: None,
            amount: Some(order.total_price),
        }
    }

    #[tokio::test]
    async fn test_initiation_confirms_order() {
        let db = setup_db().await;
        let order = pending_order(&db).await;

        let confirmed = PaymentService::initiate_payment(&db, &simulated(), Duration::from_secs(5), None, input(&order))
            .await
            .unwrap();

        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        assert!(confirmed.payment_reference.unwrap().starts_with("MVOLA-"));
    }

    #[tokio::test]
    async fn test_second_initiation_conflicts() {
        let db = setup_db().await;
        let order = pending_order(&db).await;
        let gateways = simulated();

        PaymentService::initiate_payment(&db, &gateways, Duration::from_secs(5), None, input(&order))
            .await
            .unwrap();
        let again = PaymentService::initiate_payment(&db, &gateways, Duration::from_secs(5), None, input(&order)).await;

        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_amount_mismatch_rejected() {
        let db = setup_db().await;
        let order = pending_order(&db).await;
        let mut wrong = input(&order);
        wrong.amount = Some(1000);

        let result = PaymentService::initiate_payment(&db, &simulated(), Duration::from_secs(5), None, wrong).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_gateway_failure_keeps_order_pending() {
        let db = setup_db().await;
        let order = pending_order(&db).await;
        let gateways = PaymentGateways::new(Box::new(DownGateway), Box::new(DownGateway));

        let result = PaymentService::initiate_payment(&db, &gateways, Duration::from_secs(5), None, input(&order)).await;

        assert!(matches!(result, Err(AppError::UpstreamFailure(_))));
        let stored = OrderService::find(&db, order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert!(stored.payment_reference.is_none());
        assert!(stored.payment_started_at.is_none());

        // la réservation est libérée, le client peut réessayer
        let retried = PaymentService::initiate_payment(&db, &simulated(), Duration::from_secs(5), None, input(&order))
            .await
            .unwrap();
        assert_eq!(retried.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_concurrent_initiations_call_gateway_once() {
        let db = setup_db().await;
        let order = pending_order(&db).await;
        let counting = CountingGateway::default();
        let gateways = PaymentGateways::new(Box::new(counting.clone()), Box::new(counting.clone()));

        let (first, second) = tokio::join!(
            PaymentService::initiate_payment(&db, &gateways, Duration::from_secs(5), None, input(&order)),
            PaymentService::initiate_payment(&db, &gateways, Duration::from_secs(5), None, input(&order)),
        );

        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results.iter().filter(|r| matches!(r, Err(AppError::Conflict(_)))).count(),
            1
        );

        let stored = OrderService::find(&db, order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
        assert_eq!(stored.payment_reference.as_deref(), Some("MVOLA-1"));
    }

    #[tokio::test]
    async fn test_gateway_timeout_is_upstream_failure() {
        let db = setup_db().await;
        let order = pending_order(&db).await;
        let gateways = PaymentGateways::new(Box::new(SlowGateway), Box::new(SlowGateway));

        let result =
            PaymentService::initiate_payment(&db, &gateways, Duration::from_millis(50), None, input(&order)).await;

        assert!(matches!(result, Err(AppError::UpstreamFailure(_))));
        let stored = OrderService::find(&db, order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert!(stored.payment_started_at.is_none());
    }

    #[tokio::test]
    async fn test_other_user_cannot_pay() {
        let db = setup_db().await;
        let order = pending_order(&db).await;
        let mut foreign = input(&order);
        foreign.user_id = Uuid::new_v4();

        let result = PaymentService::initiate_payment(&db, &simulated(), Duration::from_secs(5), None, foreign).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
