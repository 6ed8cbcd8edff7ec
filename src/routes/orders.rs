use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{CheckoutRequest, InitiatePaymentRequest, OrderResponse, PaymentResponse};
use crate::services::gateways::PaymentGateways;
use crate::services::order_service::OrderService;
use crate::services::payment_service::{PaymentInput, PaymentService};
use crate::services::profile_service::ProfileService;

/// POST /api/checkout - Transforme le panier en commande pending
#[post("/checkout")]
pub async fn checkout(
    auth_user: AuthUser,
    body: web::Json<CheckoutRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    // Le profil fournit les coordonnées du client
    let profile = ProfileService::get_profile(db.get_ref(), auth_user.user_id).await?;

    // Commande + lignes + panier vidé, en une transaction
    let (order, items) = OrderService::checkout(
        db.get_ref(),
        &profile,
        auth_user.email.as_deref().unwrap_or_default(),
        body.payment_method,
    )
    .await?;

    Ok(HttpResponse::Created().json(OrderResponse::new(order, items)))
}

/// GET /api/orders - Mes commandes, plus récentes d'abord
#[get("")]
pub async fn list_orders(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let orders = OrderService::list_for_user(db.get_ref(), auth_user.user_id).await?;
    let response: Vec<OrderResponse> = OrderService::with_items(db.get_ref(), orders)
        .await?
        .into_iter()
        .map(|(order, items)| OrderResponse::new(order, items))
        .collect();
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/orders/{id} - Propriétaire ou admin
#[get("/{id}")]
pub async fn get_order(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let (order, items) = OrderService::get_for_requester(db.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::new(order, items)))
}

/// POST /api/orders/{id}/payment - Déclenche le paiement mobile
#[post("/{id}/payment")]
pub async fn initiate_payment(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<InitiatePaymentRequest>,
    db: web::Data<DatabaseConnection>,
    gateways: web::Data<PaymentGateways>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let body = body.into_inner();

    let order = PaymentService::initiate_payment(
        db.get_ref(),
        gateways.get_ref(),
        config.gateway_timeout,
        config.payment_callback_url.clone(),
        PaymentInput {
            user_id: auth_user.user_id,
            order_id: path.into_inner(),
            phone: body.phone,
            amount: body.amount,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(PaymentResponse {
        success: true,
        order_id: order.id,
        reference: order.payment_reference.unwrap_or_default(),
        status: order.status,
        message: "Payment initiated, confirm it on your phone".to_string(),
    }))
}

pub fn order_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(checkout).service(
        web::scope("/orders")
            .service(list_orders)
            .service(get_order)
            .service(initiate_payment)
    );
}
