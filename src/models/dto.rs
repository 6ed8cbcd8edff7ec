// pour les requêtes/réponses structurées de l'API
use serde::{Deserialize, Serialize};
use sea_orm::prelude::{DateTimeUtc, Uuid};
use std::collections::BTreeMap;
use validator::Validate;

use crate::models::cart::CartItem;
use crate::models::formation::{FormationLevel, FormationStatus};
use crate::models::order::{self, OrderStatus, PaymentMethod};
use crate::models::order_item;

// ---------------------------------------------------------------- profils

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProfileRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 6, max = 20))]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 6, max = 20))]
    pub phone: Option<String>,
    pub address: Option<String>,
}

// ---------------------------------------------------------------- catalogue

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FormationRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_long: String,
    #[validate(range(min = 1))]
    pub price: i64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub duration: String,
    pub level: FormationLevel,
    pub content_path: Option<String>,
    #[serde(default)]
    pub syllabus: Vec<String>,
    #[serde(default = "default_formation_status")]
    pub status: FormationStatus,
}

fn default_formation_status() -> FormationStatus {
    FormationStatus::Active
}

// ---------------------------------------------------------------- panier

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub formation_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub total: i64,
    pub item_count: usize,
}

// ---------------------------------------------------------------- commandes

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InitiatePaymentRequest {
    #[validate(length(min = 6, max = 20))]
    pub phone: Option<String>,
    #[validate(range(min = 1))]
    pub amount: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub success: bool,
    pub order_id: Uuid,
    pub reference: String,
    pub status: OrderStatus,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub formation_id: Uuid,
    pub title: String,
    pub price: i64,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(item: order_item::Model) -> Self {
        Self {
            formation_id: item.formation_id,
            title: item.title,
            price: item.price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub total_price: i64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub payment_reference: Option<String>,
    pub rejection_reason: Option<String>,
    pub validated_by: Option<Uuid>,
    pub validated_at: Option<DateTimeUtc>,
    pub expires_at: Option<DateTimeUtc>,
    pub paid_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    pub fn new(order: order::Model, items: Vec<order_item::Model>) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            user_id: order.user_id,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            customer_address: order.customer_address,
            total_price: order.total_price,
            payment_method: order.payment_method,
            status: order.status,
            payment_reference: order.payment_reference,
            rejection_reason: order.rejection_reason,
            validated_by: order.validated_by,
            validated_at: order.validated_at,
            expires_at: order.expires_at,
            paid_at: order.paid_at,
            created_at: order.created_at,
            items: items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

// ---------------------------------------------------------------- webhook

/// Corps envoyé par la passerelle. Tous les champs sont optionnels ici
/// pour pouvoir répondre 400 (et non une erreur de désérialisation)
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub reference: Option<String>,
    pub status: Option<String>,
    pub order_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
}

// ---------------------------------------------------------------- téléchargements

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub formation_id: Uuid,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub url: String,
    pub expires_in: i64,
}

// ---------------------------------------------------------------- admin

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    /// "pending", "all" (défaut) ou n'importe quel statut
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RejectOrderRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub orders_by_status: BTreeMap<String, u64>,
    pub total_orders: u64,
    pub revenue: i64,
}

// ---------------------------------------------------------------- santé

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub time: DateTimeUtc,
}
