use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, Utc};
use sea_orm::*;
use sea_orm::sea_query::Expr;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::cart::CartItem;
use crate::models::dto::StatsResponse;
use crate::models::formation::{self, FormationStatus};
use crate::models::order::{self, OrderStatus, PaymentMethod};
use crate::models::order_item;
use crate::models::profile::{self, ProfileRole};
use crate::services::cart_service::{CartStorage, DbCartStorage};

pub struct OrderService;

impl OrderService {
    /// Crée la commande (en-tête + une ligne par formation) en une seule
    /// transaction : une erreur sur les lignes annule aussi l'en-tête.
    pub async fn create_order(
        db: &DatabaseConnection,
        customer: &profile::Model,
        customer_email: &str,
        payment_method: PaymentMethod,
        cart_items: &[CartItem],
    ) -> Result<(order::Model, Vec<order_item::Model>), AppError> {
        let txn = db.begin().await?;
        let (order, items) = Self::insert_order(&txn, customer, customer_email, payment_method, cart_items).await?;
        txn.commit().await?;

        log_created(&order, items.len());
        Ok((order, items))
    }

    /// Panier enregistré -> commande pending. Le panier est vidé dans la
    /// même transaction : soit la commande existe et le panier est vide,
    /// soit rien n'a changé.
    pub async fn checkout(
        db: &DatabaseConnection,
        customer: &profile::Model,
        customer_email: &str,
        payment_method: PaymentMethod,
    ) -> Result<(order::Model, Vec<order_item::Model>), AppError> {
        let txn = db.begin().await?;
        let storage = DbCartStorage::new(&txn);

        let mut cart = storage.load(customer.id).await?;
        if cart.is_empty() {
            return Err(AppError::Validation("Cart is empty".to_string()));
        }

        let (order, items) = Self::insert_order(&txn, customer, customer_email, payment_method, cart.items()).await?;
        cart.clear();
        storage.save(customer.id, &cart).await?;
        txn.commit().await?;

        log_created(&order, items.len());
        Ok((order, items))
    }

    /// Écritures de la commande, sans commit.
    /// Les prix sont relus dans le catalogue, pas pris du panier.
    async fn insert_order<C>(
        txn: &C,
        customer: &profile::Model,
        customer_email: &str,
        payment_method: PaymentMethod,
        cart_items: &[CartItem],
    ) -> Result<(order::Model, Vec<order_item::Model>), AppError>
    where
        C: ConnectionTrait,
    {
        let mut seen = HashSet::new();
        let formation_ids: Vec<Uuid> = cart_items
            .iter()
            .map(|item| item.formation_id)
            .filter(|id| seen.insert(*id))
            .collect();

        if formation_ids.is_empty() {
            return Err(AppError::Validation("Cart is empty".to_string()));
        }

        let formations = formation::Entity::find()
            .filter(formation::Column::Id.is_in(formation_ids.clone()))
            .filter(formation::Column::Status.eq(FormationStatus::Active))
            .all(txn)
            .await?;

        // garder l'ordre du panier
        let mut snapshots = Vec::with_capacity(formation_ids.len());
        for id in &formation_ids {
            let formation = formations
                .iter()
                .find(|f| f.id == *id)
                .ok_or_else(|| AppError::NotFound(format!("Formation not available: {}", id)))?;
            snapshots.push(formation);
        }

        let total_price: i64 = snapshots.iter().map(|f| f.price).sum();
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let order = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(customer.id),
            order_number: Set(generate_order_number(order_id, now)),
            customer_name: Set(customer.name.clone()),
            customer_email: Set(customer_email.to_string()),
            customer_phone: Set(customer.phone.clone()),
            customer_address: Set(customer.address.clone()),
            total_price: Set(total_price),
            payment_method: Set(payment_method),
            status: Set(OrderStatus::Pending),
            payment_reference: Set(None),
            payment_started_at: Set(None),
            rejection_reason: Set(None),
            validated_by: Set(None),
            validated_at: Set(None),
            expires_at: Set(None),
            paid_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;

        let items: Vec<order_item::Model> = snapshots
            .iter()
            .map(|f| order_item::Model {
                id: Uuid::new_v4(),
                order_id,
                formation_id: f.id,
                title: f.title.clone(),
                price: f.price,
            })
            .collect();

        order_item::Entity::insert_many(items.iter().map(|item| order_item::ActiveModel {
            id: Set(item.id),
            order_id: Set(item.order_id),
            formation_id: Set(item.formation_id),
            title: Set(item.title.clone()),
            price: Set(item.price),
        }))
        .exec_without_returning(txn)
        .await?;

        Ok((order, items))
    }

    pub async fn list_for_user(db: &DatabaseConnection, user_id: Uuid) -> Result<Vec<order::Model>, AppError> {
        Ok(order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(db)
            .await?)
    }

    /// Commande + lignes, visible par son propriétaire ou un admin.
    /// Un autre utilisateur reçoit 404 (on ne révèle pas l'existence).
    pub async fn get_for_requester(
        db: &DatabaseConnection,
        requester: Uuid,
        order_id: Uuid,
    ) -> Result<(order::Model, Vec<order_item::Model>), AppError> {
        let order = Self::find(db, order_id).await?;

        if order.user_id != requester {
            let is_admin = profile::Entity::find_by_id(requester)
                .one(db)
                .await?
                .is_some_and(|p| p.role == ProfileRole::Admin);
            if !is_admin {
                return Err(order_not_found(order_id));
            }
        }

        let items = Self::items(db, order_id).await?;
        Ok((order, items))
    }

    pub async fn find<C>(db: &C, order_id: Uuid) -> Result<order::Model, AppError>
    where
        C: ConnectionTrait,
    {
        order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| order_not_found(order_id))
    }

    pub async fn items<C>(db: &C, order_id: Uuid) -> Result<Vec<order_item::Model>, AppError>
    where
        C: ConnectionTrait,
    {
        Ok(order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(db)
            .await?)
    }

    /// Rattache les lignes à chaque commande (une seule requête)
    pub async fn with_items(
        db: &DatabaseConnection,
        orders: Vec<order::Model>,
    ) -> Result<Vec<(order::Model, Vec<order_item::Model>)>, AppError> {
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.is_in(ids))
            .all(db)
            .await?;

        Ok(orders
            .into_iter()
            .map(|o| {
                let (own, rest): (Vec<_>, Vec<_>) = items.drain(..).partition(|item| item.order_id == o.id);
                items = rest;
                (o, own)
            })
            .collect())
    }

    /// Liste admin : None ou "all" = toutes, sinon filtre sur le statut
    pub async fn list_by_status(
        db: &DatabaseConnection,
        status_filter: Option<&str>,
    ) -> Result<Vec<order::Model>, AppError> {
        let mut query = order::Entity::find();

        match status_filter.map(str::trim) {
            None | Some("") | Some("all") => {}
            Some(raw) => {
                let status = OrderStatus::parse(raw)
                    .ok_or_else(|| AppError::Validation(format!("Unknown order status: {}", raw)))?;
                query = query.filter(order::Column::Status.eq(status));
            }
        }

        Ok(query.order_by_desc(order::Column::CreatedAt).all(db).await?)
    }

    /// pending -> validated (revue manuelle)
    pub async fn validate(
        db: &DatabaseConnection,
        admin_id: Uuid,
        order_id: Uuid,
        access_validity_days: Option<i64>,
    ) -> Result<order::Model, AppError> {
        let now = Utc::now();
        let expires_at = access_validity_days.map(|days| now + Duration::days(days));

        let txn = db.begin().await?;

        let result = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(OrderStatus::Validated))
            .col_expr(order::Column::ValidatedBy, Expr::value(admin_id))
            .col_expr(order::Column::ValidatedAt, Expr::value(now))
            .col_expr(order::Column::ExpiresAt, Expr::value(expires_at))
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.is_in(OrderStatus::Validated.allowed_sources().iter().copied()))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(Self::transition_refused(&txn, order_id, OrderStatus::Validated).await);
        }

        Self::increment_sales(&txn, order_id).await?;
        let order = Self::find(&txn, order_id).await?;
        txn.commit().await?;

        info!(order_id = %order_id, admin_id = %admin_id, "Order validated");
        Ok(order)
    }

    /// pending -> rejected, avec motif obligatoire
    pub async fn reject(
        db: &DatabaseConnection,
        admin_id: Uuid,
        order_id: Uuid,
        reason: &str,
    ) -> Result<order::Model, AppError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation("Rejection reason is required".to_string()));
        }

        let now = Utc::now();
        let result = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(OrderStatus::Rejected))
            .col_expr(order::Column::RejectionReason, Expr::value(reason))
            .col_expr(order::Column::ValidatedBy, Expr::value(admin_id))
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.is_in(OrderStatus::Rejected.allowed_sources().iter().copied()))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(Self::transition_refused(db, order_id, OrderStatus::Rejected).await);
        }

        info!(order_id = %order_id, admin_id = %admin_id, "Order rejected");
        Self::find(db, order_id).await
    }

    pub async fn stats(db: &DatabaseConnection) -> Result<StatsResponse, AppError> {
        let orders = order::Entity::find().all(db).await?;

        let mut orders_by_status = BTreeMap::new();
        let mut revenue = 0i64;
        for o in &orders {
            *orders_by_status.entry(o.status.as_str().to_string()).or_insert(0u64) += 1;
            if o.status.grants_access() {
                revenue += o.total_price;
            }
        }

        Ok(StatsResponse {
            orders_by_status,
            total_orders: orders.len() as u64,
            revenue,
        })
    }

    /// +1 vente pour chaque formation de la commande. Appelé uniquement
    /// après une transition réussie, donc une seule fois par commande.
    pub async fn increment_sales<C>(db: &C, order_id: Uuid) -> Result<(), AppError>
    where
        C: ConnectionTrait,
    {
        let formation_ids: Vec<Uuid> = Self::items(db, order_id)
            .await?
            .into_iter()
            .map(|item| item.formation_id)
            .collect();

        formation::Entity::update_many()
            .col_expr(
                formation::Column::SalesCount,
                Expr::col(formation::Column::SalesCount).add(1),
            )
            .filter(formation::Column::Id.is_in(formation_ids))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Explique pourquoi un UPDATE conditionnel n'a touché aucune ligne
    pub async fn transition_refused<C>(db: &C, order_id: Uuid, target: OrderStatus) -> AppError
    where
        C: ConnectionTrait,
    {
        match Self::find(db, order_id).await {
            Ok(current) => {
                warn!(
                    order_id = %order_id,
                    current = current.status.as_str(),
                    target = target.as_str(),
                    "Order transition refused"
                );
                if current.status.is_terminal() {
                    AppError::Conflict(format!("Order is already {}", current.status.as_str()))
                } else {
                    AppError::Conflict(format!(
                        "Order is {} and cannot become {}",
                        current.status.as_str(),
                        target.as_str()
                    ))
                }
            }
            Err(e) => e,
        }
    }
}

fn log_created(order: &order::Model, item_count: usize) {
    info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total = order.total_price,
        items = item_count,
        "Order created"
    );
}

fn order_not_found(order_id: Uuid) -> AppError {
    AppError::NotFound(format!("Order not found: {}", order_id))
}

/// CMD-YYYYMMDD-XXXXXXXX (8 premiers caractères hexadécimaux de l'id)
fn generate_order_number(order_id: Uuid, now: chrono::DateTime<Utc>) -> String {
    let simple = order_id.simple().to_string().to_uppercase();
    format!("CMD-{}-{}", now.format("%Y%m%d"), &simple[..8])
}
