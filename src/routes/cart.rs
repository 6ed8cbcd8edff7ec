use actix_web::{delete, get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{AddCartItemRequest, CartResponse};
use crate::services::cart_service::{Cart, CartService, CartStorage, DbCartStorage};

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        Self {
            total: cart.total(),
            item_count: cart.len(),
            items: cart.into_items(),
        }
    }
}

/// GET /api/cart
#[get("")]
pub async fn get_cart(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let cart = DbCartStorage::new(db.get_ref()).load(auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// POST /api/cart/items - Ajouter une formation (sans effet si déjà présente)
#[post("/items")]
pub async fn add_item(
    auth_user: AuthUser,
    body: web::Json<AddCartItemRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let storage = DbCartStorage::new(db.get_ref());
    let cart = CartService::add_formation(&storage, db.get_ref(), auth_user.user_id, body.formation_id).await?;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// DELETE /api/cart/items/{formation_id}
#[delete("/items/{formation_id}")]
pub async fn remove_item(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let storage = DbCartStorage::new(db.get_ref());
    let cart = CartService::remove_formation(&storage, auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// DELETE /api/cart - Vider le panier
#[delete("")]
pub async fn clear_cart(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let storage = DbCartStorage::new(db.get_ref());
    CartService::clear(&storage, auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(CartResponse::from(Cart::default())))
}

pub fn cart_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cart")
            .service(get_cart)
            .service(add_item)
            .service(remove_item)
            .service(clear_cart)
    );
}
