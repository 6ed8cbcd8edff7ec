use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{FormationRequest, OrderListQuery, OrderResponse, RejectOrderRequest};
use crate::services::catalog_service::CatalogService;
use crate::services::order_service::OrderService;
use crate::services::profile_service::ProfileService;

// Chaque handler relit le rôle en base : le token ne porte pas le rôle

/// GET /api/admin/orders?status=pending|all|<statut>
#[get("/orders")]
pub async fn list_orders(
    auth_user: AuthUser,
    query: web::Query<OrderListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    ProfileService::require_admin(db.get_ref(), auth_user.user_id).await?;

    let orders = OrderService::list_by_status(db.get_ref(), query.status.as_deref()).await?;
    let response: Vec<OrderResponse> = OrderService::with_items(db.get_ref(), orders)
        .await?
        .into_iter()
        .map(|(order, items)| OrderResponse::new(order, items))
        .collect();
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/admin/orders/{id}/validate
#[post("/orders/{id}/validate")]
pub async fn validate_order(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let admin = ProfileService::require_admin(db.get_ref(), auth_user.user_id).await?;
    let order_id = path.into_inner();

    let order = OrderService::validate(db.get_ref(), admin.id, order_id, config.access_validity_days).await?;
    let items = OrderService::items(db.get_ref(), order_id).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::new(order, items)))
}

/// POST /api/admin/orders/{id}/reject {reason}
#[post("/orders/{id}/reject")]
pub async fn reject_order(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<RejectOrderRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let admin = ProfileService::require_admin(db.get_ref(), auth_user.user_id).await?;
    body.validate()?;
    let order_id = path.into_inner();

    let order = OrderService::reject(db.get_ref(), admin.id, order_id, &body.reason).await?;
    let items = OrderService::items(db.get_ref(), order_id).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::new(order, items)))
}

/// GET /api/admin/stats - Commandes par statut + chiffre d'affaires
#[get("/stats")]
pub async fn stats(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    ProfileService::require_admin(db.get_ref(), auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(OrderService::stats(db.get_ref()).await?))
}

/// GET /api/admin/formations - Toutes les formations, inactives comprises
#[get("/formations")]
pub async fn list_formations(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    ProfileService::require_admin(db.get_ref(), auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(CatalogService::list_all(db.get_ref()).await?))
}

#[post("/formations")]
pub async fn create_formation(
    auth_user: AuthUser,
    body: web::Json<FormationRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    ProfileService::require_admin(db.get_ref(), auth_user.user_id).await?;
    body.validate()?;
    let formation = CatalogService::create(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(formation))
}

#[put("/formations/{id}")]
pub async fn update_formation(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<FormationRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    ProfileService::require_admin(db.get_ref(), auth_user.user_id).await?;
    body.validate()?;
    let formation = CatalogService::update(db.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(formation))
}

#[delete("/formations/{id}")]
pub async fn delete_formation(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    ProfileService::require_admin(db.get_ref(), auth_user.user_id).await?;
    CatalogService::delete(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(list_orders)
            .service(validate_order)
            .service(reject_order)
            .service(stats)
            .service(list_formations)
            .service(create_formation)
            .service(update_formation)
            .service(delete_formation)
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};

    use crate::db::test_support::{insert_formation, insert_profile, setup_db};
    use crate::models::cart::CartItem;
    use crate::models::order::PaymentMethod;
    use crate::models::profile::ProfileRole;
    use crate::routes::test_support::{bearer, test_app};
    use crate::services::order_service::OrderService;

    #[actix_web::test]
    async fn test_client_cannot_use_admin_routes() {
        let db = setup_db().await;
        let client = insert_profile(&db, ProfileRole::Client).await;
        let app = test_app!(db);

        for uri in ["/api/admin/stats", "/api/admin/orders", "/api/admin/formations"] {
            let req = test::TestRequest::get()
                .uri(uri)
                .insert_header(bearer(client.id))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN, "{}", uri);
        }
    }

    #[actix_web::test]
    async fn test_review_flow() {
        let db = setup_db().await;
        let admin = insert_profile(&db, ProfileRole::Admin).await;
        let customer = insert_profile(&db, ProfileRole::Client).await;
        let rust = insert_formation(&db, "Rust", 50000).await;
        let go = insert_formation(&db, "Go", 30000).await;

        let (first, _) = OrderService::create_order(&db, &customer, "", PaymentMethod::Mvola, &[CartItem::from(&rust)])
            .await
            .unwrap();
        let (second, _) = OrderService::create_order(&db, &customer, "", PaymentMethod::OrangeMoney, &[CartItem::from(&go)])
            .await
            .unwrap();
        let app = test_app!(db);

        let req = test::TestRequest::get()
            .uri("/api/admin/orders?status=pending")
            .insert_header(bearer(admin.id))
            .to_request();
        let pending: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(pending.as_array().unwrap().len(), 2);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/orders/{}/validate", first.id))
            .insert_header(bearer(admin.id))
            .to_request();
        let validated: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(validated["status"], "validated");
        assert_eq!(validated["validated_by"], admin.id.to_string());

        // une commande validée ne peut plus être rejetée
        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/orders/{}/reject", first.id))
            .insert_header(bearer(admin.id))
            .set_json(serde_json::json!({"reason": "Paiement introuvable"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/orders/{}/reject", second.id))
            .insert_header(bearer(admin.id))
            .set_json(serde_json::json!({"reason": ""}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/orders/{}/reject", second.id))
            .insert_header(bearer(admin.id))
            .set_json(serde_json::json!({"reason": "Paiement introuvable"}))
            .to_request();
        let rejected: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(rejected["status"], "rejected");
        assert_eq!(rejected["rejection_reason"], "Paiement introuvable");

        let req = test::TestRequest::get()
            .uri("/api/admin/stats")
            .insert_header(bearer(admin.id))
            .to_request();
        let stats: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats["total_orders"], 2);
        assert_eq!(stats["revenue"], 50000);
        assert_eq!(stats["orders_by_status"]["validated"], 1);
        assert_eq!(stats["orders_by_status"]["rejected"], 1);
    }

    #[actix_web::test]
    async fn test_formation_crud() {
        let db = setup_db().await;
        let admin = insert_profile(&db, ProfileRole::Admin).await;
        let app = test_app!(db);

        let payload = serde_json::json!({
            "title": "Docker",
            "category": "DevOps",
            "price": 45000,
            "level": "intermediate",
            "content_path": "formations/docker.zip",
            "syllabus": ["Images", "Compose"],
        });
        let req = test::TestRequest::post()
            .uri("/api/admin/formations")
            .insert_header(bearer(admin.id))
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(created["status"], "active");
        let id = created["id"].as_str().unwrap().to_string();

        let mut invalid = payload.clone();
        invalid["price"] = serde_json::json!(0);
        let req = test::TestRequest::put()
            .uri(&format!("/api/admin/formations/{}", id))
            .insert_header(bearer(admin.id))
            .set_json(&invalid)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/formations/{}", id))
            .insert_header(bearer(admin.id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri(&format!("/api/formations/{}", id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
