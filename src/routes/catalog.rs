use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::dto::CatalogQuery;
use crate::services::catalog_service::CatalogService;

/// GET /api/formations?category= - Catalogue public (formations actives)
#[get("")]
pub async fn list_formations(
    query: web::Query<CatalogQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let formations = CatalogService::list_active(db.get_ref(), query.category.as_deref()).await?;
    Ok(HttpResponse::Ok().json(formations))
}

/// GET /api/formations/{id}
#[get("/{id}")]
pub async fn get_formation(
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let formation = CatalogService::get_active(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(formation))
}

pub fn catalog_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/formations")
            .service(list_formations)
            .service(get_formation)
    );
}
