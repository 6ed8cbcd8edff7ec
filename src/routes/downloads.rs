use actix_web::{post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{DownloadRequest, DownloadResponse};
use crate::services::content_store::SignedUrlIssuer;
use crate::services::download_service::DownloadService;

/// POST /api/downloads - Lien temporaire vers une formation achetée
#[post("")]
pub async fn request_download(
    auth_user: AuthUser,
    body: web::Json<DownloadRequest>,
    db: web::Data<DatabaseConnection>,
    store: web::Data<SignedUrlIssuer>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    // user_id est accepté pour compatibilité mais doit être celui du token
    if let Some(user_id) = body.user_id {
        if user_id != auth_user.user_id {
            warn!(caller = %auth_user.user_id, requested = %user_id, "Download requested for another user");
            return Err(AppError::Forbidden("Cannot download for another user".to_string()));
        }
    }

    let signed = DownloadService::issue_link(
        db.get_ref(),
        store.get_ref(),
        config.max_downloads,
        auth_user.user_id,
        body.formation_id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(DownloadResponse {
        url: signed.url,
        expires_in: signed.expires_in,
    }))
}

pub fn download_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/downloads")
            .service(request_download)
    );
}
