use actix_web::{get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{CreateProfileRequest, UpdateProfileRequest};
use crate::services::profile_service::ProfileService;

/// POST /api/profile - Créer son profil (rôle client)
#[post("")]
pub async fn create_profile(
    auth_user: AuthUser,
    body: web::Json<CreateProfileRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let profile = ProfileService::create_profile(db.get_ref(), auth_user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(profile))
}

/// GET /api/profile/me
#[get("/me")]
pub async fn get_me(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let profile = ProfileService::get_profile(db.get_ref(), auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// PUT /api/profile/me - nom, téléphone, adresse
#[put("/me")]
pub async fn update_me(
    auth_user: AuthUser,
    body: web::Json<UpdateProfileRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let profile = ProfileService::update_profile(db.get_ref(), auth_user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// POST /api/profile/me/login - Horodate la dernière connexion
#[post("/me/login")]
pub async fn record_login(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let profile = ProfileService::record_login(db.get_ref(), auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub fn profile_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/profile")
            .service(create_profile)
            .service(get_me)
            .service(update_me)
            .service(record_login)
    );
}
