use chrono::Utc;
use sea_orm::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::dto::{CreateProfileRequest, UpdateProfileRequest};
use crate::models::profile::{self, ProfileRole};

pub struct ProfileService;

impl ProfileService {
    /// Crée le profil de l'utilisateur (toujours avec le rôle client)
    pub async fn create_profile(
        db: &DatabaseConnection,
        user_id: Uuid,
        request: CreateProfileRequest,
    ) -> Result<profile::Model, AppError> {
        if profile::Entity::find_by_id(user_id).one(db).await?.is_some() {
            return Err(AppError::Conflict("Profile already exists".to_string()));
        }

        let now = Utc::now();
        let profile = profile::ActiveModel {
            id: Set(user_id),
            name: Set(request.name.trim().to_string()),
            phone: Set(request.phone.trim().to_string()),
            address: Set(request.address.trim().to_string()),
            role: Set(ProfileRole::Client),
            created_at: Set(now),
            last_login: Set(Some(now)),
        }
        .insert(db)
        .await?;

        info!(user_id = %user_id, "Profile created");
        Ok(profile)
    }

    pub async fn get_profile(db: &DatabaseConnection, user_id: Uuid) -> Result<profile::Model, AppError> {
        profile::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }

    pub async fn update_profile(
        db: &DatabaseConnection,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<profile::Model, AppError> {
        let current = Self::get_profile(db, user_id).await?;
        let mut active: profile::ActiveModel = current.into();

        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(phone) = request.phone {
            active.phone = Set(phone.trim().to_string());
        }
        if let Some(address) = request.address {
            active.address = Set(address.trim().to_string());
        }

        Ok(active.update(db).await?)
    }

    pub async fn record_login(db: &DatabaseConnection, user_id: Uuid) -> Result<profile::Model, AppError> {
        let current = Self::get_profile(db, user_id).await?;
        let mut active: profile::ActiveModel = current.into();
        active.last_login = Set(Some(Utc::now()));
        Ok(active.update(db).await?)
    }

    /// Vérification côté serveur, relue en base à chaque opération admin
    pub async fn require_admin<C>(db: &C, user_id: Uuid) -> Result<profile::Model, AppError>
    where
        C: ConnectionTrait,
    {
        let profile = profile::Entity::find_by_id(user_id).one(db).await?;

        match profile {
            Some(p) if p.role == ProfileRole::Admin => Ok(p),
            _ => {
                warn!(user_id = %user_id, "Admin operation refused");
                Err(AppError::Forbidden("Admin role required".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_profile, setup_db};

    #[tokio::test]
    async fn test_create_profile_defaults_to_client() {
        let db = setup_db().await;
        let user_id = Uuid::new_v4();

        let profile = ProfileService::create_profile(
            &db,
            user_id,
            CreateProfileRequest {
                name: " Rasoa ".to_string(),
                phone: "0321234567".to_string(),
                address: String::new(),
            },
        )
        .await
        .unwrap();

        assert_eq!(profile.id, user_id);
        assert_eq!(profile.name, "Rasoa");
        assert_eq!(profile.role, ProfileRole::Client);
    }

    #[tokio::test]
    async fn test_duplicate_profile_conflicts() {
        let db = setup_db().await;
        let existing = insert_profile(&db, ProfileRole::Client).await;

        let result = ProfileService::create_profile(
            &db,
            existing.id,
            CreateProfileRequest {
                name: "Autre".to_string(),
                phone: "0321234567".to_string(),
                address: String::new(),
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_only_given_fields() {
        let db = setup_db().await;
        let existing = insert_profile(&db, ProfileRole::Client).await;

        let updated = ProfileService::update_profile(
            &db,
            existing.id,
            UpdateProfileRequest {
                name: None,
                phone: Some("0331112233".to_string()),
                address: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.phone, "0331112233");
        assert_eq!(updated.name, existing.name);
        assert_eq!(updated.role, ProfileRole::Client);
    }

    #[tokio::test]
    async fn test_require_admin() {
        let db = setup_db().await;
        let admin = insert_profile(&db, ProfileRole::Admin).await;
        let client = insert_profile(&db, ProfileRole::Client).await;

        assert!(ProfileService::require_admin(&db, admin.id).await.is_ok());
        assert!(matches!(
            ProfileService::require_admin(&db, client.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            ProfileService::require_admin(&db, Uuid::new_v4()).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
