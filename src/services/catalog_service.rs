use chrono::Utc;
use sea_orm::*;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::dto::FormationRequest;
use crate::models::formation::{self, FormationStatus, Syllabus};

pub struct CatalogService;

impl CatalogService {
    /// Formations visibles par les clients (actives uniquement)
    pub async fn list_active(
        db: &DatabaseConnection,
        category: Option<&str>,
    ) -> Result<Vec<formation::Model>, AppError> {
        let mut query = formation::Entity::find()
            .filter(formation::Column::Status.eq(FormationStatus::Active));

        if let Some(category) = category.filter(|c| !c.is_empty()) {
            query = query.filter(formation::Column::Category.eq(category));
        }

        Ok(query
            .order_by_desc(formation::Column::CreatedAt)
            .all(db)
            .await?)
    }

    pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<formation::Model>, AppError> {
        Ok(formation::Entity::find()
            .order_by_desc(formation::Column::CreatedAt)
            .all(db)
            .await?)
    }

    pub async fn get_active<C>(db: &C, id: Uuid) -> Result<formation::Model, AppError>
    where
        C: ConnectionTrait,
    {
        formation::Entity::find_by_id(id)
            .filter(formation::Column::Status.eq(FormationStatus::Active))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Formation not found: {}", id)))
    }

    pub async fn create(
        db: &DatabaseConnection,
        request: FormationRequest,
    ) -> Result<formation::Model, AppError> {
        let now = Utc::now();
        let model = formation::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(request.title.trim().to_string()),
            category: Set(request.category.trim().to_string()),
            description: Set(request.description),
            description_long: Set(request.description_long),
            price: Set(request.price),
            image_url: Set(request.image_url),
            duration: Set(request.duration),
            level: Set(request.level),
            content_path: Set(normalize_path(request.content_path)),
            syllabus: Set(Syllabus(clean_syllabus(request.syllabus))),
            status: Set(request.status),
            sales_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(formation_id = %model.id, title = %model.title, "Formation created");
        Ok(model)
    }

    /// Remplace le contenu éditable, sales_count et created_at restent intacts
    pub async fn update(
        db: &DatabaseConnection,
        id: Uuid,
        request: FormationRequest,
    ) -> Result<formation::Model, AppError> {
        let current = formation::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Formation not found: {}", id)))?;

        let mut active: formation::ActiveModel = current.into();
        active.title = Set(request.title.trim().to_string());
        active.category = Set(request.category.trim().to_string());
        active.description = Set(request.description);
        active.description_long = Set(request.description_long);
        active.price = Set(request.price);
        active.image_url = Set(request.image_url);
        active.duration = Set(request.duration);
        active.level = Set(request.level);
        active.content_path = Set(normalize_path(request.content_path));
        active.syllabus = Set(Syllabus(clean_syllabus(request.syllabus)));
        active.status = Set(request.status);
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?)
    }

    pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), AppError> {
        let result = formation::Entity::delete_by_id(id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Formation not found: {}", id)));
        }

        info!(formation_id = %id, "Formation deleted");
        Ok(())
    }
}

fn normalize_path(path: Option<String>) -> Option<String> {
    path.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())
}

// une ligne vide dans le formulaire ne devient pas un chapitre
fn clean_syllabus(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
