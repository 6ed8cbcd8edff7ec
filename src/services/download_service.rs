use chrono::Utc;
use sea_orm::*;
use sea_orm::sea_query::{Expr, OnConflict};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{download, formation, order, order_item};
use crate::services::content_store::{ContentStore, SignedUrl};

pub struct DownloadService;

impl DownloadService {
    /// Émet un lien temporaire vers le contenu d'une formation achetée.
    ///
    /// 1. droit d'accès : une commande completed/validated du user contient la formation
    /// 2. quota : incrément conditionnel `issued_count < max_downloads`
    /// 3. fichier : la formation existe et a un contenu
    /// 4. lien signé
    ///
    /// Les étapes 2 à 4 sont dans une transaction : si le fichier ou la
    /// signature échoue, l'incrément est annulé. Deux requêtes simultanées
    /// ne peuvent pas dépasser le quota, l'UPDATE conditionnel tranche.
    pub async fn issue_link(
        db: &DatabaseConnection,
        store: &dyn ContentStore,
        default_max_downloads: i32,
        user_id: Uuid,
        formation_id: Uuid,
    ) -> Result<SignedUrl, AppError> {
        let now = Utc::now();

        if !Self::is_entitled(db, user_id, formation_id, now).await? {
            warn!(user_id = %user_id, formation_id = %formation_id, "Download refused: not entitled");
            return Err(AppError::NotEntitled);
        }

        let txn = db.begin().await?;

        download::Entity::insert(download::ActiveModel {
            user_id: Set(user_id),
            formation_id: Set(formation_id),
            issued_count: Set(0),
            max_downloads: Set(default_max_downloads),
            last_download: Set(None),
            created_at: Set(now),
        })
        .on_conflict(
            OnConflict::columns([download::Column::UserId, download::Column::FormationId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let reserved = download::Entity::update_many()
            .col_expr(
                download::Column::IssuedCount,
                Expr::col(download::Column::IssuedCount).add(1),
            )
            .col_expr(download::Column::LastDownload, Expr::value(Some(now)))
            .filter(download::Column::UserId.eq(user_id))
            .filter(download::Column::FormationId.eq(formation_id))
            .filter(Expr::col(download::Column::IssuedCount).lt(Expr::col(download::Column::MaxDownloads)))
            .exec(&txn)
            .await?;

        if reserved.rows_affected == 0 {
            warn!(user_id = %user_id, formation_id = %formation_id, "Download refused: quota exceeded");
            return Err(AppError::QuotaExceeded);
        }

        let content_path = formation::Entity::find_by_id(formation_id)
            .one(&txn)
            .await?
            .and_then(|f| f.content_path)
            .filter(|path| !path.trim().is_empty())
            .ok_or_else(|| AppError::NotFound("Formation content not found".to_string()))?;

        let signed = store
            .signed_url(&content_path, now)
            .map_err(AppError::LinkGenerationFailed)?;

        txn.commit().await?;

        info!(user_id = %user_id, formation_id = %formation_id, "Download link issued");
        Ok(signed)
    }

    /// Vrai si une commande du user donnant accès contient la formation
    pub async fn is_entitled(
        db: &DatabaseConnection,
        user_id: Uuid,
        formation_id: Uuid,
        now: chrono::DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let purchases = order_item::Entity::find()
            .find_also_related(order::Entity)
            .filter(order_item::Column::FormationId.eq(formation_id))
            .filter(order::Column::UserId.eq(user_id))
            .all(db)
            .await?;

        Ok(purchases
            .into_iter()
            .filter_map(|(_, order)| order)
            .any(|order| order.grants_access_at(now)))
    }
}
