// ============================================================================
// MODÈLE : DOWNLOADS (registre des liens émis)
// ============================================================================
//
// Une ligne par couple (user_id, formation_id), créée à la première demande.
// issued_count ne dépasse jamais max_downloads : l'incrément se fait par
// UPDATE ... WHERE issued_count < max_downloads (voir download_service).
//
// ============================================================================

use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "downloads")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub formation_id: Uuid,
    pub issued_count: i32,
    pub max_downloads: i32,
    pub last_download: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
