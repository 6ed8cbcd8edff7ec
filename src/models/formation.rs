// ============================================================================
// MODÈLE : FORMATIONS
// ============================================================================
//
// Description:
//   Catalogue des formations vendues. Modifié uniquement par un admin.
//
// Colonnes:
//   - price : entier en unités monétaires (Ariary), jamais de décimales
//   - content_path : chemin du fichier dans le stockage, NULL tant que le
//     contenu n'est pas déposé (le téléchargement renvoie alors 404)
//   - syllabus : liste ordonnée de chapitres, stockée en JSON
//   - sales_count : incrémenté quand une commande passe à completed/validated
//
// ============================================================================

use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum FormationLevel {
    #[sea_orm(string_value = "beginner")]
    Beginner,
    #[sea_orm(string_value = "intermediate")]
    Intermediate,
    #[sea_orm(string_value = "advanced")]
    Advanced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum FormationStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Syllabus(pub Vec<String>);

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "formations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub description: String,
    pub description_long: String,
    pub price: i64,
    pub image_url: String,
    pub duration: String,
    pub level: FormationLevel,
    #[serde(skip_serializing)]
    pub content_path: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub syllabus: Syllabus,
    pub status: FormationStatus,
    pub sales_count: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
