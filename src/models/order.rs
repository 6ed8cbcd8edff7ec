// ============================================================================
// MODÈLE : ORDERS
// ============================================================================
//
// Cycle de vie:
//
//   pending ──► confirmed ──► completed
//      │            │
//      │            └───────► failed
//      ├──────────────────────► completed / failed   (webhook sans initiation)
//      ├──► validated   (revue admin)
//      └──► rejected    (revue admin, rejection_reason obligatoire)
//
//   completed, failed, validated, rejected sont terminaux : aucune
//   transition n'en sort, et rien ne revient jamais à pending.
//
// Points d'attention:
//   - total_price = somme des order_items.price, figé à la création
//   - Chaque transition est un UPDATE conditionnel sur le statut courant
//     (voir services::order_service), jamais un lire-puis-écrire
//
// ============================================================================

use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "mvola")]
    Mvola,
    #[sea_orm(string_value = "orange_money")]
    OrangeMoney,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "validated")]
    Validated,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Failed | OrderStatus::Validated | OrderStatus::Rejected
        )
    }

    /// Statuts qui ouvrent le droit au téléchargement
    pub fn grants_access(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Validated)
    }

    /// Statuts de départ autorisés pour atteindre `self`
    pub fn allowed_sources(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[],
            OrderStatus::Confirmed => &[OrderStatus::Pending],
            OrderStatus::Completed | OrderStatus::Failed => {
                &[OrderStatus::Pending, OrderStatus::Confirmed]
            }
            OrderStatus::Validated | OrderStatus::Rejected => &[OrderStatus::Pending],
        }
    }

    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        target.allowed_sources().contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
            OrderStatus::Validated => "validated",
            OrderStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "completed" => Some(OrderStatus::Completed),
            "failed" => Some(OrderStatus::Failed),
            "validated" => Some(OrderStatus::Validated),
            "rejected" => Some(OrderStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub total_price: i64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub payment_reference: Option<String>,
    // posé pendant l'appel à l'opérateur, une seule initiation à la fois
    pub payment_started_at: Option<DateTimeUtc>,
    pub rejection_reason: Option<String>,
    pub validated_by: Option<Uuid>,
    pub validated_at: Option<DateTimeUtc>,
    pub expires_at: Option<DateTimeUtc>,
    pub paid_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Vrai si la commande donne accès aux contenus à l'instant `now`
    pub fn grants_access_at(&self, now: DateTimeUtc) -> bool {
        self.status.grants_access() && self.expires_at.is_none_or(|expiry| expiry > now)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id"
    )]
    Profile,

    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
