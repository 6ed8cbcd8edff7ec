use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;
use sea_orm::sea_query::OnConflict;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::cart::{self, CartItem, CartItems};
use crate::models::formation;
use crate::services::catalog_service::CatalogService;

/// Panier d'un utilisateur : ensemble de formations (chaque formation au
/// plus une fois, pas de quantité). Le total est recalculé à chaque lecture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn from_items(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    /// Sans effet si la formation est déjà dans le panier
    pub fn add(&mut self, item: CartItem) -> bool {
        if self.contains(item.formation_id) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn remove(&mut self, formation_id: Uuid) {
        self.items.retain(|item| item.formation_id != formation_id);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, formation_id: Uuid) -> bool {
        self.items.iter().any(|item| item.formation_id == formation_id)
    }

    pub fn total(&self) -> i64 {
        self.items.iter().map(|item| item.price).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }
}

impl From<&formation::Model> for CartItem {
    fn from(formation: &formation::Model) -> Self {
        CartItem {
            formation_id: formation.id,
            title: formation.title.clone(),
            price: formation.price,
            image_url: formation.image_url.clone(),
        }
    }
}

/// Port de persistance du panier
#[async_trait]
pub trait CartStorage: Send + Sync {
    async fn load(&self, user_id: Uuid) -> Result<Cart, AppError>;
    async fn save(&self, user_id: Uuid, cart: &Cart) -> Result<(), AppError>;
}

/// Panier stocké dans la table carts, liste sérialisée telle quelle
pub struct DbCartStorage<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> DbCartStorage<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }
}

#[async_trait]
impl<'a, C> CartStorage for DbCartStorage<'a, C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn load(&self, user_id: Uuid) -> Result<Cart, AppError> {
        let stored = cart::Entity::find_by_id(user_id).one(self.db).await?;
        Ok(stored
            .map(|row| Cart::from_items(row.items.0))
            .unwrap_or_default())
    }

    async fn save(&self, user_id: Uuid, cart: &Cart) -> Result<(), AppError> {
        let row = cart::ActiveModel {
            user_id: Set(user_id),
            items: Set(CartItems(cart.items().to_vec())),
            updated_at: Set(Utc::now()),
        };

        cart::Entity::insert(row)
            .on_conflict(
                OnConflict::column(cart::Column::UserId)
                    .update_columns([cart::Column::Items, cart::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(self.db)
            .await?;
        Ok(())
    }
}

pub struct CartService;

impl CartService {
    /// Ajoute une formation active (copie titre + prix courants)
    pub async fn add_formation(
        storage: &dyn CartStorage,
        db: &DatabaseConnection,
        user_id: Uuid,
        formation_id: Uuid,
    ) -> Result<Cart, AppError> {
        let mut cart = storage.load(user_id).await?;
        if cart.contains(formation_id) {
            return Ok(cart);
        }

        let formation = CatalogService::get_active(db, formation_id).await?;
        cart.add(CartItem::from(&formation));
        storage.save(user_id, &cart).await?;
        Ok(cart)
    }

    pub async fn remove_formation(
        storage: &dyn CartStorage,
        user_id: Uuid,
        formation_id: Uuid,
    ) -> Result<Cart, AppError> {
        let mut cart = storage.load(user_id).await?;
        cart.remove(formation_id);
        storage.save(user_id, &cart).await?;
        Ok(cart)
    }

    pub async fn clear(storage: &dyn CartStorage, user_id: Uuid) -> Result<(), AppError> {
        let mut cart = storage.load(user_id).await?;
        cart.clear();
        storage.save(user_id, &cart).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_formation, setup_db};

    fn item(price: i64) -> CartItem {
        CartItem {
            formation_id: Uuid::new_v4(),
            title: format!("Formation {}", price),
            price,
            image_url: String::new(),
        }
    }

    #[test]
    fn test_total_is_sum_of_items() {
        let mut cart = Cart::default();
        cart.add(item(50000));
        cart.add(item(30000));

        assert_eq!(cart.total(), 80000);
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut cart = Cart::default();
        let rust = item(50000);

        assert!(cart.add(rust.clone()));
        assert!(!cart.add(rust.clone()));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total(), 50000);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::default();
        cart.add(item(10000));
        cart.remove(Uuid::new_v4());
        assert_eq!(cart.len(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0);
    }

    #[tokio::test]
    async fn test_storage_round_trip() {
        let db = setup_db().await;
        let storage = DbCartStorage::new(&db);
        let user_id = Uuid::new_v4();

        assert!(storage.load(user_id).await.unwrap().is_empty());

        let mut cart = Cart::default();
        cart.add(item(50000));
        cart.add(item(30000));
        storage.save(user_id, &cart).await.unwrap();

        // un second enregistrement remplace le premier
        cart.remove(cart.items()[0].formation_id);
        storage.save(user_id, &cart).await.unwrap();

        let reloaded = storage.load(user_id).await.unwrap();
        assert_eq!(reloaded, cart);
        assert_eq!(reloaded.total(), 30000);
    }

    #[tokio::test]
    async fn test_add_formation_snapshots_catalog() {
        let db = setup_db().await;
        let storage = DbCartStorage::new(&db);
        let user_id = Uuid::new_v4();
        let formation = insert_formation(&db, "Rust", 50000).await;

        CartService::add_formation(&storage, &db, user_id, formation.id).await.unwrap();
        let cart = CartService::add_formation(&storage, &db, user_id, formation.id).await.unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].title, "Rust");
        assert_eq!(cart.items()[0].price, 50000);
    }

    #[tokio::test]
    async fn test_add_unknown_formation() {
        let db = setup_db().await;
        let storage = DbCartStorage::new(&db);

        let result = CartService::add_formation(&storage, &db, Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
