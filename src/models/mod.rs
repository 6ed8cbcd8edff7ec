// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table avec SeaORM.
//
// Liste des modules:
//   - profile : Profils utilisateurs (rôle client / admin)
//   - formation : Catalogue des formations
//   - order : Commandes et cycle de vie du paiement
//   - order_item : Lignes de commande (prix figé à l'achat)
//   - download : Registre des téléchargements (quota par user/formation)
//   - cart : Panier persistant (une ligne par utilisateur)
//   - dto : Data Transfer Objects pour les requêtes/réponses API
//
// Points d'attention:
//   - Les énumérations sont stockées en texte (DeriveActiveEnum)
//   - Les lignes de commande sont normalisées (pas de tableau embarqué)
//
// ============================================================================

pub mod profile;
pub mod formation;
pub mod order;
pub mod order_item;
pub mod download;
pub mod cart;
pub mod dto;
