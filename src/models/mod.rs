// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - users : Comptes (email unique, hash du mot de passe, rôle, email vérifié)
//   - otps : Codes à usage unique (vérification email / reset password, 15 min)
//   - produits : Catalogue, chaque produit appartient à un utilisateur
//   - dto : Data Transfer Objects pour les requêtes et réponses API
//
// Points d'attention:
//   - Les identifiants sont des UUID v4 générés côté application
//   - (titre, user_id) est unique dans produits (index SQL, voir sql/schema.sql)
//   - ON DELETE CASCADE: supprimer un user supprime ses OTP et ses produits
//
// ============================================================================

pub mod dto;
pub mod otps;
pub mod produits;
pub mod users;
