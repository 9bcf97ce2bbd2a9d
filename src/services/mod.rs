pub mod auth;
pub mod otp;
pub mod policy;
pub mod produit;
