use crate::services::auth::AuthService;
use crate::services::produit::ProduitService;

/// Services partagés par tous les workers, injectés via `web::Data<AppState>`
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub produits: ProduitService,
}
