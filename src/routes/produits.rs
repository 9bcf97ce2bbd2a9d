use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{CreateProduitRequest, ListProduitsQuery, UpdateProduitRequest};
use crate::state::AppState;

/// POST /produits - Créer un produit pour l'utilisateur connecté
#[post("")]
pub async fn create_produit(
    auth_user: AuthUser,
    body: web::Json<CreateProduitRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let produit = state.produits.create(&auth_user, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "data": produit
    })))
}

/// GET /produits?page=&limit=&search= - Liste paginée (tous propriétaires confondus)
#[get("")]
pub async fn list_produits(
    _auth_user: AuthUser,
    query: web::Query<ListProduitsQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let page = state.produits.list(&query).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": page.items.len(),
        "total": page.total,
        "page": page.page,
        "pages": page.pages,
        "data": page.items
    })))
}

/// GET /produits/user/{user_id} - Produits d'un propriétaire (lui-même ou admin)
#[get("/user/{user_id}")]
pub async fn list_user_produits(
    auth_user: AuthUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let items = state.produits.list_by_owner(&auth_user, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": items.len(),
        "data": items
    })))
}

/// GET /produits/{id}
#[get("/{id}")]
pub async fn get_produit(
    auth_user: AuthUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let detail = state.produits.get_by_id(&auth_user, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": detail
    })))
}

/// PUT /produits/{id} - Mise à jour partielle
#[put("/{id}")]
pub async fn update_produit(
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateProduitRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let produit = state
        .produits
        .update(&auth_user, &path, body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": produit
    })))
}

/// DELETE /produits/{id}
#[delete("/{id}")]
pub async fn delete_produit(
    auth_user: AuthUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.produits.delete(&auth_user, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Produit deleted successfully"
    })))
}

pub fn produits_routes(cfg: &mut web::ServiceConfig) {
    // /user/{user_id} avant /{id}
    cfg.service(
        web::scope("/produits")
            .service(create_produit)
            .service(list_produits)
            .service(list_user_produits)
            .service(get_produit)
            .service(update_produit)
            .service(delete_produit),
    );
}
