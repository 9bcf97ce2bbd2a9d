use actix_web::{delete, get, patch, post, web, HttpResponse};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{
    DeleteAccountRequest, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, LoginResponse,
    RegisterRequest, RegisterResponse, ResetPasswordRequest, UpdatePasswordRequest,
    UpdateProfileRequest, UserSummary, VerifyEmailRequest,
};
use crate::models::otps::OtpPurpose;
use crate::routes::validate;
use crate::state::AppState;

/// POST /auth/register - Créer un compte (PUBLIC)
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    validate(&body.0)?;

    let registration = state
        .auth
        .register(&body.name, &body.email, &body.password)
        .await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User registered, check your email for the verification code".to_string(),
        otp_token: registration.otp_token,
        user: UserSummary::from(&registration.user),
    }))
}

/// PATCH /auth/verify-email - Valider l'email avec le code reçu (PUBLIC)
#[patch("/verify-email")]
pub async fn verify_email(
    body: web::Json<VerifyEmailRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    // Seul l'usage verify-email est accepté ici, avant tout accès au store
    if body.purpose != OtpPurpose::VerifyEmail.as_str() {
        return Err(AppError::UnprocessableEntity(format!(
            "Unsupported purpose '{}'",
            body.purpose
        )));
    }

    let user = state.auth.verify_email(&body.otp_token, &body.otp).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Email verified successfully",
        "user": user
    })))
}

/// POST /auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let outcome = state.auth.login(&body.email, &body.password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Login successful".to_string(),
        token: outcome.token,
        user: UserSummary::from(&outcome.user),
    }))
}

/// DELETE /auth/delete - Supprimer son compte (PROTÉGÉE)
#[delete("/delete")]
pub async fn delete_account(
    auth_user: AuthUser,
    body: web::Json<DeleteAccountRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.auth.delete_account(auth_user.user_id, &body.password).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Account deleted successfully"
    })))
}

/// POST /auth/forgot-password - Demander un code de réinitialisation (PUBLIC)
#[post("/forgot-password")]
pub async fn forgot_password(
    body: web::Json<ForgotPasswordRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let otp_token = state.auth.forgot_password(&body.email).await?;

    Ok(HttpResponse::Ok().json(ForgotPasswordResponse {
        message: "A reset code has been sent to your email".to_string(),
        otp_token,
    }))
}

/// PATCH /auth/reset-password - Nouveau mot de passe avec le code reçu (PUBLIC)
#[patch("/reset-password")]
pub async fn reset_password(
    body: web::Json<ResetPasswordRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state
        .auth
        .reset_password(&body.otp_token, &body.otp, &body.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password reset successfully"
    })))
}

/// PATCH /auth/update-password - Changer son mot de passe (PROTÉGÉE)
#[patch("/update-password")]
pub async fn update_password(
    auth_user: AuthUser,
    body: web::Json<UpdatePasswordRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state
        .auth
        .update_password(auth_user.user_id, &body.old_password, &body.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password changed successfully"
    })))
}

/// GET /auth/profile - Profil de l'utilisateur connecté (PROTÉGÉE)
#[get("/profile")]
pub async fn profile(auth_user: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let user = state.auth.profile(auth_user.user_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": user
    })))
}

/// PATCH /auth/updateprofile - Modifier nom et/ou email (PROTÉGÉE)
#[patch("/updateprofile")]
pub async fn update_profile(
    auth_user: AuthUser,
    body: web::Json<UpdateProfileRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    validate(&body.0)?;

    let user = state
        .auth
        .update_profile(auth_user.user_id, body.name.as_deref(), body.email.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": user
    })))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(verify_email)
            .service(login)
            .service(delete_account)
            .service(forgot_password)
            .service(reset_password)
            .service(update_password)
            .service(profile)
            .service(update_profile),
    );
}
