use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::users::Role;

/// Règle propriétaire-ou-admin, appliquée telle quelle à la lecture, la
/// modification et la suppression d'une ressource.
pub fn can_access(resource_owner: Uuid, caller: &AuthUser) -> bool {
    caller.user_id == resource_owner || caller.role == Role::Admin
}

/// Même règle, mais un refus devient `Forbidden` (jamais un filtrage silencieux)
pub fn ensure_access(resource_owner: Uuid, caller: &AuthUser, denied: &str) -> Result<(), AppError> {
    if can_access(resource_owner, caller) {
        Ok(())
    } else {
        log::info!("Access denied to user {}: {denied}", caller.user_id);
        Err(AppError::Forbidden(denied.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: "caller@x.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_owner_is_allowed() {
        let owner = caller(Role::User);
        assert!(can_access(owner.user_id, &owner));
    }

    #[test]
    fn test_admin_is_allowed_on_any_resource() {
        assert!(can_access(Uuid::new_v4(), &caller(Role::Admin)));
    }

    #[test]
    fn test_other_user_is_forbidden() {
        let stranger = caller(Role::User);
        assert!(!can_access(Uuid::new_v4(), &stranger));
        assert!(matches!(
            ensure_access(Uuid::new_v4(), &stranger, "nope"),
            Err(AppError::Forbidden(msg)) if msg == "nope"
        ));
    }
}
