use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::debug;

use crate::errors::ServiceError;
use crate::AppState;

/// Permission names checked by the handlers.
pub mod consts {
    pub const PRODUCTS_WRITE: &str = "products:write";
    pub const ORDERS_READ: &str = "orders:read";
    pub const ORDERS_WRITE: &str = "orders:write";
    pub const INTEGRATION_MANAGE: &str = "integration:manage";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Regular API consumer: full product and order access.
    User,
    /// Integration operator: additionally may trigger 1C exchanges.
    Admin,
}

/// The authenticated caller, extracted from the `Authorization: Bearer`
/// header against the statically configured token lists.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub role: Role,
}

impl AuthUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        match self.role {
            Role::Admin => true,
            Role::User => permission != consts::INTEGRATION_MANAGE,
        }
    }

    pub fn require(&self, permission: &str) -> Result<(), ServiceError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "missing permission: {}",
                permission
            )))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let api_keys = state.config.api_key_list();
        let admin_keys = state.config.admin_api_key_list();

        // No keys configured means auth is disabled (local development);
        // every caller is treated as an operator.
        if api_keys.is_empty() && admin_keys.is_empty() {
            debug!("No API keys configured; treating request as admin");
            return Ok(AuthUser { role: Role::Admin });
        }

        let token = bearer_token(parts)
            .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".to_string()))?;

        if admin_keys.iter().any(|k| k == token) {
            return Ok(AuthUser { role: Role::Admin });
        }
        if api_keys.iter().any(|k| k == token) {
            return Ok(AuthUser { role: Role::User });
        }

        Err(ServiceError::Unauthorized("invalid bearer token".to_string()))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
