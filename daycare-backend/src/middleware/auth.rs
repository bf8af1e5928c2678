// src/middleware/auth.rs

use crate::api::AppState;
use crate::domain::role::UserRole;
use crate::error::AppError;
use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 認証レイヤーが発行するJWTクレーム。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// User id.
    pub sub: Uuid,
    pub role: String,
    pub institution_id: Option<Uuid>,
    pub exp: i64,
}

/// The authenticated actor attached to every call: identity, role and
/// institution scope. Authorization decisions over these fields live in
/// `middleware::policy`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: UserRole,
    pub institution_id: Option<Uuid>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_super_admin(&self) -> bool {
        self.role.is_super_admin()
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization header".to_string()))?;

        let claims = decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|err| AppError::Unauthorized(format!("Invalid token: {}", err)))?
        .claims;

        let role = UserRole::from_str(&claims.role)
            .ok_or_else(|| AppError::Unauthorized(format!("Unknown role: {}", claims.role)))?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            role,
            institution_id: claims.institution_id,
        })
    }
}
