use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use mongodb::bson::oid::ObjectId;

use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::{cookies, jwt};

/// Authenticated caller, from the `accessToken` cookie or an
/// `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. Ownership
/// checks happen via `authorize()` in the handler body.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: ObjectId,
    pub username: String,
    pub email: String,
}

fn bearer_token(parts: &Parts) -> Result<Option<String>, AppError> {
    let Some(header) = parts.headers.get("Authorization") else {
        return Ok(None);
    };
    let value = header.to_str().map_err(|_| AppError::TokenInvalid)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AppError::TokenInvalid)?;
    Ok(Some(token.trim().to_string()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = match jar.get(cookies::ACCESS_TOKEN) {
            Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
            _ => bearer_token(parts)?.ok_or(AppError::TokenMissing)?,
        };

        let claims =
            jwt::verify_access(&token, &state.config.auth).map_err(|_| AppError::TokenInvalid)?;
        let user_id = ObjectId::parse_str(&claims.sub).map_err(|_| AppError::TokenInvalid)?;

        // Tokens outlive deleted accounts; only accept callers that still exist.
        let user = user::repo(&state.db)
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: user.id,
            username: user.username,
            email: user.email,
        })
    }
}
