use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;
use crate::entity::user;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("failed to sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Short-lived token identifying the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    /// User id, hex.
    pub sub: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Long-lived token exchanged for a new token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User id, hex.
    pub sub: String,
    /// Makes every issued refresh token distinct.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn sign_access(user: &user::Model, auth: &AuthConfig) -> Result<String, JwtError> {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: user.id.to_hex(),
        username: user.username.clone(),
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(auth.access_token_ttl_minutes)).timestamp(),
    };
    sign(&claims, &auth.access_token_secret)
}

pub fn sign_refresh(user_id: ObjectId, auth: &AuthConfig) -> Result<String, JwtError> {
    let now = Utc::now();
    let claims = RefreshClaims {
        sub: user_id.to_hex(),
        jti: uuid::Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(auth.refresh_token_ttl_days)).timestamp(),
    };
    sign(&claims, &auth.refresh_token_secret)
}

pub fn verify_access(token: &str, auth: &AuthConfig) -> Result<AccessClaims, JwtError> {
    verify(token, &auth.access_token_secret)
}

pub fn verify_refresh(token: &str, auth: &AuthConfig) -> Result<RefreshClaims, JwtError> {
    verify(token, &auth.refresh_token_secret)
}

fn sign<C: Serialize>(claims: &C, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(JwtError::Sign)
}

fn verify<C: for<'de> Deserialize<'de>>(token: &str, secret: &str) -> Result<C, JwtError> {
    let data = decode::<C>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(JwtError::Invalid)?;
    Ok(data.claims)
}
