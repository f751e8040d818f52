use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::AppError;

/// Serialize an `ObjectId` as its 24-character hex string.
pub fn hex_id<S: Serializer>(id: &ObjectId, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&id.to_hex())
}

pub fn hex_ids<S: Serializer>(ids: &[ObjectId], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(ids.iter().map(|id| id.to_hex()))
}

/// Serialize a BSON timestamp as RFC 3339.
pub fn rfc3339<S: Serializer>(at: &DateTime, serializer: S) -> Result<S::Ok, S::Error> {
    let text = at
        .try_to_rfc3339_string()
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&text)
}

/// Only the public URL of a stored asset.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AssetUrl {
    #[schema(example = "http://127.0.0.1:8000/assets/image/3f1c.png")]
    pub url: String,
}

/// Public profile of a user embedded in another resource.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String, example = "6650c0f4e13a5b2f9c1d2e3f")]
    pub id: ObjectId,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar: Option<AssetUrl>,
}

/// Trimmed value of a required text field; blank counts as missing.
pub fn require_non_blank(value: Option<&str>, name: &str) -> Result<String, AppError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::BadRequest(format!("{name} is required"))),
    }
}

/// Trimmed value of an optional text field. Present-but-blank is rejected.
pub fn optional_non_blank(value: Option<&str>, name: &str) -> Result<Option<String>, AppError> {
    match value {
        None => Ok(None),
        Some(v) => require_non_blank(Some(v), name).map(Some),
    }
}

/// Usernames and emails are stored trimmed and lowercase.
pub fn normalize_identity(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Minimal shape check for an email address.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        })
        && !email.chars().any(char::is_whitespace);
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid email address".into()))
    }
}
