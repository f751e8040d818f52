use mongodb::bson::oid::ObjectId;

use crate::error::AppError;

/// Parse a 24-character hex id taken from a path or query parameter.
pub fn parse_object_id(raw: &str, name: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::BadRequest(format!("Invalid {name}")))
}
