use mongodb::Database;
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::Repository;
use super::asset::AssetRef;

pub const COLLECTION: &str = "users";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    /// Lowercase, trimmed, unique.
    pub username: String,
    /// Lowercase, trimmed, unique.
    pub email: String,
    pub full_name: String,
    /// Argon2 PHC string.
    pub password: String,

    pub avatar: AssetRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<AssetRef>,

    /// Video ids in first-watched order, without duplicates.
    #[serde(default)]
    pub watch_history: Vec<ObjectId>,
    /// The single refresh token currently accepted for this user.
    #[serde(default)]
    pub refresh_token: Option<String>,

    pub created_at: DateTime,
    pub updated_at: DateTime,
}

pub fn repo(db: &Database) -> Repository<Model> {
    Repository::new(db, COLLECTION)
}
