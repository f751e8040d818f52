use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::shared::{OwnerSummary, hex_id, rfc3339};
use crate::entity::tweet;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct TweetRequest {
    #[schema(example = "New video drops tomorrow")]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TweetResponse {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub content: String,
    #[serde(serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub owner: ObjectId,
    #[serde(serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
    #[serde(serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime,
}

impl From<tweet::Model> for TweetResponse {
    fn from(m: tweet::Model) -> Self {
        Self {
            id: m.id,
            content: m.content,
            owner: m.owner,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TweetItem {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub content: String,
    pub owner: OwnerSummary,
    pub likes_count: i64,
    pub is_liked: bool,
    #[serde(serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
    #[serde(serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime,
}
