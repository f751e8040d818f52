use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::shared::{OwnerSummary, hex_id, rfc3339};
use crate::entity::comment;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CommentRequest {
    #[schema(example = "Great explanation, thanks!")]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub content: String,
    #[serde(serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub video: ObjectId,
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

impl From<comment::Model> for CommentResponse {
    fn from(m: comment::Model) -> Self {
        Self {
            id: m.id,
            content: m.content,
            video: m.video,
            owner: m.owner,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A comment in a video's comment list.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentItem {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub content: String,
    #[serde(serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub video: ObjectId,
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
