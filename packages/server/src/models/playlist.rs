use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::shared::{AssetUrl, OwnerSummary, hex_id, hex_ids, rfc3339};
use crate::entity::playlist;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreatePlaylistRequest {
    #[schema(example = "Rust talks")]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// At least one field is required.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResponse {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    #[serde(serialize_with = "hex_ids")]
    #[schema(value_type = Vec<String>)]
    pub videos: Vec<ObjectId>,
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

impl From<playlist::Model> for PlaylistResponse {
    fn from(m: playlist::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            videos: m.videos,
            owner: m.owner,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A playlist in a user's list, with totals over its published videos.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    #[serde(serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub owner: ObjectId,
    pub total_videos: i64,
    pub total_views: i64,
    #[serde(serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
    #[serde(serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideo {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub video_file: AssetUrl,
    pub thumbnail: AssetUrl,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    #[serde(serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
}

/// A playlist with its published videos in playlist order.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    /// Stored order of the playlist, used to order `videos`.
    #[serde(default, skip_serializing)]
    #[schema(ignore)]
    pub video_ids: Vec<ObjectId>,
    pub videos: Vec<PlaylistVideo>,
    pub total_videos: i64,
    pub total_views: i64,
    #[serde(default)]
    pub owner: Option<OwnerSummary>,
    #[serde(serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
    #[serde(serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime,
}
