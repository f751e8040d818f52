use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use super::shared::rfc3339;
use super::video::VideoCard;

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    /// State after the toggle.
    pub is_liked: bool,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideo {
    pub video: VideoCard,
    #[serde(rename(deserialize = "createdAt", serialize = "likedAt"), serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub liked_at: DateTime,
}
