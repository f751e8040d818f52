use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::shared::{AssetUrl, hex_id, rfc3339};

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    /// State after the toggle.
    pub is_subscribed: bool,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberProfile {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar: Option<AssetUrl>,
    pub subscribers_count: i64,
    /// Whether the caller is subscribed to this user.
    pub is_subscribed: bool,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub subscriber: SubscriberProfile,
    #[serde(rename(deserialize = "createdAt", serialize = "subscribedAt"), serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub subscribed_at: DateTime,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LatestVideo {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub title: String,
    pub thumbnail: AssetUrl,
    pub views: i64,
    #[serde(serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar: Option<AssetUrl>,
    #[serde(default)]
    pub latest_video: Option<LatestVideo>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannel {
    pub channel: ChannelSummary,
    #[serde(rename(deserialize = "createdAt", serialize = "subscribedAt"), serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub subscribed_at: DateTime,
}
