use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::shared::{AssetUrl, OwnerSummary, hex_id, rfc3339};
use crate::entity::asset::AssetRef;
use crate::entity::video;
use crate::error::AppError;
use crate::pipeline::{SearchMode, SortDirection, SortKey, TextSearch};

/// Fields `sortBy` may name, besides `relevance`.
const SORTABLE_FIELDS: &[&str] = &["createdAt", "updatedAt", "views", "duration", "title"];

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct VideoListQuery {
    /// Page number, 1-based. Default 1.
    pub page: Option<String>,
    /// Items per page, at most 100. Default 10.
    pub limit: Option<String>,
    /// Free-text search over title and description.
    pub query: Option<String>,
    /// One of `createdAt` (default), `updatedAt`, `views`, `duration`,
    /// `title`, or `relevance` (requires `query`).
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_type: Option<String>,
    /// Only videos owned by this user.
    pub user_id: Option<String>,
}

impl VideoListQuery {
    /// The trimmed `query` as a search run in `mode`, if one was given.
    pub fn search(&self, mode: SearchMode) -> Option<TextSearch> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| TextSearch {
                query: q.to_string(),
                mode,
            })
    }
}

/// Resolve `sortBy`/`sortType` into a sort key.
pub fn parse_sort(
    sort_by: Option<&str>,
    sort_type: Option<&str>,
    search: Option<SearchMode>,
) -> Result<SortKey, AppError> {
    let direction = match sort_type.map(str::trim) {
        None | Some("") | Some("desc") => SortDirection::Desc,
        Some("asc") => SortDirection::Asc,
        Some(_) => {
            return Err(AppError::BadRequest(
                "sortType must be one of: asc, desc".into(),
            ));
        }
    };

    match sort_by.map(str::trim) {
        None | Some("") => Ok(SortKey::field("createdAt", direction)),
        Some("relevance") => match search {
            Some(mode) => Ok(SortKey::Relevance(mode)),
            None => Err(AppError::BadRequest(
                "sortBy=relevance requires a search query".into(),
            )),
        },
        Some(field) if SORTABLE_FIELDS.contains(&field) => Ok(SortKey::field(field, direction)),
        Some(_) => Err(AppError::BadRequest(format!(
            "sortBy must be one of: {}, relevance",
            SORTABLE_FIELDS.join(", ")
        ))),
    }
}

/// Multipart body of `POST /videos`. Documentation only.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct PublishVideoForm {
    #[schema(value_type = String, format = Binary)]
    pub video_file: Vec<u8>,
    #[schema(value_type = String, format = Binary)]
    pub thumbnail: Vec<u8>,
    pub title: String,
    pub description: String,
    /// Seconds. Taken from the asset host when omitted.
    pub duration: Option<f64>,
}

/// Multipart body of `PATCH /videos/{videoId}`. At least one part is
/// required. Documentation only.
#[derive(Deserialize, utoipa::ToSchema)]
#[allow(dead_code)]
pub struct UpdateVideoForm {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub thumbnail: Option<Vec<u8>>,
}

/// A stored video as returned after a write.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub video_file: AssetRef,
    pub thumbnail: AssetRef,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
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

impl From<video::Model> for VideoResponse {
    fn from(m: video::Model) -> Self {
        Self {
            id: m.id,
            video_file: m.video_file,
            thumbnail: m.thumbnail,
            title: m.title,
            description: m.description,
            duration: m.duration,
            views: m.views,
            is_published: m.is_published,
            owner: m.owner,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A video in a list, with its owner's public profile.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoCard {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub video_file: AssetUrl,
    pub thumbnail: AssetUrl,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    /// Absent if the owner account no longer exists.
    #[serde(default)]
    pub owner: Option<OwnerSummary>,
    #[serde(serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
    #[serde(serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoOwner {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar: Option<AssetUrl>,
    pub subscribers_count: i64,
    pub is_subscribed: bool,
}

/// Full video page as seen by the caller.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub video_file: AssetUrl,
    pub thumbnail: AssetUrl,
    pub title: String,
    pub description: String,
    pub duration: f64,
    /// Views before this fetch was counted.
    pub views: i64,
    pub is_published: bool,
    pub owner: VideoOwner,
    pub likes_count: i64,
    pub is_liked: bool,
    pub comments_count: i64,
    #[serde(serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
    #[serde(serialize_with = "rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishStatus {
    #[serde(rename = "_id", serialize_with = "hex_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub is_published: bool,
}
