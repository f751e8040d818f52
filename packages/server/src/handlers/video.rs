use axum::extract::State;
use common::AssetKind;
use mongodb::bson::{self, DateTime, doc, oid::ObjectId};
use tracing::{info, instrument};

use crate::entity::asset::AssetRef;
use crate::entity::{comment, decode_all, like, playlist, user, video};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::multipart::MultipartForm;
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::shared::{optional_non_blank, require_non_blank};
use crate::models::video::*;
use crate::pagination::{PageEnvelope, PageParams, run_facet};
use crate::pipeline::queries::{self, VideoListing};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::utils::object_id::parse_object_id;
use crate::utils::upload;

use super::{find_or_404, list_message};

fn parse_duration(raw: Option<&str>) -> Result<Option<f64>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(d) if d.is_finite() && d >= 0.0 => Ok(Some(d)),
        _ => Err(AppError::BadRequest("Invalid duration".into())),
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Videos",
    operation_id = "listVideos",
    summary = "List published videos",
    description = "Paginated list of published videos with optional free-text search, owner filter and sorting. \
        `totalCount` counts every match, not just the returned page.",
    params(VideoListQuery),
    responses(
        (status = 200, description = "Page of videos", body = ApiResponse<PageEnvelope<VideoCard>>),
        (status = 400, description = "Invalid pagination, sort or userId (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_videos(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<VideoListQuery>,
) -> Result<ApiResponse<PageEnvelope<VideoCard>>, AppError> {
    let window = PageParams::parse(query.page.as_deref(), query.limit.as_deref())?;

    let search = query.search(state.config.search.mode);
    let sort = parse_sort(
        query.sort_by.as_deref(),
        query.sort_type.as_deref(),
        search.as_ref().map(|s| s.mode),
    )?;
    let owner = match query.user_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_object_id(raw, "userId")?),
        _ => None,
    };

    let pipeline = queries::video_listing(&VideoListing {
        search,
        owner,
        sort,
        window,
    });
    let page = run_facet(&video::repo(&state.db), &pipeline, window).await?;

    let message = list_message(
        page.items.is_empty(),
        "No videos found",
        "Videos fetched successfully",
    );
    Ok(ApiResponse::ok(page, message))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Videos",
    operation_id = "publishVideo",
    summary = "Upload and publish a video",
    request_body(content = PublishVideoForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video published", body = ApiResponse<VideoResponse>),
        (status = 400, description = "Missing field or bad file (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(owner = %auth_user.user_id))]
pub async fn publish_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut form: MultipartForm,
) -> Result<ApiResponse<VideoResponse>, AppError> {
    let title = require_non_blank(form.text("title"), "title")?;
    let description = require_non_blank(form.text("description"), "description")?;
    let duration = parse_duration(form.text("duration"))?;
    let video_file = form.require_file("videoFile", AssetKind::Video)?;
    let thumbnail_file = form.require_file("thumbnail", AssetKind::Image)?;

    let (video_asset, host_duration) =
        upload::store(&*state.assets, &video_file, AssetKind::Video).await?;
    let thumbnail = match upload::store(&*state.assets, &thumbnail_file, AssetKind::Image).await {
        Ok((thumbnail, _)) => thumbnail,
        Err(e) => {
            upload::discard(&*state.assets, &video_asset, AssetKind::Video).await;
            return Err(e);
        }
    };

    let now = DateTime::now();
    let model = video::Model {
        id: ObjectId::new(),
        video_file: video_asset,
        thumbnail,
        title,
        description,
        duration: duration.or(host_duration).unwrap_or(0.0),
        views: 0,
        is_published: true,
        owner: auth_user.user_id,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = video::repo(&state.db).insert(&model).await {
        upload::discard(&*state.assets, &model.video_file, AssetKind::Video).await;
        upload::discard(&*state.assets, &model.thumbnail, AssetKind::Image).await;
        return Err(e.into());
    }

    info!(video_id = %model.id, "Video published");
    Ok(ApiResponse::created(
        VideoResponse::from(model),
        "Video uploaded successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/{videoId}",
    tag = "Videos",
    operation_id = "getVideo",
    summary = "Get a video",
    description = "Returns the video with owner, like and comment counts as seen by the caller. \
        Counts one view and adds the video to the caller's watch history (once). \
        `views` in the response is the count before this fetch.",
    params(("videoId" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video details", body = ApiResponse<VideoDetail>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(viewer = %auth_user.user_id))]
pub async fn get_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(video_id): AppPath<String>,
) -> Result<ApiResponse<VideoDetail>, AppError> {
    let video_id = parse_object_id(&video_id, "videoId")?;
    let videos = video::repo(&state.db);

    let rows = videos
        .aggregate(&queries::video_detail(video_id, auth_user.user_id))
        .await?;
    let detail = decode_all::<VideoDetail>(rows)?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("Video not found".into()))?;

    videos
        .update_one(doc! { "_id": video_id }, doc! { "$inc": { "views": 1_i64 } })
        .await?;
    user::repo(&state.db)
        .update_one(
            doc! { "_id": auth_user.user_id },
            doc! { "$addToSet": { "watchHistory": video_id } },
        )
        .await?;

    Ok(ApiResponse::ok(detail, "Video fetched successfully"))
}

#[utoipa::path(
    patch,
    path = "/{videoId}",
    tag = "Videos",
    operation_id = "updateVideo",
    summary = "Update title, description or thumbnail",
    description = "Owner only. At least one of `title`, `description`, `thumbnail` is required. \
        A replaced thumbnail is deleted from the asset host after the update is stored.",
    params(("videoId" = String, Path, description = "Video ID")),
    request_body(content = UpdateVideoForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video updated", body = ApiResponse<VideoResponse>),
        (status = 400, description = "Nothing to update or bad file (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = %auth_user.user_id))]
pub async fn update_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(video_id): AppPath<String>,
    mut form: MultipartForm,
) -> Result<ApiResponse<VideoResponse>, AppError> {
    let video_id = parse_object_id(&video_id, "videoId")?;
    let title = optional_non_blank(form.text("title"), "title")?;
    let description = optional_non_blank(form.text("description"), "description")?;
    let thumbnail_file = form.take_file("thumbnail", AssetKind::Image)?;
    if title.is_none() && description.is_none() && thumbnail_file.is_none() {
        return Err(AppError::BadRequest(
            "Provide a title, description or thumbnail to update".into(),
        ));
    }

    let videos = video::repo(&state.db);
    let current = find_or_404(&videos, video_id, "Video").await?;
    auth_user.authorize(&current, "update")?;

    let mut set = doc! { "updatedAt": DateTime::now() };
    if let Some(title) = title {
        set.insert("title", title);
    }
    if let Some(description) = description {
        set.insert("description", description);
    }
    let fresh_thumbnail: Option<AssetRef> = match &thumbnail_file {
        Some(file) => {
            let (thumbnail, _) = upload::store(&*state.assets, file, AssetKind::Image).await?;
            set.insert("thumbnail", bson::to_bson(&thumbnail)?);
            Some(thumbnail)
        }
        None => None,
    };

    let updated = match videos.update_by_id(video_id, doc! { "$set": set }).await {
        Ok(Some(updated)) => updated,
        outcome => {
            if let Some(thumbnail) = &fresh_thumbnail {
                upload::discard(&*state.assets, thumbnail, AssetKind::Image).await;
            }
            return Err(match outcome {
                Err(e) => e.into(),
                Ok(_) => AppError::NotFound("Video not found".into()),
            });
        }
    };

    if fresh_thumbnail.is_some() {
        upload::discard(&*state.assets, &current.thumbnail, AssetKind::Image).await;
    }
    Ok(ApiResponse::ok(
        VideoResponse::from(updated),
        "Video updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/{videoId}",
    tag = "Videos",
    operation_id = "deleteVideo",
    summary = "Delete a video",
    description = "Owner only. Also deletes the video's comments, likes on the video and on those comments, \
        removes it from every playlist, and deletes its files from the asset host.",
    params(("videoId" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video deleted", body = ApiResponse<Empty>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn delete_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(video_id): AppPath<String>,
) -> Result<ApiResponse<Empty>, AppError> {
    let video_id = parse_object_id(&video_id, "videoId")?;
    let videos = video::repo(&state.db);
    let current = find_or_404(&videos, video_id, "Video").await?;
    auth_user.authorize(&current, "delete")?;

    if !videos.delete_by_id(video_id).await? {
        return Err(AppError::NotFound("Video not found".into()));
    }

    let comments = comment::repo(&state.db);
    let comment_ids = comments.ids(doc! { "video": video_id }).await?;
    let likes_removed = like::repo(&state.db)
        .delete_many(doc! {
            "$or": [
                { "video": video_id },
                { "comment": { "$in": comment_ids } },
            ]
        })
        .await?;
    let comments_removed = comments.delete_many(doc! { "video": video_id }).await?;
    let playlists_touched = playlist::repo(&state.db)
        .update_many(
            doc! { "videos": video_id },
            doc! { "$pull": { "videos": video_id } },
        )
        .await?;

    upload::discard(&*state.assets, &current.video_file, AssetKind::Video).await;
    upload::discard(&*state.assets, &current.thumbnail, AssetKind::Image).await;

    info!(
        %video_id,
        comments_removed, likes_removed, playlists_touched, "Video deleted"
    );
    Ok(ApiResponse::ok(Empty::default(), "Video deleted successfully"))
}

#[utoipa::path(
    patch,
    path = "/toggle/publish/{videoId}",
    tag = "Videos",
    operation_id = "togglePublishStatus",
    summary = "Flip a video's published flag",
    description = "Owner only. Unpublished videos are hidden from listings and playlists.",
    params(("videoId" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "New publish status", body = ApiResponse<PublishStatus>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn toggle_publish_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(video_id): AppPath<String>,
) -> Result<ApiResponse<PublishStatus>, AppError> {
    let video_id = parse_object_id(&video_id, "videoId")?;
    let videos = video::repo(&state.db);
    let current = find_or_404(&videos, video_id, "Video").await?;
    auth_user.authorize(&current, "publish or unpublish")?;

    // Flip in the store so concurrent toggles never lose an update.
    let flip = vec![doc! {
        "$set": {
            "isPublished": { "$not": "$isPublished" },
            "updatedAt": "$$NOW",
        }
    }];
    let updated = videos
        .update_by_id(video_id, flip)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".into()))?;

    Ok(ApiResponse::ok(
        PublishStatus {
            id: updated.id,
            is_published: updated.is_published,
        },
        "Video publish status toggled successfully",
    ))
}
