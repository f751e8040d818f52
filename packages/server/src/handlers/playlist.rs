use axum::extract::State;
use mongodb::bson::{DateTime, Document, doc, oid::ObjectId};
use tracing::{info, instrument};

use crate::entity::{decode_all, playlist, video};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::path::AppPath;
use crate::models::playlist::*;
use crate::models::shared::{optional_non_blank, require_non_blank};
use crate::pipeline::{order_by_ids, queries};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::utils::object_id::parse_object_id;

use super::{ensure_exists, ensure_user_exists, find_or_404, list_message};

/// Load a playlist and check the caller owns it.
async fn owned_playlist(
    state: &AppState,
    auth_user: &AuthUser,
    playlist_id: ObjectId,
    action: &str,
) -> Result<playlist::Model, AppError> {
    let current = find_or_404(&playlist::repo(&state.db), playlist_id, "Playlist").await?;
    auth_user.authorize(&current, action)?;
    Ok(current)
}

/// Apply a membership change (`$addToSet` or `$pull`) to the playlist.
async fn change_membership(
    state: &AppState,
    playlist_id: ObjectId,
    update: Document,
) -> Result<playlist::Model, AppError> {
    let mut update = update;
    update.insert("$set", doc! { "updatedAt": DateTime::now() });
    playlist::repo(&state.db)
        .update_by_id(playlist_id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("Playlist not found".into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Playlists",
    operation_id = "createPlaylist",
    summary = "Create an empty playlist",
    request_body = CreatePlaylistRequest,
    responses(
        (status = 201, description = "Playlist created", body = ApiResponse<PlaylistResponse>),
        (status = 400, description = "Name or description missing (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(owner = %auth_user.user_id))]
pub async fn create_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePlaylistRequest>,
) -> Result<ApiResponse<PlaylistResponse>, AppError> {
    let name = require_non_blank(payload.name.as_deref(), "name")?;
    let description = require_non_blank(payload.description.as_deref(), "description")?;

    let now = DateTime::now();
    let model = playlist::Model {
        id: ObjectId::new(),
        name,
        description,
        videos: Vec::new(),
        owner: auth_user.user_id,
        created_at: now,
        updated_at: now,
    };
    playlist::repo(&state.db).insert(&model).await?;

    info!(playlist_id = %model.id, "Playlist created");
    Ok(ApiResponse::created(
        PlaylistResponse::from(model),
        "Playlist created successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/user/{userId}",
    tag = "Playlists",
    operation_id = "getUserPlaylists",
    summary = "List a user's playlists",
    description = "Most recently updated first. Totals only count published videos.",
    params(("userId" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Playlists", body = ApiResponse<Vec<PlaylistSummary>>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn user_playlists(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(user_id): AppPath<String>,
) -> Result<ApiResponse<Vec<PlaylistSummary>>, AppError> {
    let user_id = parse_object_id(&user_id, "userId")?;
    ensure_user_exists(&state.db, user_id).await?;

    let rows = playlist::repo(&state.db)
        .aggregate(&queries::user_playlists(user_id))
        .await?;
    let playlists: Vec<PlaylistSummary> = decode_all(rows)?;

    let message = list_message(
        playlists.is_empty(),
        "No playlists found",
        "Playlists fetched successfully",
    );
    Ok(ApiResponse::ok(playlists, message))
}

#[utoipa::path(
    get,
    path = "/{playlistId}",
    tag = "Playlists",
    operation_id = "getPlaylist",
    summary = "Get a playlist with its videos",
    description = "Videos appear in playlist order; unpublished ones are left out of the list and the totals.",
    params(("playlistId" = String, Path, description = "Playlist ID")),
    responses(
        (status = 200, description = "Playlist", body = ApiResponse<PlaylistDetail>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_playlist(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(playlist_id): AppPath<String>,
) -> Result<ApiResponse<PlaylistDetail>, AppError> {
    let playlist_id = parse_object_id(&playlist_id, "playlistId")?;

    let rows = playlist::repo(&state.db)
        .aggregate(&queries::playlist_with_videos(playlist_id))
        .await?;
    let mut detail = decode_all::<PlaylistDetail>(rows)?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("Playlist not found".into()))?;

    let videos = std::mem::take(&mut detail.videos);
    detail.videos = order_by_ids(videos, &detail.video_ids, |v| v.id);

    Ok(ApiResponse::ok(detail, "Playlist fetched successfully"))
}

#[utoipa::path(
    patch,
    path = "/{playlistId}",
    tag = "Playlists",
    operation_id = "updatePlaylist",
    summary = "Rename or describe a playlist",
    description = "Owner only. At least one of `name`, `description` is required.",
    params(("playlistId" = String, Path, description = "Playlist ID")),
    request_body = UpdatePlaylistRequest,
    responses(
        (status = 200, description = "Playlist updated", body = ApiResponse<PlaylistResponse>),
        (status = 400, description = "Nothing to update or malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(playlist_id): AppPath<String>,
    AppJson(payload): AppJson<UpdatePlaylistRequest>,
) -> Result<ApiResponse<PlaylistResponse>, AppError> {
    let playlist_id = parse_object_id(&playlist_id, "playlistId")?;
    let name = optional_non_blank(payload.name.as_deref(), "name")?;
    let description = optional_non_blank(payload.description.as_deref(), "description")?;
    if name.is_none() && description.is_none() {
        return Err(AppError::BadRequest(
            "Provide a name or description to update".into(),
        ));
    }

    owned_playlist(&state, &auth_user, playlist_id, "update").await?;

    let mut set = doc! { "updatedAt": DateTime::now() };
    if let Some(name) = name {
        set.insert("name", name);
    }
    if let Some(description) = description {
        set.insert("description", description);
    }
    let updated = playlist::repo(&state.db)
        .update_by_id(playlist_id, doc! { "$set": set })
        .await?
        .ok_or_else(|| AppError::NotFound("Playlist not found".into()))?;

    Ok(ApiResponse::ok(
        PlaylistResponse::from(updated),
        "Playlist updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/{playlistId}",
    tag = "Playlists",
    operation_id = "deletePlaylist",
    summary = "Delete a playlist",
    description = "Owner only. The videos themselves are untouched.",
    params(("playlistId" = String, Path, description = "Playlist ID")),
    responses(
        (status = 200, description = "Playlist deleted", body = ApiResponse<Empty>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn delete_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(playlist_id): AppPath<String>,
) -> Result<ApiResponse<Empty>, AppError> {
    let playlist_id = parse_object_id(&playlist_id, "playlistId")?;
    owned_playlist(&state, &auth_user, playlist_id, "delete").await?;

    if !playlist::repo(&state.db).delete_by_id(playlist_id).await? {
        return Err(AppError::NotFound("Playlist not found".into()));
    }

    info!(%playlist_id, "Playlist deleted");
    Ok(ApiResponse::ok(Empty::default(), "Playlist deleted successfully"))
}

#[utoipa::path(
    patch,
    path = "/add/{videoId}/{playlistId}",
    tag = "Playlists",
    operation_id = "addVideoToPlaylist",
    summary = "Add a video to a playlist",
    description = "Owner only. Adding a video that is already in the playlist changes nothing.",
    params(
        ("videoId" = String, Path, description = "Video ID"),
        ("playlistId" = String, Path, description = "Playlist ID"),
    ),
    responses(
        (status = 200, description = "Updated playlist", body = ApiResponse<PlaylistResponse>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Playlist or video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn add_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((video_id, playlist_id)): AppPath<(String, String)>,
) -> Result<ApiResponse<PlaylistResponse>, AppError> {
    let video_id = parse_object_id(&video_id, "videoId")?;
    let playlist_id = parse_object_id(&playlist_id, "playlistId")?;

    owned_playlist(&state, &auth_user, playlist_id, "add videos to").await?;
    ensure_exists(&video::repo(&state.db), video_id, "Video").await?;

    let updated =
        change_membership(&state, playlist_id, doc! { "$addToSet": { "videos": video_id } })
            .await?;
    Ok(ApiResponse::ok(
        PlaylistResponse::from(updated),
        "Video added to playlist successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/remove/{videoId}/{playlistId}",
    tag = "Playlists",
    operation_id = "removeVideoFromPlaylist",
    summary = "Remove a video from a playlist",
    description = "Owner only. Removing a video that is not in the playlist changes nothing.",
    params(
        ("videoId" = String, Path, description = "Video ID"),
        ("playlistId" = String, Path, description = "Playlist ID"),
    ),
    responses(
        (status = 200, description = "Updated playlist", body = ApiResponse<PlaylistResponse>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn remove_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((video_id, playlist_id)): AppPath<(String, String)>,
) -> Result<ApiResponse<PlaylistResponse>, AppError> {
    let video_id = parse_object_id(&video_id, "videoId")?;
    let playlist_id = parse_object_id(&playlist_id, "playlistId")?;

    owned_playlist(&state, &auth_user, playlist_id, "remove videos from").await?;

    let updated =
        change_membership(&state, playlist_id, doc! { "$pull": { "videos": video_id } }).await?;
    Ok(ApiResponse::ok(
        PlaylistResponse::from(updated),
        "Video removed from playlist successfully",
    ))
}
