use axum::extract::State;
use tracing::{debug, instrument};

use crate::entity::like::LikeTarget;
use crate::entity::{comment, decode_all, like, tweet, video};
use crate::error::{AppError, ErrorBody, is_duplicate_key};
use crate::extractors::auth::AuthUser;
use crate::extractors::path::AppPath;
use crate::models::like::*;
use crate::pipeline::queries;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::utils::object_id::parse_object_id;

use super::{ensure_exists, list_message};

/// Remove the caller's like on `target` if present, otherwise add it.
/// Returns whether the target is liked afterwards.
async fn toggle(state: &AppState, auth_user: &AuthUser, target: LikeTarget) -> Result<bool, AppError> {
    let likes = like::repo(&state.db);
    if likes.delete_one(target.filter_by(auth_user.user_id)).await? {
        return Ok(false);
    }
    match likes.insert(&target.new_like(auth_user.user_id)).await {
        Ok(()) => Ok(true),
        // A concurrent toggle got there first.
        Err(e) if is_duplicate_key(&e) => {
            debug!(target = target.field(), "Like already present");
            Ok(true)
        }
        Err(e) => Err(e.into()),
    }
}

fn status_message(is_liked: bool, what: &str) -> String {
    if is_liked {
        format!("{what} liked successfully")
    } else {
        format!("{what} unliked successfully")
    }
}

#[utoipa::path(
    post,
    path = "/toggle/v/{videoId}",
    tag = "Likes",
    operation_id = "toggleVideoLike",
    summary = "Like or unlike a video",
    params(("videoId" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Like state after the toggle", body = ApiResponse<LikeStatus>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn toggle_video_like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(video_id): AppPath<String>,
) -> Result<ApiResponse<LikeStatus>, AppError> {
    let video_id = parse_object_id(&video_id, "videoId")?;
    ensure_exists(&video::repo(&state.db), video_id, "Video").await?;

    let is_liked = toggle(&state, &auth_user, LikeTarget::Video(video_id)).await?;
    Ok(ApiResponse::ok(
        LikeStatus { is_liked },
        status_message(is_liked, "Video"),
    ))
}

#[utoipa::path(
    post,
    path = "/toggle/c/{commentId}",
    tag = "Likes",
    operation_id = "toggleCommentLike",
    summary = "Like or unlike a comment",
    params(("commentId" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Like state after the toggle", body = ApiResponse<LikeStatus>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn toggle_comment_like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(comment_id): AppPath<String>,
) -> Result<ApiResponse<LikeStatus>, AppError> {
    let comment_id = parse_object_id(&comment_id, "commentId")?;
    ensure_exists(&comment::repo(&state.db), comment_id, "Comment").await?;

    let is_liked = toggle(&state, &auth_user, LikeTarget::Comment(comment_id)).await?;
    Ok(ApiResponse::ok(
        LikeStatus { is_liked },
        status_message(is_liked, "Comment"),
    ))
}

#[utoipa::path(
    post,
    path = "/toggle/t/{tweetId}",
    tag = "Likes",
    operation_id = "toggleTweetLike",
    summary = "Like or unlike a tweet",
    params(("tweetId" = String, Path, description = "Tweet ID")),
    responses(
        (status = 200, description = "Like state after the toggle", body = ApiResponse<LikeStatus>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tweet not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn toggle_tweet_like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(tweet_id): AppPath<String>,
) -> Result<ApiResponse<LikeStatus>, AppError> {
    let tweet_id = parse_object_id(&tweet_id, "tweetId")?;
    ensure_exists(&tweet::repo(&state.db), tweet_id, "Tweet").await?;

    let is_liked = toggle(&state, &auth_user, LikeTarget::Tweet(tweet_id)).await?;
    Ok(ApiResponse::ok(
        LikeStatus { is_liked },
        status_message(is_liked, "Tweet"),
    ))
}

#[utoipa::path(
    get,
    path = "/videos",
    tag = "Likes",
    operation_id = "getLikedVideos",
    summary = "Videos the caller liked",
    description = "Most recent like first. Unpublished videos are left out.",
    responses(
        (status = 200, description = "Liked videos", body = ApiResponse<Vec<LikedVideo>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn liked_videos(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<LikedVideo>>, AppError> {
    let rows = like::repo(&state.db)
        .aggregate(&queries::liked_videos(auth_user.user_id))
        .await?;
    let videos: Vec<LikedVideo> = decode_all(rows)?;

    let message = list_message(
        videos.is_empty(),
        "No liked videos found",
        "Liked videos fetched successfully",
    );
    Ok(ApiResponse::ok(videos, message))
}
