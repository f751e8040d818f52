use axum::extract::State;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use tracing::{info, instrument};

use crate::entity::like::LikeTarget;
use crate::entity::{comment, like, video};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::comment::*;
use crate::models::shared::require_non_blank;
use crate::pagination::{PageEnvelope, PageParams, paginate};
use crate::pipeline::queries;
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::utils::object_id::parse_object_id;

use super::{ensure_exists, find_or_404, list_message};

#[utoipa::path(
    get,
    path = "/{videoId}",
    tag = "Comments",
    operation_id = "listComments",
    summary = "List comments on a video",
    description = "Newest first, with the author's profile and like count as seen by the caller.",
    params(("videoId" = String, Path, description = "Video ID"), PageParams),
    responses(
        (status = 200, description = "Page of comments", body = ApiResponse<PageEnvelope<CommentItem>>),
        (status = 400, description = "Malformed id or pagination (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, params))]
pub async fn list_comments(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(video_id): AppPath<String>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<ApiResponse<PageEnvelope<CommentItem>>, AppError> {
    let video_id = parse_object_id(&video_id, "videoId")?;
    let window = params.window()?;
    ensure_exists(&video::repo(&state.db), video_id, "Video").await?;

    let pipeline = queries::video_comments(video_id, auth_user.user_id);
    let page: PageEnvelope<CommentItem> =
        paginate(&comment::repo(&state.db), &pipeline, window).await?.into();

    let message = list_message(
        page.items.is_empty(),
        "No comments found",
        "Comments fetched successfully",
    );
    Ok(ApiResponse::ok(page, message))
}

#[utoipa::path(
    post,
    path = "/{videoId}",
    tag = "Comments",
    operation_id = "addComment",
    summary = "Comment on a video",
    params(("videoId" = String, Path, description = "Video ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = ApiResponse<CommentResponse>),
        (status = 400, description = "Blank content or malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(owner = %auth_user.user_id))]
pub async fn add_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(video_id): AppPath<String>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<ApiResponse<CommentResponse>, AppError> {
    let video_id = parse_object_id(&video_id, "videoId")?;
    let content = require_non_blank(payload.content.as_deref(), "content")?;
    ensure_exists(&video::repo(&state.db), video_id, "Video").await?;

    let now = DateTime::now();
    let model = comment::Model {
        id: ObjectId::new(),
        content,
        video: video_id,
        owner: auth_user.user_id,
        created_at: now,
        updated_at: now,
    };
    comment::repo(&state.db).insert(&model).await?;

    info!(comment_id = %model.id, %video_id, "Comment added");
    Ok(ApiResponse::created(
        CommentResponse::from(model),
        "Comment added successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/c/{commentId}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Edit a comment",
    description = "Author only.",
    params(("commentId" = String, Path, description = "Comment ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = ApiResponse<CommentResponse>),
        (status = 400, description = "Blank content or malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(comment_id): AppPath<String>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<ApiResponse<CommentResponse>, AppError> {
    let comment_id = parse_object_id(&comment_id, "commentId")?;
    let content = require_non_blank(payload.content.as_deref(), "content")?;

    let comments = comment::repo(&state.db);
    let current = find_or_404(&comments, comment_id, "Comment").await?;
    auth_user.authorize(&current, "update")?;

    let updated = comments
        .update_by_id(
            comment_id,
            doc! { "$set": { "content": content, "updatedAt": DateTime::now() } },
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;

    Ok(ApiResponse::ok(
        CommentResponse::from(updated),
        "Comment updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/c/{commentId}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
    description = "Author only. Likes on the comment are deleted with it.",
    params(("commentId" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = ApiResponse<Empty>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(comment_id): AppPath<String>,
) -> Result<ApiResponse<Empty>, AppError> {
    let comment_id = parse_object_id(&comment_id, "commentId")?;
    let comments = comment::repo(&state.db);
    let current = find_or_404(&comments, comment_id, "Comment").await?;
    auth_user.authorize(&current, "delete")?;

    if !comments.delete_by_id(comment_id).await? {
        return Err(AppError::NotFound("Comment not found".into()));
    }
    let likes_removed = like::repo(&state.db)
        .delete_many(LikeTarget::Comment(comment_id).filter())
        .await?;

    info!(%comment_id, likes_removed, "Comment deleted");
    Ok(ApiResponse::ok(Empty::default(), "Comment deleted successfully"))
}
