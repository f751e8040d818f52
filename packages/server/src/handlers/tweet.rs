use axum::extract::State;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use tracing::{info, instrument};

use crate::entity::like::LikeTarget;
use crate::entity::{decode_all, like, tweet};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::path::AppPath;
use crate::models::shared::require_non_blank;
use crate::models::tweet::*;
use crate::pipeline::queries;
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::utils::object_id::parse_object_id;

use super::{ensure_user_exists, find_or_404, list_message};

#[utoipa::path(
    post,
    path = "/",
    tag = "Tweets",
    operation_id = "createTweet",
    summary = "Post a tweet",
    request_body = TweetRequest,
    responses(
        (status = 201, description = "Tweet created", body = ApiResponse<TweetResponse>),
        (status = 400, description = "Blank content (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(owner = %auth_user.user_id))]
pub async fn create_tweet(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<TweetRequest>,
) -> Result<ApiResponse<TweetResponse>, AppError> {
    let content = require_non_blank(payload.content.as_deref(), "content")?;

    let now = DateTime::now();
    let model = tweet::Model {
        id: ObjectId::new(),
        content,
        owner: auth_user.user_id,
        created_at: now,
        updated_at: now,
    };
    tweet::repo(&state.db).insert(&model).await?;

    info!(tweet_id = %model.id, "Tweet created");
    Ok(ApiResponse::created(
        TweetResponse::from(model),
        "Tweet created successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/user/{userId}",
    tag = "Tweets",
    operation_id = "getUserTweets",
    summary = "List a user's tweets",
    description = "Newest first, with like counts as seen by the caller.",
    params(("userId" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Tweets", body = ApiResponse<Vec<TweetItem>>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn user_tweets(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(user_id): AppPath<String>,
) -> Result<ApiResponse<Vec<TweetItem>>, AppError> {
    let user_id = parse_object_id(&user_id, "userId")?;
    ensure_user_exists(&state.db, user_id).await?;

    let rows = tweet::repo(&state.db)
        .aggregate(&queries::user_tweets(user_id, auth_user.user_id))
        .await?;
    let tweets: Vec<TweetItem> = decode_all(rows)?;

    let message = list_message(
        tweets.is_empty(),
        "No tweets found",
        "Tweets fetched successfully",
    );
    Ok(ApiResponse::ok(tweets, message))
}

#[utoipa::path(
    patch,
    path = "/{tweetId}",
    tag = "Tweets",
    operation_id = "updateTweet",
    summary = "Edit a tweet",
    description = "Author only.",
    params(("tweetId" = String, Path, description = "Tweet ID")),
    request_body = TweetRequest,
    responses(
        (status = 200, description = "Tweet updated", body = ApiResponse<TweetResponse>),
        (status = 400, description = "Blank content or malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Tweet not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_tweet(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(tweet_id): AppPath<String>,
    AppJson(payload): AppJson<TweetRequest>,
) -> Result<ApiResponse<TweetResponse>, AppError> {
    let tweet_id = parse_object_id(&tweet_id, "tweetId")?;
    let content = require_non_blank(payload.content.as_deref(), "content")?;

    let tweets = tweet::repo(&state.db);
    let current = find_or_404(&tweets, tweet_id, "Tweet").await?;
    auth_user.authorize(&current, "update")?;

    let updated = tweets
        .update_by_id(
            tweet_id,
            doc! { "$set": { "content": content, "updatedAt": DateTime::now() } },
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Tweet not found".into()))?;

    Ok(ApiResponse::ok(
        TweetResponse::from(updated),
        "Tweet updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/{tweetId}",
    tag = "Tweets",
    operation_id = "deleteTweet",
    summary = "Delete a tweet",
    description = "Author only. Likes on the tweet are deleted with it.",
    params(("tweetId" = String, Path, description = "Tweet ID")),
    responses(
        (status = 200, description = "Tweet deleted", body = ApiResponse<Empty>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Tweet not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn delete_tweet(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(tweet_id): AppPath<String>,
) -> Result<ApiResponse<Empty>, AppError> {
    let tweet_id = parse_object_id(&tweet_id, "tweetId")?;
    let tweets = tweet::repo(&state.db);
    let current = find_or_404(&tweets, tweet_id, "Tweet").await?;
    auth_user.authorize(&current, "delete")?;

    if !tweets.delete_by_id(tweet_id).await? {
        return Err(AppError::NotFound("Tweet not found".into()));
    }
    let likes_removed = like::repo(&state.db)
        .delete_many(LikeTarget::Tweet(tweet_id).filter())
        .await?;

    info!(%tweet_id, likes_removed, "Tweet deleted");
    Ok(ApiResponse::ok(Empty::default(), "Tweet deleted successfully"))
}
