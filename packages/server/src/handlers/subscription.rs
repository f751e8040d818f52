use axum::extract::State;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use tracing::{debug, info, instrument};

use crate::entity::{decode_all, subscription};
use crate::error::{AppError, ErrorBody, is_duplicate_key};
use crate::extractors::auth::AuthUser;
use crate::extractors::path::AppPath;
use crate::models::subscription::*;
use crate::pipeline::queries;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::utils::object_id::parse_object_id;

use super::{ensure_user_exists, list_message};

#[utoipa::path(
    post,
    path = "/c/{channelId}",
    tag = "Subscriptions",
    operation_id = "toggleSubscription",
    summary = "Subscribe to or unsubscribe from a channel",
    params(("channelId" = String, Path, description = "Channel (user) ID")),
    responses(
        (status = 200, description = "Subscription state after the toggle", body = ApiResponse<SubscriptionStatus>),
        (status = 400, description = "Malformed id or own channel (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Channel not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(subscriber = %auth_user.user_id))]
pub async fn toggle_subscription(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(channel_id): AppPath<String>,
) -> Result<ApiResponse<SubscriptionStatus>, AppError> {
    let channel_id = parse_object_id(&channel_id, "channelId")?;
    if channel_id == auth_user.user_id {
        return Err(AppError::BadRequest(
            "You cannot subscribe to your own channel".into(),
        ));
    }
    ensure_user_exists(&state.db, channel_id).await?;

    let subscriptions = subscription::repo(&state.db);
    let existing = doc! { "subscriber": auth_user.user_id, "channel": channel_id };
    if subscriptions.delete_one(existing).await? {
        info!(%channel_id, "Unsubscribed");
        return Ok(ApiResponse::ok(
            SubscriptionStatus {
                is_subscribed: false,
            },
            "Unsubscribed successfully",
        ));
    }

    let now = DateTime::now();
    let model = subscription::Model {
        id: ObjectId::new(),
        subscriber: auth_user.user_id,
        channel: channel_id,
        created_at: now,
        updated_at: now,
    };
    match subscriptions.insert(&model).await {
        Ok(()) => info!(%channel_id, "Subscribed"),
        Err(e) if is_duplicate_key(&e) => debug!(%channel_id, "Subscription already present"),
        Err(e) => return Err(e.into()),
    }
    Ok(ApiResponse::ok(
        SubscriptionStatus {
            is_subscribed: true,
        },
        "Subscribed successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/c/{channelId}/subscribers",
    tag = "Subscriptions",
    operation_id = "getChannelSubscribers",
    summary = "List a channel's subscribers",
    description = "Most recent first. Each subscriber carries their own subscriber count and \
        whether the caller follows them.",
    params(("channelId" = String, Path, description = "Channel (user) ID")),
    responses(
        (status = 200, description = "Subscribers", body = ApiResponse<Vec<Subscriber>>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Channel not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn channel_subscribers(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(channel_id): AppPath<String>,
) -> Result<ApiResponse<Vec<Subscriber>>, AppError> {
    let channel_id = parse_object_id(&channel_id, "channelId")?;
    ensure_user_exists(&state.db, channel_id).await?;

    let rows = subscription::repo(&state.db)
        .aggregate(&queries::channel_subscribers(channel_id, auth_user.user_id))
        .await?;
    let subscribers: Vec<Subscriber> = decode_all(rows)?;

    let message = list_message(
        subscribers.is_empty(),
        "No subscribers found",
        "Subscribers fetched successfully",
    );
    Ok(ApiResponse::ok(subscribers, message))
}

#[utoipa::path(
    get,
    path = "/u/{subscriberId}/subscriptions",
    tag = "Subscriptions",
    operation_id = "getSubscribedChannels",
    summary = "List the channels a user follows",
    description = "Most recent subscription first, each with the channel's latest published video.",
    params(("subscriberId" = String, Path, description = "Subscriber (user) ID")),
    responses(
        (status = 200, description = "Channels", body = ApiResponse<Vec<SubscribedChannel>>),
        (status = 400, description = "Malformed id (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn subscribed_channels(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(subscriber_id): AppPath<String>,
) -> Result<ApiResponse<Vec<SubscribedChannel>>, AppError> {
    let subscriber_id = parse_object_id(&subscriber_id, "subscriberId")?;
    ensure_user_exists(&state.db, subscriber_id).await?;

    let rows = subscription::repo(&state.db)
        .aggregate(&queries::subscribed_channels(subscriber_id))
        .await?;
    let channels: Vec<SubscribedChannel> = decode_all(rows)?;

    let message = list_message(
        channels.is_empty(),
        "No subscribed channels found",
        "Subscribed channels fetched successfully",
    );
    Ok(ApiResponse::ok(channels, message))
}
