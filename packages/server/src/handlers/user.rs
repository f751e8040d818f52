use axum::body::Bytes;
use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;
use common::AssetKind;
use mongodb::bson::{self, DateTime, Document, doc, oid::ObjectId};
use tracing::{info, instrument};

use crate::entity::asset::AssetRef;
use crate::entity::{decode_all, user};
use crate::error::{AppError, ErrorBody, is_duplicate_key};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::multipart::{MultipartForm, TempUpload};
use crate::extractors::path::AppPath;
use crate::models::shared::{
    normalize_identity, optional_non_blank, require_non_blank, validate_email,
};
use crate::models::user::*;
use crate::models::video::VideoCard;
use crate::pipeline::{order_by_ids, queries};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::utils::{cookies, hash, jwt, upload};

use super::{find_or_404, list_message};

fn require_password(value: Option<&str>, name: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(AppError::BadRequest(format!("{name} is required"))),
    }
}

/// Sign a new token pair and make its refresh token the only one accepted.
///
/// With `expected`, the swap only happens if the stored token still equals
/// it, so a refresh token can be exchanged at most once.
async fn rotate_tokens(
    state: &AppState,
    user: &user::Model,
    expected: Option<&str>,
) -> Result<TokenPair, AppError> {
    let auth = &state.config.auth;
    let access_token = jwt::sign_access(user, auth)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;
    let refresh_token = jwt::sign_refresh(user.id, auth)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;

    let mut filter = doc! { "_id": user.id };
    if let Some(old) = expected {
        filter.insert("refreshToken", old);
    }
    let matched = user::repo(&state.db)
        .update_one(filter, doc! { "$set": { "refreshToken": refresh_token.as_str() } })
        .await?;
    if matched == 0 {
        return Err(AppError::Unauthorized(
            "Refresh token is expired or used".into(),
        ));
    }

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Users",
    operation_id = "registerUser",
    summary = "Register a new user",
    description = "Creates an account. `username` and `email` are trimmed and lowercased and must be unique. \
        `avatar` is required, `coverImage` optional; both must be images.",
    request_body(content = RegisterForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "User registered", body = ApiResponse<UserResponse>),
        (status = 400, description = "Missing field or bad file (BAD_REQUEST)", body = ErrorBody),
        (status = 409, description = "Username or email taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, form), fields(username = tracing::field::Empty))]
pub async fn register(
    State(state): State<AppState>,
    mut form: MultipartForm,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let username = normalize_identity(&require_non_blank(form.text("username"), "username")?);
    let email = normalize_identity(&require_non_blank(form.text("email"), "email")?);
    let full_name = require_non_blank(form.text("fullName"), "fullName")?;
    let password = require_password(form.text("password"), "password")?;
    validate_email(&email)?;
    tracing::Span::current().record("username", username.as_str());

    let users = user::repo(&state.db);
    if users
        .exists(doc! { "$or": [{ "username": username.as_str() }, { "email": email.as_str() }] })
        .await?
    {
        return Err(AppError::Conflict(
            "User with email or username already exists".into(),
        ));
    }

    let avatar_file = form.require_file("avatar", AssetKind::Image)?;
    let cover_file = form.take_file("coverImage", AssetKind::Image)?;

    let password = hash::hash_password(&password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let (avatar, _) = upload::store(&*state.assets, &avatar_file, AssetKind::Image).await?;
    let cover_image = match &cover_file {
        Some(file) => match upload::store(&*state.assets, file, AssetKind::Image).await {
            Ok((cover, _)) => Some(cover),
            Err(e) => {
                upload::discard(&*state.assets, &avatar, AssetKind::Image).await;
                return Err(e);
            }
        },
        None => None,
    };

    let now = DateTime::now();
    let model = user::Model {
        id: ObjectId::new(),
        username,
        email,
        full_name,
        password,
        avatar,
        cover_image,
        watch_history: Vec::new(),
        refresh_token: None,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = users.insert(&model).await {
        upload::discard(&*state.assets, &model.avatar, AssetKind::Image).await;
        if let Some(cover) = &model.cover_image {
            upload::discard(&*state.assets, cover, AssetKind::Image).await;
        }
        if is_duplicate_key(&e) {
            tracing::debug!("Registration race condition: unique index caught on insert");
            return Err(AppError::Conflict(
                "User with email or username already exists".into(),
            ));
        }
        return Err(e.into());
    }

    info!(user_id = %model.id, "User registered");
    Ok(ApiResponse::created(
        UserResponse::from(model),
        "User registered successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Users",
    operation_id = "loginUser",
    summary = "Log in with username or email",
    description = "Returns the user and a token pair, and sets both as HttpOnly cookies.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Missing field (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Wrong password (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "No such user (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload), fields(username = ?payload.username))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>), AppError> {
    let password = require_password(payload.password.as_deref(), "password")?;

    let mut identities = Vec::new();
    if let Some(username) = payload.username.as_deref().map(normalize_identity)
        && !username.is_empty()
    {
        identities.push(doc! { "username": username });
    }
    if let Some(email) = payload.email.as_deref().map(normalize_identity)
        && !email.is_empty()
    {
        identities.push(doc! { "email": email });
    }
    if identities.is_empty() {
        return Err(AppError::BadRequest("username or email is required".into()));
    }

    let user = user::repo(&state.db)
        .find_one(doc! { "$or": identities })
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".into()))?;

    let is_valid = hash::verify_password(&password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let tokens = rotate_tokens(&state, &user, None).await?;
    let jar = cookies::set_auth_cookies(
        jar,
        &tokens.access_token,
        &tokens.refresh_token,
        state.config.auth.secure_cookies,
    );

    info!(user_id = %user.id, "User logged in");
    Ok((
        jar,
        ApiResponse::ok(
            LoginResponse {
                user: UserResponse::from(user),
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Users",
    operation_id = "logoutUser",
    summary = "Log out",
    description = "Revokes the stored refresh token and clears both auth cookies.",
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<Empty>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, jar), fields(user_id = %auth_user.user_id))]
pub async fn logout(
    auth_user: AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<Empty>), AppError> {
    user::repo(&state.db)
        .update_one(
            doc! { "_id": auth_user.user_id },
            doc! { "$unset": { "refreshToken": "" } },
        )
        .await?;

    Ok((
        cookies::clear_auth_cookies(jar),
        ApiResponse::ok(Empty::default(), "User logged out"),
    ))
}

#[utoipa::path(
    post,
    path = "/refresh-token",
    tag = "Users",
    operation_id = "refreshAccessToken",
    summary = "Exchange a refresh token for a new token pair",
    description = "Reads the refresh token from the `refreshToken` cookie, or from the JSON body. \
        The token must be the one most recently issued to the user; it is consumed by this call.",
    request_body(content = RefreshRequest, content_type = "application/json", description = "Optional when the cookie is sent"),
    responses(
        (status = 200, description = "New tokens issued", body = ApiResponse<TokenPair>),
        (status = 401, description = "Missing, invalid or reused token (UNAUTHORIZED)", body = ErrorBody),
    ),
)]
#[instrument(skip_all)]
pub async fn refresh_access_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, ApiResponse<TokenPair>), AppError> {
    let from_cookie = jar
        .get(cookies::REFRESH_TOKEN)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());
    let incoming = match from_cookie {
        Some(token) => Some(token),
        None if body.is_empty() => None,
        None => serde_json::from_slice::<RefreshRequest>(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?
            .refresh_token,
    };
    let incoming =
        incoming.ok_or_else(|| AppError::Unauthorized("Refresh token is required".into()))?;

    let claims = jwt::verify_refresh(&incoming, &state.config.auth)
        .map_err(|_| AppError::Unauthorized("Invalid refresh token".into()))?;
    let user_id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid refresh token".into()))?;
    let user = user::repo(&state.db)
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".into()))?;

    if user.refresh_token.as_deref() != Some(incoming.as_str()) {
        return Err(AppError::Unauthorized(
            "Refresh token is expired or used".into(),
        ));
    }

    let tokens = rotate_tokens(&state, &user, Some(&incoming)).await?;
    let jar = cookies::set_auth_cookies(
        jar,
        &tokens.access_token,
        &tokens.refresh_token,
        state.config.auth.secure_cookies,
    );
    Ok((jar, ApiResponse::ok(tokens, "Access token refreshed")))
}

#[utoipa::path(
    post,
    path = "/change-password",
    tag = "Users",
    operation_id = "changePassword",
    summary = "Change the caller's password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<Empty>),
        (status = 400, description = "Missing field or wrong old password (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn change_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<ApiResponse<Empty>, AppError> {
    let old_password = require_password(payload.old_password.as_deref(), "oldPassword")?;
    let new_password = require_password(payload.new_password.as_deref(), "newPassword")?;

    let users = user::repo(&state.db);
    let user = find_or_404(&users, auth_user.user_id, "User").await?;

    let is_valid = hash::verify_password(&old_password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::BadRequest("Invalid old password".into()));
    }

    let hashed = hash::hash_password(&new_password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;
    users
        .update_one(
            doc! { "_id": user.id },
            doc! { "$set": { "password": hashed, "updatedAt": DateTime::now() } },
        )
        .await?;

    Ok(ApiResponse::ok(Empty::default(), "Password changed successfully"))
}

#[utoipa::path(
    get,
    path = "/current-user",
    tag = "Users",
    operation_id = "getCurrentUser",
    summary = "Get the authenticated user",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn current_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = find_or_404(&user::repo(&state.db), auth_user.user_id, "User").await?;
    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Current user fetched successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/update-account",
    tag = "Users",
    operation_id = "updateAccount",
    summary = "Update full name and/or email",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Nothing to update or invalid email (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Email taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_account(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateAccountRequest>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let full_name = optional_non_blank(payload.full_name.as_deref(), "fullName")?;
    let email = optional_non_blank(payload.email.as_deref(), "email")?
        .map(|e| normalize_identity(&e));
    if let Some(email) = &email {
        validate_email(email)?;
    }
    if full_name.is_none() && email.is_none() {
        return Err(AppError::BadRequest("fullName or email is required".into()));
    }

    let mut set = doc! { "updatedAt": DateTime::now() };
    if let Some(full_name) = full_name {
        set.insert("fullName", full_name);
    }
    if let Some(email) = email {
        set.insert("email", email);
    }

    let user = user::repo(&state.db)
        .update_by_id(auth_user.user_id, doc! { "$set": set })
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Conflict("Email is already in use".into())
            } else {
                AppError::from(e)
            }
        })?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Account details updated successfully",
    ))
}

/// Upload `file`, point `field` at it, then drop the previous image.
async fn replace_user_image(
    state: &AppState,
    user_id: ObjectId,
    field: &str,
    file: &TempUpload,
    previous: impl Fn(&user::Model) -> Option<AssetRef>,
) -> Result<user::Model, AppError> {
    let users = user::repo(&state.db);
    let current = find_or_404(&users, user_id, "User").await?;

    let (fresh, _) = upload::store(&*state.assets, file, AssetKind::Image).await?;
    let mut set = Document::new();
    set.insert(field, bson::to_bson(&fresh)?);
    set.insert("updatedAt", DateTime::now());

    let updated = match users.update_by_id(user_id, doc! { "$set": set }).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            upload::discard(&*state.assets, &fresh, AssetKind::Image).await;
            return Err(AppError::NotFound("User not found".into()));
        }
        Err(e) => {
            upload::discard(&*state.assets, &fresh, AssetKind::Image).await;
            return Err(e.into());
        }
    };

    if let Some(old) = previous(&current) {
        upload::discard(&*state.assets, &old, AssetKind::Image).await;
    }
    Ok(updated)
}

#[utoipa::path(
    patch,
    path = "/avatar",
    tag = "Users",
    operation_id = "updateAvatar",
    summary = "Replace the avatar image",
    request_body(content = AvatarForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Avatar updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Missing or invalid image (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = %auth_user.user_id))]
pub async fn update_avatar(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut form: MultipartForm,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let file = form.require_file("avatar", AssetKind::Image)?;
    let user = replace_user_image(&state, auth_user.user_id, "avatar", &file, |u| {
        Some(u.avatar.clone())
    })
    .await?;
    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Avatar image updated successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/cover-image",
    tag = "Users",
    operation_id = "updateCoverImage",
    summary = "Replace the cover image",
    request_body(content = CoverImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Cover image updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Missing or invalid image (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = %auth_user.user_id))]
pub async fn update_cover_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut form: MultipartForm,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let file = form.require_file("coverImage", AssetKind::Image)?;
    let user = replace_user_image(&state, auth_user.user_id, "coverImage", &file, |u| {
        u.cover_image.clone()
    })
    .await?;
    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Cover image updated successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/c/{username}",
    tag = "Users",
    operation_id = "getChannelProfile",
    summary = "Public channel profile",
    description = "Returns a user's public profile with subscriber counts and whether the caller is subscribed.",
    params(("username" = String, Path, description = "Channel username (case-insensitive)")),
    responses(
        (status = 200, description = "Channel profile", body = ApiResponse<ChannelProfile>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No such channel (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(viewer = %auth_user.user_id))]
pub async fn channel_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(username): AppPath<String>,
) -> Result<ApiResponse<ChannelProfile>, AppError> {
    let username = normalize_identity(&username);
    if username.is_empty() {
        return Err(AppError::BadRequest("username is missing".into()));
    }

    let rows = user::repo(&state.db)
        .aggregate(&queries::channel_profile(&username, auth_user.user_id))
        .await?;
    let profile = decode_all::<ChannelProfile>(rows)?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("Channel does not exist".into()))?;

    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}

#[utoipa::path(
    get,
    path = "/history",
    tag = "Users",
    operation_id = "getWatchHistory",
    summary = "The caller's watch history",
    description = "Videos in the order they were first watched. Deleted videos are omitted.",
    responses(
        (status = 200, description = "Watch history", body = ApiResponse<Vec<VideoCard>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn watch_history(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<VideoCard>>, AppError> {
    let rows = user::repo(&state.db)
        .aggregate(&queries::watch_history(auth_user.user_id))
        .await?;
    let row = decode_all::<WatchHistoryRow>(rows)?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let videos = order_by_ids(row.videos, &row.watch_history, |v| v.id);
    let message = list_message(
        videos.is_empty(),
        "Watch history is empty",
        "Watch history fetched successfully",
    );
    Ok(ApiResponse::ok(videos, message))
}
