use axum::extract::DefaultBodyLimit;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload_limit = usize::try_from(config.assets.max_upload_size).unwrap_or(usize::MAX);

    OpenApiRouter::new()
        .routes(routes!(handlers::health::healthcheck))
        .nest("/users", user_routes(upload_limit))
        .nest("/videos", video_routes(upload_limit))
        .nest("/comments", comment_routes())
        .nest("/tweets", tweet_routes())
        .nest("/playlist", playlist_routes())
        .nest("/likes", like_routes())
        .nest("/subscriptions", subscription_routes())
}

fn user_routes(upload_limit: usize) -> OpenApiRouter<AppState> {
    use handlers::user::*;

    let account = OpenApiRouter::new()
        .routes(routes!(login))
        .routes(routes!(logout))
        .routes(routes!(refresh_access_token))
        .routes(routes!(change_password))
        .routes(routes!(current_user))
        .routes(routes!(update_account))
        .routes(routes!(channel_profile))
        .routes(routes!(watch_history));

    let uploads = OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(update_avatar))
        .routes(routes!(update_cover_image))
        .layer(DefaultBodyLimit::max(upload_limit));

    account.merge(uploads)
}

fn video_routes(upload_limit: usize) -> OpenApiRouter<AppState> {
    use handlers::video::*;

    OpenApiRouter::new()
        .routes(routes!(list_videos, publish_video))
        .routes(routes!(get_video, update_video, delete_video))
        .routes(routes!(toggle_publish_status))
        .layer(DefaultBodyLimit::max(upload_limit))
}

fn comment_routes() -> OpenApiRouter<AppState> {
    use handlers::comment::*;

    OpenApiRouter::new()
        .routes(routes!(list_comments, add_comment))
        .routes(routes!(update_comment, delete_comment))
}

fn tweet_routes() -> OpenApiRouter<AppState> {
    use handlers::tweet::*;

    OpenApiRouter::new()
        .routes(routes!(create_tweet))
        .routes(routes!(user_tweets))
        .routes(routes!(update_tweet, delete_tweet))
}

fn playlist_routes() -> OpenApiRouter<AppState> {
    use handlers::playlist::*;

    OpenApiRouter::new()
        .routes(routes!(create_playlist))
        .routes(routes!(user_playlists))
        .routes(routes!(get_playlist, update_playlist, delete_playlist))
        .routes(routes!(add_video))
        .routes(routes!(remove_video))
}

fn like_routes() -> OpenApiRouter<AppState> {
    use handlers::like::*;

    OpenApiRouter::new()
        .routes(routes!(toggle_video_like))
        .routes(routes!(toggle_comment_like))
        .routes(routes!(toggle_tweet_like))
        .routes(routes!(liked_videos))
}

fn subscription_routes() -> OpenApiRouter<AppState> {
    use handlers::subscription::*;

    OpenApiRouter::new()
        .routes(routes!(toggle_subscription))
        .routes(routes!(channel_subscribers))
        .routes(routes!(subscribed_channels))
}
