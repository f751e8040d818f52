pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod guard;
pub mod handlers;
pub mod indexes;
pub mod models;
pub mod pagination;
pub mod pipeline;
pub mod response;
pub mod routes;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use common::AssetBackend;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::cookies::ACCESS_TOKEN;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "VidHub API",
        version = "1.0.0",
        description = "API for the VidHub video sharing platform"
    ),
    tags(
        (name = "Health", description = "Liveness probe"),
        (name = "Users", description = "Accounts, sessions and channel profiles"),
        (name = "Videos", description = "Video upload, listing and management"),
        (name = "Comments", description = "Comments on videos"),
        (name = "Tweets", description = "Short text posts"),
        (name = "Playlists", description = "User-curated video lists"),
        (name = "Likes", description = "Likes on videos, comments and tweets"),
        (name = "Subscriptions", description = "Channel subscriptions"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(ACCESS_TOKEN))),
        );
    }
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cors
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(cors.max_age))
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".into())
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes(&state.config))
        .split_for_parts();

    let config = state.config.clone();
    let mut router = router
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api));

    if config.assets.backend == AssetBackend::Filesystem {
        router = router.nest_service("/assets", ServeDir::new(&config.assets.root_dir));
    }

    router
        .fallback(not_found)
        .layer(cors_layer(&config.server.cors))
        .layer(TraceLayer::new_for_http())
}
