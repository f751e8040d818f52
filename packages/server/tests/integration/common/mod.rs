use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use common::assets::filesystem::FilesystemAssetHost;
use common::{AssetBackend, AssetHostConfig};
use mongodb::Database;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use tempfile::TempDir;
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::mongo::Mongo;
use tokio::sync::OnceCell;

use vidhub::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, SearchConfig, ServerConfig,
};
use vidhub::pipeline::SearchMode;
use vidhub::state::AppState;

/// MongoDB container shared across all tests in this binary.
static SHARED_MONGO: OnceCell<(ContainerAsync<Mongo>, u16)> = OnceCell::const_new();

/// Monotonic counter for unique database names.
static DB_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Container ID for atexit cleanup.
static CONTAINER_ID: OnceLock<String> = OnceLock::new();

extern "C" fn cleanup_container() {
    if let Some(id) = CONTAINER_ID.get() {
        let _ = std::process::Command::new("docker")
            .args(["rm", "-f", "-v", id])
            .output();
    }
}

/// Start (or reuse) the shared MongoDB container and return its host port.
async fn shared_mongo_port() -> u16 {
    let (_, port) = SHARED_MONGO
        .get_or_init(|| async {
            let container = Mongo::default()
                .start()
                .await
                .expect("Failed to start MongoDB container");
            let port = container
                .get_host_port_ipv4(27017)
                .await
                .expect("Failed to get MongoDB port");

            let _ = CONTAINER_ID.set(container.id().to_string());

            // The `watchdog` feature handles signal-based cleanup (Ctrl+C),
            // but normal process exit doesn't trigger `Drop` on statics.
            unsafe { libc::atexit(cleanup_container) };

            (container, port)
        })
        .await;
    *port
}

pub mod routes {
    pub const REGISTER: &str = "/api/v1/users/register";
    pub const LOGIN: &str = "/api/v1/users/login";
    pub const LOGOUT: &str = "/api/v1/users/logout";
    pub const REFRESH: &str = "/api/v1/users/refresh-token";
    pub const CHANGE_PASSWORD: &str = "/api/v1/users/change-password";
    pub const CURRENT_USER: &str = "/api/v1/users/current-user";
    pub const UPDATE_ACCOUNT: &str = "/api/v1/users/update-account";
    pub const HISTORY: &str = "/api/v1/users/history";
    pub const VIDEOS: &str = "/api/v1/videos";
    pub const TWEETS: &str = "/api/v1/tweets";
    pub const PLAYLISTS: &str = "/api/v1/playlist";
    pub const LIKED_VIDEOS: &str = "/api/v1/likes/videos";
    pub const HEALTHCHECK: &str = "/api/v1/healthcheck";

    pub fn channel(username: &str) -> String {
        format!("/api/v1/users/c/{username}")
    }

    pub fn video(id: &str) -> String {
        format!("/api/v1/videos/{id}")
    }

    pub fn toggle_publish(id: &str) -> String {
        format!("/api/v1/videos/toggle/publish/{id}")
    }

    pub fn comments(video_id: &str) -> String {
        format!("/api/v1/comments/{video_id}")
    }

    pub fn comment(id: &str) -> String {
        format!("/api/v1/comments/c/{id}")
    }

    pub fn tweet(id: &str) -> String {
        format!("/api/v1/tweets/{id}")
    }

    pub fn user_tweets(user_id: &str) -> String {
        format!("/api/v1/tweets/user/{user_id}")
    }

    pub fn playlist(id: &str) -> String {
        format!("/api/v1/playlist/{id}")
    }

    pub fn user_playlists(user_id: &str) -> String {
        format!("/api/v1/playlist/user/{user_id}")
    }

    pub fn playlist_add(video_id: &str, playlist_id: &str) -> String {
        format!("/api/v1/playlist/add/{video_id}/{playlist_id}")
    }

    pub fn playlist_remove(video_id: &str, playlist_id: &str) -> String {
        format!("/api/v1/playlist/remove/{video_id}/{playlist_id}")
    }

    pub fn like_video(id: &str) -> String {
        format!("/api/v1/likes/toggle/v/{id}")
    }

    pub fn like_comment(id: &str) -> String {
        format!("/api/v1/likes/toggle/c/{id}")
    }

    pub fn like_tweet(id: &str) -> String {
        format!("/api/v1/likes/toggle/t/{id}")
    }

    pub fn subscribe(channel_id: &str) -> String {
        format!("/api/v1/subscriptions/c/{channel_id}")
    }

    pub fn subscribers(channel_id: &str) -> String {
        format!("/api/v1/subscriptions/c/{channel_id}/subscribers")
    }

    pub fn subscribed_channels(subscriber_id: &str) -> String {
        format!("/api/v1/subscriptions/u/{subscriber_id}/subscriptions")
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: Database,
    /// Uploaded assets live here until the app is dropped.
    _assets_dir: TempDir,
}

/// A registered and logged-in user.
pub struct TestUser {
    pub id: String,
    pub username: String,
    pub token: String,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
    /// Every `Set-Cookie` header, verbatim.
    pub set_cookies: Vec<String>,
}

fn image_part(file_name: &str) -> Part {
    Part::bytes(b"\x89PNG\r\n\x1a\nnot-really-a-png".to_vec())
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .expect("Failed to set MIME type")
}

fn video_part(file_name: &str) -> Part {
    Part::bytes(b"\x00\x00\x00\x18ftypmp42-not-really-a-video".to_vec())
        .file_name(file_name.to_string())
        .mime_str("video/mp4")
        .expect("Failed to set MIME type")
}

impl TestApp {
    pub async fn spawn() -> Self {
        let port = shared_mongo_port().await;
        let db_name = format!("test_{}", DB_COUNTER.fetch_add(1, Ordering::Relaxed));
        let db_url = format!("mongodb://127.0.0.1:{port}");

        let database = DatabaseConfig {
            url: db_url,
            name: db_name,
        };
        let (client, db) = vidhub::database::init_db(&database)
            .await
            .expect("Failed to connect to MongoDB");
        vidhub::indexes::ensure_indexes(&db)
            .await
            .expect("Failed to create indexes");

        let assets_dir = TempDir::new().expect("Failed to create assets dir");
        let assets = AssetHostConfig {
            backend: AssetBackend::Filesystem,
            root_dir: assets_dir.path().to_path_buf(),
            public_base_url: "http://127.0.0.1/assets".into(),
            max_upload_size: 16 * 1024 * 1024,
            s3: None,
        };
        let host = FilesystemAssetHost::new(
            assets.root_dir.clone(),
            assets.public_base_url.clone(),
            assets.max_upload_size,
        )
        .await
        .expect("Failed to create asset host");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database,
            auth: AuthConfig {
                access_token_secret: "access-secret-for-integration-tests".into(),
                access_token_ttl_minutes: 15,
                refresh_token_secret: "refresh-secret-for-integration-tests".into(),
                refresh_token_ttl_days: 10,
                secure_cookies: false,
            },
            assets,
            // The test container is plain MongoDB, without Atlas Search.
            search: SearchConfig {
                mode: SearchMode::Text,
            },
        };

        let state = AppState {
            client,
            db: db.clone(),
            config: Arc::new(app_config),
            assets: Arc::new(host),
        };

        let app = vidhub::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            _assets_dir: assets_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_multipart(&self, path: &str, form: Form, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart PATCH request");

        TestResponse::from_response(res).await
    }

    /// Register through the multipart endpoint.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> TestResponse {
        let form = Form::new()
            .text("username", username.to_string())
            .text("email", email.to_string())
            .text("password", password.to_string())
            .text("fullName", format!("{username} Test"))
            .part("avatar", image_part("avatar.png"));

        let res = self
            .client
            .post(self.url(routes::REGISTER))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send register request");

        TestResponse::from_response(res).await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.post_without_token(
            routes::LOGIN,
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Register a user and log in.
    pub async fn create_user(&self, username: &str) -> TestUser {
        let password = "correct-horse-battery";
        let reg = self
            .register(username, &format!("{username}@example.com"), password)
            .await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);

        let res = self.login(username, password).await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        TestUser {
            id: reg.id(),
            username: username.to_string(),
            token: res.body["data"]["accessToken"]
                .as_str()
                .expect("Login response should contain an access token")
                .to_string(),
        }
    }

    /// Publish a video and return its `_id`.
    pub async fn publish_video(&self, token: &str, title: &str) -> String {
        let form = Form::new()
            .text("title", title.to_string())
            .text("description", format!("About {title}"))
            .text("duration", "42.5")
            .part("videoFile", video_part("clip.mp4"))
            .part("thumbnail", image_part("thumb.png"));

        let res = self
            .client
            .post(self.url(routes::VIDEOS))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("Failed to send publish request");
        let res = TestResponse::from_response(res).await;
        assert_eq!(res.status, 201, "publish_video failed: {}", res.text);
        res.id()
    }

    /// Comment on a video and return the comment `_id`.
    pub async fn add_comment(&self, token: &str, video_id: &str, content: &str) -> String {
        let res = self
            .post_with_token(
                &routes::comments(video_id),
                &json!({ "content": content }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "add_comment failed: {}", res.text);
        res.id()
    }

    pub async fn create_tweet(&self, token: &str, content: &str) -> String {
        let res = self
            .post_with_token(routes::TWEETS, &json!({ "content": content }), token)
            .await;
        assert_eq!(res.status, 201, "create_tweet failed: {}", res.text);
        res.id()
    }

    pub async fn create_playlist(&self, token: &str, name: &str) -> String {
        let res = self
            .post_with_token(
                routes::PLAYLISTS,
                &json!({ "name": name, "description": "x" }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_playlist failed: {}", res.text);
        res.id()
    }

    /// Count documents in a collection matching `filter`.
    pub async fn count(&self, collection: &str, filter: mongodb::bson::Document) -> u64 {
        self.db
            .collection::<mongodb::bson::Document>(collection)
            .count_documents(filter)
            .await
            .expect("count_documents failed")
    }
}

pub fn image_form(field: &str) -> Form {
    Form::new().part(field.to_string(), image_part("new.png"))
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let set_cookies = res
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            text,
            body,
            set_cookies,
        }
    }

    /// `data._id` of the envelope.
    pub fn id(&self) -> String {
        self.body["data"]["_id"]
            .as_str()
            .expect("response data should contain '_id'")
            .to_string()
    }

    pub fn error_kind(&self) -> &str {
        self.body["errorKind"].as_str().unwrap_or_default()
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.set_cookies
            .iter()
            .any(|c| c.starts_with(&format!("{name}=")))
    }
}
