use serde_json::json;

use crate::common::{TestApp, image_form, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register() {
        let app = TestApp::spawn().await;

        let res = app.register("Alice", "Alice@Example.com", "securepass").await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["statusCode"], 201);
        assert_eq!(res.body["data"]["username"], "alice");
        assert_eq!(res.body["data"]["email"], "alice@example.com");
        assert!(res.body["data"]["avatar"]["url"].is_string());
        assert!(res.body["data"].get("password").is_none());
        assert!(res.body["data"].get("refreshToken").is_none());
    }

    #[tokio::test]
    async fn usernames_differing_only_in_case_conflict() {
        let app = TestApp::spawn().await;

        let first = app.register("Alice", "first@example.com", "securepass").await;
        assert_eq!(first.status, 201, "{}", first.text);

        let res = app.register("alice", "second@example.com", "securepass").await;

        assert_eq!(res.status, 409);
        assert_eq!(res.error_kind(), "CONFLICT");
    }

    #[tokio::test]
    async fn missing_avatar_is_rejected() {
        let app = TestApp::spawn().await;
        let form = reqwest::multipart::Form::new()
            .text("username", "bob")
            .text("email", "bob@example.com")
            .text("password", "securepass")
            .text("fullName", "Bob");

        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::REGISTER))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app.register("   ", "bob@example.com", "securepass").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_kind(), "BAD_REQUEST");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn correct_password_returns_tokens_in_body_and_cookies() {
        let app = TestApp::spawn().await;
        app.register("alice", "alice@example.com", "securepass").await;

        let res = app.login("alice", "securepass").await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["data"]["accessToken"].is_string());
        assert!(res.body["data"]["refreshToken"].is_string());
        assert_eq!(res.body["data"]["user"]["username"], "alice");
        assert!(res.has_cookie("accessToken"));
        assert!(res.has_cookie("refreshToken"));
        assert!(res.set_cookies.iter().all(|c| c.contains("HttpOnly")));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized_without_cookies() {
        let app = TestApp::spawn().await;
        app.register("alice", "alice@example.com", "securepass").await;

        let res = app.login("alice", "wrong-password").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.error_kind(), "INVALID_CREDENTIALS");
        assert!(res.set_cookies.is_empty());
    }

    #[tokio::test]
    async fn login_by_email_is_case_insensitive() {
        let app = TestApp::spawn().await;
        app.register("alice", "alice@example.com", "securepass").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({ "email": "ALICE@example.com", "password": "securepass" }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.login("nobody", "securepass").await;

        assert_eq!(res.status, 404);
    }
}

mod tokens {
    use super::*;

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::CURRENT_USER).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.error_kind(), "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::CURRENT_USER, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.error_kind(), "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn current_user_returns_the_caller() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app.get_with_token(routes::CURRENT_USER, &alice.token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"]["_id"], alice.id.as_str());
        assert_eq!(res.body["data"]["username"], alice.username.as_str());
    }

    #[tokio::test]
    async fn refresh_rotates_and_rejects_the_old_token() {
        let app = TestApp::spawn().await;
        app.register("alice", "alice@example.com", "securepass").await;
        let login = app.login("alice", "securepass").await;
        let old = login.body["data"]["refreshToken"].as_str().unwrap().to_string();

        let first = app
            .post_without_token(routes::REFRESH, &json!({ "refreshToken": old }))
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_ne!(first.body["data"]["refreshToken"], old.as_str());
        assert!(first.has_cookie("refreshToken"));

        let reused = app
            .post_without_token(routes::REFRESH, &json!({ "refreshToken": old }))
            .await;
        assert_eq!(reused.status, 401);
    }

    #[tokio::test]
    async fn logout_revokes_the_refresh_token() {
        let app = TestApp::spawn().await;
        app.register("alice", "alice@example.com", "securepass").await;
        let login = app.login("alice", "securepass").await;
        let access = login.body["data"]["accessToken"].as_str().unwrap();
        let refresh = login.body["data"]["refreshToken"].as_str().unwrap();

        let res = app.post_with_token(routes::LOGOUT, &json!({}), access).await;
        assert_eq!(res.status, 200);

        let res = app
            .post_without_token(routes::REFRESH, &json!({ "refreshToken": refresh }))
            .await;
        assert_eq!(res.status, 401);
    }
}

mod account {
    use super::*;

    #[tokio::test]
    async fn change_password_requires_the_old_one() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let wrong = app
            .post_with_token(
                routes::CHANGE_PASSWORD,
                &json!({ "oldPassword": "nope", "newPassword": "brand-new-pass" }),
                &alice.token,
            )
            .await;
        assert_eq!(wrong.status, 400);

        let ok = app
            .post_with_token(
                routes::CHANGE_PASSWORD,
                &json!({ "oldPassword": "correct-horse-battery", "newPassword": "brand-new-pass" }),
                &alice.token,
            )
            .await;
        assert_eq!(ok.status, 200, "{}", ok.text);

        assert_eq!(app.login("alice", "brand-new-pass").await.status, 200);
        assert_eq!(app.login("alice", "correct-horse-battery").await.status, 401);
    }

    #[tokio::test]
    async fn update_account_rejects_a_taken_email() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        app.create_user("bob").await;

        let res = app
            .patch_with_token(
                routes::UPDATE_ACCOUNT,
                &json!({ "fullName": "Alice L", "email": "bob@example.com" }),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn avatar_can_be_replaced() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let before = app.get_with_token(routes::CURRENT_USER, &alice.token).await;

        let res = app
            .patch_multipart("/api/v1/users/avatar", image_form("avatar"), &alice.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_ne!(
            res.body["data"]["avatar"]["url"],
            before.body["data"]["avatar"]["url"]
        );
    }

    #[tokio::test]
    async fn channel_profile_counts_subscribers() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        app.post_with_token(&routes::subscribe(&alice.id), &json!({}), &bob.token)
            .await;

        let res = app.get_with_token(&routes::channel("alice"), &bob.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"]["subscribersCount"], 1);
        assert_eq!(res.body["data"]["isSubscribed"], true);
        assert_eq!(res.body["data"]["channelsSubscribedToCount"], 0);
    }

    #[tokio::test]
    async fn unknown_channel_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app.get_with_token(&routes::channel("ghost"), &alice.token).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn healthcheck_is_public() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::HEALTHCHECK).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"]["status"], "OK");
    }
}
