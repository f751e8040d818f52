use mongodb::bson::{doc, oid::ObjectId};
use reqwest::multipart::Form;
use serde_json::json;

use crate::common::{TestApp, image_form, routes};

fn oid(hex: &str) -> ObjectId {
    ObjectId::parse_str(hex).unwrap()
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn invalid_pagination_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        for query in ["page=0", "page=-1", "page=abc", "limit=0", "limit=ten"] {
            let res = app
                .get_with_token(&format!("{}?{query}", routes::VIDEOS), &alice.token)
                .await;
            assert_eq!(res.status, 400, "{query} should be rejected");
            assert_eq!(res.body["message"], "Invalid page or limit value");
        }
    }

    #[tokio::test]
    async fn page_holds_at_most_limit_items() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        for title in ["one", "two", "three"] {
            app.publish_video(&alice.token, title).await;
        }

        let res = app
            .get_with_token(&format!("{}?page=1&limit=2", routes::VIDEOS), &alice.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let data = &res.body["data"];
        assert_eq!(data["items"].as_array().unwrap().len(), 2);
        assert_eq!(data["totalCount"], 3);
        assert_eq!(data["totalPages"], 2);
        assert_eq!(data["hasNextPage"], true);
        assert_eq!(data["hasPrevPage"], false);
        assert_eq!(data["items"][0]["title"], "three");
        assert_eq!(data["items"][0]["owner"]["username"], "alice");
    }

    #[tokio::test]
    async fn page_offset_beyond_i64_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        app.publish_video(&alice.token, "only").await;

        for query in [
            "page=9223372036854775807&limit=10",
            "page=1000000000000000001&limit=10",
        ] {
            let res = app
                .get_with_token(&format!("{}?{query}", routes::VIDEOS), &alice.token)
                .await;
            assert_eq!(res.status, 400, "{query}: {}", res.text);
            assert_eq!(res.body["message"], "Invalid page or limit value");
        }
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        app.publish_video(&alice.token, "only").await;

        let res = app
            .get_with_token(&format!("{}?page=5", routes::VIDEOS), &alice.token)
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["data"]["items"].as_array().unwrap().is_empty());
        assert_eq!(res.body["data"]["totalCount"], 1);
        assert_eq!(res.body["message"], "No videos found");
    }

    #[tokio::test]
    async fn unpublished_videos_are_hidden() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let hidden = app.publish_video(&alice.token, "hidden").await;
        app.publish_video(&alice.token, "shown").await;
        app.patch_with_token(&routes::toggle_publish(&hidden), &json!({}), &alice.token)
            .await;

        let res = app.get_with_token(routes::VIDEOS, &alice.token).await;

        let items = res.body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "shown");
    }

    #[tokio::test]
    async fn filters_by_owner_and_text() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        app.publish_video(&alice.token, "Learning Rust").await;
        app.publish_video(&alice.token, "Cooking pasta").await;
        app.publish_video(&bob.token, "Rust for beginners").await;

        let by_owner = app
            .get_with_token(
                &format!("{}?userId={}", routes::VIDEOS, bob.id),
                &alice.token,
            )
            .await;
        assert_eq!(by_owner.body["data"]["totalCount"], 1);

        let searched = app
            .get_with_token(&format!("{}?query=rust", routes::VIDEOS), &alice.token)
            .await;
        assert_eq!(searched.status, 200, "{}", searched.text);
        assert_eq!(searched.body["data"]["totalCount"], 2);
    }

    #[tokio::test]
    async fn sorts_by_requested_field() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        for title in ["b", "c", "a"] {
            app.publish_video(&alice.token, title).await;
        }

        let res = app
            .get_with_token(
                &format!("{}?sortBy=title&sortType=asc", routes::VIDEOS),
                &alice.token,
            )
            .await;

        let titles: Vec<_> = res.body["data"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn unknown_sort_field_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .get_with_token(&format!("{}?sortBy=password", routes::VIDEOS), &alice.token)
            .await;

        assert_eq!(res.status, 400);
    }
}

mod publishing {
    use super::*;

    #[tokio::test]
    async fn published_video_has_assets_and_duration() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let id = app.publish_video(&alice.token, "intro").await;

        let res = app.get_with_token(&routes::video(&id), &alice.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"]["duration"], 42.5);
        assert_eq!(res.body["data"]["isPublished"], true);
        assert!(res.body["data"]["videoFile"]["url"].is_string());
        assert_eq!(res.body["data"]["owner"]["username"], "alice");
    }

    #[tokio::test]
    async fn thumbnail_must_be_an_image() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let form = Form::new()
            .text("title", "t")
            .text("description", "d")
            .part(
                "videoFile",
                reqwest::multipart::Part::bytes(b"video".to_vec()).file_name("clip.mp4"),
            )
            .part(
                "thumbnail",
                reqwest::multipart::Part::bytes(b"video".to_vec()).file_name("thumb.mp4"),
            );

        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::VIDEOS))
            .bearer_auth(&alice.token)
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
        assert_eq!(app.count("videos", doc! {}).await, 0);
    }

    #[tokio::test]
    async fn malformed_id_is_a_bad_request() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app.get_with_token(&routes::video("not-an-id"), &alice.token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Invalid videoId");
    }

    #[tokio::test]
    async fn missing_video_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .get_with_token(&routes::video(&ObjectId::new().to_hex()), &alice.token)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod viewing {
    use super::*;

    #[tokio::test]
    async fn each_fetch_counts_one_view_and_history_once() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let id = app.publish_video(&alice.token, "intro").await;

        let first = app.get_with_token(&routes::video(&id), &bob.token).await;
        let second = app.get_with_token(&routes::video(&id), &bob.token).await;

        assert_eq!(first.body["data"]["views"], 0);
        assert_eq!(second.body["data"]["views"], 1);
        assert_eq!(app.count("videos", doc! { "_id": oid(&id), "views": 2 }).await, 1);

        let history = app.get_with_token(routes::HISTORY, &bob.token).await;
        assert_eq!(history.status, 200, "{}", history.text);
        let entries = history.body["data"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["_id"], id.as_str());
    }

    #[tokio::test]
    async fn history_keeps_first_watch_order() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let first = app.publish_video(&alice.token, "first").await;
        let second = app.publish_video(&alice.token, "second").await;

        app.get_with_token(&routes::video(&second), &alice.token).await;
        app.get_with_token(&routes::video(&first), &alice.token).await;
        app.get_with_token(&routes::video(&second), &alice.token).await;

        let history = app.get_with_token(routes::HISTORY, &alice.token).await;
        let ids: Vec<_> = history.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["_id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, [second, first]);
    }
}

mod ownership {
    use super::*;

    #[tokio::test]
    async fn double_toggle_restores_publish_status() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let id = app.publish_video(&alice.token, "intro").await;

        let once = app
            .patch_with_token(&routes::toggle_publish(&id), &json!({}), &alice.token)
            .await;
        assert_eq!(once.status, 200, "{}", once.text);
        assert_eq!(once.body["data"]["isPublished"], false);

        let twice = app
            .patch_with_token(&routes::toggle_publish(&id), &json!({}), &alice.token)
            .await;
        assert_eq!(twice.body["data"]["isPublished"], true);
    }

    #[tokio::test]
    async fn non_owner_cannot_modify() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let mallory = app.create_user("mallory").await;
        let id = app.publish_video(&alice.token, "intro").await;

        let toggle = app
            .patch_with_token(&routes::toggle_publish(&id), &json!({}), &mallory.token)
            .await;
        assert_eq!(toggle.status, 403);
        assert_eq!(toggle.error_kind(), "FORBIDDEN");

        let update = app
            .patch_multipart(
                &routes::video(&id),
                Form::new().text("title", "pwned"),
                &mallory.token,
            )
            .await;
        assert_eq!(update.status, 403);

        let delete = app.delete_with_token(&routes::video(&id), &mallory.token).await;
        assert_eq!(delete.status, 403);

        assert_eq!(app.count("videos", doc! { "title": "intro" }).await, 1);
    }

    #[tokio::test]
    async fn owner_updates_title_and_thumbnail() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let id = app.publish_video(&alice.token, "intro").await;
        let before = app.get_with_token(&routes::video(&id), &alice.token).await;

        let form = image_form("thumbnail").text("title", "Intro, revised");
        let res = app.patch_multipart(&routes::video(&id), form, &alice.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"]["title"], "Intro, revised");
        assert_eq!(res.body["data"]["description"], "About intro");
        assert_ne!(
            res.body["data"]["thumbnail"]["url"],
            before.body["data"]["thumbnail"]["url"]
        );
    }

    #[tokio::test]
    async fn update_without_fields_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let id = app.publish_video(&alice.token, "intro").await;

        let res = app
            .patch_multipart(&routes::video(&id), Form::new().text("title", "  "), &alice.token)
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn delete_cascades_to_comments_likes_and_playlists() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let id = app.publish_video(&alice.token, "intro").await;
        let comment = app.add_comment(&bob.token, &id, "nice").await;
        app.post_with_token(&routes::like_video(&id), &json!({}), &bob.token)
            .await;
        app.post_with_token(&routes::like_comment(&comment), &json!({}), &alice.token)
            .await;
        let playlist = app.create_playlist(&bob.token, "Favorites").await;
        app.patch_with_token(&routes::playlist_add(&id, &playlist), &json!({}), &bob.token)
            .await;

        let res = app.delete_with_token(&routes::video(&id), &alice.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let video_id = oid(&id);
        assert_eq!(app.count("videos", doc! { "_id": video_id }).await, 0);
        assert_eq!(app.count("comments", doc! { "video": video_id }).await, 0);
        assert_eq!(app.count("likes", doc! {}).await, 0);
        assert_eq!(app.count("playlists", doc! { "videos": video_id }).await, 0);

        let again = app.get_with_token(&routes::video(&id), &alice.token).await;
        assert_eq!(again.status, 404);
    }
}
