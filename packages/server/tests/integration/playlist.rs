use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn adding_the_same_video_twice_keeps_one_entry() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let video = app.publish_video(&alice.token, "intro").await;
    let playlist = app.create_playlist(&alice.token, "Favorites").await;

    for _ in 0..2 {
        let res = app
            .patch_with_token(&routes::playlist_add(&video, &playlist), &json!({}), &alice.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
    }

    let res = app.get_with_token(&routes::playlist(&playlist), &alice.token).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"]["totalVideos"], 1);
    assert_eq!(res.body["data"]["videos"][0]["_id"], video.as_str());
    assert_eq!(res.body["data"]["owner"]["username"], "alice");
}

#[tokio::test]
async fn playlist_keeps_insertion_order_and_hides_unpublished() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let first = app.publish_video(&alice.token, "first").await;
    let second = app.publish_video(&alice.token, "second").await;
    let hidden = app.publish_video(&alice.token, "hidden").await;
    let playlist = app.create_playlist(&alice.token, "Mix").await;
    for video in [&second, &hidden, &first] {
        app.patch_with_token(&routes::playlist_add(video, &playlist), &json!({}), &alice.token)
            .await;
    }
    app.patch_with_token(&routes::toggle_publish(&hidden), &json!({}), &alice.token)
        .await;

    let res = app.get_with_token(&routes::playlist(&playlist), &alice.token).await;

    let ids: Vec<_> = res.body["data"]["videos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, [second, first]);
    assert_eq!(res.body["data"]["totalVideos"], 2);
    assert!(res.body["data"].get("videoIds").is_none());
}

#[tokio::test]
async fn removing_a_video_updates_totals() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let video = app.publish_video(&alice.token, "intro").await;
    let playlist = app.create_playlist(&alice.token, "Favorites").await;
    app.patch_with_token(&routes::playlist_add(&video, &playlist), &json!({}), &alice.token)
        .await;

    let res = app
        .patch_with_token(&routes::playlist_remove(&video, &playlist), &json!({}), &alice.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"]["videos"], json!([]));

    let listed = app
        .get_with_token(&routes::user_playlists(&alice.id), &alice.token)
        .await;
    assert_eq!(listed.body["data"][0]["totalVideos"], 0);
}

#[tokio::test]
async fn create_requires_name_and_description() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;

    let res = app
        .post_with_token(routes::PLAYLISTS, &json!({ "name": "No description" }), &alice.token)
        .await;

    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn non_owner_cannot_modify() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let video = app.publish_video(&bob.token, "bob's video").await;
    let playlist = app.create_playlist(&alice.token, "Favorites").await;

    let add = app
        .patch_with_token(&routes::playlist_add(&video, &playlist), &json!({}), &bob.token)
        .await;
    assert_eq!(add.status, 403);

    let rename = app
        .patch_with_token(&routes::playlist(&playlist), &json!({ "name": "Mine" }), &bob.token)
        .await;
    assert_eq!(rename.status, 403);

    let delete = app.delete_with_token(&routes::playlist(&playlist), &bob.token).await;
    assert_eq!(delete.status, 403);
}

#[tokio::test]
async fn owner_renames_and_deletes() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let playlist = app.create_playlist(&alice.token, "Favorites").await;

    let res = app
        .patch_with_token(&routes::playlist(&playlist), &json!({ "name": "Top" }), &alice.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"]["name"], "Top");
    assert_eq!(res.body["data"]["description"], "x");

    let res = app.delete_with_token(&routes::playlist(&playlist), &alice.token).await;
    assert_eq!(res.status, 200);

    let res = app.get_with_token(&routes::playlist(&playlist), &alice.token).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn adding_a_missing_video_is_not_found() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let playlist = app.create_playlist(&alice.token, "Favorites").await;

    let res = app
        .patch_with_token(
            &routes::playlist_add(&mongodb::bson::oid::ObjectId::new().to_hex(), &playlist),
            &json!({}),
            &alice.token,
        )
        .await;

    assert_eq!(res.status, 404);
}
