use mongodb::bson::doc;
use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn toggling_twice_unlikes() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let video = app.publish_video(&alice.token, "intro").await;

    let liked = app
        .post_with_token(&routes::like_video(&video), &json!({}), &alice.token)
        .await;
    assert_eq!(liked.status, 200, "{}", liked.text);
    assert_eq!(liked.body["data"]["isLiked"], true);

    let unliked = app
        .post_with_token(&routes::like_video(&video), &json!({}), &alice.token)
        .await;
    assert_eq!(unliked.body["data"]["isLiked"], false);
    assert_eq!(app.count("likes", doc! {}).await, 0);
}

#[tokio::test]
async fn liking_a_missing_target_is_not_found() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let missing = mongodb::bson::oid::ObjectId::new().to_hex();

    for path in [
        routes::like_video(&missing),
        routes::like_comment(&missing),
        routes::like_tweet(&missing),
    ] {
        let res = app.post_with_token(&path, &json!({}), &alice.token).await;
        assert_eq!(res.status, 404, "{path}");
    }
}

#[tokio::test]
async fn liked_videos_lists_published_videos_only() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let shown = app.publish_video(&alice.token, "shown").await;
    let hidden = app.publish_video(&alice.token, "hidden").await;
    let tweet = app.create_tweet(&alice.token, "not a video").await;
    for path in [
        routes::like_video(&shown),
        routes::like_video(&hidden),
        routes::like_tweet(&tweet),
    ] {
        app.post_with_token(&path, &json!({}), &bob.token).await;
    }
    app.patch_with_token(&routes::toggle_publish(&hidden), &json!({}), &alice.token)
        .await;

    let res = app.get_with_token(routes::LIKED_VIDEOS, &bob.token).await;

    assert_eq!(res.status, 200, "{}", res.text);
    let liked = res.body["data"].as_array().unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0]["video"]["_id"], shown.as_str());
    assert_eq!(liked[0]["video"]["owner"]["username"], "alice");
    assert!(liked[0]["likedAt"].is_string());
}

#[tokio::test]
async fn video_detail_reflects_the_callers_like() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let video = app.publish_video(&alice.token, "intro").await;
    app.post_with_token(&routes::like_video(&video), &json!({}), &bob.token)
        .await;

    let as_bob = app.get_with_token(&routes::video(&video), &bob.token).await;
    let as_alice = app.get_with_token(&routes::video(&video), &alice.token).await;

    assert_eq!(as_bob.body["data"]["likesCount"], 1);
    assert_eq!(as_bob.body["data"]["isLiked"], true);
    assert_eq!(as_alice.body["data"]["isLiked"], false);
}
