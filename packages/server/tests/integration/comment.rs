use mongodb::bson::doc;
use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn comments_are_listed_newest_first_with_like_state() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let video = app.publish_video(&alice.token, "intro").await;
    let first = app.add_comment(&bob.token, &video, "first!").await;
    app.add_comment(&alice.token, &video, "thanks").await;
    app.post_with_token(&routes::like_comment(&first), &json!({}), &alice.token)
        .await;

    let res = app
        .get_with_token(&format!("{}?limit=10", routes::comments(&video)), &alice.token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    let data = &res.body["data"];
    assert_eq!(data["totalCount"], 2);
    assert_eq!(data["items"][0]["content"], "thanks");
    assert_eq!(data["items"][1]["content"], "first!");
    assert_eq!(data["items"][1]["owner"]["username"], "bob");
    assert_eq!(data["items"][1]["likesCount"], 1);
    assert_eq!(data["items"][1]["isLiked"], true);
    assert_eq!(data["items"][0]["isLiked"], false);
}

#[tokio::test]
async fn comment_pages_report_totals() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let video = app.publish_video(&alice.token, "intro").await;
    for n in 0..3 {
        app.add_comment(&alice.token, &video, &format!("comment {n}")).await;
    }

    let res = app
        .get_with_token(
            &format!("{}?page=2&limit=2", routes::comments(&video)),
            &alice.token,
        )
        .await;

    let data = &res.body["data"];
    assert_eq!(data["items"].as_array().unwrap().len(), 1);
    assert_eq!(data["totalCount"], 3);
    assert_eq!(data["hasNextPage"], false);
    assert_eq!(data["hasPrevPage"], true);
}

#[tokio::test]
async fn comment_page_beyond_the_addressable_offset_is_rejected() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let video = app.publish_video(&alice.token, "intro").await;

    let res = app
        .get_with_token(
            &format!("{}?page=9223372036854775807&limit=10", routes::comments(&video)),
            &alice.token,
        )
        .await;

    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["message"], "Invalid page or limit value");
}

#[tokio::test]
async fn commenting_on_a_missing_video_is_not_found() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;

    let res = app
        .post_with_token(
            &routes::comments(&mongodb::bson::oid::ObjectId::new().to_hex()),
            &json!({ "content": "hello?" }),
            &alice.token,
        )
        .await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn blank_comment_is_rejected() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let video = app.publish_video(&alice.token, "intro").await;

    let res = app
        .post_with_token(&routes::comments(&video), &json!({ "content": "  " }), &alice.token)
        .await;

    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn only_the_author_edits_or_deletes() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let video = app.publish_video(&alice.token, "intro").await;
    let comment = app.add_comment(&bob.token, &video, "first!").await;

    let by_owner_of_video = app
        .patch_with_token(&routes::comment(&comment), &json!({ "content": "x" }), &alice.token)
        .await;
    assert_eq!(by_owner_of_video.status, 403);

    let edited = app
        .patch_with_token(
            &routes::comment(&comment),
            &json!({ "content": "first! (edited)" }),
            &bob.token,
        )
        .await;
    assert_eq!(edited.status, 200, "{}", edited.text);
    assert_eq!(edited.body["data"]["content"], "first! (edited)");

    assert_eq!(
        app.delete_with_token(&routes::comment(&comment), &alice.token)
            .await
            .status,
        403
    );
    assert_eq!(
        app.delete_with_token(&routes::comment(&comment), &bob.token)
            .await
            .status,
        200
    );
}

#[tokio::test]
async fn deleting_a_comment_removes_its_likes() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let video = app.publish_video(&alice.token, "intro").await;
    let comment = app.add_comment(&alice.token, &video, "pinned").await;
    app.post_with_token(&routes::like_comment(&comment), &json!({}), &alice.token)
        .await;

    app.delete_with_token(&routes::comment(&comment), &alice.token)
        .await;

    assert_eq!(app.count("likes", doc! {}).await, 0);
}
