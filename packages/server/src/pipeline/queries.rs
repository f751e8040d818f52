//! One pure constructor per query the API runs.

use mongodb::bson::{doc, oid::ObjectId};

use super::{Expr, Join, Paginate, Pipeline, Projection, SortDirection, SortKey, TextSearch};
use crate::entity::{comment, like, subscription, user, video};
use crate::pagination::PageWindow;

/// Public profile of a user embedded in other documents.
const OWNER_FIELDS: &[&str] = &["username", "fullName", "avatar.url"];

/// A video as shown in lists.
const VIDEO_CARD_FIELDS: &[&str] = &[
    "videoFile.url",
    "thumbnail.url",
    "title",
    "description",
    "duration",
    "views",
    "isPublished",
    "owner",
    "createdAt",
    "updatedAt",
];

fn owner_profile() -> Pipeline {
    Pipeline::new().project(Projection::include(OWNER_FIELDS))
}

/// Join the user at `local_field` with only their public profile.
fn join_owner(local_field: &str) -> Join {
    Join::new(user::COLLECTION, local_field, "_id", local_field).with_pipeline(owner_profile())
}

/// Join every like on the current document, keeping only `likedBy`.
fn join_likes(target_field: &str) -> Join {
    Join::new(like::COLLECTION, "_id", target_field, "likes")
        .with_pipeline(Pipeline::new().project(Projection::include(&["likedBy"])))
}

fn like_counts(viewer: ObjectId) -> [(&'static str, Expr); 2] {
    [
        ("likesCount", Expr::size("likes")),
        ("isLiked", Expr::contains(viewer, "likes.likedBy")),
    ]
}

/// Newest first with `_id` as tie-break so page boundaries are stable.
fn newest_first() -> Vec<SortKey> {
    vec![
        SortKey::newest_first(),
        SortKey::field("_id", SortDirection::Desc),
    ]
}

#[derive(Debug, Clone)]
pub struct VideoListing {
    pub search: Option<TextSearch>,
    pub owner: Option<ObjectId>,
    pub sort: SortKey,
    pub window: PageWindow,
}

/// Published videos, optionally searched and restricted to one owner, with
/// the owner's profile attached. Yields a single `{totalCount, items}`.
pub fn video_listing(listing: &VideoListing) -> Pipeline {
    let mut pipeline = Pipeline::new();
    if let Some(search) = &listing.search {
        pipeline = pipeline.search(search.clone());
    }

    let mut filter = doc! { "isPublished": true };
    if let Some(owner) = listing.owner {
        filter.insert("owner", owner);
    }

    pipeline
        .filter(filter)
        .sort(vec![
            listing.sort.clone(),
            SortKey::field("_id", SortDirection::Desc),
        ])
        .join(join_owner("owner"))
        .unwind("owner")
        .project(Projection::include(VIDEO_CARD_FIELDS))
        .paginate(Paginate::Facet(listing.window))
}

/// Public channel page for `username` as seen by `viewer`.
pub fn channel_profile(username: &str, viewer: ObjectId) -> Pipeline {
    Pipeline::new()
        .filter(doc! { "username": username })
        .join(Join::new(subscription::COLLECTION, "_id", "channel", "subscribers"))
        .join(Join::new(subscription::COLLECTION, "_id", "subscriber", "subscribedTo"))
        .derive([
            ("subscribersCount", Expr::size("subscribers")),
            ("channelsSubscribedToCount", Expr::size("subscribedTo")),
            ("isSubscribed", Expr::contains(viewer, "subscribers.subscriber")),
        ])
        .project(Projection::include(&[
            "username",
            "fullName",
            "email",
            "avatar.url",
            "coverImage.url",
            "subscribersCount",
            "channelsSubscribedToCount",
            "isSubscribed",
            "createdAt",
        ]))
}

/// One video with owner, subscriber, like and comment counts for `viewer`.
pub fn video_detail(video_id: ObjectId, viewer: ObjectId) -> Pipeline {
    let owner = Join::new(user::COLLECTION, "owner", "_id", "owner").with_pipeline(
        Pipeline::new()
            .join(Join::new(subscription::COLLECTION, "_id", "channel", "subscribers"))
            .derive([
                ("subscribersCount", Expr::size("subscribers")),
                ("isSubscribed", Expr::contains(viewer, "subscribers.subscriber")),
            ])
            .project(Projection::include(&[
                "username",
                "fullName",
                "avatar.url",
                "subscribersCount",
                "isSubscribed",
            ])),
    );
    let comments = Join::new(comment::COLLECTION, "_id", "video", "comments")
        .with_pipeline(Pipeline::new().project(Projection::include(&["_id"])));

    let [likes_count, is_liked] = like_counts(viewer);
    Pipeline::new()
        .filter(doc! { "_id": video_id })
        .join(owner)
        .unwind("owner")
        .join(join_likes("video"))
        .join(comments)
        .derive([
            likes_count,
            is_liked,
            ("commentsCount", Expr::size("comments")),
        ])
        .project(Projection::include(&[
            "videoFile.url",
            "thumbnail.url",
            "title",
            "description",
            "duration",
            "views",
            "isPublished",
            "owner",
            "likesCount",
            "isLiked",
            "commentsCount",
            "createdAt",
            "updatedAt",
        ]))
}

/// `{watchHistory, videos}` for one user. `videos` comes back in store
/// order; callers restore history order with [`super::order_by_ids`].
pub fn watch_history(user_id: ObjectId) -> Pipeline {
    let videos = Join::new(video::COLLECTION, "watchHistory", "_id", "videos").with_pipeline(
        Pipeline::new()
            .join(join_owner("owner"))
            .derive([("owner", Expr::first("owner"))])
            .project(Projection::include(VIDEO_CARD_FIELDS)),
    );
    Pipeline::new()
        .filter(doc! { "_id": user_id })
        .join(videos)
        .project(Projection::include(&["watchHistory", "videos"]))
}

/// A playlist with its published videos, totals and owner.
///
/// The stored id list is kept as `videoIds` so callers can restore its order.
pub fn playlist_with_videos(playlist_id: ObjectId) -> Pipeline {
    let videos = Join::new(video::COLLECTION, "videos", "_id", "videos").with_pipeline(
        Pipeline::new().project(Projection::include(&[
            "videoFile.url",
            "thumbnail.url",
            "title",
            "description",
            "duration",
            "views",
            "isPublished",
            "createdAt",
        ])),
    );
    Pipeline::new()
        .filter(doc! { "_id": playlist_id })
        .derive([("videoIds", Expr::field("videos"))])
        .join(videos)
        .derive([("videos", Expr::filter_eq("videos", "isPublished", true))])
        // Separate stage: totals must see the filtered list.
        .derive([
            ("totalVideos", Expr::size("videos")),
            ("totalViews", Expr::sum("videos.views")),
        ])
        .join(join_owner("owner"))
        .derive([("owner", Expr::first("owner"))])
        .project(Projection::include(&[
            "name",
            "description",
            "videoIds",
            "videos",
            "totalVideos",
            "totalViews",
            "owner",
            "createdAt",
            "updatedAt",
        ]))
}

/// Comments on a video, newest first. Paginated by the caller.
pub fn video_comments(video_id: ObjectId, viewer: ObjectId) -> Pipeline {
    Pipeline::new()
        .filter(doc! { "video": video_id })
        .sort(newest_first())
        .join(join_owner("owner"))
        .unwind("owner")
        .join(join_likes("comment"))
        .derive(like_counts(viewer))
        .project(Projection::include(&[
            "content",
            "video",
            "owner",
            "likesCount",
            "isLiked",
            "createdAt",
            "updatedAt",
        ]))
}

/// Tweets by `owner`, newest first.
pub fn user_tweets(owner: ObjectId, viewer: ObjectId) -> Pipeline {
    Pipeline::new()
        .filter(doc! { "owner": owner })
        .sort(newest_first())
        .join(join_owner("owner"))
        .unwind("owner")
        .join(join_likes("tweet"))
        .derive(like_counts(viewer))
        .project(Projection::include(&[
            "content",
            "owner",
            "likesCount",
            "isLiked",
            "createdAt",
            "updatedAt",
        ]))
}

/// Playlists of `owner` with totals over their published videos.
pub fn user_playlists(owner: ObjectId) -> Pipeline {
    let videos = Join::new(video::COLLECTION, "videos", "_id", "videos")
        .with_pipeline(Pipeline::new().project(Projection::include(&["isPublished", "views"])));
    Pipeline::new()
        .filter(doc! { "owner": owner })
        .join(videos)
        .derive([("videos", Expr::filter_eq("videos", "isPublished", true))])
        .derive([
            ("totalVideos", Expr::size("videos")),
            ("totalViews", Expr::sum("videos.views")),
        ])
        .sort(vec![
            SortKey::field("updatedAt", SortDirection::Desc),
            SortKey::field("_id", SortDirection::Desc),
        ])
        .project(Projection::include(&[
            "name",
            "description",
            "owner",
            "totalVideos",
            "totalViews",
            "createdAt",
            "updatedAt",
        ]))
}

/// Published videos liked by `user`, most recent like first.
pub fn liked_videos(user_id: ObjectId) -> Pipeline {
    let video = Join::new(video::COLLECTION, "video", "_id", "video").with_pipeline(
        Pipeline::new()
            .filter(doc! { "isPublished": true })
            .join(join_owner("owner"))
            .derive([("owner", Expr::first("owner"))])
            .project(Projection::include(VIDEO_CARD_FIELDS)),
    );
    Pipeline::new()
        .filter(doc! { "likedBy": user_id, "video": { "$exists": true } })
        .sort(newest_first())
        .join(video)
        .unwind("video")
        .project(Projection::include(&["video", "createdAt"]))
}

/// Users subscribed to `channel`, each with their own subscriber count and
/// whether `viewer` is subscribed to them.
pub fn channel_subscribers(channel: ObjectId, viewer: ObjectId) -> Pipeline {
    let subscriber = Join::new(user::COLLECTION, "subscriber", "_id", "subscriber").with_pipeline(
        Pipeline::new()
            .join(Join::new(subscription::COLLECTION, "_id", "channel", "subscribers"))
            .derive([
                ("subscribersCount", Expr::size("subscribers")),
                ("isSubscribed", Expr::contains(viewer, "subscribers.subscriber")),
            ])
            .project(Projection::include(&[
                "username",
                "fullName",
                "avatar.url",
                "subscribersCount",
                "isSubscribed",
            ])),
    );
    Pipeline::new()
        .filter(doc! { "channel": channel })
        .sort(newest_first())
        .join(subscriber)
        .unwind("subscriber")
        .project(Projection::include(&["subscriber", "createdAt"]))
}

/// Channels `subscriber` follows, each with its latest published video.
pub fn subscribed_channels(subscriber: ObjectId) -> Pipeline {
    let latest_video = Join::new(video::COLLECTION, "_id", "owner", "latestVideo").with_pipeline(
        Pipeline::new()
            .filter(doc! { "isPublished": true })
            .sort(newest_first())
            .paginate(Paginate::Window(PageWindow { page: 1, limit: 1 }))
            .project(Projection::include(&["title", "thumbnail.url", "views", "createdAt"])),
    );
    let channel = Join::new(user::COLLECTION, "channel", "_id", "channel").with_pipeline(
        Pipeline::new()
            .join(latest_video)
            .derive([("latestVideo", Expr::first("latestVideo"))])
            .project(Projection::include(&[
                "username",
                "fullName",
                "avatar.url",
                "latestVideo",
            ])),
    );
    Pipeline::new()
        .filter(doc! { "subscriber": subscriber })
        .sort(newest_first())
        .join(channel)
        .unwind("channel")
        .project(Projection::include(&["channel", "createdAt"]))
}
