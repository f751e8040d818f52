use mongodb::Database;
use mongodb::bson::{DateTime, Document, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::Repository;

pub const COLLECTION: &str = "likes";

/// A like on exactly one of a video, a comment or a tweet.
///
/// Unset targets are omitted from the stored document so the partial unique
/// indexes on `{target, likedBy}` only cover the field that is present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet: Option<ObjectId>,
    pub liked_by: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video(ObjectId),
    Comment(ObjectId),
    Tweet(ObjectId),
}

impl LikeTarget {
    /// Field of [`Model`] that references the target.
    pub fn field(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "video",
            LikeTarget::Comment(_) => "comment",
            LikeTarget::Tweet(_) => "tweet",
        }
    }

    pub fn id(&self) -> ObjectId {
        match *self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) | LikeTarget::Tweet(id) => id,
        }
    }

    /// Filter for every like on this target.
    pub fn filter(&self) -> Document {
        let mut filter = Document::new();
        filter.insert(self.field(), self.id());
        filter
    }

    /// Filter for `user`'s like on this target.
    pub fn filter_by(&self, user: ObjectId) -> Document {
        let mut filter = self.filter();
        filter.insert("likedBy", user);
        filter
    }

    pub fn new_like(&self, user: ObjectId) -> Model {
        let now = DateTime::now();
        let mut like = Model {
            id: ObjectId::new(),
            video: None,
            comment: None,
            tweet: None,
            liked_by: user,
            created_at: now,
            updated_at: now,
        };
        match *self {
            LikeTarget::Video(id) => like.video = Some(id),
            LikeTarget::Comment(id) => like.comment = Some(id),
            LikeTarget::Tweet(id) => like.tweet = Some(id),
        }
        like
    }
}

pub fn repo(db: &Database) -> Repository<Model> {
    Repository::new(db, COLLECTION)
}
