use mongodb::Database;
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::Repository;
use super::asset::AssetRef;
use crate::guard::Owned;

pub const COLLECTION: &str = "videos";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub video_file: AssetRef,
    pub thumbnail: AssetRef,
    pub title: String,
    pub description: String,
    /// Seconds.
    pub duration: f64,
    /// Only ever changed through `$inc`.
    pub views: i64,
    pub is_published: bool,
    pub owner: ObjectId,

    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Owned for Model {
    const KIND: &'static str = "video";

    fn owner_id(&self) -> ObjectId {
        self.owner
    }
}

pub fn repo(db: &Database) -> Repository<Model> {
    Repository::new(db, COLLECTION)
}
