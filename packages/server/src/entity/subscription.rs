use mongodb::Database;
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::Repository;

pub const COLLECTION: &str = "subscriptions";

/// `subscriber` follows `channel`. Both are user ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub subscriber: ObjectId,
    pub channel: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

pub fn repo(db: &Database) -> Repository<Model> {
    Repository::new(db, COLLECTION)
}
