use mongodb::Database;
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::Repository;
use crate::guard::Owned;

pub const COLLECTION: &str = "tweets";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    pub owner: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Owned for Model {
    const KIND: &'static str = "tweet";

    fn owner_id(&self) -> ObjectId {
        self.owner
    }
}

pub fn repo(db: &Database) -> Repository<Model> {
    Repository::new(db, COLLECTION)
}
