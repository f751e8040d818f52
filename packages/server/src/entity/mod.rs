pub mod asset;
pub mod comment;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

use futures::TryStreamExt;
use mongodb::bson::{self, Document, doc, oid::ObjectId};
use mongodb::options::{ReturnDocument, UpdateModifications};
use mongodb::{Collection, Database};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::pipeline::Pipeline;

/// Typed accessor over one collection.
///
/// Every method is a thin pass-through to the driver; business rules live in
/// the handlers and the authorization guard.
#[derive(Debug, Clone)]
pub struct Repository<T: Send + Sync> {
    collection: Collection<T>,
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + Unpin,
{
    pub fn new(db: &Database, name: &str) -> Self {
        Self {
            collection: db.collection(name),
        }
    }

    pub async fn find_by_id(&self, id: ObjectId) -> mongodb::error::Result<Option<T>> {
        self.collection.find_one(doc! { "_id": id }).await
    }

    pub async fn find_one(&self, filter: Document) -> mongodb::error::Result<Option<T>> {
        self.collection.find_one(filter).await
    }

    pub async fn insert(&self, model: &T) -> mongodb::error::Result<()> {
        self.collection.insert_one(model).await?;
        Ok(())
    }

    /// Apply `update` (an operator document or an update pipeline) and
    /// return the document as it is after the write.
    pub async fn update_by_id(
        &self,
        id: ObjectId,
        update: impl Into<UpdateModifications>,
    ) -> mongodb::error::Result<Option<T>> {
        self.collection
            .find_one_and_update(doc! { "_id": id }, update)
            .return_document(ReturnDocument::After)
            .await
    }

    /// Returns the number of matched documents.
    pub async fn update_one(&self, filter: Document, update: Document) -> mongodb::error::Result<u64> {
        let result = self.collection.update_one(filter, update).await?;
        Ok(result.matched_count)
    }

    pub async fn update_many(&self, filter: Document, update: Document) -> mongodb::error::Result<u64> {
        let result = self.collection.update_many(filter, update).await?;
        Ok(result.modified_count)
    }

    pub async fn delete_by_id(&self, id: ObjectId) -> mongodb::error::Result<bool> {
        self.delete_one(doc! { "_id": id }).await
    }

    pub async fn delete_one(&self, filter: Document) -> mongodb::error::Result<bool> {
        let result = self.collection.delete_one(filter).await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn delete_many(&self, filter: Document) -> mongodb::error::Result<u64> {
        let result = self.collection.delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    pub async fn exists(&self, filter: Document) -> mongodb::error::Result<bool> {
        Ok(self.collection.count_documents(filter).limit(1).await? > 0)
    }

    /// Ids of every document matching `filter`.
    pub async fn ids(&self, filter: Document) -> mongodb::error::Result<Vec<ObjectId>> {
        let values = self.collection.distinct("_id", filter).await?;
        Ok(values.iter().filter_map(bson::Bson::as_object_id).collect())
    }

    /// Run an aggregation and collect the raw result documents.
    pub async fn aggregate(&self, pipeline: &Pipeline) -> mongodb::error::Result<Vec<Document>> {
        let cursor = self.collection.aggregate(pipeline.render()).await?;
        cursor.try_collect().await
    }
}

/// Decode aggregation output into typed rows.
pub fn decode_all<R: DeserializeOwned>(docs: Vec<Document>) -> Result<Vec<R>, bson::de::Error> {
    docs.into_iter().map(bson::from_document).collect()
}
