pub mod comment;
pub mod health;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

use mongodb::bson::{doc, oid::ObjectId};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::entity::{Repository, user as user_entity};
use crate::error::AppError;

/// Load a document by id or fail with `NotFound("{what} not found")`.
pub(crate) async fn find_or_404<T>(
    repo: &Repository<T>,
    id: ObjectId,
    what: &str,
) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned + Send + Sync + Unpin,
{
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{what} not found")))
}

/// Fail with `NotFound` unless a document with this id exists.
pub(crate) async fn ensure_exists<T>(
    repo: &Repository<T>,
    id: ObjectId,
    what: &str,
) -> Result<(), AppError>
where
    T: Serialize + DeserializeOwned + Send + Sync + Unpin,
{
    if repo.exists(doc! { "_id": id }).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("{what} not found")))
    }
}

pub(crate) async fn ensure_user_exists(
    db: &mongodb::Database,
    id: ObjectId,
) -> Result<(), AppError> {
    ensure_exists(&user_entity::repo(db), id, "User").await
}

/// Pick the success message for a list result.
pub(crate) fn list_message(is_empty: bool, empty: &str, found: &str) -> String {
    if is_empty { empty } else { found }.to_string()
}
