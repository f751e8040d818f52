use mongodb::bson::{Document, doc};
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};
use tracing::{info, warn};

use crate::entity::{comment, like, playlist, subscription, user, video};

/// Indexes that enforce data invariants. Startup fails if any is missing.
fn constraint_indexes() -> Vec<(&'static str, IndexModel)> {
    let unique = |name: &str| IndexOptions::builder().unique(true).name(name.to_string());
    let like_target = |field: &str| {
        let mut keys = Document::new();
        keys.insert(field, 1);
        keys.insert("likedBy", 1);
        let mut present = Document::new();
        present.insert(field, doc! { "$exists": true });
        IndexModel::builder()
            .keys(keys)
            .options(
                unique(&format!("uniq_like_{field}"))
                    .partial_filter_expression(present)
                    .build(),
            )
            .build()
    };

    vec![
        (
            user::COLLECTION,
            IndexModel::builder()
                .keys(doc! { "username": 1 })
                .options(unique("uniq_username").build())
                .build(),
        ),
        (
            user::COLLECTION,
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique("uniq_email").build())
                .build(),
        ),
        (like::COLLECTION, like_target("video")),
        (like::COLLECTION, like_target("comment")),
        (like::COLLECTION, like_target("tweet")),
        (
            subscription::COLLECTION,
            IndexModel::builder()
                .keys(doc! { "channel": 1, "subscriber": 1 })
                .options(unique("uniq_subscription").build())
                .build(),
        ),
        (
            video::COLLECTION,
            IndexModel::builder()
                .keys(doc! { "title": "text", "description": "text" })
                .options(
                    IndexOptions::builder()
                        .name("video_text".to_string())
                        .weights(doc! { "title": 5, "description": 1 })
                        .build(),
                )
                .build(),
        ),
    ]
}

/// Lookup indexes for the joins and filters the pipelines run.
fn lookup_indexes() -> Vec<(&'static str, IndexModel)> {
    let plain = |keys: Document| IndexModel::builder().keys(keys).build();
    vec![
        (video::COLLECTION, plain(doc! { "owner": 1, "createdAt": -1 })),
        (comment::COLLECTION, plain(doc! { "video": 1, "createdAt": -1 })),
        (like::COLLECTION, plain(doc! { "likedBy": 1, "createdAt": -1 })),
        (subscription::COLLECTION, plain(doc! { "subscriber": 1 })),
        (playlist::COLLECTION, plain(doc! { "owner": 1 })),
        (playlist::COLLECTION, plain(doc! { "videos": 1 })),
    ]
}

/// Ensure required indexes exist. Safe to run on every start.
pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    for (collection, model) in constraint_indexes() {
        let created = db
            .collection::<Document>(collection)
            .create_index(model)
            .await?;
        info!("Ensured index {}.{} exists", collection, created.index_name);
    }

    for (collection, model) in lookup_indexes() {
        match db.collection::<Document>(collection).create_index(model).await {
            Ok(created) => info!("Ensured index {}.{} exists", collection, created.index_name),
            Err(e) => warn!("Failed to create index on {}: {}", collection, e),
        }
    }

    Ok(())
}
