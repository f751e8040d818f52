//! Aggregation pipelines as a closed, typed stage list.
//!
//! Handlers never assemble raw BSON; they call a function in [`queries`]
//! which returns a [`Pipeline`], and the repository renders it.

pub mod queries;
mod stage;

use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;

pub use stage::{
    Expr, Join, Paginate, Pipeline, Projection, SearchMode, SortDirection, SortKey, Stage,
    TextSearch,
};

/// Reorder `items` to follow `ids`. Items whose id is not listed are dropped,
/// as are ids with no matching item.
pub fn order_by_ids<T>(items: Vec<T>, ids: &[ObjectId], id_of: impl Fn(&T) -> ObjectId) -> Vec<T> {
    let mut by_id: HashMap<ObjectId, T> = items.into_iter().map(|item| (id_of(&item), item)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
