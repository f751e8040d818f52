use mongodb::bson::{Bson, Document, doc};
use serde::Deserialize;

use crate::pagination::PageWindow;

/// How free-text search is executed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Atlas Search `$search` with weighted matching that tolerates one edit.
    #[default]
    Atlas,
    /// Classic `$text` over the weighted text index on videos. Exact terms
    /// only; for deployments without Atlas Search.
    Text,
}

/// Field weights and tolerance for video search.
const TITLE_BOOST: i32 = 5;
const DESCRIPTION_BOOST: i32 = 1;
const FUZZY_MAX_EDITS: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn as_i32(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Field(String, SortDirection),
    /// Search score, best match first.
    Relevance(SearchMode),
}

impl SortKey {
    pub fn field(name: &str, direction: SortDirection) -> Self {
        SortKey::Field(name.to_string(), direction)
    }

    /// Creation time, newest first. The default ordering for every listing.
    pub fn newest_first() -> Self {
        SortKey::field("createdAt", SortDirection::Desc)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSearch {
    pub query: String,
    pub mode: SearchMode,
}

/// A `$lookup` from the current collection into `from`.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub from: &'static str,
    pub local_field: String,
    pub foreign_field: String,
    pub alias: String,
    pub pipeline: Option<Pipeline>,
}

impl Join {
    pub fn new(from: &'static str, local_field: &str, foreign_field: &str, alias: &str) -> Self {
        Self {
            from,
            local_field: local_field.to_string(),
            foreign_field: foreign_field.to_string(),
            alias: alias.to_string(),
            pipeline: None,
        }
    }

    /// Run `pipeline` over each joined document.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }
}

/// Derived-field expressions usable in `Derive` and `Project` stages.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Value at a field path.
    Field(String),
    /// Length of an array field; a missing field counts as empty.
    Size(String),
    /// Whether `needle` occurs in the array at `haystack`.
    Contains { needle: Bson, haystack: String },
    /// Sum of numeric values at a path (typically `array.field`).
    Sum(String),
    /// First element of an array field, or missing when empty.
    First(String),
    /// Elements of the array `input` whose `field` equals `value`.
    FilterEq {
        input: String,
        field: String,
        value: Bson,
    },
}

impl Expr {
    pub fn field(path: &str) -> Self {
        Expr::Field(path.to_string())
    }

    pub fn size(path: &str) -> Self {
        Expr::Size(path.to_string())
    }

    pub fn contains(needle: impl Into<Bson>, haystack: &str) -> Self {
        Expr::Contains {
            needle: needle.into(),
            haystack: haystack.to_string(),
        }
    }

    pub fn sum(path: &str) -> Self {
        Expr::Sum(path.to_string())
    }

    pub fn first(path: &str) -> Self {
        Expr::First(path.to_string())
    }

    pub fn filter_eq(input: &str, field: &str, value: impl Into<Bson>) -> Self {
        Expr::FilterEq {
            input: input.to_string(),
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn render(&self) -> Bson {
        match self {
            Expr::Field(path) => Bson::String(format!("${path}")),
            Expr::Size(path) => doc! { "$size": { "$ifNull": [format!("${path}"), []] } }.into(),
            Expr::Contains { needle, haystack } => doc! {
                "$in": [needle.clone(), { "$ifNull": [format!("${haystack}"), []] }]
            }
            .into(),
            Expr::Sum(path) => doc! { "$sum": format!("${path}") }.into(),
            Expr::First(path) => doc! { "$first": format!("${path}") }.into(),
            Expr::FilterEq {
                input,
                field,
                value,
            } => doc! {
                "$filter": {
                    "input": { "$ifNull": [format!("${input}"), []] },
                    "as": "item",
                    "cond": { "$eq": [format!("$$item.{field}"), value.clone()] },
                }
            }
            .into(),
        }
    }
}

/// Field allowlist for a `$project` stage. Dotted paths select nested fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection(Vec<String>);

impl Projection {
    pub fn include(fields: &[&str]) -> Self {
        Self(fields.iter().map(|f| f.to_string()).collect())
    }

    fn render(&self) -> Document {
        let mut out = Document::new();
        for name in &self.0 {
            out.insert(name.clone(), 1);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paginate {
    /// `$skip` + `$limit`.
    Window(PageWindow),
    /// Single pass producing `{totalCount, items}` where `totalCount` counts
    /// every document that reached this stage.
    Facet(PageWindow),
}

/// A single aggregation stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Free-text search. Must be the first stage of a top-level pipeline.
    Search(TextSearch),
    Match(Document),
    Sort(Vec<SortKey>),
    Join(Join),
    /// Collapse a joined array into one document per element. Documents
    /// whose array is empty are dropped.
    Unwind(String),
    Derive(Vec<(String, Expr)>),
    Project(Projection),
    Paginate(Paginate),
    /// Replace the stream with `{field: <number of documents>}`.
    Count(String),
}

impl Stage {
    fn render_into(&self, out: &mut Vec<Document>) {
        match self {
            Stage::Search(search) => out.push(render_search(search)),
            Stage::Match(filter) => out.push(doc! { "$match": filter.clone() }),
            Stage::Sort(keys) => {
                let mut spec = Document::new();
                for key in keys {
                    match key {
                        SortKey::Field(name, direction) => {
                            spec.insert(name.clone(), direction.as_i32());
                        }
                        SortKey::Relevance(mode) => {
                            spec.insert("score", doc! { "$meta": score_meta(*mode) });
                        }
                    }
                }
                out.push(doc! { "$sort": spec });
            }
            Stage::Join(join) => {
                let mut lookup = doc! {
                    "from": join.from,
                    "localField": join.local_field.as_str(),
                    "foreignField": join.foreign_field.as_str(),
                    "as": join.alias.as_str(),
                };
                if let Some(pipeline) = &join.pipeline {
                    lookup.insert("pipeline", pipeline.render());
                }
                out.push(doc! { "$lookup": lookup });
            }
            Stage::Unwind(path) => out.push(doc! {
                "$unwind": {
                    "path": format!("${path}"),
                    "preserveNullAndEmptyArrays": false,
                }
            }),
            Stage::Derive(fields) => {
                let mut spec = Document::new();
                for (name, expr) in fields {
                    spec.insert(name.clone(), expr.render());
                }
                out.push(doc! { "$addFields": spec });
            }
            Stage::Project(projection) => out.push(doc! { "$project": projection.render() }),
            Stage::Paginate(Paginate::Window(window)) => {
                out.push(doc! { "$skip": window.skip() });
                out.push(doc! { "$limit": window.limit() });
            }
            Stage::Paginate(Paginate::Facet(window)) => {
                out.push(doc! {
                    "$facet": {
                        "metadata": [{ "$count": "total" }],
                        "items": [
                            { "$skip": window.skip() },
                            { "$limit": window.limit() },
                        ],
                    }
                });
                out.push(doc! {
                    "$project": {
                        "totalCount": {
                            "$ifNull": [{ "$arrayElemAt": ["$metadata.total", 0] }, 0]
                        },
                        "items": 1,
                    }
                });
            }
            Stage::Count(field) => out.push(doc! { "$count": field.as_str() }),
        }
    }
}

fn score_meta(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Atlas => "searchScore",
        SearchMode::Text => "textScore",
    }
}

fn render_search(search: &TextSearch) -> Document {
    match search.mode {
        SearchMode::Atlas => {
            let clause = |path: &str, boost: i32| {
                doc! {
                    "text": {
                        "query": search.query.as_str(),
                        "path": path,
                        "score": { "boost": { "value": boost } },
                        "fuzzy": { "maxEdits": FUZZY_MAX_EDITS },
                    }
                }
            };
            doc! {
                "$search": {
                    "index": "default",
                    "compound": {
                        "should": [
                            clause("title", TITLE_BOOST),
                            clause("description", DESCRIPTION_BOOST),
                        ],
                    },
                }
            }
        }
        SearchMode::Text => doc! { "$match": { "$text": { "$search": search.query.as_str() } } },
    }
}

/// Ordered list of stages, built by value and rendered to BSON on demand.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn search(self, search: TextSearch) -> Self {
        self.stage(Stage::Search(search))
    }

    pub fn filter(self, filter: Document) -> Self {
        self.stage(Stage::Match(filter))
    }

    pub fn sort(self, keys: Vec<SortKey>) -> Self {
        self.stage(Stage::Sort(keys))
    }

    pub fn join(self, join: Join) -> Self {
        self.stage(Stage::Join(join))
    }

    pub fn unwind(self, path: &str) -> Self {
        self.stage(Stage::Unwind(path.to_string()))
    }

    pub fn derive<'a>(self, fields: impl IntoIterator<Item = (&'a str, Expr)>) -> Self {
        let fields = fields
            .into_iter()
            .map(|(name, expr)| (name.to_string(), expr))
            .collect();
        self.stage(Stage::Derive(fields))
    }

    pub fn project(self, projection: Projection) -> Self {
        self.stage(Stage::Project(projection))
    }

    pub fn paginate(self, paginate: Paginate) -> Self {
        self.stage(Stage::Paginate(paginate))
    }

    pub fn render(&self) -> Vec<Document> {
        let mut out = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            stage.render_into(&mut out);
        }
        out
    }
}
