use mongodb::bson::Document;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::entity::{Repository, decode_all};
use crate::error::AppError;
use crate::pipeline::{Paginate, Pipeline, Stage};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Raw `page`/`limit` query parameters, validated by [`PageParams::window`].
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Page number, 1-based. Default 1.
    #[param(example = "1")]
    pub page: Option<String>,
    /// Items per page, at most 100. Default 10.
    #[param(example = "10")]
    pub limit: Option<String>,
}

impl PageParams {
    pub fn window(&self) -> Result<PageWindow, AppError> {
        Self::parse(self.page.as_deref(), self.limit.as_deref())
    }

    /// Both values must be integers >= 1 when present; `limit` is capped at
    /// [`MAX_LIMIT`]. A page whose offset does not fit the store's `$skip`
    /// is rejected too.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<PageWindow, AppError> {
        let page = parse_positive(page, DEFAULT_PAGE)?;
        let limit = parse_positive(limit, DEFAULT_LIMIT)?.min(MAX_LIMIT);
        let window = PageWindow { page, limit };
        if window.checked_skip().is_none() {
            return Err(invalid_page());
        }
        Ok(window)
    }
}

fn parse_positive(raw: Option<&str>, default: u64) -> Result<u64, AppError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(invalid_page()),
    }
}

fn invalid_page() -> AppError {
    AppError::BadRequest("Invalid page or limit value".into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Documents before this page, or `None` when that exceeds `i64::MAX`.
    pub fn checked_skip(&self) -> Option<i64> {
        let skip = self.page.saturating_sub(1).checked_mul(self.limit)?;
        i64::try_from(skip).ok()
    }

    /// Offset for `$skip`, saturating at `i64::MAX`.
    pub fn skip(&self) -> i64 {
        self.checked_skip().unwrap_or(i64::MAX)
    }

    /// Page size for `$limit`.
    pub fn limit(&self) -> i64 {
        i64::try_from(self.limit).unwrap_or(i64::MAX)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Uniform page of results returned by every paginated endpoint.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope<T> {
    pub items: Vec<T>,
    /// Number of matching items across all pages.
    #[schema(example = 47)]
    pub total_count: u64,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub limit: u64,
    #[schema(example = 5)]
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> PageEnvelope<T> {
    pub fn new(items: Vec<T>, total_count: u64, window: PageWindow) -> Self {
        let total_pages = window.total_pages(total_count);
        Self {
            items,
            total_count,
            page: window.page,
            limit: window.limit,
            total_pages,
            has_next_page: window.page < total_pages,
            has_prev_page: window.page > 1,
        }
    }
}

/// Output of the two-phase count + slice shape.
#[derive(Debug)]
pub struct PaginatedDocs<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> From<PaginatedDocs<T>> for PageEnvelope<T> {
    fn from(page: PaginatedDocs<T>) -> Self {
        Self {
            items: page.docs,
            total_count: page.total_docs,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages,
            has_next_page: page.has_next_page,
            has_prev_page: page.has_prev_page,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FacetPage {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    items: Vec<Document>,
}

/// Run a pipeline ending in [`Paginate::Facet`] and read its single
/// `{totalCount, items}` result.
pub async fn run_facet<M, T>(
    repo: &Repository<M>,
    pipeline: &Pipeline,
    window: PageWindow,
) -> Result<PageEnvelope<T>, AppError>
where
    M: Serialize + DeserializeOwned + Send + Sync + Unpin,
    T: DeserializeOwned,
{
    let result = repo.aggregate(pipeline).await?;
    let facet = match result.into_iter().next() {
        Some(doc) => mongodb::bson::from_document::<FacetPage>(doc)?,
        None => FacetPage {
            total_count: 0,
            items: Vec::new(),
        },
    };
    let items = decode_all(facet.items)?;
    Ok(PageEnvelope::new(items, facet.total_count, window))
}

#[derive(Deserialize)]
struct CountRow {
    total: u64,
}

/// Count everything `pipeline` yields, then fetch only `window` of it.
pub async fn paginate<M, T>(
    repo: &Repository<M>,
    pipeline: &Pipeline,
    window: PageWindow,
) -> Result<PaginatedDocs<T>, AppError>
where
    M: Serialize + DeserializeOwned + Send + Sync + Unpin,
    T: DeserializeOwned,
{
    let counted = repo
        .aggregate(&pipeline.clone().stage(Stage::Count("total".into())))
        .await?;
    let total_docs = match counted.into_iter().next() {
        Some(doc) => mongodb::bson::from_document::<CountRow>(doc)?.total,
        None => 0,
    };

    let slice = pipeline.clone().paginate(Paginate::Window(window));
    let docs = decode_all(repo.aggregate(&slice).await?)?;

    let total_pages = window.total_pages(total_docs);
    Ok(PaginatedDocs {
        docs,
        total_docs,
        page: window.page,
        limit: window.limit,
        total_pages,
        has_next_page: window.page < total_pages,
        has_prev_page: window.page > 1,
    })
}
