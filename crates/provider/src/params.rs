use model::{
    query::{filter::Filter, pagination::Pagination, sort::Sorter},
    records::record::Record,
};
use serde::{Deserialize, Serialize};

/// `getList` input in Refine's wire shape.
///
/// ```json
/// {
///   "filters": [{"field": "status", "operator": "eq", "value": "published"}],
///   "sorters": [{"field": "created_at", "order": "desc"}],
///   "pagination": {"current": 2, "pageSize": 20},
///   "relations": ["author", "comments.author"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GetListParams {
    pub filters: Vec<Filter>,
    pub sorters: Vec<Sorter>,
    /// Falls back to the first page at the configured default size.
    pub pagination: Option<Pagination>,
    pub relations: Vec<String>,
}

impl GetListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn sort(mut self, sorter: Sorter) -> Self {
        self.sorters.push(sorter);
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn with_relation(mut self, path: &str) -> Self {
        self.relations.push(path.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GetListResult {
    pub data: Vec<Record>,
    /// Rows matching the filters, ignoring pagination.
    pub total: u64,
}
