use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// How many rows a list query returns and where it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PaginationParams", into = "PaginationParams")]
pub enum Pagination {
    /// 1-based page number and page size.
    Page { current: u64, page_size: u64 },
    /// Raw LIMIT/OFFSET.
    Offset { limit: u64, offset: u64 },
    /// Return every row; the client paginates.
    Off,
}

impl Pagination {
    pub fn page(current: u64, page_size: u64) -> Self {
        Pagination::Page { current, page_size }
    }

    /// Resolves to `(limit, offset)`, or `None` when pagination is off.
    ///
    /// Zero page numbers and zero page sizes have no meaningful window and are
    /// returned as `Err` with a description of the problem.
    pub fn window(&self) -> Result<Option<(u64, u64)>, String> {
        match *self {
            Pagination::Page { current, page_size } => {
                if current == 0 {
                    return Err("page numbers start at 1".into());
                }
                if page_size == 0 {
                    return Err("page size must be positive".into());
                }
                let offset = (current - 1)
                    .checked_mul(page_size)
                    .ok_or_else(|| format!("page {current} of size {page_size} overflows"))?;
                Ok(Some((page_size, offset)))
            }
            Pagination::Offset { limit, offset } => {
                if limit == 0 {
                    return Err("limit must be positive".into());
                }
                Ok(Some((limit, offset)))
            }
            Pagination::Off => Ok(None),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::Page {
            current: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Wire form: `{ "current": 2, "pageSize": 10, "mode": "server" | "client" | "off" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaginationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
}

impl From<PaginationParams> for Pagination {
    fn from(params: PaginationParams) -> Self {
        if matches!(params.mode.as_deref(), Some("off") | Some("client")) {
            return Pagination::Off;
        }
        if let Some(limit) = params.limit {
            return Pagination::Offset {
                limit,
                offset: params.offset.unwrap_or(0),
            };
        }
        Pagination::Page {
            current: params.current.unwrap_or(1),
            page_size: params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

impl From<Pagination> for PaginationParams {
    fn from(pagination: Pagination) -> Self {
        let mut params = PaginationParams {
            current: None,
            page_size: None,
            limit: None,
            offset: None,
            mode: None,
        };
        match pagination {
            Pagination::Page { current, page_size } => {
                params.current = Some(current);
                params.page_size = Some(page_size);
            }
            Pagination::Offset { limit, offset } => {
                params.limit = Some(limit);
                params.offset = Some(offset);
            }
            Pagination::Off => params.mode = Some("off".into()),
        }
        params
    }
}
