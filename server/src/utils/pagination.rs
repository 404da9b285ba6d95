use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Raw `?page=&limit=` query. Values are kept as text so garbage falls back
/// to defaults instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub limit: i64,
    pub skip: i64,
}

impl PageQuery {
    pub fn window(&self) -> PageWindow {
        let page = parse_or(self.page.as_deref(), DEFAULT_PAGE).max(1);
        let limit = parse_or(self.limit.as_deref(), DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        PageWindow {
            page,
            limit,
            skip: (page - 1).saturating_mul(limit),
        }
    }
}

/// Leading integer of `raw`, or `default` when there is none or it is zero.
fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    let Some(raw) = raw else {
        return default;
    };
    let trimmed = raw.trim();
    let sign_len = usize::from(trimmed.starts_with('-'));
    let digits = trimmed[sign_len..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .count();
    match trimmed[..sign_len + digits].parse::<i64>() {
        Ok(0) | Err(_) => default,
        Ok(value) => value,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(window: PageWindow, total: i64) -> Self {
        let total_pages = (total + window.limit - 1) / window.limit;
        Self {
            page: window.page,
            limit: window.limit,
            total,
            total_pages,
            has_next: window.page < total_pages,
            has_prev: window.page > 1,
        }
    }
}
