//! API utility functions
//!
//! Shared router state, listing query parameters, and the pagination
//! response header used by the member listing endpoint.

use crate::members::db::{MemberFilter, MemberOrder, PagedList};
use crate::members::MemberDb;
use crate::services::PhotoStorage;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use chrono::{Months, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;

/// State shared by every handler: the repository and the photo storage client
pub type RouterState = (Arc<MemberDb>, Arc<dyn PhotoStorage>);

/// Maximum page size a client may request
pub const MAX_PAGE_SIZE: i64 = 50;
/// Page size used when the client does not specify one
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Default minimum age filter
pub const DEFAULT_MIN_AGE: i32 = 18;
/// Default maximum age filter
pub const DEFAULT_MAX_AGE: i32 = 150;

/// Query parameters for the member listing endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListParams {
    pub page_number: i64,
    pub page_size: i64,
    /// Gender filter; defaults to the opposite of the caller's gender
    pub gender: Option<String>,
    pub min_age: i32,
    pub max_age: i32,
    /// "created" orders by account creation; anything else by last activity
    pub order_by: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
            gender: None,
            min_age: DEFAULT_MIN_AGE,
            max_age: DEFAULT_MAX_AGE,
            order_by: None,
        }
    }
}

impl ListParams {
    /// Page size clamped to the allowed maximum
    pub fn effective_page_size(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Page number floored at 1
    pub fn effective_page_number(&self) -> i64 {
        self.page_number.max(1)
    }

    /// Minimum age clamped to the supported range
    pub fn effective_min_age(&self) -> u32 {
        self.min_age.clamp(0, DEFAULT_MAX_AGE) as u32
    }

    /// Maximum age clamped to the supported range
    pub fn effective_max_age(&self) -> u32 {
        self.max_age.clamp(0, DEFAULT_MAX_AGE) as u32
    }

    /// Build the repository filter for this request
    ///
    /// # Arguments
    /// * `current_username` - Caller, always excluded from results
    /// * `gender` - Already-resolved gender filter
    /// * `today` - Reference date for the age-to-dob conversion
    pub fn to_filter(&self, current_username: &str, gender: String, today: NaiveDate) -> MemberFilter {
        // Age bounds become date-of-birth bounds: someone aged `maxAge`
        // today was born after today minus (maxAge + 1) years. Ages are
        // clamped first; negative or absurd values must not panic the
        // month arithmetic.
        let min_dob = today
            .checked_sub_months(Months::new((self.effective_max_age() + 1) * 12))
            .unwrap_or(today);
        let max_dob = today
            .checked_sub_months(Months::new(self.effective_min_age() * 12))
            .unwrap_or(today);

        let order_by = match self.order_by.as_deref() {
            Some("created") => MemberOrder::Created,
            _ => MemberOrder::LastActive,
        };

        MemberFilter {
            current_username: current_username.to_string(),
            gender,
            min_dob,
            max_dob,
            order_by,
            page_number: self.effective_page_number(),
            page_size: self.effective_page_size(),
        }
    }
}

/// Build the `Pagination` response header for a page of results
///
/// The header carries the page counters as a JSON object; it is also listed
/// in `Access-Control-Expose-Headers` so browsers can read it.
pub fn pagination_header<T>(page: &PagedList<T>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let body = serde_json::json!({
        "currentPage": page.current_page,
        "itemsPerPage": page.page_size,
        "totalItems": page.total_count,
        "totalPages": page.total_pages,
    });

    if let Ok(value) = HeaderValue::from_str(&body.to_string()) {
        headers.insert(HeaderName::from_static("pagination"), value);
        headers.insert(
            HeaderName::from_static("access-control-expose-headers"),
            HeaderValue::from_static("Pagination"),
        );
    }

    headers
}
