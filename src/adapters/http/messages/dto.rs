//! HTTP DTOs for message endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::chat::Page;
use crate::domain::foundation::ValidationError;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to send a direct message over HTTP.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: i64,
    pub content: String,
}

/// `?skip=&limit=` query parameters shared by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Validates into a `Page`, applying the default limit.
    pub fn into_page(self) -> Result<Page, ValidationError> {
        let skip = match self.skip {
            None => 0,
            Some(s) if s < 0 => {
                return Err(ValidationError::out_of_range("skip", 0, u32::MAX as i64, s))
            }
            Some(s) => u32::try_from(s).unwrap_or(u32::MAX),
        };
        let limit = match self.limit {
            None => Page::DEFAULT_LIMIT,
            Some(l) => u32::try_from(l).map_err(|_| {
                ValidationError::out_of_range("limit", 1, Page::MAX_LIMIT as i64, l)
            })?,
        };
        Page::new(skip, limit)
    }
}

/// Query for `GET /messages/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl SearchQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            skip: self.skip,
            limit: self.limit,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Plain acknowledgement body.
#[derive(Debug, Clone, Serialize)]
pub struct StatusMessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnreadCountResponse {
    pub unread_count: u64,
}
