//! Membership audit report.
//!
//! ```text
//! GET /api/v1/history?since=YYYY-MM-DD HH:MM
//! ```

use actix_web::{get, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, HistoryEntry};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_history_since};

const SINCE: FieldName = FieldName::new("since");

/// Query parameters for the report.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryParams {
    pub since: Option<String>,
}

/// One audit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntryResponse {
    pub user_id: i32,
    pub segment_id: i32,
    /// Absent once the segment has been deleted.
    pub slug: Option<String>,
    #[schema(example = "added")]
    pub operation: String,
    pub recorded_at: DateTime<Utc>,
}

impl From<HistoryEntry> for HistoryEntryResponse {
    fn from(value: HistoryEntry) -> Self {
        Self {
            user_id: value.user_id.get(),
            segment_id: value.segment_id.get(),
            slug: value.slug.map(String::from),
            operation: value.operation.as_str().to_owned(),
            recorded_at: value.recorded_at,
        }
    }
}

/// List membership changes recorded at or after `since` (UTC), oldest
/// first.
#[utoipa::path(
    get,
    path = "/api/v1/history",
    params(
        ("since" = String, Query, description = "Lower bound, `YYYY-MM-DD HH:MM` in UTC")
    ),
    responses(
        (status = 200, description = "Audit rows", body = [HistoryEntryResponse]),
        (status = 400, description = "Missing or malformed since", body = Error),
        (status = 500, description = "Store failure", body = Error)
    ),
    tags = ["history"],
    operation_id = "listHistory"
)]
#[get("/history")]
pub async fn list_history(
    state: web::Data<HttpState>,
    query: web::Query<HistoryParams>,
) -> ApiResult<web::Json<Vec<HistoryEntryResponse>>> {
    let since = parse_history_since(query.since.as_deref(), SINCE)?;
    let entries = state.history.history_since(since).await?;
    Ok(web::Json(
        entries.into_iter().map(HistoryEntryResponse::from).collect(),
    ))
}
