//! Diesel row structs. Internal to the persistence adapters.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use super::schema::{history, segments, user_segments, users};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = segments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SegmentRow {
    pub segment_id: i32,
    pub slug: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = segments)]
pub(crate) struct NewSegmentRow<'a> {
    pub slug: &'a str,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow {
    pub user_id: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_segments)]
pub(crate) struct NewMembershipRow {
    pub user_id: i32,
    pub segment_id: i32,
    pub alive_until: Option<NaiveDate>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = history)]
pub(crate) struct NewHistoryRow<'a> {
    pub user_id: i32,
    pub segment_id: i32,
    pub operation: &'a str,
    pub recorded_at: DateTime<Utc>,
}

/// Audit row joined with the segment's current slug, if it still exists.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct HistoryEntryRow {
    pub user_id: i32,
    pub segment_id: i32,
    pub operation: String,
    pub recorded_at: DateTime<Utc>,
    pub slug: Option<String>,
}
