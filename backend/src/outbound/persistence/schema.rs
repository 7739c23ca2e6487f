//! Diesel table definitions matching `backend/migrations`.

diesel::table! {
    /// Allocated user identifiers.
    users (user_id) {
        user_id -> Int4,
    }
}

diesel::table! {
    /// Segment catalogue; `slug` is unique.
    segments (segment_id) {
        segment_id -> Int4,
        slug -> Text,
    }
}

diesel::table! {
    /// One row per membership. A null `alive_until` never expires.
    user_segments (user_id, segment_id) {
        user_id -> Int4,
        segment_id -> Int4,
        alive_until -> Nullable<Date>,
    }
}

diesel::table! {
    /// Append-only audit trail, one row per segment per operation.
    ///
    /// `segment_id` carries no foreign key so rows outlive their segment.
    history (history_id) {
        history_id -> Int8,
        user_id -> Int4,
        segment_id -> Int4,
        operation -> Text,
        recorded_at -> Timestamptz,
    }
}

diesel::joinable!(user_segments -> segments (segment_id));

diesel::allow_tables_to_appear_in_same_query!(users, segments, user_segments, history);
