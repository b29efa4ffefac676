//! Diesel table definitions.
//!
//! Must track `migrations/` exactly; regenerate with `diesel print-schema`
//! after changing a migration.

diesel::table! {
    /// Registered forum members.
    members (id) {
        id -> Uuid,
        /// Unique `@` handle, at most 32 word characters.
        handle -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One reputation account per member.
    user_scores (user_id) {
        user_id -> Uuid,
        total_points -> Int8,
        current_tier_id -> Varchar,
        /// Optimistic concurrency counter, bumped on every award.
        version -> Int8,
        /// Tier reached but not yet announced to the member.
        pending_rank_up -> Nullable<Varchar>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only award history.
    point_events (id) {
        id -> Uuid,
        user_id -> Uuid,
        amount -> Int8,
        reason -> Varchar,
        occurred_at -> Timestamptz,
        /// Insertion order; breaks ties between events in the same tick.
        seq -> Int8,
    }
}

diesel::table! {
    notifications (id) {
        id -> Int8,
        recipient_id -> Uuid,
        kind -> Varchar,
        message -> Text,
        link -> Nullable<Text>,
        created_at -> Timestamptz,
        is_read -> Bool,
    }
}

diesel::joinable!(user_scores -> members (user_id));
diesel::joinable!(point_events -> user_scores (user_id));
diesel::joinable!(notifications -> members (recipient_id));

diesel::allow_tables_to_appear_in_same_query!(members, user_scores, point_events, notifications);
