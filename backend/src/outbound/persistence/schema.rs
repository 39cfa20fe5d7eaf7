//! Diesel table definitions for the PostgreSQL schema.
//!
//! Must match `backend/migrations` exactly.

diesel::table! {
    /// Administered user accounts.
    users (id) {
        /// Primary key from a `BIGSERIAL` sequence.
        id -> Int8,
        /// Whitespace-normalised name, at most 80 characters.
        name -> Varchar,
        /// Email address, unique, at most 120 characters.
        email -> Varchar,
        /// Row creation timestamp.
        created_at -> Timestamptz,
    }
}
