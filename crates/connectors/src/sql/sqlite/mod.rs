//! SQLite through sqlx. Covers file databases and private in-memory ones.

pub mod adapter;
pub mod params;
