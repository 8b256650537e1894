pub mod base;
pub mod middleware;
pub mod sqlite;
