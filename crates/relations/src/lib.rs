//! Batched loading of declared relations (belongsTo, hasOne, hasMany,
//! belongsToMany, polymorphic) onto already-fetched records.
//!
//! A [`RelationshipResolver`] lives for one request or page. Each relation it
//! touches gets a [`DataLoader`] that merges the per-record lookups into one
//! `IN (...)` query and caches the answers until the resolver is dropped or
//! cleared.

pub mod batch;
pub mod error;
pub mod loader;
pub mod path;
pub mod resolver;

pub use error::{LoaderError, RelationError};
pub use loader::{BatchLoad, DataLoader, LoaderConfig};
pub use resolver::{RelationshipResolver, ResolverConfig};
