//! A Refine-style data provider over any [`connectors::SqlExecutor`].

pub mod error;
pub mod logging;
pub mod params;
pub mod provider;

pub use error::ProviderError;
pub use params::{GetListParams, GetListResult};
pub use provider::DataProvider;
