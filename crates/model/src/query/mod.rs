pub mod context;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod sort;
