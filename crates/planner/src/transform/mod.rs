//! Compilers from Refine-style query inputs to SQL expression trees.

pub mod identifier;
pub mod logical;
pub mod pagination;
pub mod predicate;
pub mod sort;
