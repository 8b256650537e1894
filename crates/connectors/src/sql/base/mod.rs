pub mod adapter;
pub mod ext;
