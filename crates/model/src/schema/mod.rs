pub mod relation;
pub mod table;
