pub mod schema_validator;
