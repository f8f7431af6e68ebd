pub mod builder;
pub mod types;
pub mod validate;
