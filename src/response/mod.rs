pub mod aggregate;
pub mod validate;
