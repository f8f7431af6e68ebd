//! Field survey manager: survey schemas, data entry forms, response
//! validation and aggregation, role-based access and CSV/text reporting
//! over a SQLite document store.

pub mod access;
pub mod app;
pub mod commands;
pub mod error;
pub mod form;
pub mod render;
pub mod response;
pub mod settings;
pub mod store;
pub mod survey;
pub mod terminal;
pub mod util;
