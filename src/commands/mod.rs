//! One function per user action. Each checks the access policy before it
//! touches the store and returns `AppError` for the front end to display.

pub mod auth;
pub mod profile;
pub mod reports;
pub mod surveys;
pub mod taker;
pub mod users;

use serde::Serialize;

use crate::access::policy::Actor;
use crate::survey::types::Role;

/// The logged-in operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

impl Session {
    pub fn actor(&self) -> Actor {
        Actor::new(self.username.clone(), self.role)
    }
}
