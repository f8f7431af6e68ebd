use serde::{Deserialize, Serialize};

use crate::access::policy::{Action, Resource, UserChange};
use crate::app::App;
use crate::error::AppError;
use crate::response::validate::ValidationError;
use crate::store::password::hash_password;
use crate::survey::types::{Role, User};
use crate::util::text::{non_blank, same_username};

use super::Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
  pub id: String,
  pub username: String,
  pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
  pub username: String,
  pub password: String,
  pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEdit {
  pub user_id: String,
  pub username: String,
  pub role: Role,
  /// Left blank to keep the current password.
  #[serde(default)]
  pub password: Option<String>,
}

fn input(message: impl Into<String>) -> AppError {
  ValidationError::Input(message.into()).into()
}

fn check_password_length(app: &App, password: &str) -> Result<(), AppError> {
  let min = app.settings.min_password_length;
  if password.chars().count() < min {
    return Err(input(format!("Password must be at least {min} characters long.")));
  }
  Ok(())
}

/// Administrator count, taken as the maximum when it cannot be read.
fn administrator_count(app: &App) -> usize {
  app.store.count_administrators().unwrap_or_else(|err| {
    log::error!("unable to count administrators: {err}");
    app.settings.max_administrators
  })
}

pub fn list_users(app: &App, session: &Session) -> Result<Vec<UserSummary>, AppError> {
  app.policy().authorize(&session.actor(), Action::View, &Resource::Users)?;
  Ok(
    app
      .store
      .list_users()?
      .into_iter()
      .map(|u| UserSummary {
        id: u.id,
        username: u.username,
        role: u.role
      })
      .collect()
  )
}

pub fn add_user(app: &App, session: &Session, args: NewUser) -> Result<User, AppError> {
  let policy = app.policy();
  let actor = session.actor();
  policy.authorize(&actor, Action::Create, &Resource::Users)?;

  let username = non_blank(&args.username)
    .ok_or_else(|| input("Please fill in all fields."))?
    .to_string();
  if args.password.is_empty() {
    return Err(input("Please fill in all fields."));
  }
  check_password_length(app, &args.password)?;

  let change = UserChange {
    username: username.clone(),
    current_role: None,
    requested_role: Some(args.role),
    administrators: administrator_count(app),
    seed: false
  };
  policy.authorize(&actor, Action::Create, &Resource::User(change))?;

  if app.store.username_taken(&username, None)? {
    return Err(AppError::Conflict(format!("Username '{username}' already exists.")));
  }
  let hash = hash_password(&args.password)?;
  app.store.insert_user(&username, &hash, args.role)
}

/// Renames, re-roles and optionally re-passwords an account. When the
/// operator edits their own account the session follows the new name.
pub fn edit_user(app: &App, session: &mut Session, args: UserEdit) -> Result<User, AppError> {
  let policy = app.policy();
  policy.authorize(&session.actor(), Action::Edit, &Resource::Users)?;

  let username = non_blank(&args.username)
    .ok_or_else(|| input("Username cannot be empty."))?
    .to_string();
  let new_password = args.password.as_deref().filter(|p| !p.trim().is_empty());
  if let Some(password) = new_password {
    check_password_length(app, password)?;
  }

  let target = app.store.get_user(&args.user_id)?;
  let change = UserChange {
    username: target.username.clone(),
    current_role: Some(target.role),
    requested_role: Some(args.role),
    administrators: administrator_count(app),
    seed: target.seed
  };
  policy.authorize(&session.actor(), Action::Edit, &Resource::User(change))?;

  if !same_username(&username, &target.username) && app.store.username_taken(&username, Some(&target.id))? {
    return Err(AppError::Conflict(format!("Username '{username}' already exists.")));
  }
  let hash = new_password.map(hash_password).transpose()?;
  app.store.update_user(&target.id, &username, args.role, hash.as_deref())?;

  if target.id == session.user_id {
    session.username = username.clone();
    session.role = args.role;
  }
  app.store.get_user(&target.id)
}

pub fn delete_user(app: &App, session: &Session, user_id: &str) -> Result<(), AppError> {
  let policy = app.policy();
  policy.authorize(&session.actor(), Action::Delete, &Resource::Users)?;
  let target = app.store.get_user(user_id)?;
  let change = UserChange {
    username: target.username.clone(),
    current_role: Some(target.role),
    requested_role: None,
    administrators: administrator_count(app),
    seed: target.seed
  };
  policy.authorize(&session.actor(), Action::Delete, &Resource::User(change))?;
  app.store.delete_user(&target.id)
}
