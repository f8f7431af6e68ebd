use serde::Deserialize;

use crate::app::App;
use crate::error::AppError;
use crate::response::validate::ValidationError;
use crate::store::password::{hash_password, verify_password};

use super::Session;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernameChange {
  pub new_username: String,
  pub current_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
  pub current_password: String,
  pub new_password: String,
  pub confirm_password: String,
}

fn input(message: impl Into<String>) -> AppError {
  ValidationError::Input(message.into()).into()
}

fn confirm_current_password(app: &App, session: &Session, password: &str) -> Result<(), AppError> {
  let user = app.store.get_user(&session.user_id)?;
  if verify_password(password, &user.password_hash) {
    Ok(())
  } else {
    log::warn!("'{}' entered a wrong current password", session.username);
    Err(input("Current password is incorrect."))
  }
}

pub fn change_username(app: &App, session: &mut Session, args: UsernameChange) -> Result<(), AppError> {
  let new_username = args.new_username.trim();
  if new_username.is_empty() || args.current_password.is_empty() {
    return Err(input("Please enter the new username and your current password."));
  }
  if new_username == session.username {
    return Err(input("The new username is the same as the current one."));
  }
  confirm_current_password(app, session, &args.current_password)?;
  if app.store.username_taken(new_username, Some(&session.user_id))? {
    return Err(AppError::Conflict(format!("Username '{new_username}' is already taken.")));
  }
  app.store.update_username(&session.user_id, new_username)?;
  log::info!("'{}' renamed themselves to '{new_username}'", session.username);
  session.username = new_username.to_string();
  Ok(())
}

pub fn change_password(app: &App, session: &Session, args: PasswordChange) -> Result<(), AppError> {
  if args.current_password.is_empty() || args.new_password.is_empty() || args.confirm_password.is_empty() {
    return Err(input("All password fields are required."));
  }
  let min = app.settings.min_password_length;
  if args.new_password.chars().count() < min {
    return Err(input(format!("New password must be at least {min} characters long.")));
  }
  if args.new_password != args.confirm_password {
    return Err(input("New password and confirmation do not match."));
  }
  if args.new_password == args.current_password {
    return Err(input("New password must be different from the current password."));
  }
  confirm_current_password(app, session, &args.current_password)?;
  let hash = hash_password(&args.new_password)?;
  app.store.update_password(&session.user_id, &hash)
}
