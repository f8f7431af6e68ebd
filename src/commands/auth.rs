use crate::app::App;
use crate::error::AppError;
use crate::response::validate::ValidationError;
use crate::store::password::verify_password;

use super::Session;

const INVALID_LOGIN: &str = "Invalid username or password.";

/// Username must match exactly; the password is checked against its hash.
pub fn login(app: &App, username: &str, password: &str) -> Result<Session, AppError> {
  let username = username.trim();
  if username.is_empty() || password.is_empty() {
    return Err(ValidationError::Input("Please enter both username and password.".to_string()).into());
  }
  let user = match app.store.find_user(username)? {
    Some(user) if verify_password(password, &user.password_hash) => user,
    _ => {
      log::warn!("failed login for '{username}'");
      return Err(ValidationError::Input(INVALID_LOGIN.to_string()).into());
    }
  };
  log::info!("'{}' logged in as {}", user.username, user.role);
  Ok(Session {
    user_id: user.id,
    username: user.username,
    role: user.role
  })
}
