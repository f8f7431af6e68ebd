use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::AppError;
use crate::survey::types::{Role, User};

use super::{expect_changed, now_string, parse_timestamp, Store};

const USER_COLUMNS: &str = "id, username, password, role, created_at, seed";

struct UserRow {
  id: String,
  username: String,
  password: String,
  role: String,
  created_at: String,
  seed: bool,
}

impl UserRow {
  fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id: row.get(0)?,
      username: row.get(1)?,
      password: row.get(2)?,
      role: row.get(3)?,
      created_at: row.get(4)?,
      seed: row.get(5)?
    })
  }

  fn into_user(self) -> Result<User, AppError> {
    let role = self
      .role
      .parse::<Role>()
      .map_err(|e| AppError::Connection(format!("Malformed user '{}': {e}", self.username)))?;
    Ok(User {
      id: self.id,
      username: self.username,
      password_hash: self.password,
      role,
      created_at: parse_timestamp(&self.created_at),
      seed: self.seed
    })
  }
}

impl Store {
  /// Exact, case-sensitive lookup used by login.
  pub fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
    let row = self
      .conn()
      .query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1 COLLATE BINARY"),
        params![username],
        UserRow::read
      )
      .optional()?;
    row.map(UserRow::into_user).transpose()
  }

  pub fn get_user(&self, id: &str) -> Result<User, AppError> {
    let row = self
      .conn()
      .query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        UserRow::read
      )
      .optional()?
      .ok_or_else(|| AppError::NotFound("User".to_string()))?;
    row.into_user()
  }

  pub fn list_users(&self) -> Result<Vec<User>, AppError> {
    let mut stmt = self
      .conn()
      .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username COLLATE NOCASE"))?;
    let rows = stmt.query_map([], UserRow::read)?;

    let mut users = Vec::new();
    for row in rows {
      users.push(row?.into_user()?);
    }
    Ok(users)
  }

  /// Case-insensitive check, optionally ignoring one account (the one being
  /// renamed).
  pub fn username_taken(&self, username: &str, except_id: Option<&str>) -> Result<bool, AppError> {
    let count: i64 = self.conn().query_row(
      "SELECT COUNT(*) FROM users WHERE username = ?1 COLLATE NOCASE AND id != ?2",
      params![username, except_id.unwrap_or("")],
      |row| row.get(0)
    )?;
    Ok(count > 0)
  }

  pub fn count_administrators(&self) -> Result<usize, AppError> {
    let count: i64 = self.conn().query_row(
      "SELECT COUNT(*) FROM users WHERE role = ?1",
      params![Role::Administrator.as_str()],
      |row| row.get(0)
    )?;
    Ok(count.max(0) as usize)
  }

  pub fn insert_user(&self, username: &str, password_hash: &str, role: Role) -> Result<User, AppError> {
    let id = Uuid::new_v4().to_string();
    let created_at = now_string();
    self.conn().execute(
      "INSERT INTO users (id, username, password, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
      params![id, username, password_hash, role.as_str(), created_at]
    )?;
    log::info!("created user '{username}' as {role}");
    Ok(User {
      id,
      username: username.to_string(),
      password_hash: password_hash.to_string(),
      role,
      created_at: parse_timestamp(&created_at),
      seed: false
    })
  }

  /// Rewrites username and role, and the password hash when one is given.
  pub fn update_user(
    &self,
    id: &str,
    username: &str,
    role: Role,
    password_hash: Option<&str>
  ) -> Result<(), AppError> {
    let changed = match password_hash {
      Some(hash) => self.conn().execute(
        "UPDATE users SET username = ?1, role = ?2, password = ?3 WHERE id = ?4",
        params![username, role.as_str(), hash, id]
      )?,
      None => self.conn().execute(
        "UPDATE users SET username = ?1, role = ?2 WHERE id = ?3",
        params![username, role.as_str(), id]
      )?,
    };
    expect_changed(changed, "User")?;
    log::info!("updated user {id} ('{username}', {role})");
    Ok(())
  }

  pub fn update_username(&self, id: &str, username: &str) -> Result<(), AppError> {
    let changed = self.conn().execute(
      "UPDATE users SET username = ?1 WHERE id = ?2",
      params![username, id]
    )?;
    expect_changed(changed, "User")?;
    log::info!("renamed user {id} to '{username}'");
    Ok(())
  }

  pub fn update_password(&self, id: &str, password_hash: &str) -> Result<(), AppError> {
    let changed = self.conn().execute(
      "UPDATE users SET password = ?1 WHERE id = ?2",
      params![password_hash, id]
    )?;
    expect_changed(changed, "User")?;
    log::info!("changed password of user {id}");
    Ok(())
  }

  pub fn delete_user(&self, id: &str) -> Result<(), AppError> {
    let changed = self
      .conn()
      .execute("DELETE FROM users WHERE id = ?1", params![id])?;
    expect_changed(changed, "User")?;
    log::info!("deleted user {id}");
    Ok(())
  }
}
