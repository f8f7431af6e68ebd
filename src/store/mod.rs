//! SQLite document store for the `users`, `surveys` and `responses`
//! collections. Nested parts of a document (question lists, answer lists)
//! are kept as JSON text.

pub mod password;
pub mod responses;
pub mod surveys;
pub mod users;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use uuid::Uuid;

use crate::error::AppError;
use crate::render::helpers::ensure_dir;
use crate::survey::types::Role;

pub struct Store {
  conn: Connection,
}

impl Store {
  pub fn open(path: &Path) -> Result<Self, AppError> {
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        ensure_dir(parent)?;
      }
    }
    let conn = Connection::open(path)?;
    log::info!("opened database {}", path.display());
    Self::with_connection(conn)
  }

  pub fn open_in_memory() -> Result<Self, AppError> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self, AppError> {
    let store = Self { conn };
    store.init_schema()?;
    Ok(store)
  }

  pub(crate) fn conn(&self) -> &Connection {
    &self.conn
  }

  fn init_schema(&self) -> Result<(), AppError> {
    self.conn.execute_batch(
      "CREATE TABLE IF NOT EXISTS users (
          id TEXT PRIMARY KEY,
          username TEXT NOT NULL UNIQUE COLLATE NOCASE,
          password TEXT NOT NULL,
          role TEXT NOT NULL,
          created_at TEXT NOT NULL,
          seed INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS surveys (
          id TEXT PRIMARY KEY,
          name TEXT NOT NULL UNIQUE,
          status TEXT NOT NULL,
          creator TEXT NOT NULL,
          date_created TEXT,
          num_questions INTEGER NOT NULL DEFAULT 0,
          questions TEXT NOT NULL DEFAULT '[]'
        );
        CREATE INDEX IF NOT EXISTS idx_surveys_creator ON surveys(creator);
        CREATE TABLE IF NOT EXISTS responses (
          id TEXT PRIMARY KEY,
          survey_id TEXT NOT NULL,
          user_id TEXT NOT NULL,
          timestamp TEXT NOT NULL,
          schema_hash TEXT,
          answers TEXT NOT NULL DEFAULT '[]'
        );
        CREATE INDEX IF NOT EXISTS idx_responses_survey ON responses(survey_id);"
    )?;
    let has_seed: i64 = self.conn.query_row(
      "SELECT COUNT(*) FROM pragma_table_info('users') WHERE name = 'seed'",
      [],
      |row| row.get(0)
    )?;
    if has_seed == 0 {
      self
        .conn
        .execute_batch("ALTER TABLE users ADD COLUMN seed INTEGER NOT NULL DEFAULT 0;")?;
      log::info!("added seed column to users");
    }
    Ok(())
  }

  /// Creates the designated administrator when no account exists yet and
  /// marks it as the seed account, which survives renames. A database
  /// without a marked account gets the mark on the account named
  /// `username`. Returns whether an account was created.
  pub fn ensure_seed_admin(&self, username: &str, password: &str) -> Result<bool, AppError> {
    let existing: i64 = self
      .conn
      .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    if existing > 0 {
      let marked: i64 = self
        .conn
        .query_row("SELECT COUNT(*) FROM users WHERE seed = 1", [], |row| row.get(0))?;
      if marked == 0 {
        let changed = self.conn.execute(
          "UPDATE users SET seed = 1 WHERE username = ?1 COLLATE BINARY",
          params![username]
        )?;
        if changed > 0 {
          log::info!("marked '{username}' as the seed administrator");
        }
      }
      return Ok(false);
    }
    let hash = password::hash_password(password)?;
    self.conn.execute(
      "INSERT INTO users (id, username, password, role, created_at, seed) VALUES (?1, ?2, ?3, ?4, ?5, 1)",
      params![
        Uuid::new_v4().to_string(),
        username,
        hash,
        Role::Administrator.as_str(),
        now_string()
      ]
    )?;
    log::info!("seeded administrator account '{username}'");
    Ok(true)
  }
}

pub(crate) fn now_string() -> String {
  format_time(&Utc::now())
}

/// Fixed-width RFC 3339 so stored timestamps sort as text.
pub(crate) fn format_time(value: &DateTime<Utc>) -> String {
  value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(raw)
    .ok()
    .map(|d| d.with_timezone(&Utc))
}

/// Maps a zero-row update or delete to `NotFound`.
pub(crate) fn expect_changed(changed: usize, what: &str) -> Result<(), AppError> {
  if changed == 0 {
    log::warn!("{what} update matched no rows");
    Err(AppError::NotFound(what.to_string()))
  } else {
    Ok(())
  }
}
