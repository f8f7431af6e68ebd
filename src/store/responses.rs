use rusqlite::{params, Row};
use std::collections::HashMap;

use crate::error::AppError;
use crate::survey::types::{AnswerEntry, Response};

use super::{format_time, parse_timestamp, Store};

struct ResponseRow {
  id: String,
  survey_id: String,
  user_id: String,
  timestamp: String,
  schema_hash: Option<String>,
  answers: String,
}

impl ResponseRow {
  fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id: row.get(0)?,
      survey_id: row.get(1)?,
      user_id: row.get(2)?,
      timestamp: row.get(3)?,
      schema_hash: row.get(4)?,
      answers: row.get(5)?
    })
  }

  fn into_response(self) -> Result<Response, AppError> {
    let timestamp = parse_timestamp(&self.timestamp).ok_or_else(|| {
      AppError::Connection(format!("Malformed response {}: bad timestamp", self.id))
    })?;
    let answers: Vec<AnswerEntry> = serde_json::from_str(&self.answers)?;
    Ok(Response {
      id: self.id,
      survey_id: self.survey_id,
      user_id: self.user_id,
      timestamp,
      schema_hash: self.schema_hash,
      answers
    })
  }
}

impl Store {
  pub fn insert_response(&self, response: &Response) -> Result<(), AppError> {
    let answers = serde_json::to_string(&response.answers)?;
    self.conn().execute(
      "INSERT INTO responses (id, survey_id, user_id, timestamp, schema_hash, answers) \
      VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        response.id,
        response.survey_id,
        response.user_id,
        format_time(&response.timestamp),
        response.schema_hash,
        answers
      ]
    )?;
    log::info!(
      "stored response {} to survey {} from {}",
      response.id,
      response.survey_id,
      response.user_id
    );
    Ok(())
  }

  /// Responses for one survey, oldest first.
  pub fn responses_for_survey(&self, survey_id: &str) -> Result<Vec<Response>, AppError> {
    let mut stmt = self.conn().prepare(
      "SELECT id, survey_id, user_id, timestamp, schema_hash, answers \
      FROM responses WHERE survey_id = ?1 ORDER BY timestamp, id"
    )?;
    let rows = stmt.query_map(params![survey_id], ResponseRow::read)?;

    let mut responses = Vec::new();
    for row in rows {
      responses.push(row?.into_response()?);
    }
    Ok(responses)
  }

  /// Number of stored responses per survey id.
  pub fn response_counts(&self) -> Result<HashMap<String, usize>, AppError> {
    let mut stmt = self
      .conn()
      .prepare("SELECT survey_id, COUNT(*) FROM responses GROUP BY survey_id")?;
    let rows = stmt.query_map([], |row| {
      Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = HashMap::new();
    for row in rows {
      let (survey_id, count) = row?;
      counts.insert(survey_id, count.max(0) as usize);
    }
    Ok(counts)
  }
}
