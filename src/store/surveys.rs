use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::AppError;
use crate::survey::types::{Question, Survey, SurveyStatus};
use crate::survey::validate::questions_from_json;

use super::{expect_changed, format_time, parse_timestamp, Store};

const SURVEY_COLUMNS: &str = "id, name, status, creator, date_created, num_questions, questions";

struct SurveyRow {
  id: String,
  name: String,
  status: String,
  creator: String,
  date_created: Option<String>,
  num_questions: i64,
  questions: String,
}

impl SurveyRow {
  fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id: row.get(0)?,
      name: row.get(1)?,
      status: row.get(2)?,
      creator: row.get(3)?,
      date_created: row.get(4)?,
      num_questions: row.get(5)?,
      questions: row.get(6)?
    })
  }

  fn into_survey(self) -> Result<Survey, AppError> {
    let status = self
      .status
      .parse::<SurveyStatus>()
      .map_err(|e| AppError::Connection(format!("Malformed survey '{}': {e}", self.name)))?;
    let questions = questions_from_json(&self.questions)?.map_err(|e| {
      log::warn!("survey '{}' holds an invalid question list: {e}", self.name);
      AppError::Schema(e)
    })?;
    Ok(Survey {
      id: self.id,
      name: self.name,
      status,
      creator: self.creator,
      date_created: self.date_created.as_deref().and_then(parse_timestamp),
      num_questions: self.num_questions.max(0) as usize,
      questions
    })
  }
}

impl Store {
  fn query_surveys(&self, filter: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Survey>, AppError> {
    let mut stmt = self.conn().prepare(&format!(
      "SELECT {SURVEY_COLUMNS} FROM surveys {filter} ORDER BY date_created, name"
    ))?;
    let rows = stmt.query_map(args, SurveyRow::read)?;

    let mut surveys = Vec::new();
    for row in rows {
      surveys.push(row?.into_survey()?);
    }
    Ok(surveys)
  }

  /// Stores a new, empty survey stamped with the current time.
  pub fn insert_survey(
    &self,
    name: &str,
    creator: &str,
    status: SurveyStatus
  ) -> Result<Survey, AppError> {
    let survey = Survey {
      id: Uuid::new_v4().to_string(),
      name: name.to_string(),
      status,
      creator: creator.to_string(),
      date_created: Some(Utc::now()),
      num_questions: 0,
      questions: Vec::new()
    };
    let created = survey.date_created.as_ref().map(format_time);
    self.conn().execute(
      "INSERT INTO surveys (id, name, status, creator, date_created, num_questions, questions) \
      VALUES (?1, ?2, ?3, ?4, ?5, 0, '[]')",
      params![survey.id, survey.name, status.as_str(), survey.creator, created]
    )?;
    log::info!("created survey '{}' ({}) for {}", survey.name, survey.id, survey.creator);
    Ok(survey)
  }

  pub fn get_survey(&self, id: &str) -> Result<Survey, AppError> {
    self
      .conn()
      .query_row(
        &format!("SELECT {SURVEY_COLUMNS} FROM surveys WHERE id = ?1"),
        params![id],
        SurveyRow::read
      )
      .optional()?
      .ok_or_else(|| AppError::NotFound("Survey".to_string()))?
      .into_survey()
  }

  pub fn list_surveys(&self) -> Result<Vec<Survey>, AppError> {
    self.query_surveys("", &[])
  }

  /// Surveys whose creator matches ignoring case.
  pub fn list_surveys_by_creator(&self, creator: &str) -> Result<Vec<Survey>, AppError> {
    self.query_surveys("WHERE creator = ?1 COLLATE NOCASE", &[&creator])
  }

  pub fn list_active_surveys(&self) -> Result<Vec<Survey>, AppError> {
    self.query_surveys("WHERE status = ?1", &[&SurveyStatus::Active.as_str()])
  }

  pub fn survey_name_taken(&self, name: &str, except_id: Option<&str>) -> Result<bool, AppError> {
    let count: i64 = self.conn().query_row(
      "SELECT COUNT(*) FROM surveys WHERE name = ?1 AND id != ?2",
      params![name, except_id.unwrap_or("")],
      |row| row.get(0)
    )?;
    Ok(count > 0)
  }

  pub fn update_survey_details(&self, id: &str, name: &str, status: SurveyStatus) -> Result<(), AppError> {
    let changed = self.conn().execute(
      "UPDATE surveys SET name = ?1, status = ?2 WHERE id = ?3",
      params![name, status.as_str(), id]
    )?;
    expect_changed(changed, "Survey")?;
    log::info!("updated survey {id}: name '{name}', status {status}");
    Ok(())
  }

  pub fn update_survey_status(&self, id: &str, status: SurveyStatus) -> Result<(), AppError> {
    let changed = self.conn().execute(
      "UPDATE surveys SET status = ?1 WHERE id = ?2",
      params![status.as_str(), id]
    )?;
    expect_changed(changed, "Survey")?;
    log::info!("survey {id} is now {status}");
    Ok(())
  }

  /// Replaces the question list and its cached count in one statement.
  pub fn save_questions(&self, id: &str, questions: &[Question]) -> Result<(), AppError> {
    let payload = serde_json::to_string(questions)?;
    let changed = self.conn().execute(
      "UPDATE surveys SET questions = ?1, num_questions = ?2 WHERE id = ?3",
      params![payload, questions.len() as i64, id]
    )?;
    expect_changed(changed, "Survey")?;
    log::info!("saved {} questions for survey {id}", questions.len());
    Ok(())
  }

  /// Removes the survey document. Its responses stay in the store.
  pub fn delete_survey(&self, id: &str) -> Result<(), AppError> {
    let changed = self
      .conn()
      .execute("DELETE FROM surveys WHERE id = ?1", params![id])?;
    expect_changed(changed, "Survey")?;
    log::info!("deleted survey {id}");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use crate::error::AppError;
  use crate::store::Store;
  use crate::survey::types::{Question, QuestionType, SurveyStatus};
  use crate::survey::validate::SchemaError;

  fn question(id: &str) -> Question {
    Question {
      id: id.to_string(),
      text: format!("Text {id}"),
      question_type: QuestionType::SingleChoice,
      options: vec!["Yes".to_string(), "No".to_string()],
      mandatory: true
    }
  }

  #[test]
  fn saving_questions_keeps_count_in_step() {
    let store = Store::open_in_memory().expect("store");
    let survey = store
      .insert_survey("Satisfaction", "admin", SurveyStatus::Draft)
      .expect("insert");
    for n in [3usize, 1, 0] {
      let questions: Vec<Question> = (1..=n).map(|i| question(&format!("Q{i}"))).collect();
      store.save_questions(&survey.id, &questions).expect("save");
      let loaded = store.get_survey(&survey.id).expect("get");
      assert_eq!(loaded.num_questions, loaded.questions.len());
      assert_eq!(loaded.questions, questions);
    }
  }

  #[test]
  fn survey_names_are_unique_and_exact() {
    let store = Store::open_in_memory().expect("store");
    let first = store
      .insert_survey("Census", "admin", SurveyStatus::Draft)
      .expect("insert");
    assert!(store.survey_name_taken("Census", None).expect("taken"));
    assert!(!store.survey_name_taken("Census", Some(&first.id)).expect("self"));
    assert!(!store.survey_name_taken("census", None).expect("case"));
    assert!(matches!(
      store.insert_survey("Census", "bob", SurveyStatus::Draft),
      Err(AppError::Conflict(_))
    ));
  }

  #[test]
  fn filters_by_creator_ignoring_case_and_by_status() {
    let store = Store::open_in_memory().expect("store");
    let a = store.insert_survey("A", "Bob", SurveyStatus::Active).expect("a");
    store.insert_survey("B", "alice", SurveyStatus::Draft).expect("b");
    let mine = store.list_surveys_by_creator("bob").expect("mine");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, a.id);
    let active = store.list_active_surveys().expect("active");
    assert_eq!(active.len(), 1);
    store
      .update_survey_details(&a.id, "A2", SurveyStatus::Archived)
      .expect("update");
    assert!(store.list_active_surveys().expect("active").is_empty());
    assert_eq!(store.list_surveys().expect("all").len(), 2);
  }

  #[test]
  fn missing_survey_is_not_found() {
    let store = Store::open_in_memory().expect("store");
    assert!(matches!(store.get_survey("x"), Err(AppError::NotFound(_))));
    assert!(matches!(store.delete_survey("x"), Err(AppError::NotFound(_))));
    assert!(matches!(
      store.update_survey_status("x", SurveyStatus::Active),
      Err(AppError::NotFound(_))
    ));
  }

  #[test]
  fn stored_question_without_mandatory_flag_is_a_schema_error() {
    let store = Store::open_in_memory().expect("store");
    let survey = store
      .insert_survey("Legacy", "admin", SurveyStatus::Draft)
      .expect("insert");
    store
      .conn()
      .execute(
        "UPDATE surveys SET questions = ?1 WHERE id = ?2",
        rusqlite::params![r#"[{"id":"Q1","text":"t","type":"TEXT_INPUT","options":[]}]"#, survey.id]
      )
      .expect("raw update");
    let err = store.get_survey(&survey.id).expect_err("schema");
    assert!(matches!(
      err,
      AppError::Schema(SchemaError::MissingField { field: "isMandatory", .. })
    ));
    assert_eq!(err.alert().1, "Input Error");
  }
}
