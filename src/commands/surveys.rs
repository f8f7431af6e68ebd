use serde::{Deserialize, Serialize};

use crate::access::policy::{Action, Resource};
use crate::app::App;
use crate::error::AppError;
use crate::response::validate::ValidationError;
use crate::survey::builder::QuestionBuilder;
use crate::survey::types::{Survey, SurveyStatus};
use crate::util::text::non_blank;

use super::Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySummary {
  pub id: String,
  pub name: String,
  pub status: SurveyStatus,
  pub creator: String,
  pub num_questions: usize,
}

impl From<&Survey> for SurveySummary {
  fn from(survey: &Survey) -> Self {
    Self {
      id: survey.id.clone(),
      name: survey.name.clone(),
      status: survey.status,
      creator: survey.creator.clone(),
      num_questions: survey.num_questions
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDetails {
  pub name: String,
  #[serde(default)]
  pub status: SurveyStatus,
}

pub(crate) fn survey_resource(survey: &Survey) -> Resource {
  Resource::Survey {
    creator: survey.creator.clone(),
    status: survey.status
  }
}

fn checked_name(app: &App, name: &str, except_id: Option<&str>) -> Result<String, AppError> {
  let name = non_blank(name)
    .ok_or_else(|| AppError::from(ValidationError::Input("Survey name cannot be empty.".to_string())))?;
  if app.store.survey_name_taken(name, except_id)? {
    return Err(AppError::Conflict(format!("A survey named '{name}' already exists.")));
  }
  Ok(name.to_string())
}

/// Loads a survey and checks `action` on it.
fn authorized_survey(app: &App, session: &Session, survey_id: &str, action: Action) -> Result<Survey, AppError> {
  let survey = app.store.get_survey(survey_id)?;
  app.policy().authorize(&session.actor(), action, &survey_resource(&survey))?;
  Ok(survey)
}

pub fn list_surveys(app: &App, session: &Session) -> Result<Vec<SurveySummary>, AppError> {
  app.policy().authorize(&session.actor(), Action::View, &Resource::Surveys)?;
  Ok(app.store.list_surveys()?.iter().map(SurveySummary::from).collect())
}

pub fn create_survey(app: &App, session: &Session, args: SurveyDetails) -> Result<Survey, AppError> {
  app.policy().authorize(&session.actor(), Action::Create, &Resource::Surveys)?;
  let name = checked_name(app, &args.name, None)?;
  app.store.insert_survey(&name, &session.username, args.status)
}

/// Changes name and status. The creator never changes.
pub fn edit_survey(app: &App, session: &Session, survey_id: &str, args: SurveyDetails) -> Result<Survey, AppError> {
  let survey = authorized_survey(app, session, survey_id, Action::Edit)?;
  let name = checked_name(app, &args.name, Some(&survey.id))?;
  app.store.update_survey_details(&survey.id, &name, args.status)?;
  app.store.get_survey(&survey.id)
}

pub fn set_status(app: &App, session: &Session, survey_id: &str, status: SurveyStatus) -> Result<(), AppError> {
  let survey = authorized_survey(app, session, survey_id, Action::Edit)?;
  app.store.update_survey_status(&survey.id, status)
}

pub fn delete_survey(app: &App, session: &Session, survey_id: &str) -> Result<(), AppError> {
  let survey = authorized_survey(app, session, survey_id, Action::Delete)?;
  app.store.delete_survey(&survey.id)
}

pub fn open_builder(app: &App, session: &Session, survey_id: &str) -> Result<QuestionBuilder, AppError> {
  let survey = authorized_survey(app, session, survey_id, Action::ManageQuestions)?;
  Ok(QuestionBuilder::load(&survey))
}

/// Persists the builder's question list; the cached count follows it.
pub fn save_questions(app: &App, session: &Session, builder: QuestionBuilder) -> Result<Survey, AppError> {
  let survey = authorized_survey(app, session, builder.survey_id(), Action::ManageQuestions)?;
  let questions = builder.finish()?;
  app.store.save_questions(&survey.id, &questions)?;
  app.store.get_survey(&survey.id)
}
