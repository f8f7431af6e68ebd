use chrono::Utc;
use uuid::Uuid;

use crate::access::policy::{Action, Resource};
use crate::app::App;
use crate::error::AppError;
use crate::form::{Form, FormBackend};
use crate::response::validate::{check_answer_integrity, validate, ValidationError};
use crate::survey::types::Response;
use crate::survey::validate::schema_fingerprint;

use super::surveys::{survey_resource, SurveySummary};
use super::Session;

/// Surveys currently open for data entry.
pub fn list_active_surveys(app: &App, session: &Session) -> Result<Vec<SurveySummary>, AppError> {
  app.policy().authorize(&session.actor(), Action::Submit, &Resource::Surveys)?;
  Ok(app.store.list_active_surveys()?.iter().map(SurveySummary::from).collect())
}

pub fn load_form(app: &App, session: &Session, survey_id: &str) -> Result<Form, AppError> {
  let survey = app.store.get_survey(survey_id)?;
  app.policy().authorize(&session.actor(), Action::Submit, &survey_resource(&survey))?;
  Ok(Form::for_survey(&survey))
}

/// Validates and stores the form's answers, then clears the form.
///
/// The survey is re-read so a status change or question edit since the form
/// was loaded is honoured. Nothing is written when any mandatory question is
/// unanswered.
pub fn submit(app: &App, session: &Session, form: &mut Form) -> Result<Response, AppError> {
  let survey_id = form
    .survey_id
    .clone()
    .ok_or_else(|| ValidationError::Input("This form is not attached to a survey.".to_string()))?;
  let survey = app.store.get_survey(&survey_id)?;
  app.policy().authorize(&session.actor(), Action::Submit, &survey_resource(&survey))?;

  let answers = form.collect();
  if let Err(err) = validate(&survey.questions, &answers) {
    log::info!("rejected submission to '{}' by {}: {err}", survey.name, session.username);
    return Err(err.into());
  }
  check_answer_integrity(&survey.questions, &answers)?;

  let response = Response {
    id: Uuid::new_v4().to_string(),
    survey_id: survey.id.clone(),
    user_id: session.username.clone(),
    timestamp: Utc::now(),
    schema_hash: Some(schema_fingerprint(&survey.questions)?),
    answers
  };
  app.store.insert_response(&response)?;
  form.reset();
  Ok(response)
}

/// Loads the form, lets `backend` fill it and submits it.
pub fn take_survey(
  app: &App,
  session: &Session,
  survey_id: &str,
  backend: &mut dyn FormBackend
) -> Result<Response, AppError> {
  let mut form = load_form(app, session, survey_id)?;
  backend.fill(&mut form)?;
  submit(app, session, &mut form)
}
