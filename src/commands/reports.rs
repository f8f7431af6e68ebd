use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::access::policy::{Action, Resource};
use crate::app::App;
use crate::error::AppError;
use crate::render::chart::render_chart;
use crate::render::csv::{detailed_csv, summary_csv, SUMMARY_FILE_NAME};
use crate::render::helpers::{export_path, write_string};
use crate::response::aggregate::{aggregate_question, chart_view, ChartView, StaleAnswerPolicy, Tally};
use crate::response::validate::ValidationError;
use crate::survey::types::{Question, QuestionType, Role, Survey, SurveyStatus};
use crate::survey::validate::schema_fingerprint;
use crate::util::text::{export_file_name, format_date, format_timestamp};

use super::Session;

pub const TIMESTAMP_KEY: &str = "Timestamp";
pub const TIMESTAMP_TITLE: &str = "Submission Date";
pub const MISSING_CELL: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
  pub survey_id: String,
  pub survey_name: String,
  pub status: SurveyStatus,
  pub creator: String,
  pub num_questions: usize,
  /// `yyyy-MM-dd`, or `N/A`.
  pub date_created: String,
  pub total_responses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionChart {
  pub question_id: String,
  pub question_text: String,
  pub tally: Tally,
  pub view: ChartView,
}

impl QuestionChart {
  pub fn render(&self) -> Result<String, AppError> {
    render_chart(&self.question_text, &self.tally, &self.view)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportColumn {
  pub key: String,
  pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedReport {
  pub survey_id: String,
  pub survey_name: String,
  pub columns: Vec<ReportColumn>,
  /// One row per submission; `None` where the submission has no answer.
  pub rows: Vec<Vec<Option<String>>>,
  /// Answer ids not in the survey, listed when stale answers are flagged.
  pub stale_question_ids: Vec<String>,
  /// Submissions collected against a different question list.
  pub outdated_responses: usize,
}

impl DetailedReport {
  /// Cell text for on-screen tables.
  pub fn display_cell(cell: &Option<String>) -> &str {
    cell.as_deref().unwrap_or(MISSING_CELL)
  }
}

fn report_resource(survey: &Survey) -> Resource {
  Resource::Report {
    creator: survey.creator.clone()
  }
}

fn authorized_survey(app: &App, session: &Session, survey_id: &str) -> Result<Survey, AppError> {
  let survey = app.store.get_survey(survey_id)?;
  app.policy().authorize(&session.actor(), Action::View, &report_resource(&survey))?;
  Ok(survey)
}

/// One row per visible survey. Survey Creators see the surveys whose
/// creator matches their username ignoring case.
pub fn summary(app: &App, session: &Session) -> Result<Vec<SummaryRow>, AppError> {
  let policy = app.policy();
  let actor = session.actor();
  policy.authorize(&actor, Action::View, &Resource::Reports)?;

  let surveys = match session.role {
    Role::SurveyCreator => app.store.list_surveys_by_creator(&session.username)?,
    _ => app.store.list_surveys()?,
  };
  let counts = app.store.response_counts()?;
  let rows: Vec<SummaryRow> = surveys
    .iter()
    .filter(|s| policy.can_perform(&actor, Action::View, &report_resource(s)))
    .map(|s| SummaryRow {
      survey_id: s.id.clone(),
      survey_name: s.name.clone(),
      status: s.status,
      creator: s.creator.clone(),
      num_questions: s.questions.len(),
      date_created: format_date(s.date_created.as_ref()),
      total_responses: counts.get(&s.id).copied().unwrap_or(0)
    })
    .collect();
  log::info!("summary report for {}: {} surveys", session.username, rows.len());
  Ok(rows)
}

/// Questions that can be charted: choice and rating types.
pub fn visualizable_questions(app: &App, session: &Session, survey_id: &str) -> Result<Vec<Question>, AppError> {
  let survey = authorized_survey(app, session, survey_id)?;
  Ok(
    survey
      .questions
      .into_iter()
      .filter(|q| q.question_type.is_visualizable())
      .collect()
  )
}

/// Answer distribution for one question. An id the survey no longer has is
/// handled by the configured stale-answer policy and charted by label.
pub fn question_chart(
  app: &App,
  session: &Session,
  survey_id: &str,
  question_id: &str
) -> Result<QuestionChart, AppError> {
  let survey = authorized_survey(app, session, survey_id)?;
  if survey.question(question_id).is_some_and(|q| !q.question_type.is_visualizable()) {
    return Err(ValidationError::Input("Only choice and rating questions can be charted.".to_string()).into());
  }
  let responses = app.store.responses_for_survey(&survey.id)?;
  let tally = aggregate_question(&survey, question_id, &responses, app.settings.stale_answers);
  let question = survey.question(question_id).cloned().unwrap_or_else(|| Question {
    id: question_id.to_string(),
    text: question_id.to_string(),
    question_type: QuestionType::SingleChoice,
    options: Vec::new(),
    mandatory: false
  });
  let view = chart_view(&question, &tally);
  log::info!(
    "chart for {}/{}: {} tallied from {} responses",
    survey.name,
    question_id,
    tally.total_tallied,
    tally.responses_considered
  );
  Ok(QuestionChart {
    question_id: question.id,
    question_text: question.text,
    tally,
    view
  })
}

pub fn detailed_report(app: &App, session: &Session, survey_id: &str) -> Result<DetailedReport, AppError> {
  let survey = authorized_survey(app, session, survey_id)?;
  let responses = app.store.responses_for_survey(&survey.id)?;
  let policy = app.settings.stale_answers;

  let mut columns = vec![ReportColumn {
    key: TIMESTAMP_KEY.to_string(),
    title: TIMESTAMP_TITLE.to_string()
  }];
  columns.extend(survey.questions.iter().map(|q| ReportColumn {
    key: q.id.clone(),
    title: q.text.clone()
  }));

  let mut stale: Vec<String> = Vec::new();
  for response in &responses {
    for entry in &response.answers {
      if survey.question(&entry.question_id).is_none() && !stale.contains(&entry.question_id) {
        stale.push(entry.question_id.clone());
      }
    }
  }
  if policy == StaleAnswerPolicy::Tolerate {
    columns.extend(stale.iter().map(|id| ReportColumn {
      key: id.clone(),
      title: id.clone()
    }));
  }

  let rows = responses
    .iter()
    .map(|response| {
      columns
        .iter()
        .map(|column| {
          if column.key == TIMESTAMP_KEY {
            Some(format_timestamp(&response.timestamp))
          } else {
            response.answer_for(&column.key).map(|a| a.display())
          }
        })
        .collect()
    })
    .collect();

  let current = schema_fingerprint(&survey.questions)?;
  let outdated_responses = responses
    .iter()
    .filter(|r| r.schema_hash.as_deref().is_some_and(|h| h != current))
    .count();
  if !stale.is_empty() {
    log::warn!(
      "survey '{}' has answers for removed questions {:?} ({})",
      survey.name,
      stale,
      policy.as_str()
    );
  }

  Ok(DetailedReport {
    survey_id: survey.id,
    survey_name: survey.name,
    columns,
    rows,
    stale_question_ids: if policy == StaleAnswerPolicy::Flag { stale } else { Vec::new() },
    outdated_responses
  })
}

/// Writes `Survey_Summary_Report.csv` into `dir`.
pub fn export_summary(app: &App, session: &Session, dir: &Path) -> Result<PathBuf, AppError> {
  let rows = summary(app, session)?;
  if rows.is_empty() {
    return Err(ValidationError::Input("The report table is empty. Nothing to export.".to_string()).into());
  }
  let path = export_path(dir, SUMMARY_FILE_NAME);
  write_string(&path, &summary_csv(&rows))?;
  log::info!("exported summary report to {}", path.display());
  Ok(path)
}

/// Writes `<survey name>_Responses.csv` into `dir`.
pub fn export_detailed(app: &App, session: &Session, survey_id: &str, dir: &Path) -> Result<PathBuf, AppError> {
  let report = detailed_report(app, session, survey_id)?;
  if report.rows.is_empty() {
    return Err(ValidationError::Input("No responses available to export.".to_string()).into());
  }
  let path = export_path(dir, &export_file_name(&report.survey_name));
  write_string(&path, &detailed_csv(&report))?;
  log::info!("exported {} responses to {}", report.rows.len(), path.display());
  Ok(path)
}
