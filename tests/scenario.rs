use std::fs;
use std::path::Path;

use field_survey::access::policy::DenyReason;
use field_survey::app::App;
use field_survey::commands::surveys::{self, SurveyDetails};
use field_survey::commands::{auth, reports, taker, users, Session};
use field_survey::error::AppError;
use field_survey::form::test_backend::ScriptedBackend;
use field_survey::response::aggregate::ChartView;
use field_survey::response::validate::ValidationError;
use field_survey::settings::AppSettings;
use field_survey::survey::builder::QuestionDraft;
use field_survey::survey::types::{QuestionType, Role, SurveyStatus};
use uuid::Uuid;

fn app() -> App {
  App::in_memory(AppSettings::default_for(Path::new("."))).expect("app")
}

fn admin(app: &App) -> Session {
  auth::login(app, "admin", "admin123").expect("admin login")
}

fn clerk(app: &App, admin: &Session) -> Session {
  users::add_user(
    app,
    admin,
    users::NewUser {
      username: "clerk".to_string(),
      password: "fieldwork".to_string(),
      role: Role::DataEntry
    }
  )
  .expect("add clerk");
  auth::login(app, "clerk", "fieldwork").expect("clerk login")
}

/// Active survey with one mandatory Yes/No question, `Q1`.
fn satisfaction_survey(app: &App, admin: &Session) -> String {
  let survey = surveys::create_survey(
    app,
    admin,
    SurveyDetails {
      name: "Satisfaction".to_string(),
      status: SurveyStatus::Draft
    }
  )
  .expect("create");
  let mut builder = surveys::open_builder(app, admin, &survey.id).expect("builder");
  builder
    .add(QuestionDraft {
      text: "Satisfied?".to_string(),
      question_type: QuestionType::SingleChoice,
      options: vec!["Yes".to_string(), "No".to_string()],
      mandatory: true
    })
    .expect("question");
  surveys::save_questions(app, admin, builder).expect("save");
  surveys::set_status(app, admin, &survey.id, SurveyStatus::Active).expect("activate");
  survey.id
}

#[test]
fn data_entry_submission_is_tallied() {
  let app = app();
  let admin = admin(&app);
  let survey_id = satisfaction_survey(&app, &admin);
  let clerk = clerk(&app, &admin);

  let mut backend = ScriptedBackend::new().with_choice("Q1", "Yes");
  taker::take_survey(&app, &clerk, &survey_id, &mut backend).expect("submit");

  let chart = reports::question_chart(&app, &admin, &survey_id, "Q1").expect("chart");
  assert_eq!(chart.tally.counts.get("Yes"), Some(&1));
  assert_eq!(chart.tally.counts.len(), 1);
  match chart.view {
    ChartView::Pie(slices) => {
      assert_eq!(slices.len(), 1);
      assert_eq!(slices[0].display_label, "Yes (100.0%)");
    }
    other => panic!("expected a pie, got {other:?}")
  }

  let rows = reports::summary(&app, &admin).expect("summary");
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].total_responses, 1);
  assert_eq!(rows[0].num_questions, 1);
}

#[test]
fn unanswered_mandatory_question_blocks_submit() {
  let app = app();
  let admin = admin(&app);
  let survey_id = satisfaction_survey(&app, &admin);
  let clerk = clerk(&app, &admin);

  let err = taker::take_survey(&app, &clerk, &survey_id, &mut ScriptedBackend::new()).expect_err("missing");
  match err {
    AppError::Validation(ValidationError::MissingAnswers(missing)) => {
      assert_eq!(missing, vec!["Satisfied?".to_string()]);
    }
    other => panic!("unexpected error {other:?}")
  }
  let chart = reports::question_chart(&app, &admin, &survey_id, "Q1").expect("chart");
  assert_eq!(chart.view, ChartView::Empty);
}

#[test]
fn usernames_are_unique_ignoring_case() {
  let app = app();
  let admin = admin(&app);
  let err = users::add_user(
    &app,
    &admin,
    users::NewUser {
      username: "Admin".to_string(),
      password: "another1".to_string(),
      role: Role::DataEntry
    }
  )
  .expect_err("duplicate");
  assert!(matches!(err, AppError::Conflict(_)));
  assert!(matches!(auth::login(&app, "Admin", "admin123"), Err(AppError::Validation(_))));
}

#[test]
fn data_entry_cannot_reach_other_sections() {
  let app = app();
  let admin = admin(&app);
  let survey_id = satisfaction_survey(&app, &admin);
  let clerk = clerk(&app, &admin);

  assert!(matches!(
    users::list_users(&app, &clerk),
    Err(AppError::Permission(DenyReason::AdminOnly))
  ));
  assert!(matches!(reports::summary(&app, &clerk), Err(AppError::Permission(_))));
  assert!(matches!(
    surveys::delete_survey(&app, &clerk, &survey_id),
    Err(AppError::Permission(_))
  ));
}

#[test]
fn detailed_export_writes_titled_columns() {
  let app = app();
  let admin = admin(&app);
  let survey_id = satisfaction_survey(&app, &admin);
  let clerk = clerk(&app, &admin);
  taker::take_survey(&app, &clerk, &survey_id, &mut ScriptedBackend::new().with_choice("Q1", "No"))
    .expect("submit");

  let dir = std::env::temp_dir().join(format!("field-survey-scenario-{}", Uuid::new_v4()));
  let path = reports::export_detailed(&app, &admin, &survey_id, &dir).expect("export");
  assert!(path.ends_with("Satisfaction_Responses.csv"));
  let csv = fs::read_to_string(&path).expect("read export");
  let mut lines = csv.lines();
  assert_eq!(lines.next(), Some("\"Submission Date\",\"Satisfied?\""));
  assert!(lines.next().expect("row").ends_with(",\"No\""));
  fs::remove_dir_all(&dir).expect("cleanup");
}
