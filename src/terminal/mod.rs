//! Interactive front end: login, then a role-specific menu of sections.

pub mod backend;

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::access::navigation::{sections_for, Section};
use crate::app::App;
use crate::commands::reports::{self, DetailedReport};
use crate::commands::surveys::{self, SurveyDetails, SurveySummary};
use crate::commands::{auth, profile, taker, users, Session};
use crate::error::{AlertKind, AppError};
use crate::form::FormBackend;
use crate::survey::builder::{QuestionBuilder, QuestionDraft};
use crate::survey::types::{QuestionType, Role, SurveyStatus};

use self::backend::DialoguerBackend;

pub(crate) fn prompt_error(err: dialoguer::Error) -> AppError {
  match err {
    dialoguer::Error::IO(io) if io.kind() == ErrorKind::Interrupted => AppError::Cancelled,
    dialoguer::Error::IO(io) => AppError::Io(io),
  }
}

fn show_alert(err: &AppError) {
  let (kind, title) = err.alert();
  match kind {
    AlertKind::Error => eprintln!("\n[{title}] {err}\n"),
    AlertKind::Warning => eprintln!("\n[{title}]\n"),
  }
}

fn show_info(title: &str, message: &str) {
  println!("\n[{title}] {message}\n");
}

struct Terminal<'a> {
  app: &'a mut App,
  theme: ColorfulTheme,
  export_dir: PathBuf,
}

/// Runs the login / dashboard loop until the operator quits.
pub fn run(app: &mut App, data_root: &Path) -> Result<(), AppError> {
  let mut terminal = Terminal {
    app,
    theme: ColorfulTheme::default(),
    export_dir: data_root.join("exports"),
  };
  terminal.main_loop()
}

impl<'a> Terminal<'a> {
  fn text(&self, prompt: &str, initial: &str) -> Result<String, AppError> {
    Input::<String>::with_theme(&self.theme)
      .with_prompt(prompt)
      .with_initial_text(initial)
      .allow_empty(true)
      .interact_text()
      .map_err(prompt_error)
  }

  fn secret(&self, prompt: &str) -> Result<String, AppError> {
    Password::with_theme(&self.theme)
      .with_prompt(prompt)
      .allow_empty_password(true)
      .interact()
      .map_err(prompt_error)
  }

  fn choose<S: ToString>(&self, prompt: &str, items: &[S]) -> Result<Option<usize>, AppError> {
    Select::with_theme(&self.theme)
      .with_prompt(prompt)
      .items(items)
      .default(0)
      .interact_opt()
      .map_err(prompt_error)
  }

  fn confirm(&self, prompt: &str) -> Result<bool, AppError> {
    Confirm::with_theme(&self.theme)
      .with_prompt(prompt)
      .default(false)
      .interact()
      .map_err(prompt_error)
  }

  fn main_loop(&mut self) -> Result<(), AppError> {
    loop {
      match self.choose("Field Survey Manager", &["Log in", "Quit"])? {
        Some(0) => {}
        _ => return Ok(()),
      }
      match self.login() {
        Ok(mut session) => self.dashboard(&mut session)?,
        Err(AppError::Cancelled) => {}
        Err(err) => show_alert(&err),
      }
    }
  }

  fn login(&mut self) -> Result<Session, AppError> {
    let username = self.text("Username", "")?;
    let password = self.secret("Password")?;
    auth::login(self.app, &username, &password)
  }

  fn dashboard(&mut self, session: &mut Session) -> Result<(), AppError> {
    loop {
      let sections = sections_for(session.role);
      let mut items: Vec<String> = sections.iter().map(|s| s.title().to_string()).collect();
      items.push("Log out".to_string());
      let title = format!("Welcome, {} ({})", session.username, session.role);
      let Some(choice) = self.choose(&title, &items)? else {
        return Ok(());
      };
      let Some(section) = sections.get(choice).copied() else {
        log::info!("'{}' logged out", session.username);
        return Ok(());
      };
      let outcome = match section {
        Section::Surveys => self.surveys(session),
        Section::TakeSurvey => self.take_survey(session),
        Section::Users => self.users(session),
        Section::Reports => self.reports(session),
        Section::Settings => self.profile(session),
      };
      match outcome {
        Ok(()) | Err(AppError::Cancelled) => {}
        Err(err) => show_alert(&err),
      }
    }
  }

  fn pick_survey(&self, prompt: &str, list: &[SurveySummary]) -> Result<Option<String>, AppError> {
    if list.is_empty() {
      show_info("Surveys", "No surveys available.");
      return Ok(None);
    }
    let items: Vec<String> = list
      .iter()
      .map(|s| format!("{} [{}] by {} ({} questions)", s.name, s.status, s.creator, s.num_questions))
      .collect();
    Ok(self.choose(prompt, &items)?.map(|i| list[i].id.clone()))
  }

  fn pick_status(&self, current: SurveyStatus) -> Result<SurveyStatus, AppError> {
    let names: Vec<&str> = SurveyStatus::ALL.iter().map(|s| s.as_str()).collect();
    let start = SurveyStatus::ALL.iter().position(|s| *s == current).unwrap_or(0);
    let index = Select::with_theme(&self.theme)
      .with_prompt("Status")
      .items(&names)
      .default(start)
      .interact_opt()
      .map_err(prompt_error)?
      .ok_or(AppError::Cancelled)?;
    Ok(SurveyStatus::ALL[index])
  }

  fn pick_role(&self, current: Role) -> Result<Role, AppError> {
    let names: Vec<&str> = Role::ALL.iter().map(|r| r.as_str()).collect();
    let start = Role::ALL.iter().position(|r| *r == current).unwrap_or(0);
    let index = Select::with_theme(&self.theme)
      .with_prompt("Role")
      .items(&names)
      .default(start)
      .interact_opt()
      .map_err(prompt_error)?
      .ok_or(AppError::Cancelled)?;
    Ok(Role::ALL[index])
  }

  fn surveys(&mut self, session: &Session) -> Result<(), AppError> {
    const ACTIONS: [&str; 6] = [
      "Create survey",
      "Edit details",
      "Change status",
      "Manage questions",
      "Delete survey",
      "Back",
    ];
    loop {
      let list = surveys::list_surveys(self.app, session)?;
      println!();
      for s in &list {
        println!("  {:<32} {:<9} {:<16} {} questions", s.name, s.status.as_str(), s.creator, s.num_questions);
      }
      let outcome = match self.choose("Manage Surveys", &ACTIONS)? {
        Some(0) => self.create_survey(session),
        Some(1) => self.edit_survey(session, &list),
        Some(2) => self.change_status(session, &list),
        Some(3) => self.manage_questions(session, &list),
        Some(4) => self.delete_survey(session, &list),
        _ => return Ok(()),
      };
      match outcome {
        Ok(()) | Err(AppError::Cancelled) => {}
        Err(err) => show_alert(&err),
      }
    }
  }

  fn create_survey(&mut self, session: &Session) -> Result<(), AppError> {
    let name = self.text("Survey name", "")?;
    let status = self.pick_status(SurveyStatus::Draft)?;
    let survey = surveys::create_survey(self.app, session, SurveyDetails { name, status })?;
    show_info("Success", &format!("Survey '{}' created.", survey.name));
    Ok(())
  }

  fn edit_survey(&mut self, session: &Session, list: &[SurveySummary]) -> Result<(), AppError> {
    let Some(id) = self.pick_survey("Survey to edit", list)? else {
      return Ok(());
    };
    let current = self.app.store.get_survey(&id)?;
    let name = self.text("Survey name", &current.name)?;
    let status = self.pick_status(current.status)?;
    surveys::edit_survey(self.app, session, &id, SurveyDetails { name, status })?;
    show_info("Success", "Survey updated.");
    Ok(())
  }

  fn change_status(&mut self, session: &Session, list: &[SurveySummary]) -> Result<(), AppError> {
    let Some(id) = self.pick_survey("Survey", list)? else {
      return Ok(());
    };
    let current = list.iter().find(|s| s.id == id).map(|s| s.status).unwrap_or_default();
    let status = self.pick_status(current)?;
    surveys::set_status(self.app, session, &id, status)?;
    show_info("Success", &format!("Status set to {status}."));
    Ok(())
  }

  fn delete_survey(&mut self, session: &Session, list: &[SurveySummary]) -> Result<(), AppError> {
    let Some(id) = self.pick_survey("Survey to delete", list)? else {
      return Ok(());
    };
    if self.confirm("Delete this survey and its questions?")? {
      surveys::delete_survey(self.app, session, &id)?;
      show_info("Success", "Survey deleted.");
    }
    Ok(())
  }

  fn question_draft(&self, initial: Option<&QuestionDraft>) -> Result<QuestionDraft, AppError> {
    let text = self.text("Question text", initial.map(|d| d.text.as_str()).unwrap_or(""))?;
    let names: Vec<&str> = QuestionType::ALL.iter().map(|t| t.as_str()).collect();
    let start = initial
      .and_then(|d| QuestionType::ALL.iter().position(|t| *t == d.question_type))
      .unwrap_or(0);
    let index = Select::with_theme(&self.theme)
      .with_prompt("Question type")
      .items(&names)
      .default(start)
      .interact_opt()
      .map_err(prompt_error)?
      .ok_or(AppError::Cancelled)?;
    let question_type = QuestionType::ALL[index];
    let options = if question_type.is_choice() {
      let joined = initial.map(|d| d.options.join(", ")).unwrap_or_default();
      self
        .text("Options (comma separated)", &joined)?
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
    } else {
      Vec::new()
    };
    let mandatory = Confirm::with_theme(&self.theme)
      .with_prompt("Mandatory?")
      .default(initial.map(|d| d.mandatory).unwrap_or(false))
      .interact()
      .map_err(prompt_error)?;
    Ok(QuestionDraft {
      text,
      question_type,
      options,
      mandatory,
    })
  }

  fn pick_question(&self, builder: &QuestionBuilder, prompt: &str) -> Result<Option<String>, AppError> {
    if builder.questions().is_empty() {
      show_info("Questions", "This survey has no questions yet.");
      return Ok(None);
    }
    let items: Vec<String> = builder
      .questions()
      .iter()
      .map(|q| format!("{} {} [{}]", q.id, q.text, q.question_type))
      .collect();
    Ok(self.choose(prompt, &items)?.map(|i| builder.questions()[i].id.clone()))
  }

  fn builder_step(&self, builder: &mut QuestionBuilder, choice: usize) -> Result<(), AppError> {
    match choice {
      0 => {
        let draft = self.question_draft(None)?;
        let id = builder.add(draft)?.id.clone();
        show_info("Questions", &format!("Added {id}."));
      }
      1 => {
        if let Some(id) = self.pick_question(builder, "Question to edit")? {
          let initial = builder.questions().iter().find(|q| q.id == id).map(|q| QuestionDraft {
            text: q.text.clone(),
            question_type: q.question_type,
            options: q.options.clone(),
            mandatory: q.mandatory,
          });
          let draft = self.question_draft(initial.as_ref())?;
          builder.update(&id, draft)?;
        }
      }
      2 => {
        if let Some(id) = self.pick_question(builder, "Question to remove")? {
          builder.remove(&id)?;
        }
      }
      _ => {
        if let Some(id) = self.pick_question(builder, "Question to move")? {
          let position: String = self.text("New position (1 = first)", "1")?;
          let target = position.trim().parse::<usize>().unwrap_or(1).max(1) - 1;
          builder.move_to(&id, target)?;
        }
      }
    }
    Ok(())
  }

  fn manage_questions(&mut self, session: &Session, list: &[SurveySummary]) -> Result<(), AppError> {
    let Some(id) = self.pick_survey("Survey", list)? else {
      return Ok(());
    };
    let mut builder = surveys::open_builder(self.app, session, &id)?;
    const ACTIONS: [&str; 6] = [
      "Add question",
      "Edit question",
      "Remove question",
      "Move question",
      "Save questions",
      "Discard changes",
    ];
    loop {
      println!();
      for (i, q) in builder.questions().iter().enumerate() {
        let marker = if q.mandatory { " (*)" } else { "" };
        println!("  {}. [{}] {}{} {}", i + 1, q.id, q.text, marker, q.question_type);
        if !q.options.is_empty() {
          println!("       options: {}", q.options.join(" | "));
        }
      }
      let step = match self.choose("Question Builder", &ACTIONS)? {
        Some(choice @ 0..=3) => self.builder_step(&mut builder, choice),
        Some(4) => {
          let saved = surveys::save_questions(self.app, session, builder)?;
          show_info("Success", &format!("Saved {} questions.", saved.num_questions));
          return Ok(());
        }
        _ => return Ok(()),
      };
      match step {
        Ok(()) | Err(AppError::Cancelled) => {}
        Err(err) => show_alert(&err),
      }
    }
  }

  fn take_survey(&mut self, session: &Session) -> Result<(), AppError> {
    let list = taker::list_active_surveys(self.app, session)?;
    let Some(id) = self.pick_survey("Select a survey", &list)? else {
      return Ok(());
    };
    let mut form = taker::load_form(self.app, session, &id)?;
    if form.is_empty() {
      show_info("Take Survey", "This survey has no questions.");
      return Ok(());
    }
    println!("\nQuestions marked (*) are mandatory.");
    let mut backend = DialoguerBackend::new();
    loop {
      backend.fill(&mut form)?;
      match taker::submit(self.app, session, &mut form) {
        Ok(_) => {
          show_info("Success", "Response submitted successfully!");
          return Ok(());
        }
        Err(err @ AppError::Validation(_)) => {
          show_alert(&err);
          if !self.confirm("Correct the answers and try again?")? {
            return Ok(());
          }
        }
        Err(err) => return Err(err),
      }
    }
  }

  fn users(&mut self, session: &mut Session) -> Result<(), AppError> {
    const ACTIONS: [&str; 4] = ["Add user", "Edit user", "Delete user", "Back"];
    loop {
      let list = users::list_users(self.app, session)?;
      println!();
      for u in &list {
        println!("  {:<24} {}", u.username, u.role);
      }
      let outcome = match self.choose("Manage Users", &ACTIONS)? {
        Some(0) => self.add_user(session),
        Some(1) => self.edit_user(session, &list),
        Some(2) => self.delete_user(session, &list),
        _ => return Ok(()),
      };
      match outcome {
        Ok(()) | Err(AppError::Cancelled) => {}
        Err(err) => show_alert(&err),
      }
      if session.role != Role::Administrator {
        return Ok(());
      }
    }
  }

  fn pick_user(&self, prompt: &str, list: &[users::UserSummary]) -> Result<Option<users::UserSummary>, AppError> {
    let items: Vec<String> = list.iter().map(|u| format!("{} ({})", u.username, u.role)).collect();
    Ok(self.choose(prompt, &items)?.map(|i| list[i].clone()))
  }

  fn add_user(&mut self, session: &Session) -> Result<(), AppError> {
    let username = self.text("Username", "")?;
    let password = self.secret("Password")?;
    let role = self.pick_role(Role::DataEntry)?;
    let user = users::add_user(self.app, session, users::NewUser { username, password, role })?;
    show_info("Success", &format!("User '{}' added.", user.username));
    Ok(())
  }

  fn edit_user(&mut self, session: &mut Session, list: &[users::UserSummary]) -> Result<(), AppError> {
    let Some(target) = self.pick_user("User to edit", list)? else {
      return Ok(());
    };
    let username = self.text("Username", &target.username)?;
    let password = self.secret("New password (blank keeps current)")?;
    let role = self.pick_role(target.role)?;
    let edit = users::UserEdit {
      user_id: target.id,
      username,
      role,
      password: Some(password),
    };
    users::edit_user(self.app, session, edit)?;
    show_info("Success", "User updated.");
    Ok(())
  }

  fn delete_user(&mut self, session: &Session, list: &[users::UserSummary]) -> Result<(), AppError> {
    let Some(target) = self.pick_user("User to delete", list)? else {
      return Ok(());
    };
    if self.confirm(&format!("Delete user '{}'?", target.username))? {
      users::delete_user(self.app, session, &target.id)?;
      show_info("Success", "User deleted.");
    }
    Ok(())
  }

  fn reports(&mut self, session: &Session) -> Result<(), AppError> {
    loop {
      let rows = reports::summary(self.app, session)?;
      println!("\n  {:<32} {:<9} {:>9} {:<10} {:>9}", "Survey", "Status", "Questions", "Created", "Responses");
      for r in &rows {
        println!(
          "  {:<32} {:<9} {:>9} {:<10} {:>9}",
          r.survey_name,
          r.status.as_str(),
          r.num_questions,
          r.date_created,
          r.total_responses
        );
      }
      let mut items: Vec<String> = rows.iter().map(|r| format!("Open '{}'", r.survey_name)).collect();
      items.push("Export summary CSV".to_string());
      items.push("Back".to_string());
      let outcome = match self.choose("Reports", &items)? {
        Some(i) if i < rows.len() => self.survey_report(session, &rows[i].survey_id),
        Some(i) if i == rows.len() => reports::export_summary(self.app, session, &self.export_dir).map(|path| {
          show_info("Export Successful", &format!("Report exported to:\n{}", path.display()));
        }),
        _ => return Ok(()),
      };
      match outcome {
        Ok(()) | Err(AppError::Cancelled) => {}
        Err(err) => show_alert(&err),
      }
    }
  }

  fn survey_report(&mut self, session: &Session, survey_id: &str) -> Result<(), AppError> {
    const ACTIONS: [&str; 4] = ["Question chart", "Detailed responses", "Export responses CSV", "Back"];
    loop {
      let outcome = match self.choose("Survey report", &ACTIONS)? {
        Some(0) => self.question_chart(session, survey_id),
        Some(1) => reports::detailed_report(self.app, session, survey_id).map(|r| print_detailed(&r)),
        Some(2) => reports::export_detailed(self.app, session, survey_id, &self.export_dir).map(|path| {
          show_info("Export Successful", &format!("Responses exported successfully to:\n{}", path.display()));
        }),
        _ => return Ok(()),
      };
      match outcome {
        Ok(()) | Err(AppError::Cancelled) => {}
        Err(err) => show_alert(&err),
      }
    }
  }

  fn question_chart(&mut self, session: &Session, survey_id: &str) -> Result<(), AppError> {
    let questions = reports::visualizable_questions(self.app, session, survey_id)?;
    if questions.is_empty() {
      show_info("Reports", "This survey has no choice or rating questions.");
      return Ok(());
    }
    let items: Vec<String> = questions.iter().map(|q| format!("{}. {}", q.id, q.text)).collect();
    let Some(index) = self.choose("Question", &items)? else {
      return Ok(());
    };
    let chart = reports::question_chart(self.app, session, survey_id, &questions[index].id)?;
    println!("\n{}", chart.render()?);
    Ok(())
  }
}

fn print_detailed(report: &DetailedReport) {
  println!("\n{} ({} responses)", report.survey_name, report.rows.len());
  let header: Vec<&str> = report.columns.iter().map(|c| c.title.as_str()).collect();
  println!("  {}", header.join(" | "));
  for row in &report.rows {
    let cells: Vec<&str> = row.iter().map(DetailedReport::display_cell).collect();
    println!("  {}", cells.join(" | "));
  }
  if !report.stale_question_ids.is_empty() {
    println!(
      "\n  Answers to removed questions were left out: {}",
      report.stale_question_ids.join(", ")
    );
  }
  if report.outdated_responses > 0 {
    println!(
      "  {} responses were collected before the questions last changed.",
      report.outdated_responses
    );
  }
}

impl<'a> Terminal<'a> {
  fn profile(&mut self, session: &mut Session) -> Result<(), AppError> {
    match self.choose("Profile Settings", &["Change username", "Change password", "Back"])? {
      Some(0) => {
        let new_username = self.text("New username", "")?;
        let current_password = self.secret("Current password")?;
        profile::change_username(
          self.app,
          session,
          profile::UsernameChange {
            new_username,
            current_password,
          },
        )?;
        show_info("Success", &format!("Username changed to '{}'.", session.username));
      }
      Some(1) => {
        let current_password = self.secret("Current password")?;
        let new_password = self.secret("New password")?;
        let confirm_password = self.secret("Confirm new password")?;
        profile::change_password(
          self.app,
          session,
          profile::PasswordChange {
            current_password,
            new_password,
            confirm_password,
          },
        )?;
        show_info("Success", "Password changed.");
      }
      _ => {}
    }
    Ok(())
  }
}
