use serde::{Deserialize, Serialize};

use super::types::{Question, QuestionType, Survey};
use super::validate::{
  format_question_id, next_question_counter, validate_question, validate_questions, SchemaError,
};

/// Question fields as entered in the builder, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
  pub text: String,
  pub question_type: QuestionType,
  #[serde(default)]
  pub options: Vec<String>,
  #[serde(default)]
  pub mandatory: bool,
}

impl QuestionDraft {
  fn into_question(self, id: String) -> Question {
    let options = if self.question_type.is_choice() {
      self
        .options
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
    } else {
      Vec::new()
    };
    Question {
      id,
      text: self.text.trim().to_string(),
      question_type: self.question_type,
      options,
      mandatory: self.mandatory
    }
  }
}

/// Editing session over one survey's question list.
#[derive(Debug, Clone)]
pub struct QuestionBuilder {
  survey_id: String,
  questions: Vec<Question>,
  next_id: u32,
}

impl QuestionBuilder {
  pub fn load(survey: &Survey) -> Self {
    Self {
      survey_id: survey.id.clone(),
      questions: survey.questions.clone(),
      next_id: next_question_counter(&survey.questions)
    }
  }

  pub fn survey_id(&self) -> &str {
    &self.survey_id
  }

  pub fn questions(&self) -> &[Question] {
    &self.questions
  }

  pub fn next_id(&self) -> u32 {
    self.next_id
  }

  pub fn add(&mut self, draft: QuestionDraft) -> Result<&Question, SchemaError> {
    let question = draft.into_question(format_question_id(self.next_id));
    validate_question(&question)?;
    self.next_id += 1;
    self.questions.push(question);
    let last = self.questions.len() - 1;
    Ok(&self.questions[last])
  }

  /// Replaces the fields of an existing question, keeping its id and position.
  pub fn update(&mut self, question_id: &str, draft: QuestionDraft) -> Result<(), SchemaError> {
    let index = self.position(question_id)?;
    let question = draft.into_question(question_id.to_string());
    validate_question(&question)?;
    self.questions[index] = question;
    Ok(())
  }

  pub fn remove(&mut self, question_id: &str) -> Result<Question, SchemaError> {
    let index = self.position(question_id)?;
    Ok(self.questions.remove(index))
  }

  /// Moves a question to `target` (clamped to the list end).
  pub fn move_to(&mut self, question_id: &str, target: usize) -> Result<(), SchemaError> {
    let index = self.position(question_id)?;
    let question = self.questions.remove(index);
    let target = target.min(self.questions.len());
    self.questions.insert(target, question);
    Ok(())
  }

  pub fn finish(self) -> Result<Vec<Question>, SchemaError> {
    validate_questions(&self.questions)?;
    Ok(self.questions)
  }

  fn position(&self, question_id: &str) -> Result<usize, SchemaError> {
    self
      .questions
      .iter()
      .position(|q| q.id == question_id)
      .ok_or_else(|| SchemaError::UnknownQuestion(question_id.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::{QuestionBuilder, QuestionDraft};
  use crate::survey::types::{Question, QuestionType, Survey, SurveyStatus};
  use crate::survey::validate::SchemaError;

  fn survey_with(ids: &[&str]) -> Survey {
    let questions: Vec<Question> = ids
      .iter()
      .map(|id| Question {
        id: id.to_string(),
        text: format!("Text {id}"),
        question_type: QuestionType::TextInput,
        options: Vec::new(),
        mandatory: false
      })
      .collect();
    Survey {
      id: "s1".to_string(),
      name: "Demo".to_string(),
      status: SurveyStatus::Draft,
      creator: "admin".to_string(),
      date_created: None,
      num_questions: questions.len(),
      questions
    }
  }

  fn draft(text: &str, question_type: QuestionType, options: &[&str]) -> QuestionDraft {
    QuestionDraft {
      text: text.to_string(),
      question_type,
      options: options.iter().map(|o| o.to_string()).collect(),
      mandatory: true
    }
  }

  #[test]
  fn new_ids_continue_after_highest_existing() {
    let mut builder = QuestionBuilder::load(&survey_with(&["Q1", "Q4"]));
    let added = builder
      .add(draft("  Colour?  ", QuestionType::SingleChoice, &["Red", " Blue "]))
      .expect("add");
    assert_eq!(added.id, "Q5");
    assert_eq!(added.text, "Colour?");
    assert_eq!(added.options, vec!["Red".to_string(), "Blue".to_string()]);
    assert_eq!(builder.next_id(), 6);
  }

  #[test]
  fn removing_does_not_reuse_ids() {
    let mut builder = QuestionBuilder::load(&survey_with(&[]));
    builder.add(draft("One", QuestionType::TextInput, &[])).expect("q1");
    builder.add(draft("Two", QuestionType::Rating, &[])).expect("q2");
    builder.remove("Q2").expect("remove");
    let third = builder.add(draft("Three", QuestionType::TextInput, &[])).expect("q3");
    assert_eq!(third.id, "Q3");
  }

  #[test]
  fn rejects_choice_without_options_and_keeps_counter() {
    let mut builder = QuestionBuilder::load(&survey_with(&[]));
    let err = builder
      .add(draft("Pick", QuestionType::MultiChoice, &["  "]))
      .expect_err("no options");
    assert_eq!(err, SchemaError::MissingOptions("Q1".to_string()));
    assert_eq!(builder.next_id(), 1);
    assert!(builder.questions().is_empty());
  }

  #[test]
  fn update_and_move_keep_ids() {
    let mut builder = QuestionBuilder::load(&survey_with(&["Q1", "Q2", "Q3"]));
    builder
      .update("Q2", draft("Rate us", QuestionType::Rating, &["ignored"]))
      .expect("update");
    builder.move_to("Q3", 0).expect("move");
    let ids: Vec<&str> = builder.questions().iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["Q3", "Q1", "Q2"]);
    assert!(builder.questions()[2].options.is_empty());
    assert!(matches!(builder.remove("Q9"), Err(SchemaError::UnknownQuestion(_))));
    assert_eq!(builder.finish().expect("finish").len(), 3);
  }
}
