//! Backend that fills forms from pre-recorded answers instead of prompts.
//!
//! Used by the test-suite and for batch data entry from a JSON object of
//! `{ "<question id>": "value" | ["option", ...] }`.

use std::collections::BTreeMap;

use crate::error::AppError;
use crate::survey::types::Answer;

use super::{Form, FormBackend};

#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    answers: BTreeMap<String, Answer>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, question_id: impl Into<String>, answer: Answer) -> Self {
        self.answers.insert(question_id.into(), answer);
        self
    }

    /// Text for a free-text or rating question.
    pub fn with_text(self, question_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_answer(question_id, Answer::Scalar(text.into()))
    }

    /// Selection for a single-choice question.
    pub fn with_choice(self, question_id: impl Into<String>, option: impl Into<String>) -> Self {
        self.with_answer(question_id, Answer::Scalar(option.into()))
    }

    /// Selections for a multi-choice question.
    pub fn with_choices(self, question_id: impl Into<String>, options: &[&str]) -> Self {
        self.with_answer(
            question_id,
            Answer::List(options.iter().map(|o| o.to_string()).collect()),
        )
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let answers: BTreeMap<String, Answer> = serde_json::from_str(raw)
            .map_err(|e| AppError::Settings(format!("Invalid answer script: {e}")))?;
        Ok(Self { answers })
    }
}

impl FormBackend for ScriptedBackend {
    fn fill(&mut self, form: &mut Form) -> Result<(), AppError> {
        for (question_id, answer) in &self.answers {
            form.set_answer(question_id, answer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ScriptedBackend;
    use crate::error::AppError;
    use crate::form::{Form, FormBackend};
    use crate::response::validate::ValidationError;
    use crate::survey::types::{Answer, Question, QuestionType};

    fn form() -> Form {
        Form::from_questions(&[
            Question {
                id: "Q1".to_string(),
                text: "Name".to_string(),
                question_type: QuestionType::TextInput,
                options: Vec::new(),
                mandatory: true,
            },
            Question {
                id: "Q2".to_string(),
                text: "Pets".to_string(),
                question_type: QuestionType::MultiChoice,
                options: vec!["Cat".to_string(), "Dog".to_string()],
                mandatory: false,
            },
        ])
    }

    #[test]
    fn fills_text_and_choices() {
        let mut form = form();
        ScriptedBackend::new()
            .with_text("Q1", "Ada")
            .with_choices("Q2", &["Dog", "Cat"])
            .fill(&mut form)
            .expect("fill");
        assert_eq!(form.value("Q1"), Some(Answer::Scalar("Ada".to_string())));
        assert_eq!(
            form.value("Q2"),
            Some(Answer::List(vec!["Cat".to_string(), "Dog".to_string()]))
        );
    }

    #[test]
    fn json_script_with_unknown_question_fails() {
        let mut backend =
            ScriptedBackend::from_json(r#"{"Q1":"Ada","Q7":"x"}"#).expect("script");
        let err = backend.fill(&mut form()).expect_err("unknown id");
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::UnknownQuestion(ref id)) if id == "Q7"
        ));
    }
}
