//! Dynamic data-entry form built from a survey's question list.
//!
//! Each question becomes one [`FormField`] whose [`Control`] matches the
//! question type. A [`FormBackend`] drives the controls (a terminal prompt,
//! a script); [`Form::collect`] then reads one answer per field.

pub mod test_backend;

use crate::error::AppError;
use crate::response::validate::ValidationError;
use crate::survey::types::{Answer, AnswerEntry, Question, QuestionType, Survey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    FreeText { value: String },
    SingleSelect { options: Vec<String>, selected: Option<usize> },
    MultiSelect { options: Vec<String>, selected: Vec<bool> },
    Rating { value: String },
}

impl Control {
    fn for_question(question: &Question) -> Self {
        match question.question_type {
            QuestionType::TextInput => Self::FreeText { value: String::new() },
            QuestionType::SingleChoice => Self::SingleSelect {
                options: question.options.clone(),
                selected: None,
            },
            QuestionType::MultiChoice => Self::MultiSelect {
                options: question.options.clone(),
                selected: vec![false; question.options.len()],
            },
            QuestionType::Rating => Self::Rating { value: String::new() },
        }
    }

    fn clear(&mut self) {
        match self {
            Self::FreeText { value } | Self::Rating { value } => value.clear(),
            Self::SingleSelect { selected, .. } => *selected = None,
            Self::MultiSelect { selected, .. } => selected.iter_mut().for_each(|s| *s = false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub question_id: String,
    pub text: String,
    /// 1-based position in the form.
    pub number: usize,
    pub mandatory: bool,
    pub question_type: QuestionType,
    pub control: Control,
}

impl FormField {
    /// Prompt label, e.g. `2. How old are you? (*)`.
    pub fn label(&self) -> String {
        let marker = if self.mandatory { " (*)" } else { "" };
        format!("{}. {}{}", self.number, self.text, marker)
    }

    /// Current entry in the control's native shape, untrimmed.
    pub fn value(&self) -> Answer {
        match &self.control {
            Control::FreeText { value } | Control::Rating { value } => Answer::Scalar(value.clone()),
            Control::SingleSelect { options, selected } => Answer::Scalar(
                (*selected)
                    .and_then(|i| options.get(i))
                    .cloned()
                    .unwrap_or_default(),
            ),
            Control::MultiSelect { options, selected } => Answer::List(
                options
                    .iter()
                    .zip(selected)
                    .filter(|(_, on)| **on)
                    .map(|(o, _)| o.clone())
                    .collect(),
            ),
        }
    }

    fn option_index(&self, options: &[String], option: &str) -> Result<usize, ValidationError> {
        options
            .iter()
            .position(|o| o == option)
            .ok_or_else(|| ValidationError::UnknownOption {
                question_id: self.question_id.clone(),
                option: option.to_string(),
            })
    }

    fn wrong_control(&self, what: &str) -> ValidationError {
        ValidationError::Input(format!(
            "Question '{}' ({}) does not accept {what}.",
            self.question_id, self.question_type
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    pub survey_id: Option<String>,
    fields: Vec<FormField>,
}

impl Form {
    pub fn from_questions(questions: &[Question]) -> Self {
        let fields = questions
            .iter()
            .enumerate()
            .map(|(i, q)| FormField {
                question_id: q.id.clone(),
                text: q.text.clone(),
                number: i + 1,
                mandatory: q.mandatory,
                question_type: q.question_type,
                control: Control::for_question(q),
            })
            .collect();
        Self {
            survey_id: None,
            fields,
        }
    }

    pub fn for_survey(survey: &Survey) -> Self {
        let mut form = Self::from_questions(&survey.questions);
        form.survey_id = Some(survey.id.clone());
        form
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, question_id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.question_id == question_id)
    }

    fn field_mut(&mut self, question_id: &str) -> Result<&mut FormField, ValidationError> {
        self.fields
            .iter_mut()
            .find(|f| f.question_id == question_id)
            .ok_or_else(|| ValidationError::UnknownQuestion(question_id.to_string()))
    }

    pub fn value(&self, question_id: &str) -> Option<Answer> {
        self.field(question_id).map(FormField::value)
    }

    /// Types into a free-text or rating control.
    pub fn set_text(&mut self, question_id: &str, text: &str) -> Result<(), ValidationError> {
        let field = self.field_mut(question_id)?;
        match &mut field.control {
            Control::FreeText { value } | Control::Rating { value } => {
                *value = text.to_string();
                Ok(())
            }
            _ => Err(field.wrong_control("typed text")),
        }
    }

    /// Picks one option of a single-select control, replacing any earlier pick.
    pub fn select(&mut self, question_id: &str, option: &str) -> Result<(), ValidationError> {
        let field = self.field_mut(question_id)?;
        let index = match &field.control {
            Control::SingleSelect { options, .. } => field.option_index(options, option)?,
            _ => return Err(field.wrong_control("a single selection")),
        };
        if let Control::SingleSelect { selected, .. } = &mut field.control {
            *selected = Some(index);
        }
        Ok(())
    }

    /// Flips one checkbox of a multi-select control.
    pub fn toggle(&mut self, question_id: &str, option: &str) -> Result<(), ValidationError> {
        let field = self.field_mut(question_id)?;
        let index = match &field.control {
            Control::MultiSelect { options, .. } => field.option_index(options, option)?,
            _ => return Err(field.wrong_control("checkbox toggles")),
        };
        if let Control::MultiSelect { selected, .. } = &mut field.control {
            selected[index] = !selected[index];
        }
        Ok(())
    }

    /// Replaces a control's state with a stored answer value.
    pub fn set_answer(&mut self, question_id: &str, answer: &Answer) -> Result<(), ValidationError> {
        let question_type = self
            .field(question_id)
            .map(|f| f.question_type)
            .ok_or_else(|| ValidationError::UnknownQuestion(question_id.to_string()))?;
        match (question_type, answer) {
            (QuestionType::TextInput | QuestionType::Rating, Answer::Scalar(text)) => {
                self.set_text(question_id, text)
            }
            (QuestionType::SingleChoice, Answer::Scalar(option)) => {
                if option.is_empty() {
                    self.field_mut(question_id)?.control.clear();
                    Ok(())
                } else {
                    self.select(question_id, option)
                }
            }
            (QuestionType::MultiChoice, Answer::List(options)) => {
                self.field_mut(question_id)?.control.clear();
                for option in options {
                    let already = matches!(
                        self.value(question_id),
                        Some(Answer::List(ref current)) if current.contains(option)
                    );
                    if !already {
                        self.toggle(question_id, option)?;
                    }
                }
                Ok(())
            }
            _ => Err(ValidationError::WrongShape {
                question_id: question_id.to_string(),
                expected: if question_type.is_multi_valued() {
                    "a list of options"
                } else {
                    "a single value"
                },
            }),
        }
    }

    pub fn reset(&mut self) {
        self.fields.iter_mut().for_each(|f| f.control.clear());
    }

    /// One entry per field: text trimmed, blanks kept as `""` or `[]`.
    pub fn collect(&self) -> Vec<AnswerEntry> {
        self.fields
            .iter()
            .map(|f| {
                let answer = match f.value() {
                    Answer::Scalar(value) => Answer::Scalar(value.trim().to_string()),
                    list => list,
                };
                AnswerEntry {
                    question_id: f.question_id.clone(),
                    answer,
                }
            })
            .collect()
    }
}

/// Something that fills in a form: an interactive prompt or a script.
pub trait FormBackend {
    fn fill(&mut self, form: &mut Form) -> Result<(), AppError>;
}
