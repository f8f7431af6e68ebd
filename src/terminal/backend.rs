use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, MultiSelect, Select};

use crate::error::AppError;
use crate::form::{Control, Form, FormBackend, FormField};
use crate::survey::types::Answer;

use super::prompt_error;

const NO_ANSWER: &str = "(no answer)";

/// Prompts for every field of a form in order, pre-filled with the current
/// entries so a rejected submission can be corrected.
pub struct DialoguerBackend {
    theme: ColorfulTheme,
}

impl Default for DialoguerBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DialoguerBackend {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    fn ask_text(&self, field: &FormField, current: &str) -> Result<String, AppError> {
        let prompt = match field.control {
            Control::Rating { .. } => format!("{} [rating]", field.label()),
            _ => field.label(),
        };
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .with_initial_text(current)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)
    }

    fn ask_single(
        &self,
        field: &FormField,
        options: &[String],
        selected: Option<usize>,
    ) -> Result<Answer, AppError> {
        let mut items: Vec<&str> = options.iter().map(String::as_str).collect();
        items.push(NO_ANSWER);
        let choice = Select::with_theme(&self.theme)
            .with_prompt(field.label())
            .items(&items)
            .default(selected.unwrap_or(options.len()))
            .interact_opt()
            .map_err(prompt_error)?
            .ok_or(AppError::Cancelled)?;
        Ok(Answer::Scalar(options.get(choice).cloned().unwrap_or_default()))
    }

    fn ask_multi(
        &self,
        field: &FormField,
        options: &[String],
        selected: &[bool],
    ) -> Result<Answer, AppError> {
        let picks = MultiSelect::with_theme(&self.theme)
            .with_prompt(format!("{} (space to toggle)", field.label()))
            .items(options)
            .defaults(selected)
            .interact_opt()
            .map_err(prompt_error)?
            .ok_or(AppError::Cancelled)?;
        Ok(Answer::List(
            picks.into_iter().filter_map(|i| options.get(i).cloned()).collect(),
        ))
    }
}

impl FormBackend for DialoguerBackend {
    fn fill(&mut self, form: &mut Form) -> Result<(), AppError> {
        let fields: Vec<FormField> = form.fields().to_vec();
        for field in &fields {
            let answer = match &field.control {
                Control::FreeText { value } | Control::Rating { value } => {
                    Answer::Scalar(self.ask_text(field, value)?)
                }
                Control::SingleSelect { options, selected } => {
                    self.ask_single(field, options, *selected)?
                }
                Control::MultiSelect { options, selected } => {
                    self.ask_multi(field, options, selected)?
                }
            };
            form.set_answer(&field.question_id, &answer)?;
        }
        Ok(())
    }
}
