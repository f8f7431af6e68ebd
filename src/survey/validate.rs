use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::util::hash::sha256_hex;

use super::types::{Question, QuestionType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Question id cannot be empty.")]
    MissingId,
    #[error("Question '{0}' has no text.")]
    MissingText(String),
    #[error("Unrecognized question type '{0}'.")]
    UnknownType(String),
    #[error("Question '{0}' needs at least one option.")]
    MissingOptions(String),
    #[error("Question '{0}' does not take options.")]
    UnexpectedOptions(String),
    #[error("Question '{0}' has a blank option.")]
    BlankOption(String),
    #[error("Question '{id}' lists option '{option}' twice.")]
    DuplicateOption { id: String, option: String },
    #[error("Question id '{0}' is used more than once.")]
    DuplicateId(String),
    #[error("No question with id '{0}'.")]
    UnknownQuestion(String),
    #[error("Question '{id}' is missing its '{field}' field.")]
    MissingField { id: String, field: &'static str },
}

/// A question document as stored, before its required fields are checked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuestion {
    pub id: Option<String>,
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(rename = "isMandatory")]
    pub mandatory: Option<bool>,
}

impl TryFrom<RawQuestion> for Question {
    type Error = SchemaError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let id = raw.id.ok_or(SchemaError::MissingId)?;
        let text = raw.text.ok_or_else(|| SchemaError::MissingText(id.clone()))?;
        let question_type = raw
            .question_type
            .ok_or_else(|| SchemaError::MissingField {
                id: id.clone(),
                field: "type",
            })?
            .parse::<QuestionType>()?;
        let mandatory = raw.mandatory.ok_or_else(|| SchemaError::MissingField {
            id: id.clone(),
            field: "isMandatory",
        })?;
        Ok(Question {
            id,
            text,
            question_type,
            options: raw.options,
            mandatory,
        })
    }
}

/// Reads a stored question list. Malformed JSON is a `serde_json` error;
/// well-formed documents missing a required field are a `SchemaError`.
pub fn questions_from_json(raw: &str) -> Result<Result<Vec<Question>, SchemaError>, serde_json::Error> {
    let documents: Vec<RawQuestion> = serde_json::from_str(raw)?;
    Ok(documents.into_iter().map(Question::try_from).collect())
}

pub fn validate_question(question: &Question) -> Result<(), SchemaError> {
    if question.id.trim().is_empty() {
        return Err(SchemaError::MissingId);
    }
    if question.text.trim().is_empty() {
        return Err(SchemaError::MissingText(question.id.clone()));
    }
    if question.question_type.is_choice() {
        if question.options.is_empty() {
            return Err(SchemaError::MissingOptions(question.id.clone()));
        }
        let mut seen = HashSet::new();
        for option in &question.options {
            if option.trim().is_empty() {
                return Err(SchemaError::BlankOption(question.id.clone()));
            }
            if !seen.insert(option.as_str()) {
                return Err(SchemaError::DuplicateOption {
                    id: question.id.clone(),
                    option: option.clone(),
                });
            }
        }
    } else if !question.options.is_empty() {
        return Err(SchemaError::UnexpectedOptions(question.id.clone()));
    }
    Ok(())
}

pub fn validate_questions(questions: &[Question]) -> Result<(), SchemaError> {
    let mut ids = HashSet::new();
    for question in questions {
        validate_question(question)?;
        if !ids.insert(question.id.as_str()) {
            return Err(SchemaError::DuplicateId(question.id.clone()));
        }
    }
    Ok(())
}

/// Numeric suffix of a `Q<n>` id.
pub fn question_number(id: &str) -> Option<u32> {
    id.strip_prefix('Q')
        .or_else(|| id.strip_prefix('q'))
        .and_then(|digits| digits.parse::<u32>().ok())
}

/// Next free counter value: one past the largest existing `Q<n>` suffix.
pub fn next_question_counter(questions: &[Question]) -> u32 {
    questions
        .iter()
        .filter_map(|q| question_number(&q.id))
        .max()
        .map(|n| n + 1)
        .unwrap_or(1)
}

pub fn format_question_id(counter: u32) -> String {
    format!("Q{counter}")
}

/// Stable fingerprint of a question list, stamped on responses.
pub fn schema_fingerprint(questions: &[Question]) -> Result<String, serde_json::Error> {
    let payload = serde_json::to_vec(questions)?;
    Ok(sha256_hex(&payload))
}

#[cfg(test)]
mod tests {
    use super::{
        next_question_counter, questions_from_json, schema_fingerprint, validate_question,
        validate_questions, SchemaError,
    };
    use crate::survey::types::{Question, QuestionType};

    fn q(id: &str, question_type: QuestionType, options: &[&str]) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Question {id}"),
            question_type,
            options: options.iter().map(|o| o.to_string()).collect(),
            mandatory: false,
        }
    }

    #[test]
    fn choice_questions_need_options() {
        let err = validate_question(&q("Q1", QuestionType::MultiChoice, &[])).expect_err("empty");
        assert_eq!(err, SchemaError::MissingOptions("Q1".to_string()));
        assert!(validate_question(&q("Q1", QuestionType::SingleChoice, &["Yes", "No"])).is_ok());
    }

    #[test]
    fn text_and_rating_reject_options() {
        let err = validate_question(&q("Q2", QuestionType::Rating, &["1"])).expect_err("options");
        assert_eq!(err, SchemaError::UnexpectedOptions("Q2".to_string()));
        assert!(validate_question(&q("Q2", QuestionType::TextInput, &[])).is_ok());
    }

    #[test]
    fn rejects_blank_and_duplicate_options_and_ids() {
        assert!(matches!(
            validate_question(&q("Q1", QuestionType::SingleChoice, &["A", " "])),
            Err(SchemaError::BlankOption(_))
        ));
        assert!(matches!(
            validate_question(&q("Q1", QuestionType::SingleChoice, &["A", "A"])),
            Err(SchemaError::DuplicateOption { .. })
        ));
        let list = vec![q("Q1", QuestionType::TextInput, &[]), q("Q1", QuestionType::Rating, &[])];
        assert_eq!(
            validate_questions(&list),
            Err(SchemaError::DuplicateId("Q1".to_string()))
        );
    }

    #[test]
    fn counter_skips_past_highest_suffix() {
        assert_eq!(next_question_counter(&[]), 1);
        let list = vec![
            q("Q1", QuestionType::TextInput, &[]),
            q("Q7", QuestionType::TextInput, &[]),
            q("legacy", QuestionType::TextInput, &[]),
            q("Q3", QuestionType::TextInput, &[]),
        ];
        assert_eq!(next_question_counter(&list), 8);
    }

    #[test]
    fn fingerprint_changes_with_questions() {
        let a = vec![q("Q1", QuestionType::TextInput, &[])];
        let mut b = a.clone();
        b[0].text = "Other".to_string();
        let fa = schema_fingerprint(&a).expect("hash");
        assert_eq!(fa.len(), 64);
        assert_ne!(fa, schema_fingerprint(&b).expect("hash"));
    }

    #[test]
    fn stored_questions_need_type_and_mandatory_fields() {
        let no_mandatory = r#"[{"id":"Q1","text":"t","type":"TEXT_INPUT","options":[]}]"#;
        assert_eq!(
            questions_from_json(no_mandatory).expect("json"),
            Err(SchemaError::MissingField {
                id: "Q1".to_string(),
                field: "isMandatory",
            })
        );
        let no_type = r#"[{"id":"Q2","text":"t","options":[],"isMandatory":true}]"#;
        assert_eq!(
            questions_from_json(no_type).expect("json"),
            Err(SchemaError::MissingField {
                id: "Q2".to_string(),
                field: "type",
            })
        );
        let slider = r#"[{"id":"Q3","text":"t","type":"SLIDER","isMandatory":false}]"#;
        assert_eq!(
            questions_from_json(slider).expect("json"),
            Err(SchemaError::UnknownType("SLIDER".to_string()))
        );
        let complete = r#"[{"id":"Q4","text":"t","type":"RATING","isMandatory":false}]"#;
        let questions = questions_from_json(complete).expect("json").expect("questions");
        assert_eq!(questions[0].question_type, QuestionType::Rating);
        assert!(questions[0].options.is_empty());
        assert!(questions_from_json("not json").is_err());
        assert!(serde_json::from_str::<Question>(r#"{"id":"Q1","text":"t","type":"TEXT_INPUT"}"#).is_err());
    }
}
