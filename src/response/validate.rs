use std::collections::HashSet;
use thiserror::Error;

use crate::survey::types::{Answer, AnswerEntry, Question};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Texts of every mandatory question left unanswered, in survey order.
    #[error("The following mandatory questions must be answered before submitting:\n{}", bullet_list(.0))]
    MissingAnswers(Vec<String>),
    #[error("Answer refers to unknown question '{0}'.")]
    UnknownQuestion(String),
    #[error("Answer to '{question_id}' must be {expected}.")]
    WrongShape {
        question_id: String,
        expected: &'static str,
    },
    #[error("'{option}' is not an option of question '{question_id}'.")]
    UnknownOption { question_id: String, option: String },
    #[error("{0}")]
    Input(String),
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether an answer counts as given for the purpose of mandatory checks.
pub fn is_answered(answer: Option<&Answer>) -> bool {
    match answer {
        Some(Answer::Scalar(value)) => !value.trim().is_empty(),
        Some(Answer::List(items)) => !items.is_empty(),
        None => false,
    }
}

/// Rejects the whole submission when any mandatory question is unanswered.
pub fn validate(questions: &[Question], answers: &[AnswerEntry]) -> Result<(), ValidationError> {
    let missing: Vec<String> = questions
        .iter()
        .filter(|q| q.mandatory)
        .filter(|q| {
            let answer = answers
                .iter()
                .find(|a| a.question_id == q.id)
                .map(|a| &a.answer);
            !is_answered(answer)
        })
        .map(|q| q.text.clone())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingAnswers(missing))
    }
}

/// Every answer must reference a question of the survey, once, with the
/// shape its type expects. Non-empty choice answers must name listed options.
pub fn check_answer_integrity(
    questions: &[Question],
    answers: &[AnswerEntry],
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for entry in answers {
        let question = questions
            .iter()
            .find(|q| q.id == entry.question_id)
            .ok_or_else(|| ValidationError::UnknownQuestion(entry.question_id.clone()))?;
        if !seen.insert(entry.question_id.as_str()) {
            return Err(ValidationError::Input(format!(
                "Question '{}' was answered more than once.",
                entry.question_id
            )));
        }
        if !entry.answer.fits(question.question_type) {
            let expected = if question.question_type.is_multi_valued() {
                "a list of options"
            } else {
                "a single value"
            };
            return Err(ValidationError::WrongShape {
                question_id: entry.question_id.clone(),
                expected,
            });
        }
        if question.question_type.is_choice() {
            let picked: Vec<&String> = match &entry.answer {
                Answer::Scalar(value) if value.is_empty() => Vec::new(),
                Answer::Scalar(value) => vec![value],
                Answer::List(items) => items.iter().collect(),
            };
            if let Some(option) = picked.into_iter().find(|p| !question.options.contains(p)) {
                return Err(ValidationError::UnknownOption {
                    question_id: entry.question_id.clone(),
                    option: option.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_answer_integrity, validate, ValidationError};
    use crate::survey::types::{Answer, AnswerEntry, Question, QuestionType};

    fn question(id: &str, question_type: QuestionType, mandatory: bool) -> Question {
        let options = if question_type.is_choice() {
            vec!["A".to_string(), "B".to_string()]
        } else {
            Vec::new()
        };
        Question {
            id: id.to_string(),
            text: format!("Question {id}?"),
            question_type,
            options,
            mandatory,
        }
    }

    fn entry(id: &str, answer: Answer) -> AnswerEntry {
        AnswerEntry {
            question_id: id.to_string(),
            answer,
        }
    }

    fn all_types(mandatory: bool) -> Vec<Question> {
        vec![
            question("Q1", QuestionType::TextInput, mandatory),
            question("Q2", QuestionType::SingleChoice, mandatory),
            question("Q3", QuestionType::MultiChoice, mandatory),
            question("Q4", QuestionType::Rating, mandatory),
        ]
    }

    #[test]
    fn optional_questions_never_reject() {
        let questions = all_types(false);
        assert!(validate(&questions, &[]).is_ok());
        let blanks: Vec<AnswerEntry> = questions
            .iter()
            .map(|q| entry(&q.id, Answer::empty_for(q.question_type)))
            .collect();
        assert!(validate(&questions, &blanks).is_ok());
    }

    #[test]
    fn lists_exactly_the_unanswered_mandatory_texts() {
        let mut questions = all_types(true);
        questions.push(question("Q5", QuestionType::TextInput, false));
        let answers = vec![
            entry("Q1", Answer::Scalar("   ".to_string())),
            entry("Q2", Answer::Scalar("A".to_string())),
            entry("Q3", Answer::List(Vec::new())),
        ];
        let err = validate(&questions, &answers).expect_err("missing");
        assert_eq!(
            err,
            ValidationError::MissingAnswers(vec![
                "Question Q1?".to_string(),
                "Question Q3?".to_string(),
                "Question Q4?".to_string(),
            ])
        );
        assert_eq!(
            err.to_string(),
            "The following mandatory questions must be answered before submitting:\n- Question Q1?\n- Question Q3?\n- Question Q4?"
        );
    }

    #[test]
    fn integrity_rejects_unknown_ids_and_wrong_shapes() {
        let questions = all_types(false);
        assert_eq!(
            check_answer_integrity(&questions, &[entry("Q9", Answer::Scalar("x".to_string()))]),
            Err(ValidationError::UnknownQuestion("Q9".to_string()))
        );
        assert!(matches!(
            check_answer_integrity(&questions, &[entry("Q3", Answer::Scalar("A".to_string()))]),
            Err(ValidationError::WrongShape { .. })
        ));
        assert!(matches!(
            check_answer_integrity(&questions, &[entry("Q2", Answer::Scalar("C".to_string()))]),
            Err(ValidationError::UnknownOption { .. })
        ));
        let ok = vec![
            entry("Q1", Answer::Scalar("[free text]".to_string())),
            entry("Q2", Answer::Scalar(String::new())),
            entry("Q3", Answer::List(vec!["B".to_string()])),
            entry("Q4", Answer::Scalar("5".to_string())),
        ];
        assert!(check_answer_integrity(&questions, &ok).is_ok());
    }
}
