use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::validate::{RawQuestion, SchemaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "TEXT_INPUT", alias = "TEXT")]
    TextInput,
    #[serde(rename = "SINGLE_CHOICE", alias = "RADIO")]
    SingleChoice,
    #[serde(rename = "MULTI_CHOICE", alias = "CHECKBOX")]
    MultiChoice,
    #[serde(rename = "RATING")]
    Rating,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        Self::TextInput,
        Self::SingleChoice,
        Self::MultiChoice,
        Self::Rating,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextInput => "TEXT_INPUT",
            Self::SingleChoice => "SINGLE_CHOICE",
            Self::MultiChoice => "MULTI_CHOICE",
            Self::Rating => "RATING",
        }
    }

    /// Choice types carry a non-empty option list.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultiChoice)
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Self::MultiChoice)
    }

    /// Whether per-option counts make sense for reporting charts.
    pub fn is_visualizable(&self) -> bool {
        self.is_choice() || matches!(self, Self::Rating)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = SchemaError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_uppercase().as_str() {
            "TEXT_INPUT" | "TEXT" => Ok(Self::TextInput),
            "SINGLE_CHOICE" | "RADIO" => Ok(Self::SingleChoice),
            "MULTI_CHOICE" | "CHECKBOX" => Ok(Self::MultiChoice),
            "RATING" => Ok(Self::Rating),
            _ => Err(SchemaError::UnknownType(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestion")]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Vec<String>,
    #[serde(rename = "isMandatory")]
    pub mandatory: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurveyStatus {
    Draft,
    Active,
    Archived,
}

impl SurveyStatus {
    pub const ALL: [SurveyStatus; 3] = [Self::Draft, Self::Active, Self::Archived];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Active => "Active",
            Self::Archived => "Archived",
        }
    }
}

impl Default for SurveyStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl fmt::Display for SurveyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SurveyStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| format!("Unknown survey status '{raw}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: String,
    pub name: String,
    pub status: SurveyStatus,
    pub creator: String,
    pub date_created: Option<DateTime<Utc>>,
    /// Cached `questions.len()`, persisted alongside the list.
    pub num_questions: usize,
    pub questions: Vec<Question>,
}

impl Survey {
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// A submitted answer. The shape follows the stored JSON type: a string for
/// single-valued questions, an array for MULTI_CHOICE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Scalar(String),
    List(Vec<String>),
}

impl Answer {
    /// Value recorded for a question the respondent left blank.
    pub fn empty_for(question_type: QuestionType) -> Self {
        if question_type.is_multi_valued() {
            Self::List(Vec::new())
        } else {
            Self::Scalar(String::new())
        }
    }

    pub fn fits(&self, question_type: QuestionType) -> bool {
        matches!(self, Self::List(_)) == question_type.is_multi_valued()
    }

    /// Cell text for tables and exports: list items joined without brackets.
    pub fn display(&self) -> String {
        match self {
            Self::Scalar(value) => value.clone(),
            Self::List(items) => items.join(", "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub question_id: String,
    pub answer: Answer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: String,
    pub survey_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    /// Fingerprint of the question list the answers were collected against.
    #[serde(default)]
    pub schema_hash: Option<String>,
    pub answers: Vec<AnswerEntry>,
}

impl Response {
    pub fn answer_for(&self, question_id: &str) -> Option<&Answer> {
        self.answers
            .iter()
            .find(|a| a.question_id == question_id)
            .map(|a| &a.answer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Administrator")]
    Administrator,
    #[serde(rename = "Survey Creator")]
    SurveyCreator,
    #[serde(rename = "Data Entry")]
    DataEntry,
}

impl Role {
    pub const ALL: [Role; 3] = [Self::Administrator, Self::SurveyCreator, Self::DataEntry];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => "Administrator",
            Self::SurveyCreator => "Survey Creator",
            Self::DataEntry => "Data Entry",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let compact = raw.trim().replace(' ', "");
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().replace(' ', "").eq_ignore_ascii_case(&compact))
            .ok_or_else(|| format!("Unknown role '{raw}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
    /// Set on the administrator created at first start.
    pub seed: bool,
}

#[cfg(test)]
mod tests {
    use super::{Answer, AnswerEntry, Question, QuestionType, Role, SurveyStatus};

    #[test]
    fn question_reads_legacy_type_names() {
        let raw = r#"{"id":"Q1","text":"Pick","type":"RADIO","options":["a","b"],"isMandatory":false}"#;
        let q: Question = serde_json::from_str(raw).expect("question");
        assert_eq!(q.question_type, QuestionType::SingleChoice);
        assert!(!q.mandatory);
        let back = serde_json::to_value(&q).expect("json");
        assert_eq!(back["type"], "SINGLE_CHOICE");
        assert_eq!(back["isMandatory"], false);
    }

    #[test]
    fn answer_shape_comes_from_json_type_not_text() {
        let raw = r#"[{"question_id":"Q1","answer":"[not, a list]"},{"question_id":"Q2","answer":["A","B"]}]"#;
        let entries: Vec<AnswerEntry> = serde_json::from_str(raw).expect("answers");
        assert_eq!(entries[0].answer, Answer::Scalar("[not, a list]".to_string()));
        assert_eq!(
            entries[1].answer,
            Answer::List(vec!["A".to_string(), "B".to_string()])
        );
        assert_eq!(entries[1].answer.display(), "A, B");
        assert_eq!(entries[0].answer.display(), "[not, a list]");
    }

    #[test]
    fn parses_roles_and_statuses_loosely() {
        assert_eq!("survey creator".parse::<Role>(), Ok(Role::SurveyCreator));
        assert_eq!("SurveyCreator".parse::<Role>(), Ok(Role::SurveyCreator));
        assert_eq!("ACTIVE".parse::<SurveyStatus>(), Ok(SurveyStatus::Active));
        assert!("Closed".parse::<SurveyStatus>().is_err());
        assert!("checkbox".parse::<QuestionType>().is_ok());
        assert!("SLIDER".parse::<QuestionType>().is_err());
    }
}
