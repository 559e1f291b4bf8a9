use serde::{Deserialize, Serialize};

/// Reference to the question an answer belongs to.
///
/// During project creation questions have no id yet, so answers reference them
/// by name; rows added to an existing project must use the assigned id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum QuestionRef {
    Id(i64),
    Name(String),
}

/// One answer text belonging to a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub text: String,
    pub question: QuestionRef,
    /// Reviewed answers are assumed correct and used for training.
    #[serde(default)]
    pub reviewed: bool,
    #[serde(default)]
    pub codes: Vec<i64>,
    /// ISO language code of the text; overrides automatic detection.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_language: String,
}

impl Answer {
    pub fn new(text: impl Into<String>, question: QuestionRef) -> Self {
        Self {
            id: None,
            text: text.into(),
            question,
            reviewed: false,
            codes: Vec::new(),
            source_language: String::new(),
        }
    }
}

/// One uploaded row: auxiliary columns plus exactly one answer per question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub auxiliary_columns: Vec<String>,
    pub answers: Vec<Answer>,
}
