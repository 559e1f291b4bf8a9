use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::row::Row;

/// Content languages accepted by the service.
pub const VALID_LANGUAGES: &[&str] = &["en", "de", "es", "pt", "fr"];

/// A single code in a question's codebook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Code {
    pub id: i64,
    pub label: String,
    pub category: String,
}

/// A question attached to a project.
///
/// Questions can only be created together with their project; afterwards they
/// are referenced by the id the service assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub codebook: Vec<Code>,
    /// Another question whose trained model this one builds on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits_from: Option<i64>,
}

impl Question {
    pub fn new(name: impl Into<String>, codebook: Vec<Code>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            codebook,
            inherits_from: None,
        }
    }
}

/// Request body for project creation.
#[derive(Debug, Clone, Serialize)]
pub struct NewProject {
    pub name: String,
    pub language: String,
    pub auxiliary_column_names: Vec<String>,
    pub translate: bool,
    pub questions: Vec<Question>,
    pub rows: Vec<Row>,
}

/// A project as returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub language: String,
    #[serde(default)]
    pub auxiliary_column_names: Vec<String>,
    #[serde(default)]
    pub translate: bool,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_omits_unassigned_id() {
        let question = Question::new("NPS verbatim", vec![]);
        let json = serde_json::to_value(&question).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("inherits_from").is_none());
    }

    #[test]
    fn project_deserializes_without_optional_fields() {
        let project: Project = serde_json::from_str(
            r#"{"id": 7, "name": "Wave 3", "language": "en"}"#,
        )
        .unwrap();
        assert_eq!(project.id, 7);
        assert!(project.questions.is_empty());
        assert!(project.created.is_none());
    }
}
