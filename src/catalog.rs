//! Read-only question catalog.
//!
//! The bundled catalog is compiled into the binary; a custom catalog can be
//! loaded from a JSON file with the same shape. Every question is validated
//! once at load time and never mutated afterwards.

use crate::types::{CategoryFilter, Question};
use std::collections::HashSet;
use std::path::Path;

const BUNDLED_CATALOG: &str = include_str!("../data/questions.json");

/// Errors that can occur while loading a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Question '{id}' is invalid: {reason}")]
    InvalidQuestion { id: String, reason: String },

    #[error("Duplicate question id '{0}'")]
    DuplicateId(String),
}

#[derive(Debug, Clone)]
pub struct Catalog {
    questions: Vec<Question>,
}

impl Catalog {
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        let mut ids = HashSet::new();
        for question in &questions {
            validate_question(question)?;
            if !ids.insert(question.id.as_str()) {
                return Err(CatalogError::DuplicateId(question.id.clone()));
            }
        }
        Ok(Self { questions })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let questions: Vec<Question> = serde_json::from_str(json)?;
        Self::new(questions)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The catalog shipped with the crate
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Questions matching the filter, in catalog order
    pub fn filtered(&self, filter: &CategoryFilter) -> Vec<&Question> {
        self.questions.iter().filter(|q| filter.matches(q)).collect()
    }

    /// Distinct category names in first-seen order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.questions
            .iter()
            .map(|q| q.category.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }
}

fn validate_question(question: &Question) -> Result<(), CatalogError> {
    let invalid = |reason: &str| CatalogError::InvalidQuestion {
        id: question.id.clone(),
        reason: reason.to_string(),
    };

    if question.options.len() < 2 {
        return Err(invalid("needs at least two options"));
    }
    let unique: HashSet<&String> = question.options.iter().collect();
    if unique.len() != question.options.len() {
        return Err(invalid("options must be unique"));
    }
    if !question.options.contains(&question.correct_answer) {
        return Err(invalid("correct answer is not one of the options"));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a simple question for tests: correct answer is always "A"
    pub(crate) fn make_question(id: &str, category: &str) -> Question {
        Question {
            id: id.to_string(),
            question: format!("Question {}?", id),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: "A".to_string(),
            category: category.to_string(),
            explanation: Some(format!("Because {}", id)),
            deep_insight: None,
        }
    }

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = Catalog::bundled().unwrap();
        assert!(catalog.len() >= 20);
        assert_eq!(
            catalog.categories(),
            vec!["Old Testament", "Prophets", "Gospels", "Early Church"]
        );
    }

    #[test]
    fn test_filtered_by_category() {
        let catalog = Catalog::new(vec![
            make_question("1", "X"),
            make_question("2", "Y"),
            make_question("3", "X"),
        ])
        .unwrap();

        assert_eq!(catalog.filtered(&CategoryFilter::All).len(), 3);
        let xs = catalog.filtered(&CategoryFilter::Only("X".into()));
        assert_eq!(xs.len(), 2);
        assert!(xs.iter().all(|q| q.category == "X"));
        assert!(catalog
            .filtered(&CategoryFilter::Only("Z".into()))
            .is_empty());
    }

    #[test]
    fn test_rejects_answer_not_in_options() {
        let mut question = make_question("bad", "X");
        question.correct_answer = "E".to_string();
        let result = Catalog::new(vec![question]);
        assert!(matches!(result, Err(CatalogError::InvalidQuestion { .. })));
    }

    #[test]
    fn test_rejects_duplicate_options() {
        let mut question = make_question("dup", "X");
        question.options = vec!["A".into(), "A".into(), "B".into()];
        let err = Catalog::new(vec![question]).unwrap_err();
        assert!(err.to_string().contains("unique"));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = Catalog::new(vec![make_question("1", "X"), make_question("1", "Y")]);
        assert!(matches!(result, Err(CatalogError::DuplicateId(id)) if id == "1"));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.json");
        let json = serde_json::to_string(&vec![make_question("1", "X")]).unwrap();
        std::fs::write(&path, json).unwrap();

        let catalog = Catalog::from_path(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.questions()[0].explanation.as_deref(), Some("Because 1"));
    }
}
