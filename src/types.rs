use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque ID types for type safety
pub type QuestionId = String;
pub type RoundId = String;
pub type UserId = String;

/// Category name that matches every question in the catalog
pub const ALL_CATEGORIES: &str = "All";

/// A single multiple-choice question from the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_insight: Option<String>,
}

impl Question {
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_answer == option
    }

    /// Options that are not the correct answer, in catalog order
    pub fn incorrect_options(&self) -> impl Iterator<Item = &String> {
        self.options.iter().filter(|o| **o != self.correct_answer)
    }
}

/// Which questions a round draws from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn matches(&self, question: &Question) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => question.category == *category,
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_CATEGORIES) {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(trimmed.to_string())
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        CategoryFilter::from(value.as_str())
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        value.to_string()
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL_CATEGORIES),
            CategoryFilter::Only(category) => f.write_str(category),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Solo,
    Teams,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Blue,
    Black,
}

impl Team {
    /// Team whose turn it is for the given question index in alternating mode
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            Team::Blue
        } else {
            Team::Black
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Blue => f.write_str("blue"),
            Team::Black => f.write_str("black"),
        }
    }
}

/// How the two teams share questions in team mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TurnOrder {
    /// Teams alternate question by question
    #[default]
    Alternating,
    /// Blue plays a whole round, then black plays a freshly drawn one
    Sequential,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Idle,
    Question,
    Options,
    Answered,
    Intermission,
    RoundEnd,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PowerUp {
    DoublePoints,
    FreezeTime,
}

/// Result of resolving one question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerOutcome {
    pub question_id: QuestionId,
    /// None when the question timed out
    pub selected: Option<String>,
    pub correct_answer: String,
    pub correct: bool,
    pub points_delta: i64,
    /// Wager after the weekday rule was applied
    pub effective_wager: u32,
    pub team: Option<Team>,
    pub streak: u32,
    pub faith_token_awarded: bool,
    pub timed_out: bool,
    pub seconds_taken: u32,
}

/// A signed-in user as reported by the identity collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}
