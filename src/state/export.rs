//! Flat text report of a finished round.
//!
//! Pure formatting over the session history; the binary offers it as a
//! download-style file.

use super::Session;
use crate::protocol::RoundSummary;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// One answered question as it appears in the report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportEntry {
    pub question: Question,
    pub outcome: AnswerOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundReport {
    /// Report timestamp (ISO8601)
    pub generated_at: String,
    pub category: CategoryFilter,
    pub summary: RoundSummary,
    pub entries: Vec<ReportEntry>,
}

impl Session {
    /// Build a report for the round that just finished
    pub fn report(&self, summary: RoundSummary) -> RoundReport {
        RoundReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            category: self.config.category.clone(),
            summary,
            entries: self.history.clone(),
        }
    }
}

pub fn render_report(report: &RoundReport) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    // Writing to a String never fails
    let _ = writeln!(out, "QUIZ REPORT");
    let _ = writeln!(out, "Generated: {}", report.generated_at);
    let _ = writeln!(out, "Category: {}", report.category);
    match summary.mode {
        GameMode::Solo => {
            let _ = writeln!(out, "Final score: {}", summary.score);
        }
        GameMode::Teams => {
            let _ = writeln!(out, "Blue team: {}", summary.blue_score);
            let _ = writeln!(out, "Black team: {}", summary.black_score);
            let winner = summary
                .winner
                .map(|t| t.to_string())
                .unwrap_or_else(|| "tie".to_string());
            let _ = writeln!(out, "Winner: {}", winner);
        }
    }
    let _ = writeln!(
        out,
        "Correct answers: {}/{}",
        summary.correct_answers, summary.questions_answered
    );
    let _ = writeln!(out, "Longest streak: {}", summary.longest_streak);
    let _ = writeln!(out, "Faith tokens: {}", summary.faith_tokens);
    let _ = writeln!(out, "Time: {}s", summary.elapsed_seconds);
    if !summary.achievements.is_empty() {
        let _ = writeln!(out, "Achievements: {}", summary.achievements.join(", "));
    }

    for (i, entry) in report.entries.iter().enumerate() {
        let question = &entry.question;
        let outcome = &entry.outcome;
        let _ = writeln!(out);
        let _ = writeln!(out, "{}. [{}] {}", i + 1, question.category, question.question);
        if let Some(team) = outcome.team {
            let _ = writeln!(out, "   Team: {}", team);
        }
        let _ = writeln!(out, "   Correct answer: {}", question.correct_answer);
        let answer = outcome.selected.as_deref().unwrap_or("(time ran out)");
        let verdict = if outcome.correct { "correct" } else { "wrong" };
        let _ = writeln!(
            out,
            "   Your answer: {} ({}, {:+})",
            answer, verdict, outcome.points_delta
        );
        if let Some(explanation) = &question.explanation {
            let _ = writeln!(out, "   Explanation: {}", explanation);
        }
        if let Some(insight) = &question.deep_insight {
            let _ = writeln!(out, "   Insight: {}", insight);
        }
    }

    out
}

pub fn write_report(report: &RoundReport, path: impl AsRef<Path>) -> std::io::Result<()> {
    std::fs::write(path, render_report(report))
}
