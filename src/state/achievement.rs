//! Session statistics and the achievement table evaluated against them.

use serde::Serialize;
use std::collections::HashMap;

/// Answers resolved within this many seconds of the options appearing count as fast
pub const FAST_ANSWER_SECS: u32 = 5;
/// Wagers at or above this count as high
pub const HIGH_WAGER_THRESHOLD: u32 = 10;
/// Consecutive wrong answers that open a comeback opportunity
pub const COMEBACK_WRONG_STREAK: u32 = 3;

/// Counters accumulated over a session. Reset at game start.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    /// Questions drawn for the round(s) played, answered or not
    pub questions_total: u32,
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub longest_streak: u32,
    pub wrong_streak: u32,
    /// Set once the player has been `COMEBACK_WRONG_STREAK` answers down in a row
    pub comeback_deficit: bool,
    pub category_streaks: HashMap<String, u32>,
    pub best_category_streak: u32,
    pub fast_answers: u32,
    pub high_wagers: u32,
    pub lightning_seen: bool,
    pub lightning_correct: u32,
    pub faith_tokens_earned: u32,
    pub hints_used: u32,
    pub take_aways_used: u32,
    pub round_complete: bool,
}

/// The facts about one resolved answer that the stats care about
#[derive(Debug, Clone)]
pub struct AnswerFacts<'a> {
    pub category: &'a str,
    pub correct: bool,
    pub streak: u32,
    pub seconds_taken: u32,
    pub timed_out: bool,
    pub wager: u32,
    pub lightning: bool,
    pub faith_token_awarded: bool,
}

impl SessionStats {
    pub fn record_answer(&mut self, facts: &AnswerFacts<'_>) {
        self.questions_answered += 1;
        self.longest_streak = self.longest_streak.max(facts.streak);

        if facts.lightning {
            self.lightning_seen = true;
        }
        if facts.wager >= HIGH_WAGER_THRESHOLD {
            self.high_wagers += 1;
        }
        if facts.faith_token_awarded {
            self.faith_tokens_earned += 1;
        }

        let category_streak = self
            .category_streaks
            .entry(facts.category.to_string())
            .or_default();

        if facts.correct {
            self.correct_answers += 1;
            self.wrong_streak = 0;
            *category_streak += 1;
            self.best_category_streak = self.best_category_streak.max(*category_streak);
            if !facts.timed_out && facts.seconds_taken <= FAST_ANSWER_SECS {
                self.fast_answers += 1;
            }
            if facts.lightning {
                self.lightning_correct += 1;
            }
        } else {
            *category_streak = 0;
            self.wrong_streak += 1;
            if self.wrong_streak >= COMEBACK_WRONG_STREAK {
                self.comeback_deficit = true;
            }
        }
    }

    pub fn correct_pct(&self) -> f64 {
        if self.questions_answered == 0 {
            return 0.0;
        }
        self.correct_answers as f64 * 100.0 / self.questions_answered as f64
    }

    /// Correct answers over every question drawn; unanswered ones count as misses
    pub fn completion_pct(&self) -> f64 {
        if self.questions_total == 0 {
            return 0.0;
        }
        self.correct_answers as f64 * 100.0 / self.questions_total as f64
    }
}

/// A badge unlocked by a predicate over the session stats
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    predicate: fn(&SessionStats) -> bool,
}

impl Achievement {
    pub fn is_met(&self, stats: &SessionStats) -> bool {
        (self.predicate)(stats)
    }
}

impl std::fmt::Debug for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Achievement").field("id", &self.id).finish()
    }
}

fn first_correct(s: &SessionStats) -> bool {
    s.correct_answers >= 1
}

fn streak_five(s: &SessionStats) -> bool {
    s.longest_streak >= 5
}

fn streak_ten(s: &SessionStats) -> bool {
    s.longest_streak >= 10
}

fn category_scholar(s: &SessionStats) -> bool {
    s.best_category_streak >= 5
}

fn quick_draw(s: &SessionStats) -> bool {
    s.fast_answers >= 5
}

fn high_roller(s: &SessionStats) -> bool {
    s.high_wagers >= 3
}

fn lightning_master(s: &SessionStats) -> bool {
    s.lightning_correct >= 1
}

fn faithful(s: &SessionStats) -> bool {
    s.faith_tokens_earned >= 3
}

fn finisher(s: &SessionStats) -> bool {
    s.round_complete
}

fn sharp_mind(s: &SessionStats) -> bool {
    s.round_complete && s.questions_answered > 0 && s.completion_pct() >= 90.0
}

fn perfect_game(s: &SessionStats) -> bool {
    s.round_complete
        && s.questions_answered > 0
        && s.questions_answered == s.questions_total
        && s.correct_answers == s.questions_answered
}

fn comeback(s: &SessionStats) -> bool {
    s.round_complete && s.comeback_deficit && s.correct_pct() >= 80.0
}

/// Evaluated in this order
pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "first_correct",
        name: "First Light",
        description: "Answer your first question correctly",
        predicate: first_correct,
    },
    Achievement {
        id: "streak_5",
        name: "On Fire",
        description: "Five correct answers in a row",
        predicate: streak_five,
    },
    Achievement {
        id: "streak_10",
        name: "Unstoppable",
        description: "Ten correct answers in a row",
        predicate: streak_ten,
    },
    Achievement {
        id: "category_scholar",
        name: "Scholar",
        description: "Five correct answers in a row within one category",
        predicate: category_scholar,
    },
    Achievement {
        id: "quick_draw",
        name: "Quick Draw",
        description: "Five correct answers within five seconds each",
        predicate: quick_draw,
    },
    Achievement {
        id: "high_roller",
        name: "High Roller",
        description: "Place three wagers of ten or more",
        predicate: high_roller,
    },
    Achievement {
        id: "lightning_master",
        name: "Lightning Master",
        description: "Answer a lightning question correctly",
        predicate: lightning_master,
    },
    Achievement {
        id: "faithful",
        name: "Faithful",
        description: "Earn three faith tokens",
        predicate: faithful,
    },
    Achievement {
        id: "finisher",
        name: "Finisher",
        description: "Finish a round",
        predicate: finisher,
    },
    Achievement {
        id: "sharp_mind",
        name: "Sharp Mind",
        description: "Finish a round with at least 90% correct",
        predicate: sharp_mind,
    },
    Achievement {
        id: "perfect_game",
        name: "Perfect Game",
        description: "Answer every question of a round correctly",
        predicate: perfect_game,
    },
    Achievement {
        id: "comeback",
        name: "Comeback Kid",
        description: "Miss three in a row and still finish with 80% correct",
        predicate: comeback,
    },
];

pub fn find_achievement(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Tracks which achievements were already unlocked this session
#[derive(Debug, Clone, Default)]
pub struct AchievementTracker {
    unlocked: Vec<&'static str>,
}

impl AchievementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newly unlocked achievements, in table order. An id is never returned twice.
    pub fn evaluate(&mut self, stats: &SessionStats) -> Vec<&'static Achievement> {
        let mut fresh = Vec::new();
        for achievement in ACHIEVEMENTS {
            if self.unlocked.contains(&achievement.id) {
                continue;
            }
            if achievement.is_met(stats) {
                self.unlocked.push(achievement.id);
                fresh.push(achievement);
            }
        }
        fresh
    }

    pub fn unlocked(&self) -> &[&'static str] {
        &self.unlocked
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.iter().any(|u| *u == id)
    }

    pub fn reset(&mut self) {
        self.unlocked.clear();
    }
}
