use crate::types::*;
use serde::{Deserialize, Serialize};

/// Inputs a presentation layer can send to the session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Command {
    StartGame,
    /// Raw wager input; clamped at the boundary, never rejected
    SetWager {
        amount: String,
    },
    ShowOptions,
    Answer {
        option: String,
    },
    UseHint,
    UseTakeAway,
    ActivateDoublePoints,
    ActivateFreezeTime,
    NextQuestion,
    /// Leave the intermission and start the black team's round
    StartSecondTeam,
    Exit,
}

/// Observable side effects emitted by the session.
///
/// Presentation layers subscribe to these to play sounds, animations and
/// confetti. The core never waits on them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum GameEvent {
    GameStarted {
        round_id: RoundId,
        total_questions: usize,
        mode: GameMode,
    },
    PhaseChanged {
        phase: Phase,
    },
    QuestionShown {
        index: usize,
        total: usize,
        question: String,
        category: String,
        team: Option<Team>,
        max_wager: u32,
        lightning: bool,
    },
    WagerChanged {
        wager: u32,
        max_wager: u32,
    },
    OptionsShown {
        options: Vec<String>,
        time_limit: u32,
    },
    Tick {
        remaining: u32,
    },
    Urgent {
        remaining: u32,
    },
    TimeUp,
    SessionTick {
        remaining: u32,
    },
    SessionTimeUp,
    AnswerResolved {
        outcome: AnswerOutcome,
        explanation: Option<String>,
        deep_insight: Option<String>,
    },
    CorrectAnswer,
    WrongAnswer,
    StreakMilestone {
        streak: u32,
    },
    FaithTokenEarned {
        tokens: u32,
    },
    PowerUpActivated {
        power_up: PowerUp,
        tokens_left: u32,
    },
    PowerUpExpired {
        power_up: PowerUp,
    },
    HintRevealed {
        correct_answer: String,
        penalty: u32,
    },
    OptionsRemoved {
        removed: Vec<String>,
        penalty: u32,
    },
    ScoreChanged {
        score: u32,
        team: Option<Team>,
    },
    AchievementUnlocked {
        id: String,
        name: String,
        description: String,
    },
    Intermission {
        blue_score: u32,
    },
    Confetti,
    RoundEnded {
        summary: RoundSummary,
    },
    GameExited,
}

/// Final numbers handed to the leaderboard and the report at round end
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundSummary {
    pub round_id: RoundId,
    pub mode: GameMode,
    pub score: u32,
    pub blue_score: u32,
    pub black_score: u32,
    pub winner: Option<Team>,
    pub correct_answers: u32,
    pub questions_answered: u32,
    pub longest_streak: u32,
    pub faith_tokens: u32,
    pub elapsed_seconds: u32,
    pub achievements: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let cmd: Command = serde_json::from_str(r#"{"t":"answer","option":"Noah"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Answer {
                option: "Noah".into()
            }
        );

        let cmd: Command = serde_json::from_str(r#"{"t":"show_options"}"#).unwrap();
        assert_eq!(cmd, Command::ShowOptions);
    }

    #[test]
    fn test_event_is_tagged() {
        let json = serde_json::to_value(GameEvent::PhaseChanged {
            phase: Phase::Options,
        })
        .unwrap();
        assert_eq!(json["t"], "phase_changed");
        assert_eq!(json["phase"], "OPTIONS");
    }
}
