//! Round lifecycle: question phase, options phase, answer resolution,
//! team turns, intermission and round end.

use super::achievement::AnswerFacts;
use super::export::ReportEntry;
use super::score::max_wager;
use super::selector::select_round;
use super::{QuizError, Session};
use crate::protocol::{GameEvent, RoundSummary};
use crate::random::shuffle;
use crate::types::*;

/// Streak values that trigger a milestone event
const STREAK_MILESTONE: u32 = 3;

/// Per-question interaction state. Reset every time a question is shown.
#[derive(Debug, Clone, Default)]
pub struct QuestionState {
    /// Options in display order; empty until the options phase
    pub options: Vec<String>,
    /// Options taken out by a take-away
    pub removed: Vec<String>,
    pub hint_used: bool,
    pub take_away_used: bool,
    pub wager_locked: bool,
    pub lightning: bool,
    pub max_wager: u32,
    pub outcome: Option<AnswerOutcome>,
}

impl QuestionState {
    pub fn available_options(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|o| !self.removed.contains(o))
            .cloned()
            .collect()
    }
}

/// The questions drawn for one play-through
#[derive(Debug, Clone)]
pub struct Round {
    pub id: RoundId,
    pub questions: Vec<Question>,
    pub index: usize,
    /// Set when the whole round belongs to one team (sequential turns)
    pub team: Option<Team>,
    pub current: QuestionState,
}

impl Round {
    fn new(questions: Vec<Question>, team: Option<Team>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            questions,
            index: 0,
            team,
            current: QuestionState::default(),
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl Session {
    /// Start a new game: reset every counter, draw a round and show its first
    /// question.
    pub fn start_game(&mut self) -> Result<RoundId, QuizError> {
        let first_team = match (self.config.mode, self.config.turn_order) {
            (GameMode::Teams, TurnOrder::Sequential) => Some(Team::Blue),
            _ => None,
        };
        let questions = select_round(
            &self.catalog,
            &self.config.category,
            self.config.round_size,
            &mut self.rng,
        )?;

        self.cancel_timers();
        self.scoring.reset();
        self.stats = Default::default();
        self.achievements.reset();
        self.history.clear();
        self.question_number = 0;
        self.blue_snapshot = None;
        self.elapsed_secs = 0;
        self.finished = None;
        self.current_wager = 1;

        let round = Round::new(questions, first_team);
        self.stats.questions_total = round.len() as u32;
        let round_id = round.id.clone();
        tracing::info!(
            "Starting {:?} game, round {} with {} questions ({})",
            self.config.mode,
            round_id,
            round.len(),
            self.config.category
        );
        self.emit(GameEvent::GameStarted {
            round_id: round_id.clone(),
            total_questions: round.len(),
            mode: self.config.mode,
        });
        self.round = Some(round);

        if self.config.session_timer_enabled {
            self.session_timer.start(self.config.session_time_limit_secs);
        }
        self.enter_question_phase();
        Ok(round_id)
    }

    fn enter_question_phase(&mut self) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        self.question_number += 1;
        let lightning = self.question_number % self.config.lightning_interval() == 0;

        let team = match self.config.mode {
            GameMode::Solo => None,
            GameMode::Teams => Some(match self.config.turn_order {
                TurnOrder::Alternating => Team::for_index(round.index),
                TurnOrder::Sequential => round.team.unwrap_or(Team::Blue),
            }),
        };
        if let Some(team) = team {
            self.scoring.teams.current_turn = team;
        }

        let score = self.scoring.score_for(team);
        let bound = max_wager(self.config.mode, lightning, score);
        round.current = QuestionState {
            lightning,
            max_wager: bound,
            ..QuestionState::default()
        };
        self.current_wager = self.current_wager.clamp(1, bound);

        let total = round.len();
        let index = round.index;
        let Some(question) = round.current_question() else {
            return;
        };
        let event = GameEvent::QuestionShown {
            index,
            total,
            question: question.question.clone(),
            category: question.category.clone(),
            team,
            max_wager: bound,
            lightning,
        };
        tracing::info!(
            "Question {}/{} ({}){}",
            index + 1,
            total,
            question.id,
            if lightning { " [lightning]" } else { "" }
        );

        self.set_phase(Phase::Question);
        self.emit(event);
    }

    /// Reveal the shuffled options, lock the wager and start the question timer
    pub fn show_options(&mut self) -> Result<Vec<String>, QuizError> {
        self.require_phase("show options", &[Phase::Question])?;
        let round = self.round.as_mut().ok_or(QuizError::NoActiveRound)?;
        let question = round.current_question().ok_or(QuizError::NoActiveRound)?;

        let options = shuffle(&question.options, &mut self.rng);
        round.current.options = options;
        round.current.wager_locked = true;
        let available = round.current.available_options();

        let limit = self.config.question_time_limit_secs;
        self.question_timer.stop();
        self.question_timer.start(limit);

        self.set_phase(Phase::Options);
        self.emit(GameEvent::OptionsShown {
            options: available.clone(),
            time_limit: limit,
        });
        Ok(available)
    }

    /// Answer the current question with one of the shown options
    pub fn submit_answer(&mut self, option: &str) -> Result<AnswerOutcome, QuizError> {
        self.require_phase("answer", &[Phase::Options])?;
        let round = self.round.as_ref().ok_or(QuizError::NoActiveRound)?;
        if !round.current.options.iter().any(|o| o == option)
            || round.current.removed.iter().any(|o| o == option)
        {
            return Err(QuizError::OptionUnavailable(option.to_string()));
        }
        self.resolve(Some(option.to_string()))
    }

    /// Resolve the current question. `selected` is None on timeout.
    fn resolve(&mut self, selected: Option<String>) -> Result<AnswerOutcome, QuizError> {
        self.question_timer.stop();
        self.end_freeze();
        let seconds_taken = self.question_timer.elapsed();
        let double_was_active = self.scoring.power_ups.double_points_active;

        let team = self.current_team();
        let round = self.round.as_mut().ok_or(QuizError::NoActiveRound)?;
        let question = round
            .current_question()
            .cloned()
            .ok_or(QuizError::NoActiveRound)?;
        let lightning = round.current.lightning;

        let mut outcome = self.scoring.submit_answer(
            selected.as_deref(),
            &question,
            self.current_wager,
            self.config.mode,
            team,
        );
        outcome.seconds_taken = seconds_taken;
        round.current.outcome = Some(outcome.clone());

        self.stats.record_answer(&AnswerFacts {
            category: &question.category,
            correct: outcome.correct,
            streak: outcome.streak,
            seconds_taken,
            timed_out: outcome.timed_out,
            wager: self.current_wager,
            lightning,
            faith_token_awarded: outcome.faith_token_awarded,
        });
        self.history.push(ReportEntry {
            question: question.clone(),
            outcome: outcome.clone(),
        });

        tracing::info!(
            "Question {} resolved: correct={} delta={} streak={}",
            question.id,
            outcome.correct,
            outcome.points_delta,
            outcome.streak
        );

        self.set_phase(Phase::Answered);
        self.emit(GameEvent::AnswerResolved {
            outcome: outcome.clone(),
            explanation: question.explanation.clone(),
            deep_insight: question.deep_insight.clone(),
        });
        if outcome.correct {
            self.emit(GameEvent::CorrectAnswer);
            if outcome.streak % STREAK_MILESTONE == 0 {
                self.emit(GameEvent::StreakMilestone {
                    streak: outcome.streak,
                });
            }
        } else {
            self.emit(GameEvent::WrongAnswer);
        }
        if outcome.faith_token_awarded {
            self.emit(GameEvent::FaithTokenEarned {
                tokens: self.scoring.player.faith_tokens,
            });
        }
        if double_was_active {
            self.emit(GameEvent::PowerUpExpired {
                power_up: PowerUp::DoublePoints,
            });
        }
        self.emit(GameEvent::ScoreChanged {
            score: self.scoring.score_for(team),
            team,
        });
        self.evaluate_achievements();

        Ok(outcome)
    }

    fn evaluate_achievements(&mut self) {
        for achievement in self.achievements.evaluate(&self.stats) {
            tracing::info!("Achievement unlocked: {}", achievement.id);
            self.emit(GameEvent::AchievementUnlocked {
                id: achievement.id.to_string(),
                name: achievement.name.to_string(),
                description: achievement.description.to_string(),
            });
        }
    }

    /// Move past an answered question: next question, intermission or round end
    pub fn next_question(&mut self) -> Result<Phase, QuizError> {
        self.require_phase("advance", &[Phase::Answered])?;
        let round = self.round.as_mut().ok_or(QuizError::NoActiveRound)?;
        round.index += 1;

        if round.index < round.len() {
            self.enter_question_phase();
        } else if round.team == Some(Team::Blue) {
            self.enter_intermission();
        } else {
            self.finish_round();
        }
        Ok(self.phase)
    }

    fn enter_intermission(&mut self) {
        let blue_score = self.scoring.teams.blue;
        self.blue_snapshot = Some(blue_score);
        self.session_timer.pause();
        tracing::info!("Blue team finished with {}, intermission", blue_score);
        self.set_phase(Phase::Intermission);
        self.emit(GameEvent::Intermission { blue_score });
    }

    /// Leave the intermission: black plays a freshly drawn round from the
    /// same category
    pub fn start_second_team(&mut self) -> Result<RoundId, QuizError> {
        self.require_phase("start the second team", &[Phase::Intermission])?;
        let questions = select_round(
            &self.catalog,
            &self.config.category,
            self.config.round_size,
            &mut self.rng,
        )?;

        let round = Round::new(questions, Some(Team::Black));
        self.stats.questions_total += round.len() as u32;
        let round_id = round.id.clone();
        tracing::info!("Black team starting round {}", round_id);
        self.round = Some(round);
        self.scoring.player.current_streak = 0;
        self.session_timer.resume();
        self.enter_question_phase();
        Ok(round_id)
    }

    fn finish_round(&mut self) {
        self.cancel_timers();
        self.stats.round_complete = true;
        self.evaluate_achievements();

        let round_id = self
            .round
            .as_ref()
            .map(|r| r.id.clone())
            .unwrap_or_default();
        let teams = &self.scoring.teams;
        let summary = RoundSummary {
            round_id,
            mode: self.config.mode,
            score: self.scoring.player.score,
            blue_score: teams.blue,
            black_score: teams.black,
            winner: match self.config.mode {
                GameMode::Solo => None,
                GameMode::Teams => teams.leader(),
            },
            correct_answers: self.scoring.player.correct_answers,
            questions_answered: self.stats.questions_answered,
            longest_streak: self.scoring.player.longest_streak,
            faith_tokens: self.scoring.player.faith_tokens,
            elapsed_seconds: self.elapsed_secs,
            achievements: self
                .achievements
                .unlocked()
                .iter()
                .map(|id| id.to_string())
                .collect(),
        };

        tracing::info!(
            "Round {} ended: score={} correct={}/{} elapsed={}s",
            summary.round_id,
            summary.score,
            summary.correct_answers,
            summary.questions_answered,
            summary.elapsed_seconds
        );
        self.set_phase(Phase::RoundEnd);
        let celebrate = summary.questions_answered > 0
            && (summary.correct_answers == summary.questions_answered
                || summary.winner.is_some());
        self.emit(GameEvent::RoundEnded {
            summary: summary.clone(),
        });
        if celebrate {
            self.emit(GameEvent::Confetti);
        }
        self.last_report = Some(self.report(summary.clone()));
        self.finished = Some(summary);
    }

    /// Stop both timers and drop any scheduled freeze resume
    fn cancel_timers(&mut self) {
        self.question_timer.stop();
        self.session_timer.stop();
        self.freeze_resume_in = None;
        self.scoring.power_ups.freeze_time_active = false;
    }

    /// Abandon the game from any phase. Safe to call repeatedly.
    pub fn exit(&mut self) {
        self.cancel_timers();
        self.question_timer.reset();
        self.session_timer.reset();
        if self.phase == Phase::Idle && self.round.is_none() {
            return;
        }
        self.round = None;
        tracing::info!("Game exited");
        self.set_phase(Phase::Idle);
        self.emit(GameEvent::GameExited);
    }

    /// Advance all timers by one second
    pub fn tick(&mut self) {
        if matches!(self.phase, Phase::Idle | Phase::RoundEnd) {
            return;
        }
        if self.phase != Phase::Intermission {
            self.elapsed_secs += 1;
        }

        let mut time_up = false;
        for signal in self.question_timer.tick() {
            match signal {
                super::TimerSignal::Tick { remaining } => {
                    self.emit(GameEvent::Tick { remaining })
                }
                super::TimerSignal::Urgent { remaining } => {
                    self.emit(GameEvent::Urgent { remaining })
                }
                super::TimerSignal::TimeUp => time_up = true,
            }
        }
        self.tick_freeze();

        if time_up {
            tracing::info!("Time up");
            self.emit(GameEvent::TimeUp);
            if let Err(e) = self.resolve(None) {
                tracing::warn!("Failed to resolve timed out question: {}", e);
            }
        }

        let mut session_up = false;
        for signal in self.session_timer.tick() {
            match signal {
                super::TimerSignal::Tick { remaining } => {
                    self.emit(GameEvent::SessionTick { remaining })
                }
                super::TimerSignal::Urgent { .. } => {}
                super::TimerSignal::TimeUp => session_up = true,
            }
        }
        if session_up {
            tracing::info!("Session time up");
            self.emit(GameEvent::SessionTimeUp);
            self.finish_round();
        }
    }
}
