mod achievement;
mod export;
mod round;
mod score;
mod selector;
mod timer;

pub use achievement::{
    find_achievement, Achievement, AchievementTracker, AnswerFacts, SessionStats, ACHIEVEMENTS,
    FAST_ANSWER_SECS, HIGH_WAGER_THRESHOLD,
};
pub use export::{render_report, write_report, ReportEntry, RoundReport};
pub use round::{QuestionState, Round};
pub use score::{
    clamp_wager, max_wager, parse_wager, PlayerState, PowerUpState, ScoringEngine, TeamState,
    WagerRule, WeekdaySource, BASE_MAX_WAGER, HINT_PENALTY, TAKE_AWAY_PENALTY,
};
pub use selector::select_round;
pub use timer::{Countdown, TimerSignal, TimerState, URGENT_THRESHOLD_SECS};

use crate::catalog::Catalog;
use crate::config::QuizConfig;
use crate::protocol::{GameEvent, RoundSummary};
use crate::types::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Errors surfaced by session operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuizError {
    #[error("No questions available for category '{0}'")]
    NoQuestionsAvailable(String),

    #[error("Cannot {action} during {phase:?} phase")]
    InvalidPhase { action: &'static str, phase: Phase },

    #[error("Option '{0}' is not available")]
    OptionUnavailable(String),

    #[error("No active round")]
    NoActiveRound,

    #[error("{0} was already used for this question")]
    AlreadyUsed(&'static str),
}

/// The single owner of all quiz state for one player (or one pair of teams).
///
/// Every mutation goes through `&mut self`; the async runtime wraps it in a
/// mutex, tests drive it directly.
pub struct Session {
    config: QuizConfig,
    catalog: Arc<Catalog>,
    rng: StdRng,
    phase: Phase,
    round: Option<Round>,
    scoring: ScoringEngine,
    current_wager: u32,
    question_timer: Countdown,
    session_timer: Countdown,
    /// Ticks left until a frozen question timer resumes
    freeze_resume_in: Option<u32>,
    stats: SessionStats,
    achievements: AchievementTracker,
    history: Vec<ReportEntry>,
    /// Questions presented this session, across rounds
    question_number: usize,
    blue_snapshot: Option<u32>,
    elapsed_secs: u32,
    finished: Option<RoundSummary>,
    /// Report of the last finished round, kept across restarts until the next one ends
    last_report: Option<RoundReport>,
    events: broadcast::Sender<GameEvent>,
}

impl Session {
    pub fn new(config: QuizConfig, catalog: Arc<Catalog>) -> Self {
        let (tx, _rx) = broadcast::channel(256);
        let wager_rule = WagerRule::new(config.friday_double_wager, WeekdaySource::Local);
        Self {
            config,
            catalog,
            rng: StdRng::seed_from_u64(rand::random()),
            phase: Phase::Idle,
            round: None,
            scoring: ScoringEngine::new(wager_rule),
            current_wager: 1,
            question_timer: Countdown::new(),
            session_timer: Countdown::new(),
            freeze_resume_in: None,
            stats: SessionStats::default(),
            achievements: AchievementTracker::new(),
            history: Vec::new(),
            question_number: 0,
            blue_snapshot: None,
            elapsed_secs: 0,
            finished: None,
            last_report: None,
            events: tx,
        }
    }

    /// Use a deterministic RNG for question draws and option order
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Override where the weekday for the Friday rule comes from
    pub fn with_weekday(mut self, weekday: WeekdaySource) -> Self {
        self.scoring.wager_rule.weekday = weekday;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Publish an event. No subscribers is fine.
    pub(crate) fn emit(&self, event: GameEvent) {
        let _ = self.events.send(event);
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            tracing::debug!("Phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
            self.emit(GameEvent::PhaseChanged { phase });
        }
    }

    pub(crate) fn require_phase(
        &self,
        action: &'static str,
        allowed: &[Phase],
    ) -> Result<(), QuizError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(QuizError::InvalidPhase {
                action,
                phase: self.phase,
            })
        }
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.round.as_ref().and_then(|r| r.current_question())
    }

    pub fn player(&self) -> &PlayerState {
        &self.scoring.player
    }

    pub fn teams(&self) -> &TeamState {
        &self.scoring.teams
    }

    pub fn power_ups(&self) -> &PowerUpState {
        &self.scoring.power_ups
    }

    pub fn current_wager(&self) -> u32 {
        self.current_wager
    }

    /// Upper wager bound for the current question (1 when no question is active)
    pub fn max_wager(&self) -> u32 {
        self.round
            .as_ref()
            .map(|r| r.current.max_wager)
            .unwrap_or(1)
    }

    /// Team answering the current question, if in team mode
    pub fn current_team(&self) -> Option<Team> {
        match self.config.mode {
            GameMode::Solo => None,
            GameMode::Teams => Some(self.scoring.teams.current_turn),
        }
    }

    /// Score of whoever is currently playing
    pub fn current_score(&self) -> u32 {
        self.scoring.score_for(self.current_team())
    }

    pub fn question_timer(&self) -> &Countdown {
        &self.question_timer
    }

    pub fn session_timer(&self) -> &Countdown {
        &self.session_timer
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze_resume_in.is_some()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn achievements(&self) -> &AchievementTracker {
        &self.achievements
    }

    pub fn history(&self) -> &[ReportEntry] {
        &self.history
    }

    pub fn blue_snapshot(&self) -> Option<u32> {
        self.blue_snapshot
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// Options the player can still pick, in display order
    pub fn available_options(&self) -> Vec<String> {
        self.round
            .as_ref()
            .map(|r| r.current.available_options())
            .unwrap_or_default()
    }

    pub fn last_report(&self) -> Option<&RoundReport> {
        self.last_report.as_ref()
    }

    /// Summary of the most recently finished round, taken at most once
    pub fn take_finished(&mut self) -> Option<RoundSummary> {
        self.finished.take()
    }
}
