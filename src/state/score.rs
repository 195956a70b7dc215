//! Scoring engine: points, wagers, streaks, faith tokens and power-ups.

use super::{QuizError, Session};
use crate::protocol::GameEvent;
use crate::random::shuffle;
use crate::types::*;
use chrono::{Datelike, Weekday};
use serde::Serialize;

pub const MIN_WAGER: u32 = 1;
pub const BASE_MAX_WAGER: u32 = 10;
pub const HINT_PENALTY: u32 = 3;
pub const TAKE_AWAY_PENALTY: u32 = 2;
/// How many wrong options a take-away removes
pub const TAKE_AWAY_COUNT: usize = 2;
/// A faith token is awarded every time the streak reaches a multiple of this
pub const TOKEN_STREAK_INTERVAL: u32 = 3;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PlayerState {
    pub score: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub correct_answers: u32,
    pub faith_tokens: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TeamState {
    pub blue: u32,
    pub black: u32,
    pub current_turn: Team,
}

impl Default for TeamState {
    fn default() -> Self {
        Self {
            blue: 0,
            black: 0,
            current_turn: Team::Blue,
        }
    }
}

impl TeamState {
    pub fn score(&self, team: Team) -> u32 {
        match team {
            Team::Blue => self.blue,
            Team::Black => self.black,
        }
    }

    fn score_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::Blue => &mut self.blue,
            Team::Black => &mut self.black,
        }
    }

    /// Higher-scoring team, None on a tie
    pub fn leader(&self) -> Option<Team> {
        match self.blue.cmp(&self.black) {
            std::cmp::Ordering::Greater => Some(Team::Blue),
            std::cmp::Ordering::Less => Some(Team::Black),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PowerUpState {
    pub double_points_active: bool,
    pub freeze_time_active: bool,
}

/// Where the weekday for the Friday rule comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekdaySource {
    Local,
    Fixed(Weekday),
}

impl WeekdaySource {
    pub fn today(&self) -> Weekday {
        match self {
            WeekdaySource::Local => chrono::Local::now().weekday(),
            WeekdaySource::Fixed(day) => *day,
        }
    }
}

/// Turns the player's wager into the effective stake.
///
/// The only adjustment is the Friday rule: when enabled, wagers count double
/// on the local calendar's Friday.
#[derive(Debug, Clone, Copy)]
pub struct WagerRule {
    pub friday_double: bool,
    pub weekday: WeekdaySource,
}

impl WagerRule {
    pub fn new(friday_double: bool, weekday: WeekdaySource) -> Self {
        Self {
            friday_double,
            weekday,
        }
    }

    pub fn effective(&self, wager: u32) -> u32 {
        if self.friday_double && self.weekday.today() == Weekday::Fri {
            wager.saturating_mul(2)
        } else {
            wager
        }
    }
}

/// Upper wager bound for a question.
///
/// Solo players may stake up to their current score (at least
/// `BASE_MAX_WAGER`); teams always get `BASE_MAX_WAGER`. Lightning questions
/// double the bound.
pub fn max_wager(mode: GameMode, lightning: bool, score: u32) -> u32 {
    let base = match mode {
        GameMode::Solo => score.max(BASE_MAX_WAGER),
        GameMode::Teams => BASE_MAX_WAGER,
    };
    if lightning {
        base.saturating_mul(2)
    } else {
        base
    }
}

pub fn clamp_wager(value: i64, max: u32) -> u32 {
    let max = max.max(MIN_WAGER);
    value.clamp(MIN_WAGER as i64, max as i64) as u32
}

/// Parse raw wager input. Anything unparseable becomes the minimum wager.
pub fn parse_wager(input: &str, max: u32) -> u32 {
    let trimmed = input.trim();
    let value = trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
    });
    match value {
        Some(v) => clamp_wager(v, max),
        None => MIN_WAGER,
    }
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    pub player: PlayerState,
    pub teams: TeamState,
    pub power_ups: PowerUpState,
    pub wager_rule: WagerRule,
}

impl ScoringEngine {
    pub fn new(wager_rule: WagerRule) -> Self {
        Self {
            player: PlayerState::default(),
            teams: TeamState::default(),
            power_ups: PowerUpState::default(),
            wager_rule,
        }
    }

    /// Clear scores, streaks, tokens and power-ups for a new game
    pub fn reset(&mut self) {
        let rule = self.wager_rule;
        *self = Self::new(rule);
    }

    /// Team score in team mode, player score otherwise
    pub fn score_for(&self, team: Option<Team>) -> u32 {
        match team {
            Some(team) => self.teams.score(team),
            None => self.player.score,
        }
    }

    /// Add a signed delta to the right score, flooring at zero
    pub fn apply_delta(&mut self, delta: i64, team: Option<Team>) -> u32 {
        let score = match team {
            Some(team) => self.teams.score_mut(team),
            None => &mut self.player.score,
        };
        let updated = (*score as i64).saturating_add(delta).clamp(0, u32::MAX as i64);
        *score = updated as u32;
        *score
    }

    pub fn apply_penalty(&mut self, points: u32, team: Option<Team>) -> u32 {
        self.apply_delta(-(points as i64), team)
    }

    /// Resolve an answer. `selected` is None when the question timed out.
    ///
    /// `team` must be Some in team mode; faith tokens are only awarded in solo
    /// mode. Double points is consumed whatever the outcome.
    pub fn submit_answer(
        &mut self,
        selected: Option<&str>,
        question: &Question,
        wager: u32,
        mode: GameMode,
        team: Option<Team>,
    ) -> AnswerOutcome {
        let correct = selected.is_some_and(|s| question.is_correct(s));
        let effective_wager = self.wager_rule.effective(wager);
        let double = std::mem::take(&mut self.power_ups.double_points_active);

        let mut faith_token_awarded = false;
        let points_delta = if correct {
            self.player.current_streak += 1;
            self.player.longest_streak = self.player.longest_streak.max(self.player.current_streak);
            self.player.correct_answers += 1;

            if mode == GameMode::Solo && self.player.current_streak % TOKEN_STREAK_INTERVAL == 0 {
                self.player.faith_tokens += 1;
                faith_token_awarded = true;
            }

            let multiplier = if double { 2 } else { 1 };
            effective_wager as i64 * multiplier
        } else {
            self.player.current_streak = 0;
            -(effective_wager as i64)
        };

        let team = match mode {
            GameMode::Solo => None,
            GameMode::Teams => team,
        };
        self.apply_delta(points_delta, team);

        AnswerOutcome {
            question_id: question.id.clone(),
            selected: selected.map(str::to_string),
            correct_answer: question.correct_answer.clone(),
            correct,
            points_delta,
            effective_wager,
            team,
            streak: self.player.current_streak,
            faith_token_awarded,
            timed_out: selected.is_none(),
            seconds_taken: 0,
        }
    }

    /// Spend a token on double points. No-op if already active or broke.
    pub fn activate_double_points(&mut self) -> bool {
        if self.power_ups.double_points_active || self.player.faith_tokens == 0 {
            return false;
        }
        self.player.faith_tokens -= 1;
        self.power_ups.double_points_active = true;
        true
    }

    /// Spend a token on freeze time. No-op if already active or broke.
    pub fn activate_freeze_time(&mut self) -> bool {
        if self.power_ups.freeze_time_active || self.player.faith_tokens == 0 {
            return false;
        }
        self.player.faith_tokens -= 1;
        self.power_ups.freeze_time_active = true;
        true
    }
}

const ROUND_PHASES: &[Phase] = &[Phase::Question, Phase::Options, Phase::Answered];
const UNANSWERED_PHASES: &[Phase] = &[Phase::Question, Phase::Options];

impl Session {
    /// Set the wager for the current question, clamped to `[1, max_wager]`
    pub fn set_wager(&mut self, amount: i64) -> Result<u32, QuizError> {
        self.require_phase("change the wager", &[Phase::Question])?;
        let max = self.max_wager();
        self.current_wager = clamp_wager(amount, max);
        self.emit(GameEvent::WagerChanged {
            wager: self.current_wager,
            max_wager: max,
        });
        Ok(self.current_wager)
    }

    /// Like [`Session::set_wager`] but for raw text input
    pub fn set_wager_input(&mut self, input: &str) -> Result<u32, QuizError> {
        let max = self.max_wager();
        self.set_wager(parse_wager(input, max) as i64)
    }

    pub fn activate_double_points(&mut self) -> Result<bool, QuizError> {
        self.require_phase("activate double points", ROUND_PHASES)?;
        if !self.scoring.activate_double_points() {
            tracing::debug!("Double points not activated (already active or no tokens)");
            return Ok(false);
        }
        tracing::info!("Double points activated");
        self.emit(GameEvent::PowerUpActivated {
            power_up: PowerUp::DoublePoints,
            tokens_left: self.scoring.player.faith_tokens,
        });
        Ok(true)
    }

    /// Pause the question timer for the configured freeze duration.
    ///
    /// Only possible while the question timer is running.
    pub fn activate_freeze_time(&mut self) -> Result<bool, QuizError> {
        self.require_phase("freeze time", &[Phase::Options])?;
        if !self.question_timer.is_running() {
            tracing::debug!("Freeze not activated (question timer not running)");
            return Ok(false);
        }
        if !self.scoring.activate_freeze_time() {
            tracing::debug!("Freeze not activated (already active or no tokens)");
            return Ok(false);
        }

        self.question_timer.pause();
        self.freeze_resume_in = Some(self.config.freeze_duration_secs);
        tracing::info!(
            "Freeze time activated with {}s remaining",
            self.question_timer.remaining()
        );
        self.emit(GameEvent::PowerUpActivated {
            power_up: PowerUp::FreezeTime,
            tokens_left: self.scoring.player.faith_tokens,
        });
        Ok(true)
    }

    /// End a freeze early or on schedule, resuming the timer if it is still paused
    pub(crate) fn end_freeze(&mut self) {
        if self.freeze_resume_in.take().is_some() {
            self.question_timer.resume();
        }
        if std::mem::take(&mut self.scoring.power_ups.freeze_time_active) {
            self.emit(GameEvent::PowerUpExpired {
                power_up: PowerUp::FreezeTime,
            });
        }
    }

    /// Count down a pending freeze by one second
    pub(crate) fn tick_freeze(&mut self) {
        let Some(left) = self.freeze_resume_in.as_mut() else {
            return;
        };
        *left = left.saturating_sub(1);
        if *left == 0 {
            tracing::debug!(
                "Freeze over, resuming at {}s",
                self.question_timer.remaining()
            );
            self.end_freeze();
        }
    }

    /// Deduct the hint penalty and reveal the correct answer. Once per question.
    pub fn apply_hint(&mut self) -> Result<String, QuizError> {
        self.require_phase("use a hint", UNANSWERED_PHASES)?;
        let team = self.current_team();
        let round = self.round.as_mut().ok_or(QuizError::NoActiveRound)?;
        if round.current.hint_used {
            return Err(QuizError::AlreadyUsed("Hint"));
        }
        let correct_answer = round
            .current_question()
            .ok_or(QuizError::NoActiveRound)?
            .correct_answer
            .clone();
        round.current.hint_used = true;
        self.stats.hints_used += 1;

        let score = self.scoring.apply_penalty(HINT_PENALTY, team);
        tracing::info!("Hint used, score now {}", score);
        self.emit(GameEvent::HintRevealed {
            correct_answer: correct_answer.clone(),
            penalty: HINT_PENALTY,
        });
        self.emit(GameEvent::ScoreChanged { score, team });
        Ok(correct_answer)
    }

    /// Deduct the take-away penalty and remove two random wrong options.
    /// Once per question. Returns the removed options.
    pub fn apply_take_away(&mut self) -> Result<Vec<String>, QuizError> {
        self.require_phase("use a take-away", UNANSWERED_PHASES)?;
        let team = self.current_team();
        let round = self.round.as_mut().ok_or(QuizError::NoActiveRound)?;
        if round.current.take_away_used {
            return Err(QuizError::AlreadyUsed("Take-away"));
        }
        let question = round.current_question().ok_or(QuizError::NoActiveRound)?;
        let candidates: Vec<String> = question
            .incorrect_options()
            .filter(|o| !round.current.removed.contains(o))
            .cloned()
            .collect();

        let mut removed = shuffle(&candidates, &mut self.rng);
        removed.truncate(TAKE_AWAY_COUNT);
        round.current.removed.extend(removed.iter().cloned());
        round.current.take_away_used = true;
        self.stats.take_aways_used += 1;

        let score = self.scoring.apply_penalty(TAKE_AWAY_PENALTY, team);
        tracing::info!("Take-away removed {:?}, score now {}", removed, score);
        self.emit(GameEvent::OptionsRemoved {
            removed: removed.clone(),
            penalty: TAKE_AWAY_PENALTY,
        });
        self.emit(GameEvent::ScoreChanged { score, team });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::make_question;
    use crate::state::tests::{test_config, test_session};

    fn engine() -> ScoringEngine {
        ScoringEngine::new(WagerRule::new(false, WeekdaySource::Fixed(Weekday::Mon)))
    }

    #[test]
    fn test_correct_answer_adds_wager_and_streak() {
        let mut engine = engine();
        let q = make_question("1", "X");
        let outcome = engine.submit_answer(Some("A"), &q, 5, GameMode::Solo, None);

        assert!(outcome.correct);
        assert_eq!(outcome.points_delta, 5);
        assert_eq!(engine.player.score, 5);
        assert_eq!(engine.player.current_streak, 1);
        assert_eq!(engine.player.correct_answers, 1);
    }

    #[test]
    fn test_wrong_answer_floors_at_zero_and_resets_streak() {
        let mut engine = engine();
        let q = make_question("1", "X");
        engine.submit_answer(Some("A"), &q, 3, GameMode::Solo, None);
        engine.submit_answer(Some("A"), &q, 3, GameMode::Solo, None);
        assert_eq!(engine.player.current_streak, 2);

        let outcome = engine.submit_answer(Some("B"), &q, 10, GameMode::Solo, None);
        assert!(!outcome.correct);
        assert_eq!(outcome.points_delta, -10);
        assert_eq!(engine.player.score, 0);
        assert_eq!(engine.player.current_streak, 0);
        assert_eq!(engine.player.longest_streak, 2);
    }

    #[test]
    fn test_score_never_negative() {
        let mut engine = engine();
        let q = make_question("1", "X");
        for i in 0..50 {
            match i % 3 {
                0 => {
                    engine.submit_answer(Some("C"), &q, 7, GameMode::Solo, None);
                }
                1 => {
                    engine.apply_penalty(HINT_PENALTY, None);
                }
                _ => {
                    engine.submit_answer(None, &q, 2, GameMode::Solo, None);
                }
            }
            assert_eq!(engine.player.score, 0);
        }
    }

    #[test]
    fn test_answer_match_is_exact() {
        let mut engine = engine();
        let q = make_question("1", "X");
        assert!(!engine.submit_answer(Some("a"), &q, 1, GameMode::Solo, None).correct);
        assert!(!engine.submit_answer(Some("A "), &q, 1, GameMode::Solo, None).correct);
    }

    #[test]
    fn test_faith_tokens_at_multiples_of_three() {
        let mut engine = engine();
        let q = make_question("1", "X");
        let mut awarded_at = Vec::new();
        for _ in 0..10 {
            let outcome = engine.submit_answer(Some("A"), &q, 1, GameMode::Solo, None);
            if outcome.faith_token_awarded {
                awarded_at.push(outcome.streak);
            }
        }
        assert_eq!(awarded_at, vec![3, 6, 9]);
        assert_eq!(engine.player.faith_tokens, 3);
    }

    #[test]
    fn test_no_faith_tokens_in_team_mode() {
        let mut engine = engine();
        let q = make_question("1", "X");
        for i in 0..6 {
            engine.submit_answer(Some("A"), &q, 1, GameMode::Teams, Some(Team::for_index(i)));
        }
        assert_eq!(engine.player.faith_tokens, 0);
        assert_eq!(engine.teams.blue, 3);
        assert_eq!(engine.teams.black, 3);
        assert_eq!(engine.player.score, 0);
    }

    #[test]
    fn test_team_delta_only_touches_active_team() {
        let mut engine = engine();
        let q = make_question("1", "X");
        engine.submit_answer(Some("A"), &q, 8, GameMode::Teams, Some(Team::Blue));
        engine.submit_answer(Some("B"), &q, 4, GameMode::Teams, Some(Team::Black));
        assert_eq!(engine.teams.blue, 8);
        assert_eq!(engine.teams.black, 0);
        assert_eq!(engine.teams.leader(), Some(Team::Blue));
    }

    #[test]
    fn test_double_points_consumed_after_one_use() {
        let mut engine = engine();
        engine.player.faith_tokens = 2;
        let q = make_question("1", "X");

        assert!(engine.activate_double_points());
        assert!(!engine.activate_double_points(), "already active");
        assert_eq!(engine.player.faith_tokens, 1);

        let outcome = engine.submit_answer(Some("A"), &q, 4, GameMode::Solo, None);
        assert_eq!(outcome.points_delta, 8);
        assert!(!engine.power_ups.double_points_active);

        // consumed on a wrong answer too, and does not double the loss
        assert!(engine.activate_double_points());
        let outcome = engine.submit_answer(Some("B"), &q, 4, GameMode::Solo, None);
        assert_eq!(outcome.points_delta, -4);
        assert!(!engine.power_ups.double_points_active);
    }

    #[test]
    fn test_power_ups_need_tokens() {
        let mut engine = engine();
        assert!(!engine.activate_double_points());
        assert!(!engine.activate_freeze_time());
        assert_eq!(engine.power_ups, PowerUpState::default());
    }

    #[test]
    fn test_both_power_ups_can_be_active() {
        let mut engine = engine();
        engine.player.faith_tokens = 2;
        assert!(engine.activate_double_points());
        assert!(engine.activate_freeze_time());
        assert!(engine.power_ups.double_points_active);
        assert!(engine.power_ups.freeze_time_active);
        assert_eq!(engine.player.faith_tokens, 0);
    }

    #[test]
    fn test_friday_rule_doubles_wager() {
        let friday = WagerRule::new(true, WeekdaySource::Fixed(Weekday::Fri));
        let thursday = WagerRule::new(true, WeekdaySource::Fixed(Weekday::Thu));
        let disabled = WagerRule::new(false, WeekdaySource::Fixed(Weekday::Fri));
        assert_eq!(friday.effective(5), 10);
        assert_eq!(thursday.effective(5), 5);
        assert_eq!(disabled.effective(5), 5);

        let mut engine = ScoringEngine::new(friday);
        let q = make_question("1", "X");
        let outcome = engine.submit_answer(Some("B"), &q, 5, GameMode::Solo, None);
        assert_eq!(outcome.points_delta, -10);
        assert_eq!(outcome.effective_wager, 10);
    }

    #[test]
    fn test_max_wager_rules() {
        assert_eq!(max_wager(GameMode::Solo, false, 0), 10);
        assert_eq!(max_wager(GameMode::Solo, false, 35), 35);
        assert_eq!(max_wager(GameMode::Solo, true, 35), 70);
        assert_eq!(max_wager(GameMode::Teams, false, 500), 10);
        assert_eq!(max_wager(GameMode::Teams, true, 0), 20);
    }

    #[test]
    fn test_wager_input_is_clamped() {
        assert_eq!(parse_wager("5", 10), 5);
        assert_eq!(parse_wager(" 50 ", 10), 10);
        assert_eq!(parse_wager("0", 10), 1);
        assert_eq!(parse_wager("-7", 10), 1);
        assert_eq!(parse_wager("seven", 10), 1);
        assert_eq!(parse_wager("", 10), 1);
        assert_eq!(parse_wager("4.9", 10), 4);
        assert_eq!(parse_wager("NaN", 10), 1);
        assert_eq!(parse_wager("99999999999999999999", 10), 10);
        assert_eq!(clamp_wager(3, 0), 1);
    }

    #[test]
    fn test_session_wager_only_in_question_phase() {
        let mut session = test_session(test_config(3));
        assert!(session.set_wager(5).is_err());

        session.start_game().unwrap();
        assert_eq!(session.set_wager(5).unwrap(), 5);
        assert_eq!(session.set_wager_input("abc").unwrap(), 1);
        assert_eq!(session.set_wager(1000).unwrap(), 10);

        session.show_options().unwrap();
        assert!(matches!(
            session.set_wager(3),
            Err(QuizError::InvalidPhase { .. })
        ));
        assert_eq!(session.current_wager(), 10);
    }

    #[test]
    fn test_hint_once_per_question() {
        let mut session = test_session(test_config(3));
        session.start_game().unwrap();
        session.set_wager(10).unwrap();
        session.show_options().unwrap();
        session.submit_answer("A").unwrap();
        assert_eq!(session.player().score, 10);
        session.next_question().unwrap();

        assert_eq!(session.apply_hint().unwrap(), "A");
        assert_eq!(session.player().score, 7);
        assert_eq!(session.apply_hint(), Err(QuizError::AlreadyUsed("Hint")));
        assert_eq!(session.player().score, 7);

        // hint penalty floors at zero
        session.scoring.player.score = 1;
        session.show_options().unwrap();
        session.submit_answer("B").unwrap();
        session.next_question().unwrap();
        assert!(session.apply_hint().is_ok());
        assert_eq!(session.player().score, 0);
    }

    #[test]
    fn test_take_away_removes_two_wrong_options() {
        let mut session = test_session(test_config(3));
        session.start_game().unwrap();
        session.show_options().unwrap();

        let removed = session.apply_take_away().unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!removed.contains(&"A".to_string()));

        let available = session.available_options();
        assert_eq!(available.len(), 2);
        assert!(available.contains(&"A".to_string()));
        assert!(removed.iter().all(|r| !available.contains(r)));

        assert_eq!(
            session.apply_take_away(),
            Err(QuizError::AlreadyUsed("Take-away"))
        );
        assert_eq!(
            session.submit_answer(&removed[0]),
            Err(QuizError::OptionUnavailable(removed[0].clone()))
        );
    }

    #[test]
    fn test_hint_and_take_away_on_same_question() {
        let mut session = test_session(test_config(3));
        session.start_game().unwrap();
        session.show_options().unwrap();
        session.apply_hint().unwrap();
        let first = session.apply_take_away().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(session.stats().take_aways_used, 1);
        assert_eq!(session.stats().hints_used, 1);
    }

    #[test]
    fn test_freeze_needs_running_timer() {
        let mut session = test_session(test_config(3));
        session.start_game().unwrap();
        session.scoring.player.faith_tokens = 1;

        // Question phase: no timer yet
        assert!(session.activate_freeze_time().is_err());
        session.show_options().unwrap();
        assert!(session.activate_freeze_time().unwrap());
        assert!(!session.activate_freeze_time().unwrap());
        assert_eq!(session.player().faith_tokens, 0);
        assert!(session.is_frozen());
    }
}
