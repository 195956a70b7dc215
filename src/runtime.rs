//! Async shell around a [`Session`]: drives the 1 s clock and hands finished
//! solo rounds to the leaderboard.

use crate::handlers::handle_command;
use crate::identity::IdentityProvider;
use crate::leaderboard::{submit_in_background, Leaderboard};
use crate::protocol::{Command, GameEvent, RoundSummary};
use crate::state::{QuizError, RoundReport, Session};
use crate::types::GameMode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Length of one session tick
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Decides whether a finished round goes to the leaderboard, and sends it
#[derive(Clone)]
pub struct ScoreSubmitter {
    leaderboard: Option<Arc<dyn Leaderboard>>,
    identity: Arc<dyn IdentityProvider>,
    opt_out: bool,
}

impl ScoreSubmitter {
    pub fn new(
        leaderboard: Option<Arc<dyn Leaderboard>>,
        identity: Arc<dyn IdentityProvider>,
        opt_out: bool,
    ) -> Self {
        Self {
            leaderboard,
            identity,
            opt_out,
        }
    }

    /// Fire-and-forget submission of a finished round.
    ///
    /// Team rounds are never submitted.
    pub async fn hand_off(&self, summary: &RoundSummary) -> Option<JoinHandle<()>> {
        if summary.mode == GameMode::Teams {
            tracing::debug!("Team round {} not submitted", summary.round_id);
            return None;
        }
        let leaderboard = self.leaderboard.clone()?;
        let user = self.identity.current_user().await;
        submit_in_background(
            leaderboard,
            user,
            self.opt_out,
            summary.score,
            summary.elapsed_seconds,
        )
    }
}

pub struct GameRuntime {
    session: Arc<Mutex<Session>>,
    submitter: ScoreSubmitter,
    last_summary: Arc<Mutex<Option<RoundSummary>>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl GameRuntime {
    pub fn new(session: Session, submitter: ScoreSubmitter) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            submitter,
            last_summary: Arc::new(Mutex::new(None)),
            ticker: Mutex::new(None),
        }
    }

    pub fn session(&self) -> Arc<Mutex<Session>> {
        self.session.clone()
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.session.lock().await.subscribe()
    }

    /// Apply a command, starting or stopping the clock as the round requires
    pub async fn dispatch(&self, command: Command) -> Result<(), QuizError> {
        let starts = matches!(command, Command::StartGame);
        let exits = matches!(command, Command::Exit);

        let finished = {
            let mut session = self.session.lock().await;
            handle_command(&mut session, command)?;
            session.take_finished()
        };

        if starts {
            self.start_ticker().await;
        }
        if exits {
            self.stop_ticker().await;
        }
        if let Some(summary) = finished {
            self.stop_ticker().await;
            record_finished(&self.last_summary, &self.submitter, summary).await;
        }
        Ok(())
    }

    /// Summary of the last finished round
    pub async fn last_summary(&self) -> Option<RoundSummary> {
        self.last_summary.lock().await.clone()
    }

    /// Report for the last finished round, if any. Survives a restart.
    pub async fn report(&self) -> Option<RoundReport> {
        self.session.lock().await.last_report().cloned()
    }

    pub async fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn start_ticker(&self) {
        self.stop_ticker().await;

        let session = self.session.clone();
        let submitter = self.submitter.clone();
        let last_summary = self.last_summary.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let finished = {
                    let mut session = session.lock().await;
                    session.tick();
                    session.take_finished()
                };
                if let Some(summary) = finished {
                    // Detached: aborting the ticker must not cancel the hand-off
                    tokio::spawn(async move {
                        record_finished(&last_summary, &submitter, summary).await;
                    });
                    break;
                }
            }
            tracing::debug!("Ticker stopped");
        });

        *self.ticker.lock().await = Some(handle);
    }

    async fn stop_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

async fn record_finished(
    last_summary: &Mutex<Option<RoundSummary>>,
    submitter: &ScoreSubmitter,
    summary: RoundSummary,
) {
    tracing::info!(
        "Round {} finished: score {}, {}/{} correct",
        summary.round_id,
        summary.score,
        summary.correct_answers,
        summary.questions_answered
    );
    submitter.hand_off(&summary).await;
    *last_summary.lock().await = Some(summary);
}
