use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizdash::catalog::Catalog;
use quizdash::config::QuizConfig;
use quizdash::identity::{IdentityProvider, LocalIdentity};
use quizdash::leaderboard::{fetch_or_unavailable, HttpLeaderboard, Leaderboard, LeaderboardView};
use quizdash::protocol::{Command, GameEvent};
use quizdash::runtime::{GameRuntime, ScoreSubmitter};
use quizdash::state::{write_report, Session};

const HELP: &str = "\
Commands:
  s          start a new game
  w <n>      set the wager
  o          show the options
  <n>        answer with option n
  h          hint (-3)
  t          take away two wrong options (-2)
  d          double points (1 faith token)
  f          freeze time (1 faith token)
  n          next question
  b          start the black team's turn
  x [file]   export the last round's report
  top        show the leaderboard
  q          quit";

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Logs go to stderr so they don't interleave with the game on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizdash=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = QuizConfig::from_env();

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path),
        None => Catalog::bundled(),
    };
    let catalog = match catalog {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            eprintln!("Failed to load questions: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Loaded {} questions in {} categories",
        catalog.len(),
        catalog.categories().len()
    );

    let identity = Arc::new(LocalIdentity::from_env());
    if identity.has_profile() {
        if let Err(e) = identity.sign_in().await {
            println!("{}", e.user_message());
        }
    }

    let leaderboard: Option<Arc<dyn Leaderboard>> = match config.leaderboard_url.as_deref() {
        Some(url) => match HttpLeaderboard::new(url) {
            Ok(board) => Some(Arc::new(board)),
            Err(e) => {
                tracing::warn!("Leaderboard disabled: {}", e);
                None
            }
        },
        None => None,
    };

    let submitter = ScoreSubmitter::new(
        leaderboard.clone(),
        identity.clone(),
        config.leaderboard_opt_out,
    );
    let runtime = GameRuntime::new(Session::new(config, catalog), submitter);

    let mut events = runtime.subscribe().await;
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(n)) => tracing::warn!("Missed {} events", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read input: {}", e);
                break;
            }
        };
        let input = line.trim();
        let mut words = input.split_whitespace();
        let Some(word) = words.next() else {
            continue;
        };

        let command = match word {
            "s" | "start" => Command::StartGame,
            "w" | "wager" => Command::SetWager {
                amount: words.next().unwrap_or_default().to_string(),
            },
            "o" | "options" => Command::ShowOptions,
            "h" | "hint" => Command::UseHint,
            "t" | "take" => Command::UseTakeAway,
            "d" | "double" => Command::ActivateDoublePoints,
            "f" | "freeze" => Command::ActivateFreezeTime,
            "n" | "next" => Command::NextQuestion,
            "b" | "black" => Command::StartSecondTeam,
            "q" | "quit" => {
                let _ = runtime.dispatch(Command::Exit).await;
                break;
            }
            "x" | "export" => {
                let path = words
                    .next()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("quiz-report.txt"));
                match runtime.report().await {
                    Some(report) => match write_report(&report, &path) {
                        Ok(()) => println!("Report written to {}", path.display()),
                        Err(e) => println!("Failed to write report: {}", e),
                    },
                    None => println!("No finished round to export yet."),
                }
                continue;
            }
            "top" => {
                match &leaderboard {
                    Some(board) => print_leaderboard(&fetch_or_unavailable(board.as_ref(), 10).await),
                    None => println!("No leaderboard configured."),
                }
                continue;
            }
            "help" | "?" => {
                println!("{}", HELP);
                continue;
            }
            other => match other.parse::<usize>() {
                Ok(n) if n > 0 => {
                    let options = runtime.session().lock().await.available_options();
                    match options.get(n - 1) {
                        Some(option) => Command::Answer {
                            option: option.clone(),
                        },
                        None => {
                            println!("No option {}", n);
                            continue;
                        }
                    }
                }
                _ => {
                    println!("Unknown command '{}', type 'help'", other);
                    continue;
                }
            },
        };

        if let Err(e) = runtime.dispatch(command).await {
            println!("{}", e);
        }
    }

    let _ = identity.sign_out().await;
}

fn print_event(event: &GameEvent) {
    match event {
        GameEvent::QuestionShown {
            index,
            total,
            question,
            category,
            team,
            max_wager,
            lightning,
        } => {
            println!();
            let team = team.map(|t| format!(" {} team", t)).unwrap_or_default();
            let lightning = if *lightning { " LIGHTNING" } else { "" };
            println!("Question {}/{} [{}]{}{}", index + 1, total, category, team, lightning);
            println!("{}", question);
            println!("Wager 1-{} (w <n>), then 'o' for options", max_wager);
        }
        GameEvent::WagerChanged { wager, max_wager } => {
            println!("Wager: {}/{}", wager, max_wager)
        }
        GameEvent::OptionsShown {
            options,
            time_limit,
        } => {
            for (i, option) in options.iter().enumerate() {
                println!("  {}) {}", i + 1, option);
            }
            println!("{}s on the clock", time_limit);
        }
        GameEvent::Tick { remaining } if remaining % 10 == 0 => println!("{}s left", remaining),
        GameEvent::Urgent { remaining } => println!("{}...", remaining),
        GameEvent::TimeUp => println!("Time's up!"),
        GameEvent::SessionTick { remaining } if remaining % 30 == 0 => {
            println!("Session: {}s left", remaining)
        }
        GameEvent::SessionTimeUp => println!("Session time is over."),
        GameEvent::AnswerResolved {
            outcome,
            explanation,
            deep_insight,
        } => {
            if outcome.correct {
                println!("Correct! {:+}", outcome.points_delta);
            } else {
                println!(
                    "Wrong. The answer was {} ({:+})",
                    outcome.correct_answer, outcome.points_delta
                );
            }
            if let Some(explanation) = explanation {
                println!("{}", explanation);
            }
            if let Some(insight) = deep_insight {
                println!("Insight: {}", insight);
            }
            println!("'n' for the next question");
        }
        GameEvent::StreakMilestone { streak } => println!("{} in a row!", streak),
        GameEvent::FaithTokenEarned { tokens } => println!("Faith token earned ({} total)", tokens),
        GameEvent::PowerUpActivated {
            power_up,
            tokens_left,
        } => println!("{:?} active, {} tokens left", power_up, tokens_left),
        GameEvent::PowerUpExpired { power_up } => println!("{:?} over", power_up),
        GameEvent::HintRevealed {
            correct_answer,
            penalty,
        } => println!("Hint: {} (-{})", correct_answer, penalty),
        GameEvent::OptionsRemoved { removed, penalty } => {
            println!("Removed: {} (-{})", removed.join(", "), penalty)
        }
        GameEvent::ScoreChanged { score, team } => match team {
            Some(team) => println!("{} team: {}", team, score),
            None => println!("Score: {}", score),
        },
        GameEvent::AchievementUnlocked {
            name, description, ..
        } => println!("Achievement unlocked: {} ({})", name, description),
        GameEvent::Intermission { blue_score } => {
            println!("Blue team finished with {}. 'b' to start the black team.", blue_score)
        }
        GameEvent::Confetti => println!("*** Well done! ***"),
        GameEvent::RoundEnded { summary } => {
            println!();
            match summary.winner {
                Some(team) => println!(
                    "Round over: blue {} / black {}, {} team wins",
                    summary.blue_score, summary.black_score, team
                ),
                None if summary.mode == quizdash::types::GameMode::Teams => println!(
                    "Round over: blue {} / black {}, it's a tie",
                    summary.blue_score, summary.black_score
                ),
                None => println!(
                    "Round over: {} points, {}/{} correct in {}s",
                    summary.score,
                    summary.correct_answers,
                    summary.questions_answered,
                    summary.elapsed_seconds
                ),
            }
            println!("'s' to play again, 'x' to export, 'top' for the leaderboard");
        }
        GameEvent::GameExited => println!("Game exited."),
        _ => {}
    }
}

fn print_leaderboard(view: &LeaderboardView) {
    match view {
        LeaderboardView::Entries(entries) if entries.is_empty() => println!("No scores yet."),
        LeaderboardView::Entries(entries) => {
            for (i, entry) in entries.iter().enumerate() {
                println!(
                    "{:>2}. {:<20} {:>4} pts {:>4}s",
                    i + 1,
                    entry.name,
                    entry.score,
                    entry.time
                );
            }
        }
        LeaderboardView::Unavailable(message) => println!("{}", message),
    }
}
