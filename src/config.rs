use crate::types::{CategoryFilter, GameMode, TurnOrder};
use std::path::PathBuf;

/// Configuration consumed by the quiz core and the binary
#[derive(Debug, Clone)]
pub struct QuizConfig {
    /// Maximum number of questions drawn per round
    pub round_size: usize,
    pub question_time_limit_secs: u32,
    pub session_time_limit_secs: u32,
    /// Whole-session countdown, off unless explicitly enabled
    pub session_timer_enabled: bool,
    pub category: CategoryFilter,
    pub mode: GameMode,
    pub turn_order: TurnOrder,
    /// Every n-th question of the session is a lightning question.
    /// None means "every `round_size` questions".
    pub lightning_interval: Option<usize>,
    /// Double the effective wager on Fridays
    pub friday_double_wager: bool,
    pub freeze_duration_secs: u32,
    pub leaderboard_url: Option<String>,
    pub leaderboard_opt_out: bool,
    pub catalog_path: Option<PathBuf>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            round_size: 20,
            question_time_limit_secs: 40,
            session_time_limit_secs: 180,
            session_timer_enabled: false,
            category: CategoryFilter::All,
            mode: GameMode::Solo,
            turn_order: TurnOrder::Alternating,
            lightning_interval: None,
            friday_double_wager: true,
            freeze_duration_secs: 5,
            leaderboard_url: None,
            leaderboard_opt_out: false,
            catalog_path: None,
        }
    }
}

impl QuizConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mode = match env_string("QUIZ_MODE").as_deref() {
            Some("teams") | Some("team") => GameMode::Teams,
            _ => GameMode::Solo,
        };

        let turn_order = match env_string("QUIZ_TURN_ORDER").as_deref() {
            Some("sequential") => TurnOrder::Sequential,
            _ => TurnOrder::Alternating,
        };

        Self {
            round_size: env_parse("QUIZ_ROUND_SIZE")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.round_size),
            question_time_limit_secs: env_parse("QUIZ_QUESTION_SECONDS")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.question_time_limit_secs),
            session_time_limit_secs: env_parse("QUIZ_SESSION_SECONDS")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.session_time_limit_secs),
            session_timer_enabled: env_flag("QUIZ_SESSION_TIMER")
                .unwrap_or(defaults.session_timer_enabled),
            category: env_string("QUIZ_CATEGORY")
                .map(CategoryFilter::from)
                .unwrap_or(defaults.category),
            mode,
            turn_order,
            lightning_interval: env_parse("QUIZ_LIGHTNING_EVERY").filter(|n: &usize| *n > 0),
            friday_double_wager: env_flag("QUIZ_FRIDAY_RULE")
                .unwrap_or(defaults.friday_double_wager),
            freeze_duration_secs: defaults.freeze_duration_secs,
            leaderboard_url: env_string("QUIZ_LEADERBOARD_URL"),
            leaderboard_opt_out: env_flag("QUIZ_LEADERBOARD_OPT_OUT")
                .unwrap_or(defaults.leaderboard_opt_out),
            catalog_path: env_string("QUIZ_CATALOG_PATH").map(PathBuf::from),
        }
    }

    pub fn lightning_interval(&self) -> usize {
        self.lightning_interval.unwrap_or(self.round_size).max(1)
    }
}

/// Read an env var, trimmed, treating empty values as unset
pub(crate) fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|s| s.parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    env_string(key).map(|v| v != "0" && v.to_lowercase() != "false")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "QUIZ_ROUND_SIZE",
        "QUIZ_QUESTION_SECONDS",
        "QUIZ_SESSION_SECONDS",
        "QUIZ_SESSION_TIMER",
        "QUIZ_CATEGORY",
        "QUIZ_MODE",
        "QUIZ_TURN_ORDER",
        "QUIZ_LIGHTNING_EVERY",
        "QUIZ_FRIDAY_RULE",
        "QUIZ_LEADERBOARD_URL",
        "QUIZ_LEADERBOARD_OPT_OUT",
        "QUIZ_CATALOG_PATH",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config() {
        let config = QuizConfig::default();
        assert_eq!(config.round_size, 20);
        assert_eq!(config.question_time_limit_secs, 40);
        assert_eq!(config.session_time_limit_secs, 180);
        assert!(!config.session_timer_enabled);
        assert_eq!(config.category, CategoryFilter::All);
        assert_eq!(config.mode, GameMode::Solo);
        assert_eq!(config.lightning_interval(), 20);
    }

    #[test]
    #[serial]
    fn test_from_env_without_vars_matches_defaults() {
        clear_env();
        let config = QuizConfig::from_env();
        assert_eq!(config.round_size, 20);
        assert_eq!(config.turn_order, TurnOrder::Alternating);
        assert!(config.leaderboard_url.is_none());
        assert!(config.friday_double_wager);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("QUIZ_ROUND_SIZE", "5");
        std::env::set_var("QUIZ_MODE", "teams");
        std::env::set_var("QUIZ_TURN_ORDER", "sequential");
        std::env::set_var("QUIZ_CATEGORY", "Prophets");
        std::env::set_var("QUIZ_SESSION_TIMER", "1");
        std::env::set_var("QUIZ_FRIDAY_RULE", "false");
        std::env::set_var("QUIZ_LEADERBOARD_URL", "  http://localhost:8080  ");

        let config = QuizConfig::from_env();
        assert_eq!(config.round_size, 5);
        assert_eq!(config.mode, GameMode::Teams);
        assert_eq!(config.turn_order, TurnOrder::Sequential);
        assert_eq!(config.category, CategoryFilter::Only("Prophets".into()));
        assert!(config.session_timer_enabled);
        assert!(!config.friday_double_wager);
        assert_eq!(
            config.leaderboard_url.as_deref(),
            Some("http://localhost:8080")
        );
        assert_eq!(config.lightning_interval(), 5);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_garbage() {
        clear_env();
        std::env::set_var("QUIZ_ROUND_SIZE", "lots");
        std::env::set_var("QUIZ_QUESTION_SECONDS", "0");
        std::env::set_var("QUIZ_LEADERBOARD_URL", "   ");

        let config = QuizConfig::from_env();
        assert_eq!(config.round_size, 20);
        assert_eq!(config.question_time_limit_secs, 40);
        assert!(config.leaderboard_url.is_none());

        clear_env();
    }
}
