// Public API for integration tests and potential library usage

pub mod catalog;
pub mod config;
pub mod handlers;
pub mod identity;
pub mod leaderboard;
pub mod protocol;
pub mod random;
pub mod runtime;
pub mod state;
pub mod types;
