use crate::protocol::Command;
use crate::state::{QuizError, Session};

/// Apply one command to the session.
///
/// Results are observable through the session's event stream; the return
/// value only reports whether the command was accepted.
pub fn handle_command(session: &mut Session, command: Command) -> Result<(), QuizError> {
    tracing::debug!("Handling command {:?}", command);
    match command {
        Command::StartGame => {
            session.start_game()?;
        }
        Command::SetWager { amount } => {
            session.set_wager_input(&amount)?;
        }
        Command::ShowOptions => {
            session.show_options()?;
        }
        Command::Answer { option } => {
            session.submit_answer(&option)?;
        }
        Command::UseHint => {
            session.apply_hint()?;
        }
        Command::UseTakeAway => {
            session.apply_take_away()?;
        }
        Command::ActivateDoublePoints => {
            session.activate_double_points()?;
        }
        Command::ActivateFreezeTime => {
            session.activate_freeze_time()?;
        }
        Command::NextQuestion => {
            session.next_question()?;
        }
        Command::StartSecondTeam => {
            session.start_second_team()?;
        }
        Command::Exit => session.exit(),
    }
    Ok(())
}
