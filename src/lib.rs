use std::num::ParseIntError;

use sodium::{Cell, CellLoop, SodiumCtx, Stream};
use thiserror::Error;

mod board;
mod game;
pub mod opponent;
mod session;

pub use board::{Board, Mark, Status, WIN_SEQUENCES};
pub use game::Game;
pub use opponent::{choose_move, minimax, Difficulty, Evaluation, COMPUTER};
pub use session::{Command, Mode, Session};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid move: square {0} is already taken!")]
    InvalidMove(usize),

    #[error("invalid index: {0}!")]
    InvalidIndex(usize),

    #[error("invalid input: {0}!")]
    InvalidInteger(ParseIntError),

    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("the game is over, restart to play again")]
    GameOver,

    #[error("it is the computer's turn")]
    ComputerToMove,

    #[error("it is not the computer's turn")]
    NotComputerTurn,
}

/// A game session driven by a stream of commands.
///
/// Must be built inside a transaction on `ctx`.
pub struct TicTacToe {
    pub session: Cell<Session>,
    pub board: Cell<Board>,
    pub status: Cell<Status>,
    pub moves: Stream<(usize, Mark)>,
    /// Fires when a placement ends the game.
    pub outcome: Stream<Status>,
    pub error: Stream<Error>,
}

/// Turns raw input lines into commands.
pub struct CommandParser {
    pub commands: Stream<Command>,
    pub error: Stream<Error>,
}

impl TicTacToe {
    pub fn new(ctx: &SodiumCtx, commands: &Stream<Command>, initial: Session) -> TicTacToe {
        let session_cell_loop: CellLoop<Session> = ctx.new_cell_loop();
        let session_cell_fwd = session_cell_loop.cell();

        let (session_stream, error_stream) = commands
            .snapshot(&session_cell_fwd, |command: &Command, session: &Session| {
                session.dispatch(*command)
            })
            .split_res();
        let session_cell = session_stream.hold(initial);
        session_cell_loop.loop_(&session_cell);

        let board_cell = session_cell.map(|session: &Session| *session.board());
        let status_cell = session_cell.map(|session: &Session| session.status());

        let move_stream = session_stream
            .map(|session: &Session| session.last_move())
            .filter_option();
        let outcome_stream = session_stream
            .filter(|session: &Session| {
                session.last_move().is_some() && session.status().is_over()
            })
            .map(|session: &Session| session.status());

        TicTacToe {
            session: session_cell,
            board: board_cell,
            status: status_cell,
            moves: move_stream,
            outcome: outcome_stream,
            error: error_stream,
        }
    }
}

impl CommandParser {
    pub fn new(input_stream: &Stream<String>) -> CommandParser {
        let (command_stream, error_stream) = input_stream
            .map(|line: &String| parse_command(line))
            .split_res();

        CommandParser {
            commands: command_stream,
            error: error_stream,
        }
    }
}

/// Parses one line of player input.
///
/// Squares are numbered `1` to `9` starting from the top left; the returned
/// [`Command::Place`] index is zero-based.
pub fn parse_command(line: &str) -> Result<Command, Error> {
    let line = line.trim();
    if line.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+') {
        let index = line.parse::<usize>().map_err(Error::InvalidInteger)?;
        return if (1..=9).contains(&index) {
            Ok(Command::Place(index - 1))
        } else {
            Err(Error::InvalidIndex(index))
        };
    }

    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default().to_ascii_lowercase();
    let argument = words.next();
    match (command.as_str(), argument) {
        ("r" | "restart", None) => Ok(Command::Restart),
        ("c" | "computer", None) => Ok(Command::ComputerMove),
        ("m" | "mode", Some(mode)) => Ok(Command::SetMode(mode.parse()?)),
        ("d" | "difficulty", Some(difficulty)) => Ok(Command::SetDifficulty(difficulty.parse()?)),
        _ => Err(Error::UnknownCommand(line.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squares_are_one_based() {
        assert_eq!(parse_command("1"), Ok(Command::Place(0)));
        assert_eq!(parse_command(" 9 "), Ok(Command::Place(8)));
        assert_eq!(parse_command("0"), Err(Error::InvalidIndex(0)));
        assert_eq!(parse_command("10"), Err(Error::InvalidIndex(10)));
        assert!(matches!(parse_command("-3"), Err(Error::InvalidInteger(_))));
        assert!(matches!(parse_command("4x"), Err(Error::InvalidInteger(_))));
    }

    #[test]
    fn words_become_commands() {
        assert_eq!(parse_command("restart"), Ok(Command::Restart));
        assert_eq!(parse_command("R"), Ok(Command::Restart));
        assert_eq!(parse_command("c"), Ok(Command::ComputerMove));
        assert_eq!(
            parse_command("mode ai"),
            Ok(Command::SetMode(Mode::PlayerVsComputer))
        );
        assert_eq!(
            parse_command("difficulty hard"),
            Ok(Command::SetDifficulty(Difficulty::Hard))
        );
    }

    #[test]
    fn unknown_input_is_an_error() {
        assert!(matches!(parse_command(""), Err(Error::UnknownCommand(_))));
        assert!(matches!(parse_command("mode"), Err(Error::UnknownCommand(_))));
        assert!(matches!(parse_command("mode chess"), Err(Error::UnknownCommand(_))));
        assert!(matches!(parse_command("restart now"), Err(Error::UnknownCommand(_))));
    }
}
