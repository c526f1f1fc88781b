use std::{fmt, str::FromStr};

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, trace};

use crate::board::{Board, Mark, Status};
use crate::game::Game;
use crate::opponent::{self, Difficulty, COMPUTER};
use crate::Error;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    PlayerVsPlayer,
    PlayerVsComputer,
}

impl Mode {
    pub fn toggle(&self) -> Mode {
        match self {
            Mode::PlayerVsPlayer => Mode::PlayerVsComputer,
            Mode::PlayerVsComputer => Mode::PlayerVsPlayer,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::PlayerVsPlayer => f.write_str("pvp"),
            Mode::PlayerVsComputer => f.write_str("computer"),
        }
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pvp" => Ok(Mode::PlayerVsPlayer),
            "computer" | "ai" | "pvc" => Ok(Mode::PlayerVsComputer),
            other => Err(Error::UnknownCommand(other.to_string())),
        }
    }
}

/// One request from whoever is driving the game.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Place the current player's mark, zero-based.
    Place(usize),
    ComputerMove,
    Restart,
    SetMode(Mode),
    SetDifficulty(Difficulty),
}

/// A game together with who is playing it.
///
/// The random source lives here so that a seeded session replays the same
/// easy-difficulty games.
#[derive(Clone, Debug)]
pub struct Session {
    game: Game,
    mode: Mode,
    difficulty: Difficulty,
    last_move: Option<(usize, Mark)>,
    rng: StdRng,
}

impl Session {
    pub fn new(mode: Mode, difficulty: Difficulty, rng: StdRng) -> Session {
        Session {
            game: Game::new(),
            mode,
            difficulty,
            last_move: None,
            rng,
        }
    }

    pub fn seeded(mode: Mode, difficulty: Difficulty, seed: u64) -> Session {
        Session::new(mode, difficulty, StdRng::seed_from_u64(seed))
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn board(&self) -> &Board {
        self.game.board()
    }

    pub fn status(&self) -> Status {
        self.game.status()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// The placement that produced the current board, cleared on restart.
    pub fn last_move(&self) -> Option<(usize, Mark)> {
        self.last_move
    }

    pub fn computer_to_move(&self) -> bool {
        self.mode == Mode::PlayerVsComputer
            && self.game.is_running()
            && self.game.current_player() == COMPUTER
    }

    /// A move made by a person at the keyboard.
    pub fn apply_move(&mut self, index: usize) -> Result<Status, Error> {
        if self.computer_to_move() {
            return Err(Error::ComputerToMove);
        }
        self.place(index)
    }

    pub fn computer_move(&mut self) -> Result<Status, Error> {
        if !self.computer_to_move() {
            return Err(Error::NotComputerTurn);
        }
        let index = opponent::choose_move(self.game.board(), self.difficulty, &mut self.rng)
            .ok_or(Error::GameOver)?;
        self.place(index)
    }

    /// Applies a human move and, if the computer is now due, its reply.
    pub fn play(&mut self, index: usize) -> Result<Status, Error> {
        let status = self.apply_move(index)?;
        if self.computer_to_move() {
            return self.computer_move();
        }
        Ok(status)
    }

    pub fn restart(&mut self) -> Status {
        self.last_move = None;
        self.game.restart()
    }

    pub fn set_mode(&mut self, mode: Mode) -> Status {
        info!(%mode, "mode changed");
        self.mode = mode;
        self.restart()
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Status {
        info!(%difficulty, "difficulty changed");
        self.difficulty = difficulty;
        self.restart()
    }

    /// The session after `command`, leaving `self` as it was.
    pub fn dispatch(&self, command: Command) -> Result<Session, Error> {
        let mut next = self.clone();
        let applied = match command {
            Command::Place(index) => next.apply_move(index).map(|_| ()),
            Command::ComputerMove => next.computer_move().map(|_| ()),
            Command::Restart => {
                next.restart();
                Ok(())
            }
            Command::SetMode(mode) => {
                next.set_mode(mode);
                Ok(())
            }
            Command::SetDifficulty(difficulty) => {
                next.set_difficulty(difficulty);
                Ok(())
            }
        };
        if let Err(err) = &applied {
            trace!(?command, %err, "command rejected");
        }
        applied.map(|()| next)
    }

    fn place(&mut self, index: usize) -> Result<Status, Error> {
        let mark = self.game.current_player();
        let status = self.game.apply_move(index)?;
        self.last_move = Some((index, mark));
        debug!(index, %mark, %status, "move applied");
        Ok(status)
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new(Mode::default(), Difficulty::default(), StdRng::from_os_rng())
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn pvp_never_invokes_the_computer() {
        let mut session = Session::seeded(Mode::PlayerVsPlayer, Difficulty::Hard, 1);
        assert_eq!(session.play(0), Ok(Status::InProgress(Mark::O)));
        assert!(!session.computer_to_move());
        assert_eq!(session.computer_move(), Err(Error::NotComputerTurn));
        assert_eq!(session.board().count(Mark::O), 0);
    }

    #[test]
    fn computer_replies_as_o() {
        let mut session = Session::seeded(Mode::PlayerVsComputer, Difficulty::Hard, 1);
        assert_eq!(session.play(0), Ok(Status::InProgress(Mark::X)));
        assert_eq!(session.board().count(Mark::O), 1);
        // the only non-losing reply to a corner opening is the centre
        assert_eq!(session.last_move(), Some((4, Mark::O)));
    }

    #[test]
    fn human_cannot_move_for_the_computer() {
        let mut session = Session::seeded(Mode::PlayerVsComputer, Difficulty::Easy, 3);
        session.apply_move(4).unwrap();
        assert!(session.computer_to_move());
        let before = *session.board();
        assert_eq!(session.apply_move(0), Err(Error::ComputerToMove));
        assert_eq!(*session.board(), before);
        session.computer_move().unwrap();
        assert!(!session.computer_to_move());
    }

    #[test]
    fn setters_restart() {
        let mut session = Session::seeded(Mode::PlayerVsPlayer, Difficulty::Easy, 5);
        session.play(4).unwrap();
        assert_eq!(session.set_mode(Mode::PlayerVsComputer), Status::InProgress(Mark::X));
        assert_eq!(*session.board(), Board::new());

        session.play(4).unwrap();
        assert_eq!(session.set_difficulty(Difficulty::Hard), Status::InProgress(Mark::X));
        assert_eq!(*session.board(), Board::new());
        assert_eq!(session.last_move(), None);
        assert_eq!(session.mode(), Mode::PlayerVsComputer);
        assert_eq!(session.difficulty(), Difficulty::Hard);
    }

    #[test]
    fn dispatch_leaves_the_session_alone() {
        let session = Session::seeded(Mode::PlayerVsPlayer, Difficulty::Easy, 9);
        let next = session.dispatch(Command::Place(3)).unwrap();
        assert_eq!(next.board().get(3), Some(Mark::X));
        assert_eq!(session.board().get(3), None);
        assert_eq!(next.dispatch(Command::Place(3)).unwrap_err(), Error::InvalidMove(3));
    }

    #[test]
    fn seeded_sessions_replay_the_same_game() {
        let run = || {
            let mut session = Session::seeded(Mode::PlayerVsComputer, Difficulty::Easy, 42);
            while session.game().is_running() {
                let index = session.game().empty_cell_indices()[0];
                session.play(index).unwrap();
            }
            *session.board()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn random_games_keep_mark_counts_balanced() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..300 {
            let mode = if rng.random_bool(0.5) {
                Mode::PlayerVsComputer
            } else {
                Mode::PlayerVsPlayer
            };
            let mut session = Session::seeded(mode, Difficulty::Easy, rng.random());
            while session.game().is_running() {
                let empty = session.game().empty_cell_indices();
                let index = empty[rng.random_range(0..empty.len())];
                session.play(index).unwrap();

                let x = session.board().count(Mark::X);
                let o = session.board().count(Mark::O);
                assert!(x == o || x == o + 1, "{}", session.board());
                if let Status::InProgress(mark) = session.status() {
                    assert_eq!(mark, if x == o { Mark::X } else { Mark::O });
                }
            }
        }
    }

    #[test]
    fn hard_computer_never_loses_to_random_play() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            let mut session = Session::seeded(Mode::PlayerVsComputer, Difficulty::Hard, 0);
            while session.game().is_running() {
                let empty = session.game().empty_cell_indices();
                session.play(empty[rng.random_range(0..empty.len())]).unwrap();
            }
            assert_ne!(session.status().winner(), Some(Mark::X));
        }
    }

    #[test]
    fn modes_parse() {
        assert_eq!("ai".parse::<Mode>(), Ok(Mode::PlayerVsComputer));
        assert_eq!("PvP".parse::<Mode>(), Ok(Mode::PlayerVsPlayer));
        assert_eq!(Mode::PlayerVsComputer.to_string(), "computer");
    }
}
