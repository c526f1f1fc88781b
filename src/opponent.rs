//! Move selection for the computer player.
//!
//! The computer always plays [`COMPUTER`]. `Easy` picks any empty square at
//! random; `Hard` runs a full-depth minimax and never loses.

use std::{fmt, str::FromStr};

use rand::Rng;
use tracing::debug;

use crate::board::{Board, Mark};
use crate::Error;

/// The mark the computer plays; the human always opens as X.
pub const COMPUTER: Mark = Mark::O;

pub const WIN_SCORE: i32 = 10;
pub const LOSS_SCORE: i32 = -10;
pub const DRAW_SCORE: i32 = 0;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Difficulty {
    #[default]
    Easy,
    Hard,
}

impl Difficulty {
    pub fn toggle(&self) -> Difficulty {
        match self {
            Difficulty::Easy => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => f.write_str("easy"),
            Difficulty::Hard => f.write_str("hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "hard" => Ok(Difficulty::Hard),
            other => Err(Error::UnknownCommand(other.to_string())),
        }
    }
}

/// Result of a minimax search, scored from O's point of view.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub score: i32,
    /// `None` when the position was already terminal.
    pub index: Option<usize>,
}

/// Picks the computer's next square, or `None` if there is nothing to play.
pub fn choose_move<R: Rng + ?Sized>(
    board: &Board,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<usize> {
    let choice = match difficulty {
        Difficulty::Easy => random_move(board, rng),
        Difficulty::Hard => best_move(board),
    };
    debug!(%difficulty, ?choice, "computer chose");
    choice
}

pub fn random_move<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<usize> {
    let empty = board.empty_cell_indices();
    if empty.is_empty() {
        return None;
    }
    Some(empty[rng.random_range(0..empty.len())])
}

pub fn best_move(board: &Board) -> Option<usize> {
    minimax(board, COMPUTER).index
}

/// Exhaustive minimax with O maximizing and X minimizing.
///
/// Scores do not depend on depth. Ties go to the lowest index, since
/// candidates are tried in ascending order and only a strictly better
/// score replaces the current best.
pub fn minimax(board: &Board, to_move: Mark) -> Evaluation {
    match board.get_winner() {
        Some(Mark::X) => return terminal(LOSS_SCORE),
        Some(Mark::O) => return terminal(WIN_SCORE),
        None => {}
    }
    let empty = board.empty_cell_indices();
    if empty.is_empty() {
        return terminal(DRAW_SCORE);
    }

    let mut best: Option<Evaluation> = None;
    for index in empty {
        let score = minimax(&board.mark(index, to_move), to_move.swap()).score;
        let better = match best {
            None => true,
            Some(b) if to_move == Mark::O => score > b.score,
            Some(b) => score < b.score,
        };
        if better {
            best = Some(Evaluation {
                score,
                index: Some(index),
            });
        }
    }
    // `empty` was non-empty, so at least one candidate was recorded
    best.unwrap_or(terminal(DRAW_SCORE))
}

fn terminal(score: i32) -> Evaluation {
    Evaluation { score, index: None }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::board::board;
    use crate::game::Game;
    use crate::Status;

    #[test]
    fn completes_own_line() {
        let b = board("OO- XX- ---");
        assert_eq!(best_move(&b), Some(2));
        assert_eq!(minimax(&b, Mark::O).score, WIN_SCORE);
    }

    #[test]
    fn blocks_a_forced_loss() {
        let b = board("X-- -O- --X");
        let eval = minimax(&b, Mark::O);
        assert_eq!(eval, Evaluation { score: DRAW_SCORE, index: Some(1) });

        // corners hand X a fork
        for corner in [2, 6] {
            assert_eq!(minimax(&b.mark(corner, Mark::O), Mark::X).score, LOSS_SCORE);
        }
    }

    #[test]
    fn blocks_an_immediate_threat() {
        let b = board("XX- -O- ---");
        assert_eq!(best_move(&b), Some(2));
    }

    #[test]
    fn terminal_positions_have_no_move() {
        assert_eq!(
            minimax(&board("XXX OO- ---"), Mark::O),
            Evaluation { score: LOSS_SCORE, index: None }
        );
        assert_eq!(
            minimax(&board("XOX XOO OXX"), Mark::O),
            Evaluation { score: DRAW_SCORE, index: None }
        );
        assert_eq!(best_move(&board("XOX XOO OXX")), None);
    }

    #[test]
    fn empty_board_is_a_draw_with_first_square() {
        assert_eq!(
            minimax(&Board::new(), Mark::X),
            Evaluation { score: DRAW_SCORE, index: Some(0) }
        );
    }

    #[test]
    fn search_leaves_board_untouched() {
        let b = board("X-- -O- --X");
        let copy = b;
        minimax(&b, Mark::O);
        assert_eq!(b, copy);
    }

    #[test]
    fn easy_picks_an_empty_square() {
        let mut rng = StdRng::seed_from_u64(7);
        let b = board("XOX -O- X-O");
        let empty = b.empty_cell_indices();
        for _ in 0..200 {
            let index = choose_move(&b, Difficulty::Easy, &mut rng).unwrap();
            assert!(empty.contains(&index));
        }
        assert_eq!(random_move(&board("XOX XOO OXX"), &mut rng), None);
    }

    #[test]
    fn easy_reaches_every_empty_square() {
        let mut rng = StdRng::seed_from_u64(11);
        let b = board("X-- --- ---");
        let mut seen = [false; 9];
        for _ in 0..500 {
            seen[random_move(&b, &mut rng).unwrap()] = true;
        }
        assert_eq!(seen, [false, true, true, true, true, true, true, true, true]);
    }

    fn assert_never_loses(game: Game) {
        match game.status() {
            Status::Won { winner, .. } => assert_eq!(winner, Mark::O, "\n{}", game.board()),
            Status::Draw => {}
            Status::InProgress(_) => {
                for index in game.empty_cell_indices() {
                    let mut next = game;
                    next.apply_move(index).unwrap();
                    if next.is_running() {
                        let reply = best_move(next.board()).unwrap();
                        next.apply_move(reply).unwrap();
                    }
                    assert_never_loses(next);
                }
            }
        }
    }

    #[test]
    fn hard_never_loses_against_any_line() {
        assert_never_loses(Game::new());
    }

    #[test]
    fn optimal_play_is_a_draw() {
        let mut game = Game::new();
        while game.is_running() {
            let index = minimax(game.board(), game.current_player()).index.unwrap();
            game.apply_move(index).unwrap();
        }
        assert_eq!(game.status(), Status::Draw);
    }

    #[test]
    fn difficulty_parses() {
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!(" easy ".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert!("medium".parse::<Difficulty>().is_err());
    }
}
