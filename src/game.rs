use tracing::debug;

use crate::board::{Board, Mark, Status};
use crate::Error;

/// A single game of tic-tac-toe, from an empty board to a win or a draw.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Game {
    board: Board,
    turn: Mark,
    status: Status,
}

impl Game {
    pub fn new() -> Self {
        Game {
            board: Board::new(),
            turn: Mark::X,
            status: Status::InProgress(Mark::X),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// The mark that moves next, or that made the final move once the game is over.
    pub fn current_player(&self) -> Mark {
        self.turn
    }

    pub fn is_running(&self) -> bool {
        !self.status.is_over()
    }

    pub fn empty_cell_indices(&self) -> Vec<usize> {
        self.board.empty_cell_indices()
    }

    /// Places the current player's mark at `index`.
    ///
    /// A rejected move leaves the game exactly as it was.
    pub fn apply_move(&mut self, index: usize) -> Result<Status, Error> {
        if self.status.is_over() {
            return Err(Error::GameOver);
        }
        if index >= Board::SIZE {
            return Err(Error::InvalidIndex(index));
        }
        if !self.board.is_valid_move(index) {
            return Err(Error::InvalidMove(index));
        }

        self.board = self.board.mark(index, self.turn);
        debug!(index, mark = %self.turn, "mark placed");

        self.status = if let Some((winner, line)) = self.board.winning_line() {
            Status::Won { winner, line }
        } else if self.board.is_full() {
            Status::Draw
        } else {
            self.turn = self.turn.swap();
            Status::InProgress(self.turn)
        };

        if self.status.is_over() {
            debug!(status = %self.status, "game over");
        }
        Ok(self.status)
    }

    pub fn restart(&mut self) -> Status {
        *self = Game::new();
        self.status
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
