use std::fmt;

pub const WIN_SEQUENCES: [[usize; 3]; 8] = [
    // Horizontal
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Vertical
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonal
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn swap(&self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => f.write_str("X"),
            Mark::O => f.write_str("O"),
        }
    }
}

/// Where a game stands after the most recent placement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// The game continues with the given mark to move.
    InProgress(Mark),
    /// `winner` completed `line`, the first complete entry of [`WIN_SEQUENCES`].
    Won { winner: Mark, line: [usize; 3] },
    Draw,
}

impl Status {
    pub fn is_over(&self) -> bool {
        !matches!(self, Status::InProgress(_))
    }

    pub fn winner(&self) -> Option<Mark> {
        match self {
            Status::Won { winner, .. } => Some(*winner),
            _ => None,
        }
    }

    /// The cells to highlight, if somebody won.
    pub fn line(&self) -> Option<[usize; 3]> {
        match self {
            Status::Won { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::InProgress(mark) => write!(f, "Player {}'s Turn", mark),
            Status::Won { winner, .. } => write!(f, "Player {} Wins!", winner),
            Status::Draw => f.write_str("It's a Draw!"),
        }
    }
}

/// Nine squares in row-major order, `0..=2` being the top row.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Board {
    squares: [Option<Mark>; 9],
}

impl Board {
    pub const SIZE: usize = 9;

    pub fn new() -> Self {
        let squares = [None; 9];
        Self { squares }
    }

    pub fn from_squares(squares: [Option<Mark>; 9]) -> Self {
        Self { squares }
    }

    pub fn squares(&self) -> &[Option<Mark>; 9] {
        &self.squares
    }

    pub fn get(&self, index: usize) -> Option<Mark> {
        self.squares.get(index).copied().flatten()
    }

    /// Returns a copy of the board with `mark` placed at `index`.
    ///
    /// No legality check is made here; see [`Board::is_valid_move`].
    pub fn mark(&self, index: usize, mark: Mark) -> Board {
        let mut new_board = *self;
        new_board.squares[index] = Some(mark);
        new_board
    }

    fn display_squares(&self) -> [&'static str; 9] {
        let mut display = [""; 9];
        for (dsquare, square) in display.iter_mut().zip(self.squares.iter()) {
            match square {
                Some(Mark::X) => *dsquare = "X",
                Some(Mark::O) => *dsquare = "O",
                None => *dsquare = " ",
            }
        }
        display
    }

    pub fn is_valid_move(&self, index: usize) -> bool {
        matches!(self.squares.get(index), Some(None))
    }

    pub fn empty_cell_indices(&self) -> Vec<usize> {
        self.squares
            .iter()
            .enumerate()
            .filter(|(_, square)| square.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.squares.iter().all(Option::is_some)
    }

    pub fn count(&self, mark: Mark) -> usize {
        self.squares.iter().filter(|s| **s == Some(mark)).count()
    }

    /// First complete line in [`WIN_SEQUENCES`] order, with its owner.
    pub fn winning_line(&self) -> Option<(Mark, [usize; 3])> {
        for seq in WIN_SEQUENCES {
            if let Some(first) = self.squares[seq[0]] {
                if seq.iter().all(|i| self.squares[*i] == Some(first)) {
                    return Some((first, seq));
                }
            }
        }
        None
    }

    pub fn get_winner(&self) -> Option<Mark> {
        self.winning_line().map(|(mark, _)| mark)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ds = self.display_squares();
        writeln!(f, " {} | {} | {}", ds[0], ds[1], ds[2])?;
        f.write_str("---+---+---\n")?;
        writeln!(f, " {} | {} | {}", ds[3], ds[4], ds[5])?;
        f.write_str("---+---+---\n")?;
        writeln!(f, " {} | {} | {}", ds[6], ds[7], ds[8])?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn board(layout: &str) -> Board {
    let mut squares = [None; 9];
    for (square, c) in squares.iter_mut().zip(layout.chars().filter(|c| !c.is_whitespace())) {
        *square = match c {
            'X' => Some(Mark::X),
            'O' => Some(Mark::O),
            _ => None,
        };
    }
    Board::from_squares(squares)
}
