//! Game state: the board, move legality, and win detection.
//!
//! `apply_move` and `undo_move` form an exact pair. Search applies a move,
//! explores the resulting position, and reverts it, so the state a search
//! starts from is the state it hands back.

use std::fmt;

use crate::board::{Board, Cell, Mark};
use crate::constants::{CELLS, DIAGONAL_ANTI, DIAGONAL_MAIN, FIRST_MARK, LINES, N};
use crate::error::{Error, MoveError, Result};

/// A board plus the winner flag set by the move that completed a line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct GameState {
    board: Board,
    winner: Option<Mark>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            winner: None,
        }
    }

    /// Parse a board written as nine cells, e.g. `"XO. .X. ..O"`.
    ///
    /// `X`/`O` are marks, `.` or `_` is empty; spaces, newlines and `|` are
    /// ignored. Piece counts must be reachable in a game started by
    /// [`FIRST_MARK`], and at most one mark may hold a completed line.
    pub fn from_cells(input: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidBoard {
            input: input.to_string(),
            reason,
        };

        let mut board = Board::new();
        let mut cell = 0;
        for ch in input.chars() {
            if ch.is_whitespace() || ch == '|' {
                continue;
            }
            if cell == CELLS {
                return Err(invalid(format!("more than {CELLS} cells")));
            }
            match ch {
                '.' | '_' => {}
                _ => match Mark::from_char(ch) {
                    Some(mark) => board.set(cell, Some(mark)),
                    None => return Err(invalid(format!("unexpected character '{ch}'"))),
                },
            }
            cell += 1;
        }
        if cell != CELLS {
            return Err(invalid(format!("expected {CELLS} cells, got {cell}")));
        }

        let first = board.count(FIRST_MARK);
        let second = board.count(FIRST_MARK.opponent());
        if first != second && first != second + 1 {
            return Err(invalid(format!(
                "piece counts {FIRST_MARK}={first}, {}={second} are not reachable",
                FIRST_MARK.opponent()
            )));
        }

        let x_line = has_line(&board, Mark::X);
        let o_line = has_line(&board, Mark::O);
        let winner = match (x_line, o_line) {
            (true, true) => return Err(invalid("both marks have a line".to_string())),
            (true, false) => Some(Mark::X),
            (false, true) => Some(Mark::O),
            (false, false) => None,
        };

        Ok(Self { board, winner })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn cell(&self, cell: Cell) -> Option<Mark> {
        self.board.get(cell)
    }

    pub fn winner(&self) -> Option<Mark> {
        self.winner
    }

    /// The mark whose turn it is, derived from piece counts.
    pub fn to_move(&self) -> Mark {
        if self.board.count(FIRST_MARK) == self.board.count(FIRST_MARK.opponent()) {
            FIRST_MARK
        } else {
            FIRST_MARK.opponent()
        }
    }

    /// Empty cells in ascending order. Search relies on this order for
    /// tie-breaking.
    pub fn legal_moves(&self) -> Vec<Cell> {
        self.board.empty_cells().collect()
    }

    pub fn remaining_count(&self) -> usize {
        self.board.empty_cells().count()
    }

    pub fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.remaining_count() == 0
    }

    /// Place `mark` on `cell`.
    ///
    /// Rejected moves leave the state untouched. On success the winner flag
    /// is set if this move completed a line.
    pub fn apply_move(&mut self, cell: Cell, mark: Mark) -> std::result::Result<(), MoveError> {
        if cell >= CELLS {
            return Err(MoveError::OutOfRange { cell });
        }
        if self.board.get(cell).is_some() {
            return Err(MoveError::Occupied { cell });
        }
        if self.winner.is_some() {
            return Err(MoveError::GameOver);
        }

        self.board.set(cell, Some(mark));
        if self.completes_line(cell, mark) {
            self.winner = Some(mark);
        }
        Ok(())
    }

    /// Revert the most recent `apply_move` on `cell`.
    ///
    /// Clears the winner flag unconditionally: the only move that can have
    /// set it is the one being undone.
    pub fn undo_move(&mut self, cell: Cell) {
        self.board.set(cell, None);
        self.winner = None;
    }

    /// Did `mark` on `cell` complete the row, the column, or (for even
    /// cells only) a diagonal?
    ///
    /// Every diagonal cell has an even index, so odd cells skip the
    /// diagonal checks entirely.
    fn completes_line(&self, cell: Cell, mark: Mark) -> bool {
        let owned = |c: &Cell| self.board.get(*c) == Some(mark);

        let row_start = (cell / N) * N;
        if (row_start..row_start + N).all(|c| owned(&c)) {
            return true;
        }

        let col = cell % N;
        if (0..N).map(|i| col + i * N).all(|c| owned(&c)) {
            return true;
        }

        if cell % 2 == 0 {
            if DIAGONAL_MAIN.iter().all(owned) {
                return true;
            }
            if DIAGONAL_ANTI.iter().all(owned) {
                return true;
            }
        }

        false
    }
}

fn has_line(board: &Board, mark: Mark) -> bool {
    LINES
        .iter()
        .any(|line| line.iter().all(|&c| board.get(c) == Some(mark)))
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)
    }
}
