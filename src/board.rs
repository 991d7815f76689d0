use std::fmt;

use crate::constants::{CELLS, N};

/// One of the two symbols a player claims cells with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }

    /// Parse `x`/`X`/`o`/`O`.
    pub fn from_char(c: char) -> Option<Mark> {
        match c.to_ascii_uppercase() {
            'X' => Some(Mark::X),
            'O' => Some(Mark::O),
            _ => None,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A cell index in `0..CELLS`.
pub type Cell = usize;

/// The 3x3 grid. Each cell is empty or holds exactly one mark.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Board {
    cells: [Option<Mark>; CELLS],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [None; CELLS],
        }
    }

    /// Contents of `cell`, or `None` when empty or off the board.
    pub fn get(&self, cell: Cell) -> Option<Mark> {
        self.cells.get(cell).copied().flatten()
    }

    pub fn is_empty_at(&self, cell: Cell) -> bool {
        cell < CELLS && self.cells[cell].is_none()
    }

    /// Overwrite a cell. Callers check bounds and occupancy first.
    pub(crate) fn set(&mut self, cell: Cell, mark: Option<Mark>) {
        self.cells[cell] = mark;
    }

    /// Empty cells in ascending index order.
    pub fn empty_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.is_none().then_some(i))
    }

    pub fn count(&self, mark: Mark) -> usize {
        self.cells.iter().filter(|&&c| c == Some(mark)).count()
    }

    pub fn cells(&self) -> &[Option<Mark>; CELLS] {
        &self.cells
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(N) {
            write!(f, "|")?;
            for c in row {
                let ch = c.map_or(' ', Mark::symbol);
                write!(f, " {ch} |")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The cell-index guide shown before an interactive game.
pub fn numbering_guide() -> String {
    let mut out = String::new();
    for row in 0..N {
        out.push('|');
        for col in 0..N {
            out.push_str(&format!(" {} |", row * N + col));
        }
        out.push('\n');
    }
    out
}

/// Parse a cell label such as `"4"`. Returns `None` for anything that is not
/// a decimal in `0..CELLS`.
pub fn parse_cell(s: &str) -> Option<Cell> {
    match s.trim().parse::<usize>() {
        Ok(cell) if cell < CELLS => Some(cell),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent() {
        assert_eq!(Mark::X.opponent(), Mark::O);
        assert_eq!(Mark::O.opponent(), Mark::X);
    }

    #[test]
    fn test_display() {
        let mut board = Board::new();
        board.set(0, Some(Mark::X));
        board.set(4, Some(Mark::O));
        assert_eq!(board.to_string(), "| X |   |   |\n|   | O |   |\n|   |   |   |\n");
    }

    #[test]
    fn test_numbering_guide() {
        assert_eq!(
            numbering_guide(),
            "| 0 | 1 | 2 |\n| 3 | 4 | 5 |\n| 6 | 7 | 8 |\n"
        );
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("0"), Some(0));
        assert_eq!(parse_cell(" 8\n"), Some(8));
        assert_eq!(parse_cell("9"), None);
        assert_eq!(parse_cell("-1"), None);
        assert_eq!(parse_cell("four"), None);
        assert_eq!(parse_cell(""), None);
    }

    #[test]
    fn test_empty_cells_ascending() {
        let mut board = Board::new();
        board.set(3, Some(Mark::X));
        board.set(7, Some(Mark::O));
        let empties: Vec<_> = board.empty_cells().collect();
        assert_eq!(empties, vec![0, 1, 2, 4, 5, 6, 8]);
        assert_eq!(board.count(Mark::X), 1);
        assert!(!board.is_empty_at(3));
        assert!(!board.is_empty_at(CELLS));
    }
}
