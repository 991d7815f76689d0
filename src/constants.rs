//! Constants for board geometry, search scoring, and game defaults.
//!
//! The board is a flat array of `CELLS` entries indexed row-major:
//!
//! ```text
//! | 0 | 1 | 2 |
//! | 3 | 4 | 5 |
//! | 6 | 7 | 8 |
//! ```

use crate::board::Mark;

// =============================================================================
// Board Geometry
// =============================================================================

/// Board side length. Only 3x3 is supported.
pub const N: usize = 3;

/// Number of cells on the board.
pub const CELLS: usize = N * N;

/// Cells making up the main diagonal (top-left to bottom-right).
pub const DIAGONAL_MAIN: [usize; N] = [0, 4, 8];

/// Cells making up the anti-diagonal (top-right to bottom-left).
pub const DIAGONAL_ANTI: [usize; N] = [2, 4, 6];

/// Every line of three: rows, columns, then both diagonals.
///
/// Used for whole-board scans (parsing a board from text). Move-time win
/// detection only looks at the lines through the played cell.
pub const LINES: [[usize; N]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    DIAGONAL_MAIN,
    DIAGONAL_ANTI,
];

// =============================================================================
// Game Defaults
// =============================================================================

/// Mark that moves first in every game.
pub const FIRST_MARK: Mark = Mark::X;

/// Consecutive rejected moves the arbiter tolerates from one source in a
/// single turn before giving up on it.
pub const MAX_REJECTIONS: usize = 64;

// =============================================================================
// Search Scores
// =============================================================================

/// Score of a drawn leaf.
pub const DRAW_SCORE: i32 = 0;

/// Added to the remaining empty-cell count when scoring a won leaf, so a win
/// on the last cell is still worth one point.
pub const WIN_BASE: i32 = 1;
