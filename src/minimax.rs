//! Exhaustive minimax search with depth-weighted terminal scores.
//!
//! The search walks the whole game tree below a position. Won leaves score
//! `remaining + 1` (positive when the optimized mark won, negative
//! otherwise), so quicker wins and slower losses are preferred. Drawn leaves
//! score zero.
//!
//! At every node children are scanned in ascending cell order and a child
//! only replaces the current best on a strictly better score, so ties go to
//! the lowest cell.
//!
//! Optional root-level parallelism evaluates each root move on a private copy
//! of the state and resolves the results with the same left-to-right scan,
//! so it never changes the chosen move.

use std::ops::{Deref, DerefMut};

use rayon::prelude::*;
use tracing::{debug, instrument, trace};

use crate::board::{Cell, Mark};
use crate::constants::{CELLS, DRAW_SCORE, WIN_BASE};
use crate::error::SearchError;
use crate::state::GameState;

/// What the engine does when asked to move on an empty board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum OpeningPolicy {
    /// Pick any cell uniformly at random. Every opening draws under optimal
    /// play, so this only skips the most expensive search of the game.
    #[default]
    Random,
    /// Run the full search like any other position.
    FullSearch,
}

/// Runtime engine settings.
#[derive(Copy, Clone, Debug, Default)]
pub struct EngineConfig {
    pub opening: OpeningPolicy,
    /// Evaluate root moves on the rayon thread pool.
    pub parallel: bool,
    /// Seed for the opening-move generator. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl EngineConfig {
    pub fn with_opening(mut self, opening: OpeningPolicy) -> Self {
        self.opening = opening;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A candidate move and its minimax score. Leaves carry no move.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
    pub cell: Option<Cell>,
    pub score: i32,
}

impl SearchResult {
    fn leaf(score: i32) -> Self {
        Self { cell: None, score }
    }
}

/// A move applied for the lifetime of the guard.
///
/// Dropping the guard undoes the move, including when a deeper search
/// returns early with an error.
struct Provisional<'a> {
    state: &'a mut GameState,
    cell: Cell,
}

impl<'a> Provisional<'a> {
    fn apply(state: &'a mut GameState, cell: Cell, mark: Mark) -> Result<Self, SearchError> {
        state
            .apply_move(cell, mark)
            .map_err(|source| SearchError::LegalMoveFailed { cell, source })?;
        Ok(Self { state, cell })
    }
}

impl Deref for Provisional<'_> {
    type Target = GameState;

    fn deref(&self) -> &GameState {
        self.state
    }
}

impl DerefMut for Provisional<'_> {
    fn deref_mut(&mut self) -> &mut GameState {
        self.state
    }
}

impl Drop for Provisional<'_> {
    fn drop(&mut self) {
        self.state.undo_move(self.cell);
    }
}

/// The automated opponent.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    rng: fastrand::Rng,
    nodes: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            config,
            rng,
            nodes: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Nodes visited by the most recent search.
    pub fn nodes_visited(&self) -> u64 {
        self.nodes
    }

    /// Pick the move that guarantees `mark` the best achievable outcome.
    ///
    /// `state` is borrowed for the search and returned unchanged.
    ///
    /// # Errors
    /// `SearchError::InvalidState` if the game is already over.
    #[instrument(skip(self, state), fields(remaining = state.remaining_count()))]
    pub fn choose_move(&mut self, state: &mut GameState, mark: Mark) -> Result<Cell, SearchError> {
        check_searchable(state)?;

        if state.remaining_count() == CELLS && self.config.opening == OpeningPolicy::Random {
            let legal = state.legal_moves();
            let cell = legal[self.rng.usize(..legal.len())];
            self.nodes = 0;
            debug!(cell, "random opening move");
            return Ok(cell);
        }

        let results = self.score_moves(state, mark)?;
        let best = select(&results, true).ok_or(SearchError::InvalidState {
            reason: "no legal moves",
        })?;
        let cell = best.cell.ok_or(SearchError::InvalidState {
            reason: "search produced no move",
        })?;
        debug!(cell, score = best.score, nodes = self.nodes, "engine move");
        Ok(cell)
    }

    /// Score every legal move for `mark`, in ascending cell order.
    ///
    /// # Errors
    /// `SearchError::InvalidState` if the game is already over.
    pub fn score_moves(
        &mut self,
        state: &mut GameState,
        mark: Mark,
    ) -> Result<Vec<SearchResult>, SearchError> {
        check_searchable(state)?;

        let opponent = mark.opponent();
        let legal = state.legal_moves();

        let (results, nodes) = if self.config.parallel {
            let root = *state;
            let branches = legal
                .par_iter()
                .map(|&cell| -> Result<(SearchResult, u64), SearchError> {
                    let mut branch = root;
                    let mut nodes = 0;
                    let mut child = Provisional::apply(&mut branch, cell, mark)?;
                    let score = minimax(&mut child, opponent, mark, &mut nodes)?.score;
                    Ok((SearchResult { cell: Some(cell), score }, nodes))
                })
                .collect::<Result<Vec<_>, SearchError>>()?;
            let nodes = branches.iter().map(|(_, n)| n).sum::<u64>();
            (branches.into_iter().map(|(r, _)| r).collect::<Vec<_>>(), nodes)
        } else {
            let mut nodes = 0;
            let mut results = Vec::with_capacity(legal.len());
            for cell in legal {
                let mut child = Provisional::apply(state, cell, mark)?;
                let score = minimax(&mut child, opponent, mark, &mut nodes)?.score;
                results.push(SearchResult { cell: Some(cell), score });
            }
            (results, nodes)
        };

        // Count the root itself.
        self.nodes = nodes + 1;
        Ok(results)
    }

    /// Full minimax value of `state` with `to_move` to play, scored for
    /// `mark`. Terminal states evaluate to their leaf score. Never uses the
    /// random opening.
    pub fn evaluate(
        &mut self,
        state: &mut GameState,
        to_move: Mark,
        mark: Mark,
    ) -> Result<SearchResult, SearchError> {
        let mut nodes = 0;
        let result = minimax(state, to_move, mark, &mut nodes)?;
        self.nodes = nodes;
        Ok(result)
    }
}

fn check_searchable(state: &GameState) -> Result<(), SearchError> {
    if state.winner().is_some() {
        return Err(SearchError::InvalidState {
            reason: "game already won",
        });
    }
    if state.remaining_count() == 0 {
        return Err(SearchError::InvalidState {
            reason: "no legal moves",
        });
    }
    Ok(())
}

/// Leaf score of a terminal state, or `None` if play continues.
fn terminal_score(state: &GameState, max_player: Mark) -> Option<i32> {
    if let Some(winner) = state.winner() {
        let magnitude = state.remaining_count() as i32 + WIN_BASE;
        return Some(if winner == max_player {
            magnitude
        } else {
            -magnitude
        });
    }
    if state.remaining_count() == 0 {
        return Some(DRAW_SCORE);
    }
    None
}

/// First result with the strictly best score, maximizing or minimizing.
fn select(results: &[SearchResult], maximizing: bool) -> Option<SearchResult> {
    let mut best: Option<SearchResult> = None;
    for &r in results {
        let better = match best {
            None => true,
            Some(b) if maximizing => r.score > b.score,
            Some(b) => r.score < b.score,
        };
        if better {
            best = Some(r);
        }
    }
    best
}

fn minimax(
    state: &mut GameState,
    player: Mark,
    max_player: Mark,
    nodes: &mut u64,
) -> Result<SearchResult, SearchError> {
    *nodes += 1;

    if let Some(score) = terminal_score(state, max_player) {
        trace!(score, "leaf");
        return Ok(SearchResult::leaf(score));
    }

    let maximizing = player == max_player;
    let mut best = SearchResult::leaf(if maximizing { i32::MIN } else { i32::MAX });

    for cell in state.legal_moves() {
        let score = {
            let mut child = Provisional::apply(state, cell, player)?;
            minimax(&mut child, player.opponent(), max_player, nodes)?.score
        };

        let better = if maximizing {
            score > best.score
        } else {
            score < best.score
        };
        if better {
            best = SearchResult {
                cell: Some(cell),
                score,
            };
        }
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_search() -> Engine {
        Engine::new(EngineConfig::default().with_opening(OpeningPolicy::FullSearch))
    }

    #[test]
    fn test_takes_immediate_win() {
        // O to move can win at 5 (row) or block X at 2; winning is better.
        let mut state = GameState::from_cells("XX. OO. X..").unwrap();
        let cell = full_search().choose_move(&mut state, Mark::O).unwrap();
        assert_eq!(cell, 5);
    }

    #[test]
    fn test_blocks_immediate_loss() {
        let mut state = GameState::from_cells("XX. .O. ...").unwrap();
        let cell = full_search().choose_move(&mut state, Mark::O).unwrap();
        assert_eq!(cell, 2);
    }

    #[test]
    fn test_win_score_is_depth_weighted() {
        let mut state = GameState::from_cells("XX. OO. X..").unwrap();
        let results = full_search().score_moves(&mut state, Mark::O).unwrap();
        let win = results.iter().find(|r| r.cell == Some(5)).unwrap();
        // O fills cell 5, leaving 3 empty cells.
        assert_eq!(win.score, 3 + WIN_BASE);
    }

    #[test]
    fn test_score_moves_ascending() {
        let mut state = GameState::from_cells("X.. ... ...").unwrap();
        let results = full_search().score_moves(&mut state, Mark::O).unwrap();
        let cells: Vec<_> = results.iter().filter_map(|r| r.cell).collect();
        assert_eq!(cells, state.legal_moves());
    }

    #[test]
    fn test_ties_go_to_lowest_cell() {
        let results = [
            SearchResult { cell: Some(1), score: 0 },
            SearchResult { cell: Some(3), score: 2 },
            SearchResult { cell: Some(5), score: 2 },
            SearchResult { cell: Some(7), score: -2 },
        ];
        assert_eq!(select(&results, true).unwrap().cell, Some(3));
        assert_eq!(select(&results, false).unwrap().cell, Some(7));
        assert_eq!(select(&[], true), None);
    }

    #[test]
    fn test_terminal_state_is_rejected() {
        let mut won = GameState::from_cells("XXX OO. ...").unwrap();
        assert!(matches!(
            full_search().choose_move(&mut won, Mark::O),
            Err(SearchError::InvalidState { .. })
        ));

        let mut full = GameState::from_cells("XOX XOO OXX").unwrap();
        assert!(matches!(
            full_search().choose_move(&mut full, Mark::O),
            Err(SearchError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_search_leaves_state_unchanged() {
        let mut state = GameState::from_cells("X.. .O. ..X").unwrap();
        let before = state;
        full_search().choose_move(&mut state, Mark::O).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_guard_undoes_on_drop() {
        let mut state = GameState::new();
        {
            let child = Provisional::apply(&mut state, 4, Mark::X).unwrap();
            assert_eq!(child.cell(4), Some(Mark::X));
        }
        assert_eq!(state, GameState::new());
    }

    #[test]
    fn test_guard_rejects_occupied() {
        let mut state = GameState::from_cells("X.. ... ...").unwrap();
        let err = Provisional::apply(&mut state, 0, Mark::O).err().unwrap();
        assert!(matches!(err, SearchError::LegalMoveFailed { cell: 0, .. }));
        assert_eq!(state.cell(0), Some(Mark::X));
    }

    #[test]
    fn test_empty_board_value_is_draw() {
        let mut state = GameState::new();
        let result = full_search().evaluate(&mut state, Mark::X, Mark::X).unwrap();
        assert_eq!(result.score, DRAW_SCORE);
        assert_eq!(result.cell, Some(0));
    }

    #[test]
    fn test_evaluate_terminal() {
        let mut state = GameState::from_cells("XXX OO. ...").unwrap();
        let mut engine = full_search();
        let result = engine.evaluate(&mut state, Mark::O, Mark::X).unwrap();
        assert_eq!(result, SearchResult::leaf(4 + WIN_BASE));
        let result = engine.evaluate(&mut state, Mark::O, Mark::O).unwrap();
        assert_eq!(result.score, -(4 + WIN_BASE));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let positions = ["X.. ... ...", "X.. .O. ...", ".X. ... ...", "XO. .X. ..."];
        for cells in positions {
            let mut state = GameState::from_cells(cells).unwrap();
            let mark = state.to_move();
            let mut seq = full_search();
            let mut par = Engine::new(
                EngineConfig::default()
                    .with_opening(OpeningPolicy::FullSearch)
                    .with_parallel(true),
            );
            assert_eq!(
                seq.score_moves(&mut state, mark).unwrap(),
                par.score_moves(&mut state, mark).unwrap()
            );
            assert_eq!(
                seq.choose_move(&mut state, mark).unwrap(),
                par.choose_move(&mut state, mark).unwrap()
            );
            assert_eq!(seq.nodes_visited(), par.nodes_visited());
        }
    }

    #[test]
    fn test_random_opening_is_seeded() {
        let config = EngineConfig::default().with_seed(7);
        let mut a = Engine::new(config);
        let mut b = Engine::new(config);
        let mut state = GameState::new();
        for _ in 0..10 {
            let cell = a.choose_move(&mut state, Mark::X).unwrap();
            assert!(cell < CELLS);
            assert_eq!(cell, b.choose_move(&mut state, Mark::X).unwrap());
            assert_eq!(a.nodes_visited(), 0);
        }
    }
}
