//! Move sources: anything that can supply the next move for a mark.
//!
//! The arbiter asks the active source for a cell and applies it. Sources
//! only see a read-only view of the game; legality is enforced by
//! [`GameState::apply_move`], and a rejected cell is reported back through
//! [`MoveSource::rejected`] before the arbiter asks again.

use std::collections::VecDeque;
use std::io::{self, BufRead, StdinLock, Stdout, Write};

use tracing::debug;

use crate::board::{Cell, Mark, parse_cell};
use crate::constants::CELLS;
use crate::error::{Error, MoveError, Result};
use crate::minimax::{Engine, EngineConfig};
use crate::state::GameState;

pub trait MoveSource {
    /// Supply the next move for `mark`.
    fn next_move(&mut self, state: &GameState, mark: Mark) -> Result<Cell>;

    /// Called when the cell last returned by `next_move` was rejected.
    ///
    /// Returning an error ends the game; returning `Ok` makes the arbiter
    /// ask again.
    fn rejected(&mut self, _cell: Cell, _err: &MoveError) -> Result<()> {
        Ok(())
    }
}

/// A human at a text terminal.
///
/// Malformed input (non-numeric or off the board) is handled here with a
/// re-prompt and never reaches the game. Occupied cells are passed through.
pub struct Interactive<R, W> {
    input: R,
    output: W,
}

impl Interactive<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Interactive<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}")
            .and_then(|()| self.output.flush())
            .map_err(|source| Error::Io {
                operation: "write to player",
                source,
            })
    }
}

impl<R: BufRead, W: Write> MoveSource for Interactive<R, W> {
    fn next_move(&mut self, _state: &GameState, mark: Mark) -> Result<Cell> {
        let mut line = String::new();
        loop {
            write!(self.output, "{mark}'s turn. Input move (0-{}): ", CELLS - 1)
                .and_then(|()| self.output.flush())
                .map_err(|source| Error::Io {
                    operation: "write prompt",
                    source,
                })?;

            line.clear();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(|source| Error::Io {
                    operation: "read move",
                    source,
                })?;
            if read == 0 {
                return Err(Error::SourceExhausted {
                    mark: mark.symbol(),
                });
            }

            match parse_cell(&line) {
                Some(cell) => return Ok(cell),
                None => self.say("Invalid square. Try again.")?,
            }
        }
    }

    fn rejected(&mut self, _cell: Cell, _err: &MoveError) -> Result<()> {
        self.say("Invalid square. Try again.")
    }
}

/// The search engine as a player.
pub struct Automated {
    engine: Engine,
}

impl Automated {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: Engine::new(config),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl MoveSource for Automated {
    fn next_move(&mut self, state: &GameState, mark: Mark) -> Result<Cell> {
        let mut scratch = *state;
        Ok(self.engine.choose_move(&mut scratch, mark)?)
    }

    /// The engine only picks from `legal_moves()`, so a rejection is a bug.
    fn rejected(&mut self, _cell: Cell, err: &MoveError) -> Result<()> {
        Err(Error::InvalidMove(err.clone()))
    }
}

/// Plays uniformly at random over the legal moves.
pub struct RandomPlayer {
    rng: fastrand::Rng,
}

impl RandomPlayer {
    pub fn new(rng: fastrand::Rng) -> Self {
        Self { rng }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(fastrand::Rng::with_seed(seed))
    }
}

impl MoveSource for RandomPlayer {
    fn next_move(&mut self, state: &GameState, mark: Mark) -> Result<Cell> {
        let legal = state.legal_moves();
        if legal.is_empty() {
            return Err(Error::SourceExhausted {
                mark: mark.symbol(),
            });
        }
        Ok(legal[self.rng.usize(..legal.len())])
    }
}

/// Replays a fixed list of cells. Useful for scripted games and tests.
#[derive(Debug, Default)]
pub struct Scripted {
    moves: VecDeque<Cell>,
    requests: usize,
    rejections: usize,
}

impl Scripted {
    pub fn new(moves: impl IntoIterator<Item = Cell>) -> Self {
        Self {
            moves: moves.into_iter().collect(),
            requests: 0,
            rejections: 0,
        }
    }

    pub fn requests(&self) -> usize {
        self.requests
    }

    pub fn rejections(&self) -> usize {
        self.rejections
    }

    pub fn remaining(&self) -> usize {
        self.moves.len()
    }
}

impl MoveSource for Scripted {
    fn next_move(&mut self, _state: &GameState, mark: Mark) -> Result<Cell> {
        self.requests += 1;
        self.moves.pop_front().ok_or(Error::SourceExhausted {
            mark: mark.symbol(),
        })
    }

    fn rejected(&mut self, cell: Cell, err: &MoveError) -> Result<()> {
        debug!(cell, %err, "scripted move rejected");
        self.rejections += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::minimax::OpeningPolicy;

    fn interactive(input: &str) -> Interactive<Cursor<Vec<u8>>, Vec<u8>> {
        Interactive::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_interactive_reads_cell() {
        let mut human = interactive("4\n");
        let cell = human.next_move(&GameState::new(), Mark::X).unwrap();
        assert_eq!(cell, 4);
        let out = String::from_utf8(human.into_output()).unwrap();
        assert_eq!(out, "X's turn. Input move (0-8): ");
    }

    #[test]
    fn test_interactive_reprompts_on_malformed_input() {
        let mut human = interactive("abc\n12\n\n7\n");
        let cell = human.next_move(&GameState::new(), Mark::O).unwrap();
        assert_eq!(cell, 7);
        let out = String::from_utf8(human.into_output()).unwrap();
        assert_eq!(out.matches("Invalid square. Try again.").count(), 3);
        assert_eq!(out.matches("O's turn.").count(), 4);
    }

    #[test]
    fn test_interactive_passes_occupied_cell_through() {
        let state = GameState::from_cells("X.. ... ...").unwrap();
        let mut human = interactive("0\n");
        assert_eq!(human.next_move(&state, Mark::O).unwrap(), 0);
    }

    #[test]
    fn test_interactive_eof() {
        let mut human = interactive("");
        let err = human.next_move(&GameState::new(), Mark::X).unwrap_err();
        assert!(matches!(err, Error::SourceExhausted { mark: 'X' }));
    }

    #[test]
    fn test_automated_does_not_mutate_state() {
        let state = GameState::from_cells("XX. .O. ...").unwrap();
        let mut engine = Automated::new(EngineConfig::default().with_opening(OpeningPolicy::FullSearch));
        assert_eq!(engine.next_move(&state, Mark::O).unwrap(), 2);
        assert_eq!(state, GameState::from_cells("XX. .O. ...").unwrap());
    }

    #[test]
    fn test_automated_rejection_is_fatal() {
        let mut engine = Automated::new(EngineConfig::default());
        let err = engine
            .rejected(0, &MoveError::Occupied { cell: 0 })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMove(MoveError::Occupied { cell: 0 })));
    }

    #[test]
    fn test_random_player_stays_legal() {
        let state = GameState::from_cells("XOX .O. X..").unwrap();
        let mut random = RandomPlayer::with_seed(42);
        for _ in 0..50 {
            let cell = random.next_move(&state, Mark::O).unwrap();
            assert!(state.legal_moves().contains(&cell));
        }
    }

    #[test]
    fn test_scripted_exhausts() {
        let mut script = Scripted::new([3]);
        let state = GameState::new();
        assert_eq!(script.next_move(&state, Mark::X).unwrap(), 3);
        assert!(script.next_move(&state, Mark::X).is_err());
        assert_eq!(script.requests(), 2);
    }
}
