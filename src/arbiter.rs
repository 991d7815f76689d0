//! The turn loop.
//!
//! The arbiter alternates between two move sources starting with
//! [`FIRST_MARK`](crate::constants::FIRST_MARK), applies each move, and
//! stops once the game is terminal. A rejected move is reported to its
//! source and requested again; it is never a forfeit.

use std::fmt;

use tracing::{debug, info, instrument, warn};

use crate::board::{Cell, Mark};
use crate::constants::MAX_REJECTIONS;
use crate::error::{Error, Result};
use crate::player::MoveSource;
use crate::state::GameState;

/// How a finished game ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win(Mark),
    Draw,
}

impl Outcome {
    pub fn winner(self) -> Option<Mark> {
        match self {
            Outcome::Win(mark) => Some(mark),
            Outcome::Draw => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win(mark) => write!(f, "{mark} wins!"),
            Outcome::Draw => write!(f, "It's a tie!"),
        }
    }
}

/// Summary of a played game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameRecord {
    pub outcome: Outcome,
    /// Applied moves in order.
    pub moves: Vec<(Mark, Cell)>,
    /// Times a source was asked for a move, including rejected answers.
    pub requests: usize,
    pub rejections: usize,
}

type Observer<'a> = Box<dyn FnMut(&GameState, Mark, Cell) + 'a>;

pub struct Arbiter<'a> {
    state: GameState,
    observer: Option<Observer<'a>>,
}

impl Default for Arbiter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Arbiter<'a> {
    pub fn new() -> Self {
        Self::from_state(GameState::new())
    }

    /// Resume from an existing position. The side to move is derived from
    /// piece counts.
    pub fn from_state(state: GameState) -> Self {
        Self {
            state,
            observer: None,
        }
    }

    /// Call `observer` with a snapshot after every applied move.
    pub fn with_observer(mut self, observer: impl FnMut(&GameState, Mark, Cell) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Play to the end, asking `x` and `o` for moves in turn.
    ///
    /// # Errors
    /// Propagates errors from the sources, and gives up on a source after
    /// [`MAX_REJECTIONS`] consecutive illegal moves in one turn.
    #[instrument(skip_all)]
    pub fn play(&mut self, x: &mut dyn MoveSource, o: &mut dyn MoveSource) -> Result<GameRecord> {
        let mut moves = Vec::new();
        let mut requests = 0;
        let mut rejections = 0;
        let mut mark = self.state.to_move();

        while !self.state.is_terminal() {
            let source: &mut dyn MoveSource = match mark {
                Mark::X => &mut *x,
                Mark::O => &mut *o,
            };

            let mut strikes = 0;
            let cell = loop {
                requests += 1;
                let cell = source.next_move(&self.state, mark)?;
                match self.state.apply_move(cell, mark) {
                    Ok(()) => break cell,
                    Err(err) => {
                        warn!(%mark, cell, %err, "move rejected");
                        rejections += 1;
                        strikes += 1;
                        source.rejected(cell, &err)?;
                        if strikes >= MAX_REJECTIONS {
                            return Err(Error::TooManyRejections {
                                mark: mark.symbol(),
                                count: strikes,
                            });
                        }
                    }
                }
            };

            debug!(%mark, cell, "move applied");
            moves.push((mark, cell));
            if let Some(observer) = self.observer.as_mut() {
                observer(&self.state, mark, cell);
            }
            mark = mark.opponent();
        }

        let outcome = match self.state.winner() {
            Some(mark) => Outcome::Win(mark),
            None => Outcome::Draw,
        };
        info!(%outcome, moves = moves.len(), "game over");

        Ok(GameRecord {
            outcome,
            moves,
            requests,
            rejections,
        })
    }
}
