//! Error types for the engine.

use thiserror::Error;

use crate::board::Cell;
use crate::constants::CELLS;

/// Why a move was rejected. Rejection never changes the state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("cell {cell} is out of range (must be 0-{})", CELLS - 1)]
    OutOfRange { cell: Cell },

    #[error("cell {cell} is already occupied")]
    Occupied { cell: Cell },

    #[error("game already over")]
    GameOver,
}

/// Errors raised by the search engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("invalid state for search: {reason}")]
    InvalidState { reason: &'static str },

    #[error("legal move {cell} failed unexpectedly: {source}")]
    LegalMoveFailed {
        cell: Cell,
        #[source]
        source: MoveError,
    },
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid move: {0}")]
    InvalidMove(#[from] MoveError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("invalid board '{input}': {reason}")]
    InvalidBoard { input: String, reason: String },

    #[error("move source for {mark} supplied {count} illegal moves in a row")]
    TooManyRejections { mark: char, count: usize },

    #[error("move source for {mark} ran out of moves")]
    SourceExhausted { mark: char },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
