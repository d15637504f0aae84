//! Error types for the minesweeper agent crate

use thiserror::Error;

use crate::Point;

/// Main error type for the minesweeper agent crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("cell {cell} is out of range for a {height}x{width} board")]
    OutOfBounds {
        cell: Point,
        height: usize,
        width: usize,
    },

    #[error("sentence claims {count} mines among only {cells} cells")]
    InvalidSentence { cells: usize, count: usize },

    #[error("inconsistent knowledge: {reason}")]
    Inconsistent { reason: String },

    #[error("cannot place {mines} mines on a board with {cells} cells")]
    TooManyMines { mines: usize, cells: usize },

    #[error("board must have at least one row and one column")]
    EmptyBoard,

    #[error("game already over")]
    GameOver,

    #[error("solver failure: {0}")]
    Solver(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] bcs::Error),
}

impl Error {
    pub(crate) fn inconsistent(reason: impl Into<String>) -> Self {
        Error::Inconsistent {
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
