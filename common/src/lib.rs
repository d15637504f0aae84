//! A Minesweeper agent that plays by propositional inference.
//!
//! - [`Board`]: ground truth, mine placement and adjacency counts
//! - [`Sentence`]: "exactly `count` of these cells are mines"
//! - [`Agent`]: knowledge base, deduction and move selection
//! - [`solver`]: exact SAT analysis of a knowledge base
//! - [`Game`]: reveals the agent's moves on a board until it wins or loses

use std::fmt;

pub mod agent;
pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod sentence;
pub mod solver;

pub use agent::Agent;
pub use board::Board;
pub use config::AgentConfig;
pub use error::{Error, Result};
pub use game::{Game, GameState, Move, MoveKind};
pub use sentence::Sentence;
pub use solver::{Analysis, DeducedState};

/// A (row, column) coordinate on the board, 0-indexed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub fn new(row: usize, col: usize) -> Self {
        Point { row, col }
    }

    pub fn in_bounds(self, height: usize, width: usize) -> bool {
        self.row < height && self.col < width
    }

    /// All valid neighbour coordinates on a `height` x `width` board.
    /// Board edges and corners are clipped; the point itself is excluded.
    pub fn neighbors(self, height: usize, width: usize) -> impl Iterator<Item = Point> {
        (-1..=1).flat_map(move |dr: isize| {
            (-1..=1).filter_map(move |dc: isize| {
                if dr == 0 && dc == 0 {
                    return None;
                }

                let row = self.row.checked_add_signed(dr)?;
                let col = self.col.checked_add_signed(dc)?;
                let neighbor = Point::new(row, col);
                neighbor.in_bounds(height, width).then_some(neighbor)
            })
        })
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
