use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt;

use crate::{Error, Point, Result};

/// A logical statement about the board: exactly `count` of `cells` are mines.
///
/// Cells whose status becomes known are removed as the agent learns them, so
/// a sentence only ever talks about undetermined cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Sentence {
    cells: BTreeSet<Point>,
    count: usize,
}

impl Sentence {
    pub fn new(cells: impl IntoIterator<Item = Point>, count: usize) -> Result<Self> {
        let cells: BTreeSet<Point> = cells.into_iter().collect();
        if count > cells.len() {
            return Err(Error::InvalidSentence {
                cells: cells.len(),
                count,
            });
        }
        Ok(Sentence { cells, count })
    }

    pub fn cells(&self) -> &BTreeSet<Point> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_subset(&self, other: &Sentence) -> bool {
        self.cells.is_subset(&other.cells)
    }

    /// Every cell is a mine when the count covers all of them.
    pub fn known_mines(&self) -> BTreeSet<Point> {
        if self.count != 0 && self.count == self.cells.len() {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Every cell is safe when none of them is a mine.
    pub fn known_safes(&self) -> BTreeSet<Point> {
        if self.count == 0 {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Removes a cell known to be a mine, taking it out of the mine quota.
    ///
    /// Returns whether the cell was a member. A member cell in a sentence
    /// that has no mines left to give is a contradiction.
    pub fn mark_mine(&mut self, cell: Point) -> Result<bool> {
        if !self.cells.contains(&cell) {
            return Ok(false);
        }
        if self.count == 0 {
            return Err(Error::inconsistent(format!(
                "{cell} is a mine but {self} has no mines left"
            )));
        }
        self.cells.remove(&cell);
        self.count -= 1;
        Ok(true)
    }

    /// Removes a cell known to be safe. The count is unchanged.
    pub fn mark_safe(&mut self, cell: Point) -> bool {
        self.cells.remove(&cell)
    }

    /// A sentence whose count exceeds its cells can no longer be satisfied.
    pub fn is_satisfiable(&self) -> bool {
        self.count <= self.cells.len()
    }

    /// Subset inference against a sentence that may contain this one.
    ///
    /// When `self` is a strict, non-empty subset of `superset` and both
    /// still hold mines, the cells only `superset` mentions hold exactly
    /// `superset.count - self.count` mines. Returns `None` when the rule
    /// does not apply. Two sentences over the same cells with different
    /// counts contradict each other.
    pub fn difference(&self, superset: &Sentence) -> Result<Option<Sentence>> {
        if self.cells == superset.cells {
            if self.count != superset.count {
                return Err(Error::inconsistent(format!(
                    "{self} and {superset} disagree on the same cells"
                )));
            }
            return Ok(None);
        }
        if self.is_empty()
            || self.count == 0
            || superset.count == 0
            || self.cells.len() >= superset.cells.len()
            || !self.is_subset(superset)
        {
            return Ok(None);
        }

        let count = superset.count.checked_sub(self.count).ok_or_else(|| {
            Error::inconsistent(format!("{self} needs more mines than its superset {superset}"))
        })?;
        let cells: BTreeSet<Point> = superset.cells.difference(&self.cells).copied().collect();
        if count > cells.len() {
            return Err(Error::inconsistent(format!(
                "{superset} leaves {count} mines for {} cells outside {self}",
                cells.len()
            )));
        }

        Ok(Some(Sentence { cells, count }))
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} = {}", self.cells.iter().join(", "), self.count)
    }
}
