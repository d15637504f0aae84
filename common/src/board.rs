use rand::Rng;
use std::collections::BTreeSet;

use crate::{Error, Point, Result};

/// Ground truth for a game: where the mines are.
///
/// The agent never looks at this directly. A driver reveals cells and hands
/// the agent only the adjacent-mine counts.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Board {
    pub height: usize,
    pub width: usize,
    grid: Vec<Vec<bool>>,
    mines: BTreeSet<Point>,
    /// Mines that have been flagged so far.
    mines_found: BTreeSet<Point>,
}

impl Board {
    /// Places `mine_count` mines uniformly at random.
    pub fn new<R: Rng>(
        height: usize,
        width: usize,
        mine_count: usize,
        rng: &mut R,
    ) -> Result<Self> {
        Self::check_dimensions(height, width, mine_count)?;

        let mut board = Self::empty(height, width);
        while board.mines.len() != mine_count {
            let cell = Point::new(rng.random_range(0..height), rng.random_range(0..width));
            board.place(cell);
        }
        Ok(board)
    }

    /// Same as [`Board::new`] with the thread-local generator.
    pub fn random(height: usize, width: usize, mine_count: usize) -> Result<Self> {
        Self::new(height, width, mine_count, &mut rand::rng())
    }

    /// Builds a board with mines at exactly the given cells.
    pub fn with_mines(
        height: usize,
        width: usize,
        mines: impl IntoIterator<Item = Point>,
    ) -> Result<Self> {
        Self::check_dimensions(height, width, 0)?;

        let mut board = Self::empty(height, width);
        for cell in mines {
            board.check_bounds(cell)?;
            board.place(cell);
        }
        Ok(board)
    }

    fn check_dimensions(height: usize, width: usize, mine_count: usize) -> Result<()> {
        if height == 0 || width == 0 {
            return Err(Error::EmptyBoard);
        }
        let cells = height * width;
        if mine_count > cells {
            return Err(Error::TooManyMines {
                mines: mine_count,
                cells,
            });
        }
        Ok(())
    }

    fn empty(height: usize, width: usize) -> Self {
        Board {
            height,
            width,
            grid: vec![vec![false; width]; height],
            mines: BTreeSet::new(),
            mines_found: BTreeSet::new(),
        }
    }

    fn place(&mut self, cell: Point) {
        self.grid[cell.row][cell.col] = true;
        self.mines.insert(cell);
    }

    pub(crate) fn check_bounds(&self, cell: Point) -> Result<()> {
        if cell.in_bounds(self.height, self.width) {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                cell,
                height: self.height,
                width: self.width,
            })
        }
    }

    pub fn mine_count(&self) -> usize {
        self.mines.len()
    }

    pub fn mines(&self) -> &BTreeSet<Point> {
        &self.mines
    }

    pub fn mines_found(&self) -> &BTreeSet<Point> {
        &self.mines_found
    }

    /// Cells off the board are never mines.
    pub fn is_mine(&self, cell: Point) -> bool {
        cell.in_bounds(self.height, self.width) && self.grid[cell.row][cell.col]
    }

    /// Number of mines within one row and column of `cell`, excluding `cell`.
    pub fn nearby_mines(&self, cell: Point) -> Result<u8> {
        self.check_bounds(cell)?;
        let count = cell
            .neighbors(self.height, self.width)
            .filter(|&neighbor| self.grid[neighbor.row][neighbor.col])
            .count();
        Ok(count as u8)
    }

    /// Flags a cell. Only real mines are recorded.
    pub fn mark_found(&mut self, cell: Point) -> bool {
        self.is_mine(cell) && self.mines_found.insert(cell)
    }

    /// Won once every mine has been flagged.
    pub fn won(&self) -> bool {
        self.mines_found == self.mines
    }

    /// Deserializes a board from bytes.
    pub fn deserialize(bts: &[u8]) -> Result<Self> {
        Ok(bcs::from_bytes(bts)?)
    }

    /// Serializes the board to bytes.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_board_has_exact_mine_count() {
        let mut rng = StdRng::seed_from_u64(3);
        let board = Board::new(8, 8, 10, &mut rng).unwrap();
        assert_eq!(board.mine_count(), 10);

        let flagged = (0..8)
            .flat_map(|r| (0..8).map(move |c| Point::new(r, c)))
            .filter(|&p| board.is_mine(p))
            .count();
        assert_eq!(flagged, 10);
    }

    #[test]
    fn test_full_board_is_allowed() {
        let board = Board::random(2, 2, 4).unwrap();
        assert_eq!(board.mine_count(), 4);
    }

    #[test]
    fn test_too_many_mines() {
        assert!(matches!(
            Board::random(3, 3, 10),
            Err(Error::TooManyMines { mines: 10, cells: 9 })
        ));
        assert!(matches!(Board::random(0, 3, 0), Err(Error::EmptyBoard)));
    }

    #[test]
    fn test_nearby_mines() {
        let board = Board::with_mines(3, 3, [Point::new(0, 0), Point::new(2, 2)]).unwrap();
        assert_eq!(board.nearby_mines(Point::new(1, 1)).unwrap(), 2);
        assert_eq!(board.nearby_mines(Point::new(0, 1)).unwrap(), 1);
        assert_eq!(board.nearby_mines(Point::new(2, 0)).unwrap(), 0);
        // A mine does not count itself
        assert_eq!(board.nearby_mines(Point::new(0, 0)).unwrap(), 0);
        assert!(matches!(
            board.nearby_mines(Point::new(3, 0)),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_is_mine_out_of_range() {
        let board = Board::with_mines(2, 2, [Point::new(1, 1)]).unwrap();
        assert!(board.is_mine(Point::new(1, 1)));
        assert!(!board.is_mine(Point::new(1, 0)));
        assert!(!board.is_mine(Point::new(7, 7)));
    }

    #[test]
    fn test_with_mines_rejects_out_of_range() {
        assert!(matches!(
            Board::with_mines(2, 2, [Point::new(2, 0)]),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_won_after_flagging_every_mine() {
        let mut board = Board::with_mines(3, 3, [Point::new(0, 0), Point::new(1, 2)]).unwrap();
        assert!(!board.won());
        assert!(!board.mark_found(Point::new(2, 2)));
        assert!(board.mark_found(Point::new(0, 0)));
        assert!(!board.won());
        assert!(board.mark_found(Point::new(1, 2)));
        assert!(board.won());
    }

    #[test]
    fn test_snapshot() {
        let mut board = Board::with_mines(4, 5, [Point::new(3, 4)]).unwrap();
        board.mark_found(Point::new(3, 4));
        let restored = Board::deserialize(&board.serialize().unwrap()).unwrap();
        assert_eq!(restored, board);
    }
}
