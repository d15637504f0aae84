use log::{debug, info};

use crate::{Agent, AgentConfig, Board, Error, Point, Result};

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// How the agent chose a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MoveKind {
    Safe,
    Random,
}

/// One revealed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Move {
    pub cell: Point,
    pub kind: MoveKind,
    /// Adjacent mines shown, or `None` when the cell was a mine.
    pub nearby_mines: Option<u8>,
}

/// Drives an [`Agent`] against a [`Board`] it cannot see.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Game {
    pub board: Board,
    pub agent: Agent,
    pub game_state: GameState,
    pub moves: Vec<Move>,
}

impl Game {
    pub fn new(board: Board, config: AgentConfig) -> Self {
        let agent = Agent::with_config(board.height, board.width, config);
        Game {
            board,
            agent,
            game_state: GameState::Playing,
            moves: Vec::new(),
        }
    }

    /// Plays one move.
    ///
    /// 1. Asks the agent for a proven safe cell, else a random guess.
    /// 2. Reveals it: a mine loses the game.
    /// 3. Hands the adjacent-mine count to the agent.
    /// 4. Flags every mine the agent knows and checks for a win.
    ///
    /// Returns `None` when the agent has no move left.
    pub fn step(&mut self) -> Result<Option<Move>> {
        if self.game_state != GameState::Playing {
            return Err(Error::GameOver);
        }

        let (cell, kind) = match self.agent.make_safe_move() {
            Some(cell) => (cell, MoveKind::Safe),
            None => match self.agent.make_random_move() {
                Some(cell) => (cell, MoveKind::Random),
                None => return Ok(None),
            },
        };

        if self.board.is_mine(cell) {
            info!("{kind:?} move {cell} hit a mine");
            self.game_state = GameState::Lost;
            let mv = Move {
                cell,
                kind,
                nearby_mines: None,
            };
            self.moves.push(mv);
            return Ok(Some(mv));
        }

        let count = self.board.nearby_mines(cell)?;
        debug!("{kind:?} move {cell} shows {count}");
        self.agent.add_knowledge(cell, count)?;

        for &mine in self.agent.mines() {
            self.board.mark_found(mine);
        }
        if self.board.won() {
            info!(
                "all {} mines found after {} moves",
                self.board.mine_count(),
                self.moves.len() + 1
            );
            self.game_state = GameState::Won;
        }

        let mv = Move {
            cell,
            kind,
            nearby_mines: Some(count),
        };
        self.moves.push(mv);
        Ok(Some(mv))
    }

    /// Steps until the game ends or the agent runs out of moves.
    pub fn play(&mut self) -> Result<GameState> {
        while self.game_state == GameState::Playing {
            if self.step()?.is_none() {
                break;
            }
        }
        Ok(self.game_state)
    }

    /// Deserializes a game from bytes.
    pub fn deserialize(bts: &[u8]) -> Result<Self> {
        let mut game: Game = bcs::from_bytes(bts)?;
        game.agent.reseed();
        Ok(game)
    }

    /// Serializes the game state to bytes.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }
}
