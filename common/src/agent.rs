use itertools::Itertools;
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::collections::{BTreeSet, HashSet};

use crate::solver;
use crate::{AgentConfig, Error, Point, Result, Sentence};

/// A Minesweeper player that reasons with propositional knowledge.
///
/// The agent never sees the board. It is told, for each cell it reveals,
/// how many neighbours hold mines, and turns that into [`Sentence`]s. From
/// the sentences it proves cells safe or mined:
///
/// 1. Propagation: a sentence with count 0 makes all its cells safe, a
///    sentence whose count equals its size makes all its cells mines. Every
///    proven cell is removed from every sentence, which can trigger further
///    deductions, so this runs until nothing new is found.
/// 2. Subset inference: if `A ⊂ B`, the cells in `B - A` hold exactly
///    `B.count - A.count` mines. The new sentences feed back into 1.
///
/// Contradictions (a mine that must also be safe, a count that cannot be
/// met) are reported as [`Error::Inconsistent`] rather than absorbed.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Agent {
    height: usize,
    width: usize,
    moves_made: BTreeSet<Point>,
    safes: BTreeSet<Point>,
    mines: BTreeSet<Point>,
    knowledge: Vec<Sentence>,
    config: AgentConfig,
    #[serde(skip, default = "unseeded_rng")]
    rng: StdRng,
}

fn unseeded_rng() -> StdRng {
    StdRng::from_os_rng()
}

impl Agent {
    pub fn new(height: usize, width: usize) -> Self {
        Self::with_config(height, width, AgentConfig::default())
    }

    pub fn with_config(height: usize, width: usize, config: AgentConfig) -> Self {
        Agent {
            height,
            width,
            moves_made: BTreeSet::new(),
            safes: BTreeSet::new(),
            mines: BTreeSet::new(),
            knowledge: Vec::new(),
            rng: config.rng(),
            config,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn moves_made(&self) -> &BTreeSet<Point> {
        &self.moves_made
    }

    pub fn safes(&self) -> &BTreeSet<Point> {
        &self.safes
    }

    pub fn mines(&self) -> &BTreeSet<Point> {
        &self.mines
    }

    pub fn knowledge(&self) -> &[Sentence] {
        &self.knowledge
    }

    /// Records `cell` as a mine in the agent and in every sentence.
    pub fn mark_mine(&mut self, cell: Point) -> Result<()> {
        self.check_bounds(cell)?;
        if self.safes.contains(&cell) {
            return Err(Error::inconsistent(format!(
                "{cell} is known safe and cannot be a mine"
            )));
        }
        self.mines.insert(cell);
        for sentence in &mut self.knowledge {
            sentence.mark_mine(cell)?;
        }
        Ok(())
    }

    /// Records `cell` as safe in the agent and in every sentence.
    pub fn mark_safe(&mut self, cell: Point) -> Result<()> {
        self.check_bounds(cell)?;
        if self.mines.contains(&cell) {
            return Err(Error::inconsistent(format!(
                "{cell} is a known mine and cannot be safe"
            )));
        }
        self.safes.insert(cell);
        for sentence in &mut self.knowledge {
            if sentence.mark_safe(cell) && !sentence.is_satisfiable() {
                return Err(Error::inconsistent(format!(
                    "{sentence} cannot hold its mines once {cell} is safe"
                )));
            }
        }
        Ok(())
    }

    /// Takes in the revealed `count` of mines around the safe cell `cell`.
    ///
    /// Marks the move and the cell, adds the sentence about its still
    /// undetermined neighbours, then draws every conclusion it can.
    /// Revealing the same cell twice is a no-op.
    pub fn add_knowledge(&mut self, cell: Point, count: u8) -> Result<()> {
        self.check_bounds(cell)?;
        if self.moves_made.contains(&cell) {
            debug!("{cell} already revealed, ignoring");
            return Ok(());
        }

        self.mark_safe(cell)?;
        self.moves_made.insert(cell);

        let sentence = self.evidence(cell, count as usize)?;
        debug!("{cell} shows {count}: {sentence}");
        self.insert_sentence(sentence);

        self.infer()
    }

    /// The sentence for `cell`'s undetermined neighbours.
    fn evidence(&self, cell: Point, count: usize) -> Result<Sentence> {
        let mut undetermined = Vec::new();
        let mut known_mines = 0;
        for neighbor in cell.neighbors(self.height, self.width) {
            if self.mines.contains(&neighbor) {
                known_mines += 1;
            } else if !self.safes.contains(&neighbor) {
                undetermined.push(neighbor);
            }
        }

        let residual = count.checked_sub(known_mines).ok_or_else(|| {
            Error::inconsistent(format!(
                "{cell} shows {count} but {known_mines} neighbouring mines are already known"
            ))
        })?;
        let available = undetermined.len();
        Sentence::new(undetermined, residual).map_err(|_| {
            Error::inconsistent(format!(
                "{cell} needs {residual} more mines among {available} undetermined neighbours"
            ))
        })
    }

    /// Appends a sentence unless it says nothing new.
    fn insert_sentence(&mut self, sentence: Sentence) -> bool {
        if sentence.is_empty() || self.knowledge.contains(&sentence) {
            return false;
        }
        self.knowledge.push(sentence);
        true
    }

    /// Alternates propagation and subset inference until neither finds
    /// anything, or the configured round limit is reached.
    fn infer(&mut self) -> Result<()> {
        for round in 0..self.config.max_rounds {
            self.propagate()?;

            let derived = self.derive_subsets()?;
            if derived > 0 {
                trace!("round {round}: derived {derived} sentences");
                continue;
            }

            if self.config.exhaustive_fallback && self.apply_exact_analysis()? > 0 {
                continue;
            }
            return Ok(());
        }

        warn!(
            "inference stopped after {} rounds with {} sentences",
            self.config.max_rounds,
            self.knowledge.len()
        );
        Ok(())
    }

    /// Marks every cell a single sentence decides, until a full pass over
    /// the knowledge base decides nothing.
    fn propagate(&mut self) -> Result<()> {
        loop {
            let mut mines = BTreeSet::new();
            let mut safes = BTreeSet::new();
            for sentence in &self.knowledge {
                mines.extend(sentence.known_mines());
                safes.extend(sentence.known_safes());
            }

            // Marked cells leave every sentence, so everything found is new.
            if mines.is_empty() && safes.is_empty() {
                break;
            }
            debug!(
                "propagation: mines [{}], safes [{}]",
                mines.iter().join(" "),
                safes.iter().join(" ")
            );
            for cell in mines {
                self.mark_mine(cell)?;
            }
            for cell in safes {
                self.mark_safe(cell)?;
            }
            self.prune();
        }
        self.prune();
        Ok(())
    }

    /// Drops empty sentences and duplicates left behind by marking.
    fn prune(&mut self) {
        let mut seen = HashSet::new();
        self.knowledge
            .retain(|sentence| !sentence.is_empty() && seen.insert(sentence.clone()));
    }

    /// Adds every sentence obtainable from one strict-subset pair.
    fn derive_subsets(&mut self) -> Result<usize> {
        let mut derived: Vec<Sentence> = Vec::new();
        for (a, b) in self.knowledge.iter().tuple_combinations() {
            for found in [a.difference(b)?, b.difference(a)?].into_iter().flatten() {
                if !self.knowledge.contains(&found) && !derived.contains(&found) {
                    trace!("subset inference: {found}");
                    derived.push(found);
                }
            }
        }

        let added = derived.len();
        self.knowledge.extend(derived);
        Ok(added)
    }

    /// Marks the cells only a global view of the knowledge base can decide.
    fn apply_exact_analysis(&mut self) -> Result<usize> {
        if self.knowledge.is_empty() {
            return Ok(0);
        }
        let analysis = solver::analyze(&self.knowledge)?;
        let mines = analysis.forced_mines();
        let safes = analysis.forced_safes();
        let found = mines.len() + safes.len();
        if found > 0 {
            debug!("exact analysis: {} mines, {} safes", mines.len(), safes.len());
        }

        for cell in mines {
            self.mark_mine(cell)?;
        }
        for cell in safes {
            self.mark_safe(cell)?;
        }
        Ok(found)
    }

    /// Checks that some placement of mines satisfies every sentence.
    pub fn check_consistency(&self) -> Result<()> {
        solver::analyze(&self.knowledge).map(|_| ())
    }

    /// A cell proven safe that has not been played yet.
    ///
    /// Candidates are tried in row-major order, so repeated calls without new
    /// knowledge return the same cell.
    pub fn make_safe_move(&self) -> Option<Point> {
        self.safes.difference(&self.moves_made).next().copied()
    }

    /// A uniformly random cell that is neither played nor a known mine.
    pub fn make_random_move(&mut self) -> Option<Point> {
        let candidates: Vec<Point> = (0..self.height)
            .cartesian_product(0..self.width)
            .map(|(row, col)| Point::new(row, col))
            .filter(|cell| !self.moves_made.contains(cell) && !self.mines.contains(cell))
            .collect();
        candidates.choose(&mut self.rng).copied()
    }

    fn check_bounds(&self, cell: Point) -> Result<()> {
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

    /// Restores an agent from bytes. The generator is re-created from the
    /// stored configuration.
    pub fn deserialize(bts: &[u8]) -> Result<Self> {
        let mut agent: Agent = bcs::from_bytes(bts)?;
        agent.reseed();
        Ok(agent)
    }

    pub(crate) fn reseed(&mut self) {
        self.rng = self.config.rng();
    }

    /// Serializes the agent's knowledge to bytes.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }
}
