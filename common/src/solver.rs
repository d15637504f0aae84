use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

use crate::{Error, Point, Result, Sentence};

/// The possible outcomes of the exact analysis for a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeducedState {
    ForcedMine,   // Every model of the knowledge base makes this cell a mine.
    ForcedSafe,   // Every model of the knowledge base makes this cell safe.
    Undetermined, // Models exist for both.
}

/// The result of analysing a set of sentences exactly.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The deduced state for every cell mentioned by a sentence.
    pub deductions: BTreeMap<Point, DeducedState>,
    /// One assignment of mines to those cells that satisfies every sentence.
    pub sample_assignment: BTreeMap<Point, bool>,
}

impl Analysis {
    pub fn forced_mines(&self) -> BTreeSet<Point> {
        self.cells_in(DeducedState::ForcedMine)
    }

    pub fn forced_safes(&self) -> BTreeSet<Point> {
        self.cells_in(DeducedState::ForcedSafe)
    }

    fn cells_in(&self, wanted: DeducedState) -> BTreeSet<Point> {
        self.deductions
            .iter()
            .filter(|&(_, &state)| state == wanted)
            .map(|(&cell, _)| cell)
            .collect()
    }
}

/// Decides the knowledge base exactly with a SAT solver.
///
/// Every cell that appears in a sentence becomes a boolean variable ("is a
/// mine"), and every sentence becomes an "exactly `count`" cardinality
/// constraint. The formula is solved once to prove the knowledge consistent
/// and to obtain a sample model, then each variable is solved under both
/// assumptions to find the cells whose value is forced.
///
/// Unlike subset inference this finds every entailed cell, at the cost of
/// one incremental solve per cell and polarity.
pub fn analyze(sentences: &[Sentence]) -> Result<Analysis> {
    let mut solver = Solver::new();
    let mut var_map: BTreeMap<Point, Var> = BTreeMap::new();

    // 1. Allocate a variable per mentioned cell
    for sentence in sentences {
        for &cell in sentence.cells() {
            var_map.entry(cell).or_insert_with(|| solver.new_var());
        }
    }

    // 2. Encode every sentence
    let mut formula = CnfFormula::new();
    for sentence in sentences.iter().filter(|s| !s.is_empty()) {
        let lits: Vec<Lit> = sentence
            .cells()
            .iter()
            .map(|cell| Lit::from_var(var_map[cell], true))
            .collect();
        encode_cardinality(&mut formula, &mut solver, &lits, sentence.count());
    }
    solver.add_formula(&formula);

    // 3. Consistency check
    if !solver.solve().map_err(|e| Error::Solver(e.to_string()))? {
        return Err(Error::inconsistent("no mine assignment satisfies the knowledge base"));
    }

    // 4. Sample model
    let model = solver
        .model()
        .ok_or_else(|| Error::Solver("solver returned no model".into()))?;
    let sample_assignment = var_map
        .iter()
        .map(|(&cell, &var)| (cell, model.contains(&Lit::from_var(var, true))))
        .collect();

    // 5. Try both polarities of every variable
    let mut deductions = BTreeMap::new();
    for (&cell, &var) in &var_map {
        let mine_possible = satisfiable_with(&mut solver, Lit::from_var(var, true))?;
        let safe_possible = satisfiable_with(&mut solver, Lit::from_var(var, false))?;

        let state = match (mine_possible, safe_possible) {
            (true, true) => DeducedState::Undetermined,
            (true, false) => DeducedState::ForcedMine,
            (false, true) => DeducedState::ForcedSafe,
            (false, false) => {
                return Err(Error::inconsistent(format!(
                    "cell {cell} can be neither a mine nor safe"
                )));
            }
        };
        deductions.insert(cell, state);
    }

    Ok(Analysis {
        deductions,
        sample_assignment,
    })
}

/// Solves under a single assumption, then clears it.
fn satisfiable_with(solver: &mut Solver, assumption: Lit) -> Result<bool> {
    solver.assume(&[assumption]);
    let result = solver.solve().map_err(|e| Error::Solver(e.to_string()));
    solver.assume(&[]);
    result
}

/// Above this many literals, cardinality uses a sequential counter instead
/// of one clause per subset.
const NAIVE_CARDINALITY_LIMIT: usize = 10;

/// Constrains exactly `k` of `lits` to be true.
///
/// "At least k of `lits`" is stated as "at most n - k of their negations",
/// so both halves go through [`at_most`].
fn encode_cardinality(formula: &mut CnfFormula, solver: &mut Solver, lits: &[Lit], k: usize) {
    if k > lits.len() {
        formula.add_clause(&[]);
        return;
    }
    at_most(formula, solver, lits, k);

    let negated: Vec<Lit> = lits.iter().map(|&lit| !lit).collect();
    at_most(formula, solver, &negated, lits.len() - k);
}

fn at_most(formula: &mut CnfFormula, solver: &mut Solver, lits: &[Lit], k: usize) {
    if k >= lits.len() {
        return;
    }
    if k == 0 {
        for &lit in lits {
            formula.add_clause(&[!lit]);
        }
    } else if lits.len() <= NAIVE_CARDINALITY_LIMIT {
        // No k+1 of them may hold together.
        for group in lits.iter().combinations(k + 1) {
            let clause: Vec<Lit> = group.into_iter().map(|&lit| !lit).collect();
            formula.add_clause(&clause);
        }
    } else {
        sequential_counter(formula, solver, lits, k);
    }
}

/// Sinz's sequential counter for "at most k", with `0 < k < vars.len()`.
///
/// `s[i][j]` holds when at least `j + 1` of `vars[0..=i]` are true.
fn sequential_counter(formula: &mut CnfFormula, solver: &mut Solver, vars: &[Lit], k: usize) {
    let n = vars.len();

    let s: Vec<Vec<Lit>> = (0..n - 1)
        .map(|_| {
            (0..k)
                .map(|_| Lit::from_var(solver.new_var(), true))
                .collect()
        })
        .collect();

    formula.add_clause(&[!vars[0], s[0][0]]);
    for &lit in &s[0][1..] {
        formula.add_clause(&[!lit]);
    }

    for i in 1..n - 1 {
        formula.add_clause(&[!vars[i], s[i][0]]);
        formula.add_clause(&[!s[i - 1][0], s[i][0]]);
        for j in 1..k {
            formula.add_clause(&[!vars[i], !s[i - 1][j - 1], s[i][j]]);
            formula.add_clause(&[!s[i - 1][j], s[i][j]]);
        }
        formula.add_clause(&[!vars[i], !s[i - 1][k - 1]]);
    }

    formula.add_clause(&[!vars[n - 1], !s[n - 2][k - 1]]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(cells: &[(usize, usize)], count: usize) -> Sentence {
        Sentence::new(cells.iter().map(|&(r, c)| Point::new(r, c)), count).unwrap()
    }

    #[test]
    fn test_symmetric_sentence_is_undetermined() {
        let analysis = analyze(&[sentence(&[(0, 0), (0, 1)], 1)]).unwrap();

        assert_eq!(
            analysis.deductions.get(&Point::new(0, 0)),
            Some(&DeducedState::Undetermined)
        );
        assert_eq!(
            analysis.deductions.get(&Point::new(0, 1)),
            Some(&DeducedState::Undetermined)
        );

        // The sample must satisfy the sentence
        let mines = analysis.sample_assignment.values().filter(|&&m| m).count();
        assert_eq!(mines, 1);
    }

    #[test]
    fn test_overlap_forces_cells_subset_inference_cannot_see() {
        // {a, b} = 1 and {b, c} = 1 and {a, b, c} = 2  =>  a and c mines, b safe
        let analysis = analyze(&[
            sentence(&[(0, 0), (0, 1)], 1),
            sentence(&[(0, 1), (0, 2)], 1),
            sentence(&[(0, 0), (0, 1), (0, 2)], 2),
        ])
        .unwrap();

        assert_eq!(
            analysis.forced_mines(),
            BTreeSet::from([Point::new(0, 0), Point::new(0, 2)])
        );
        assert_eq!(analysis.forced_safes(), BTreeSet::from([Point::new(0, 1)]));
    }

    #[test]
    fn test_contradiction_is_reported() {
        let result = analyze(&[
            sentence(&[(0, 0), (0, 1)], 2),
            sentence(&[(0, 0)], 0),
        ]);
        assert!(matches!(result, Err(Error::Inconsistent { .. })));
    }

    #[test]
    fn test_sequential_counter_on_large_sentences() {
        // 12 cells with exactly one mine, and the first 11 known to be clear.
        let row: Vec<(usize, usize)> = (0..12).map(|c| (0, c)).collect();
        let analysis = analyze(&[sentence(&row, 1), sentence(&row[..11], 0)]).unwrap();

        assert_eq!(analysis.forced_mines(), BTreeSet::from([Point::new(0, 11)]));
        assert_eq!(analysis.forced_safes().len(), 11);

        // 12 cells with 11 mines: every sample has exactly 11
        let analysis = analyze(&[sentence(&row, 11)]).unwrap();
        let mines = analysis.sample_assignment.values().filter(|&&m| m).count();
        assert_eq!(mines, 11);
        assert!(analysis.forced_mines().is_empty());
    }

    #[test]
    fn test_cardinality_above_literal_count_is_unsatisfiable() {
        let mut solver = Solver::new();
        let lits: Vec<Lit> = (0..3)
            .map(|_| Lit::from_var(solver.new_var(), true))
            .collect();
        let mut formula = CnfFormula::new();
        encode_cardinality(&mut formula, &mut solver, &lits, 4);
        solver.add_formula(&formula);
        assert!(!solver.solve().unwrap());

        // Exactly all of them forces every literal
        let mut solver = Solver::new();
        let lits: Vec<Lit> = (0..3)
            .map(|_| Lit::from_var(solver.new_var(), true))
            .collect();
        let mut formula = CnfFormula::new();
        encode_cardinality(&mut formula, &mut solver, &lits, 3);
        solver.add_formula(&formula);
        assert!(solver.solve().unwrap());
        let model = solver.model().unwrap();
        assert!(lits.iter().all(|lit| model.contains(lit)));
    }

    #[test]
    fn test_empty_knowledge() {
        let analysis = analyze(&[]).unwrap();
        assert!(analysis.deductions.is_empty());
    }
}
