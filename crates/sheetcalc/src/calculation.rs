//! Recalculation engine
//!
//! Keeps the dependency graph and parsed formulas in step with a
//! [`CellStore`] and re-derives values after every change.
//!
//! An edit of one cell parses its content, rejects formulas that would close
//! a reference cycle, commits the new edges and then evaluates the closure of
//! dependents in topological order. A full recalculation rebuilds every edge
//! and runs the same machinery seeded with every formula cell.
//!
//! Every cell lying on a reference cycle shows `#CIRCULAR!`, and so does
//! anything reading one. Which cell of a cycle had its edges refused depends
//! on edit order, but the set of cycle members does not, so incremental edits
//! and a full recalculation of the same content display the same values.
//!
//! # Example
//!
//! ```rust
//! use sheetcalc::calculation::RecalcEngine;
//! use sheetcalc::{CellAddress, CellContent, CellStore, CellValue};
//!
//! let mut store = CellStore::new(10, 10);
//! let mut engine = RecalcEngine::new();
//!
//! let a1 = CellAddress::parse("A1").unwrap();
//! let a2 = CellAddress::parse("A2").unwrap();
//! store.set_content(a1, CellContent::from_raw("10"));
//! engine.on_edit(&mut store, a1);
//! store.set_content(a2, CellContent::from_raw("=A1*2"));
//! engine.on_edit(&mut store, a2);
//!
//! assert_eq!(store.value(a2), CellValue::Number(20.0));
//! ```

use crate::{
    evaluate, parse_formula, precedent_cells, CellAddress, CellError, CellResolver, CellStore,
    CellValue, DependencyGraph, EvaluationContext, FormulaExpr, FormulaResult, FormulaValue,
};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, trace, warn};

/// Statistics from a recalculation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecalcStats {
    /// Number of cells evaluated
    pub cells_evaluated: usize,
    /// Number of cells left holding an error value
    pub errors: usize,
    /// Number of cells marked `#CIRCULAR!`
    pub circular_cells: usize,
}

impl RecalcStats {
    fn record(&mut self, value: &CellValue) {
        self.cells_evaluated += 1;
        match value {
            CellValue::Error(CellError::Circular) => {
                self.errors += 1;
                self.circular_cells += 1;
            }
            CellValue::Error(_) => self.errors += 1,
            _ => {}
        }
    }
}

/// Value of a literal cell under its declared type
///
/// Text that fails validation (only possible for content restored from a
/// snapshot) falls back to the untyped reading.
pub fn literal_value(store: &CellStore, addr: CellAddress) -> CellValue {
    let content = store.content(addr);
    let raw = content.raw();
    store
        .cell_type(addr)
        .interpret(raw)
        .unwrap_or_else(|| CellValue::from_literal(raw))
}

/// The recalculation engine
#[derive(Debug, Default)]
pub struct RecalcEngine {
    /// Dependency graph built from formulas
    graph: DependencyGraph,
    /// Parsed formulas (or their parse failure), keyed by address
    formulas: HashMap<CellAddress, FormulaResult<FormulaExpr>>,
    /// Formula cells whose edges were refused because they close a cycle
    rejected: BTreeSet<CellAddress>,
    /// Cells lying on a reference cycle through a refused cell
    circular: BTreeSet<CellAddress>,
}

impl RecalcEngine {
    /// Create an engine with an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed dependency graph
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Formula cells currently refused for closing a cycle
    pub fn rejected_cells(&self) -> impl Iterator<Item = CellAddress> + '_ {
        self.rejected.iter().copied()
    }

    /// Cells lying on a reference cycle
    pub fn circular_cells(&self) -> impl Iterator<Item = CellAddress> + '_ {
        self.circular.iter().copied()
    }

    /// React to a change of `addr`'s content in `store`
    pub fn on_edit(&mut self, store: &mut CellStore, addr: CellAddress) -> RecalcStats {
        self.on_edits(store, &[addr])
    }

    /// React to changes of several cells with a single pass
    ///
    /// Each changed cell is parsed and its edges committed in turn. A formula
    /// that would close a cycle keeps its previous edges and becomes
    /// `#CIRCULAR!` together with the rest of the cycle it closes. The pass
    /// then covers the changed cells, every cell entering or leaving a cycle
    /// and all of their dependents.
    pub fn on_edits(&mut self, store: &mut CellStore, changed: &[CellAddress]) -> RecalcStats {
        let mut stats = RecalcStats::default();
        let (rows, cols) = store.size();
        let mut seeds = changed.to_vec();

        for &addr in changed {
            self.update_edges(store, addr, rows, cols);
        }
        seeds.extend(self.revive_rejected(rows, cols));

        let members = self.cycle_members(rows, cols);
        seeds.extend(members.symmetric_difference(&self.circular).copied());
        self.circular = members;

        // A cell refused only because of another refused cell's stale edges
        // is off every cycle but has no committed edges to be reached through
        seeds.extend(self.rejected.difference(&self.circular).copied());

        self.run_pass(store, &seeds, &mut stats);
        stats
    }

    /// Parse `addr`'s content and commit its edges
    ///
    /// A formula refused for closing a cycle keeps its previous edges.
    fn update_edges(&mut self, store: &CellStore, addr: CellAddress, rows: u32, cols: u32) {
        match store.content(addr).formula_text() {
            Some(text) => match parse_formula(text) {
                Ok(ast) => {
                    let refs = precedent_cells(&ast, rows, cols);
                    if self.graph.would_cycle(addr, &refs) {
                        warn!(cell = %addr, "formula would close a reference cycle");
                        self.formulas.insert(addr, Ok(ast));
                        self.rejected.insert(addr);
                        return;
                    }
                    debug!(cell = %addr, edges = refs.len(), "committing edges");
                    self.graph.set_edges(addr, refs);
                    self.formulas.insert(addr, Ok(ast));
                }
                Err(e) => {
                    debug!(cell = %addr, error = %e, "formula failed to parse");
                    self.graph.clear_edges(addr);
                    self.formulas.insert(addr, Err(e));
                }
            },
            None => {
                self.graph.clear_edges(addr);
                self.formulas.remove(&addr);
            }
        }
        self.rejected.remove(&addr);
    }

    /// Rebuild every edge from the store's content and recompute everything
    pub fn recalc_all(&mut self, store: &mut CellStore) -> RecalcStats {
        let mut stats = RecalcStats::default();
        let (rows, cols) = store.size();

        self.graph.clear();
        self.formulas.clear();
        self.rejected.clear();
        self.circular.clear();

        // Literal values first, so formulas read current inputs
        let literals: Vec<(CellAddress, CellValue)> = store
            .iter()
            .filter(|(_, data)| !data.content.is_formula())
            .map(|(addr, _)| (addr, literal_value(store, addr)))
            .collect();
        for (addr, value) in literals {
            store.set_value(addr, value);
        }

        let formula_cells: Vec<(CellAddress, FormulaResult<FormulaExpr>)> = store
            .formula_cells()
            .map(|(addr, text)| (addr, parse_formula(text)))
            .collect();

        // Commit edges in row-major order; a formula that would close a
        // cycle against what is already committed is refused
        let mut seeds = Vec::with_capacity(formula_cells.len());
        for (addr, parsed) in formula_cells {
            if let Ok(ast) = &parsed {
                let refs = precedent_cells(ast, rows, cols);
                if self.graph.would_cycle(addr, &refs) {
                    warn!(cell = %addr, "reference cycle found during full recalculation");
                    self.rejected.insert(addr);
                } else {
                    self.graph.set_edges(addr, refs);
                }
            }
            self.formulas.insert(addr, parsed);
            seeds.push(addr);
        }
        self.circular = self.cycle_members(rows, cols);

        debug!(formulas = seeds.len(), "full recalculation");
        self.run_pass(store, &seeds, &mut stats);
        stats
    }

    /// Commit edges for refused formulas that no longer close a cycle
    ///
    /// Reviving one cell drops its stale edges, which may in turn free
    /// another, so this runs until nothing changes.
    fn revive_rejected(&mut self, rows: u32, cols: u32) -> Vec<CellAddress> {
        let mut revived = Vec::new();

        loop {
            let before = revived.len();
            let candidates: Vec<CellAddress> = self.rejected.iter().copied().collect();

            for addr in candidates {
                let refs = match self.formulas.get(&addr) {
                    Some(Ok(ast)) => precedent_cells(ast, rows, cols),
                    _ => {
                        self.rejected.remove(&addr);
                        continue;
                    }
                };
                if !self.graph.would_cycle(addr, &refs) {
                    debug!(cell = %addr, "reference cycle broken, committing edges");
                    self.graph.set_edges(addr, refs);
                    self.rejected.remove(&addr);
                    revived.push(addr);
                }
            }

            if revived.len() == before {
                return revived;
            }
        }
    }

    /// Every cell on a cycle through a refused cell
    ///
    /// Committed edges never form a cycle, so each cycle in the content runs
    /// through at least one refused cell. A refused cell's stale committed
    /// edges are ignored in favour of the edges its formula asks for.
    fn cycle_members(&self, rows: u32, cols: u32) -> BTreeSet<CellAddress> {
        let mut members = BTreeSet::new();
        if self.rejected.is_empty() {
            return members;
        }

        let mut refused: HashMap<CellAddress, Vec<CellAddress>> = HashMap::new();
        let mut refused_readers: HashMap<CellAddress, Vec<CellAddress>> = HashMap::new();
        for &addr in &self.rejected {
            if let Some(Ok(ast)) = self.formulas.get(&addr) {
                let refs: Vec<CellAddress> =
                    precedent_cells(ast, rows, cols).into_iter().collect();
                for &p in &refs {
                    refused_readers.entry(p).or_default().push(addr);
                }
                refused.insert(addr, refs);
            }
        }

        let reads = |cell: CellAddress| -> Vec<CellAddress> {
            match refused.get(&cell) {
                Some(refs) => refs.clone(),
                None => self.graph.precedents(cell).collect(),
            }
        };
        let readers = |cell: CellAddress| -> Vec<CellAddress> {
            self.graph
                .dependents(cell)
                .filter(|d| !self.rejected.contains(d))
                .chain(refused_readers.get(&cell).into_iter().flatten().copied())
                .collect()
        };

        for &addr in &self.rejected {
            if members.contains(&addr) {
                continue;
            }
            let downstream = reachable(addr, &reads);
            if !downstream.contains(&addr) {
                continue;
            }
            let upstream = reachable(addr, &readers);
            members.extend(downstream.intersection(&upstream).copied());
        }

        if !members.is_empty() {
            debug!(cells = members.len(), "cells on reference cycles");
        }
        members
    }

    /// Evaluate the closure of `seeds` and write the results to the store
    fn run_pass(&self, store: &mut CellStore, seeds: &[CellAddress], stats: &mut RecalcStats) {
        let closure = self.graph.closure(seeds);
        let order = self.graph.topological_order(&closure);
        debug!(seeds = seeds.len(), cells = order.len(), "recalculation pass");

        let results = {
            let pass = Pass::new(store, &self.formulas, &self.circular, &order);
            for &addr in &order {
                pass.ensure(addr);
            }
            pass.finish()
        };

        for (addr, value) in results {
            stats.record(&value);
            store.set_value(addr, value);
        }
    }
}

/// Cells reachable from `start` in one or more steps of `next`
fn reachable<F>(start: CellAddress, next: F) -> HashSet<CellAddress>
where
    F: Fn(CellAddress) -> Vec<CellAddress>,
{
    let mut seen = HashSet::new();
    let mut stack = next(start);
    while let Some(cell) = stack.pop() {
        if seen.insert(cell) {
            stack.extend(next(cell));
        }
    }
    seen
}

/// Per-cell state within one pass
#[derive(Debug, Clone)]
enum CellState {
    /// Scheduled but not evaluated yet
    Dirty,
    /// Evaluation in progress
    Evaluating,
    /// Evaluated this pass
    Done(CellValue),
}

/// One recalculation pass over a fixed set of cells
///
/// Reads of cells outside the set go to the store; reads of cells inside it
/// see this pass's results, evaluating a still-dirty cell on demand.
struct Pass<'a> {
    store: &'a CellStore,
    formulas: &'a HashMap<CellAddress, FormulaResult<FormulaExpr>>,
    circular: &'a BTreeSet<CellAddress>,
    states: RefCell<HashMap<CellAddress, CellState>>,
    /// Cells whose evaluation was re-entered
    reentered: RefCell<HashSet<CellAddress>>,
    order: Vec<CellAddress>,
}

impl<'a> Pass<'a> {
    fn new(
        store: &'a CellStore,
        formulas: &'a HashMap<CellAddress, FormulaResult<FormulaExpr>>,
        circular: &'a BTreeSet<CellAddress>,
        order: &[CellAddress],
    ) -> Self {
        let states = order.iter().map(|&a| (a, CellState::Dirty)).collect();
        Self {
            store,
            formulas,
            circular,
            states: RefCell::new(states),
            reentered: RefCell::new(HashSet::new()),
            order: order.to_vec(),
        }
    }

    /// Evaluate `addr` unless this pass already has its value
    fn ensure(&self, addr: CellAddress) -> CellValue {
        let state = self.states.borrow().get(&addr).cloned();
        match state {
            Some(CellState::Done(value)) => value,
            Some(CellState::Dirty) => self.evaluate_cell(addr),
            Some(CellState::Evaluating) => {
                warn!(cell = %addr, "re-entered cell during recalculation");
                self.reentered.borrow_mut().insert(addr);
                CellValue::Error(CellError::Circular)
            }
            None => self.store.value(addr),
        }
    }

    fn evaluate_cell(&self, addr: CellAddress) -> CellValue {
        self.states.borrow_mut().insert(addr, CellState::Evaluating);

        let value = if self.circular.contains(&addr) {
            CellValue::Error(CellError::Circular)
        } else {
            match self.formulas.get(&addr) {
                Some(Ok(ast)) => {
                    let ctx = EvaluationContext::new(self, addr);
                    match evaluate(ast, &ctx) {
                        Ok(value) => value.into(),
                        Err(e) => CellValue::Error(e.cell_error()),
                    }
                }
                Some(Err(e)) => CellValue::Error(e.cell_error()),
                None => literal_value(self.store, addr),
            }
        };

        let value = if self.reentered.borrow().contains(&addr) {
            CellValue::Error(CellError::Circular)
        } else {
            value
        };

        trace!(cell = %addr, value = %value, "evaluated");
        self.states
            .borrow_mut()
            .insert(addr, CellState::Done(value.clone()));
        value
    }

    /// Computed values in evaluation order
    fn finish(self) -> Vec<(CellAddress, CellValue)> {
        let mut states = self.states.into_inner();
        self.order
            .into_iter()
            .filter_map(|addr| match states.remove(&addr) {
                Some(CellState::Done(value)) => Some((addr, value)),
                _ => None,
            })
            .collect()
    }
}

impl CellResolver for Pass<'_> {
    fn resolve(&self, addr: CellAddress) -> FormulaValue {
        self.ensure(addr).into()
    }

    fn bounds(&self) -> (u32, u32) {
        self.store.size()
    }
}
