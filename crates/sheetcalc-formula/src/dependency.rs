//! Dependency tracking for formula calculation
//!
//! Forward edges map a formula cell to the cells it reads (precedents); the
//! reverse index maps a cell to the formulas that read it (dependents). Both
//! sides are always updated together.

use crate::ast::{FormulaExpr, Reference};
use ahash::{AHashMap, AHashSet};
use sheetcalc_core::CellAddress;
use std::collections::VecDeque;

/// Cells a formula reads, with ranges expanded and clipped to the grid
///
/// Single references are kept even when they lie outside the grid, so the
/// formula is still linked to the address it names.
pub fn precedent_cells(expr: &FormulaExpr, rows: u32, cols: u32) -> AHashSet<CellAddress> {
    let mut cells = AHashSet::new();
    for reference in expr.references() {
        match reference {
            Reference::Cell(r) => {
                cells.insert(r.address);
            }
            Reference::Range(r) => {
                if let Some(range) = r.range().clip(rows, cols) {
                    cells.extend(range.cells());
                }
            }
        }
    }
    cells
}

/// Dependency graph for formula cells
///
/// Tracks which cells depend on which other cells,
/// enabling efficient recalculation.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Cell → Cells that depend on it (dependents)
    dependents: AHashMap<CellAddress, AHashSet<CellAddress>>,
    /// Cell → Cells it depends on (precedents)
    precedents: AHashMap<CellAddress, AHashSet<CellAddress>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the precedents of `cell`, keeping the reverse index in step
    pub fn set_edges(&mut self, cell: CellAddress, refs: AHashSet<CellAddress>) {
        self.clear_edges(cell);
        if refs.is_empty() {
            return;
        }
        for &precedent in &refs {
            self.dependents.entry(precedent).or_default().insert(cell);
        }
        self.precedents.insert(cell, refs);
    }

    /// Remove the outgoing edges of `cell`
    ///
    /// Edges from other formulas into `cell` stay: they still read it.
    pub fn clear_edges(&mut self, cell: CellAddress) {
        if let Some(precedents) = self.precedents.remove(&cell) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(&precedent) {
                    deps.remove(&cell);
                    if deps.is_empty() {
                        self.dependents.remove(&precedent);
                    }
                }
            }
        }
    }

    /// Get cells that depend on the given cell
    pub fn dependents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Get cells that the given cell depends on
    pub fn precedents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.precedents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Would giving `cell` these precedents close a cycle?
    ///
    /// Walks the existing precedent edges from each candidate looking for
    /// `cell`. The graph is not touched.
    pub fn would_cycle(&self, cell: CellAddress, refs: &AHashSet<CellAddress>) -> bool {
        let mut visited = AHashSet::new();
        let mut stack: Vec<CellAddress> = refs.iter().copied().collect();

        while let Some(current) = stack.pop() {
            if current == cell {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(self.precedents(current));
        }

        false
    }

    /// Every cell reachable from `seeds` over dependent edges, seeds included
    pub fn closure(&self, seeds: &[CellAddress]) -> AHashSet<CellAddress> {
        let mut result: AHashSet<CellAddress> = seeds.iter().copied().collect();
        let mut queue: VecDeque<CellAddress> = seeds.iter().copied().collect();

        while let Some(cell) = queue.pop_front() {
            for dependent in self.dependents(cell) {
                if result.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }

        result
    }

    /// Order `cells` so every cell comes after its precedents within the set
    ///
    /// Kahn's algorithm restricted to the given subgraph. Ties are broken in
    /// row-major address order so passes are deterministic. Any cells caught
    /// in a cycle are appended at the end.
    pub fn topological_order(&self, cells: &AHashSet<CellAddress>) -> Vec<CellAddress> {
        let mut in_degree: AHashMap<CellAddress, usize> = cells
            .iter()
            .map(|&cell| {
                let degree = self.precedents(cell).filter(|p| cells.contains(p)).count();
                (cell, degree)
            })
            .collect();

        let mut ready: Vec<CellAddress> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&cell, _)| cell)
            .collect();
        ready.sort_unstable();
        let mut queue: VecDeque<CellAddress> = ready.into();

        let mut order = Vec::with_capacity(cells.len());
        while let Some(cell) = queue.pop_front() {
            order.push(cell);

            let mut released = Vec::new();
            for dependent in self.dependents(cell) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        released.push(dependent);
                    }
                }
            }
            released.sort_unstable();
            queue.extend(released);
        }

        if order.len() < cells.len() {
            let mut stuck: Vec<CellAddress> = in_degree
                .into_iter()
                .filter(|&(_, degree)| degree > 0)
                .map(|(cell, _)| cell)
                .collect();
            stuck.sort_unstable();
            order.extend(stuck);
        }

        order
    }

    /// Check whether a cell has any precedents recorded
    pub fn has_edges(&self, cell: CellAddress) -> bool {
        self.precedents.contains_key(&cell)
    }

    /// Number of formula cells with edges
    pub fn len(&self) -> usize {
        self.precedents.len()
    }

    /// Check if the graph holds no edges
    pub fn is_empty(&self) -> bool {
        self.precedents.is_empty()
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    fn set(cells: &[&str]) -> AHashSet<CellAddress> {
        cells.iter().map(|s| addr(s)).collect()
    }

    #[test]
    fn test_set_edges_updates_both_sides() {
        let mut graph = DependencyGraph::new();
        graph.set_edges(addr("B1"), set(&["A1"]));

        assert!(graph.dependents(addr("A1")).any(|c| c == addr("B1")));
        assert!(graph.precedents(addr("B1")).any(|c| c == addr("A1")));

        graph.set_edges(addr("B1"), set(&["A2"]));
        assert_eq!(graph.dependents(addr("A1")).count(), 0);
        assert_eq!(graph.dependents(addr("A2")).count(), 1);

        graph.clear_edges(addr("B1"));
        assert!(graph.is_empty());
        assert_eq!(graph.dependents(addr("A2")).count(), 0);
    }

    #[test]
    fn test_would_cycle() {
        let mut graph = DependencyGraph::new();
        // C1 -> B1 -> A1
        graph.set_edges(addr("B1"), set(&["A1"]));
        graph.set_edges(addr("C1"), set(&["B1"]));

        assert!(graph.would_cycle(addr("A1"), &set(&["C1"])));
        assert!(graph.would_cycle(addr("A1"), &set(&["A1"])));
        assert!(!graph.would_cycle(addr("D1"), &set(&["C1"])));

        // Nothing was committed
        assert!(!graph.has_edges(addr("A1")));
    }

    #[test]
    fn test_closure_includes_seeds_and_transitive_dependents() {
        let mut graph = DependencyGraph::new();
        graph.set_edges(addr("B1"), set(&["A1"]));
        graph.set_edges(addr("C1"), set(&["B1"]));
        graph.set_edges(addr("D1"), set(&["Z9"]));

        assert_eq!(graph.closure(&[addr("A1")]), set(&["A1", "B1", "C1"]));
    }

    #[test]
    fn test_topological_order_respects_edges() {
        let mut graph = DependencyGraph::new();
        // D1 = B1 + C1, B1 = A1, C1 = A1 + B1
        graph.set_edges(addr("B1"), set(&["A1"]));
        graph.set_edges(addr("C1"), set(&["A1", "B1"]));
        graph.set_edges(addr("D1"), set(&["B1", "C1"]));

        let closure = graph.closure(&[addr("A1")]);
        let order = graph.topological_order(&closure);
        assert_eq!(order, vec![addr("A1"), addr("B1"), addr("C1"), addr("D1")]);
    }

    #[test]
    fn test_precedent_cells_clip_ranges() {
        let ast = parse_formula("=SUM(A1:C2)+Z50").unwrap();
        let cells = precedent_cells(&ast, 2, 2);
        assert_eq!(cells, set(&["A1", "B1", "A2", "B2", "Z50"]));
    }
}
