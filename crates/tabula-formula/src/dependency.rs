//! Formula dependency graph
//!
//! Built fresh for each recalculation pass from the parsed formulas.
//! Range references are expanded to their member cells, so a formula over
//! `A1:A3` depends on A1, A2 and A3 individually.

use std::collections::HashMap;

use ahash::RandomState;

use crate::ast::{Expr, RefItem};
use tabula_core::Address;

type AddressSet = std::collections::HashSet<Address, RandomState>;

/// Dependency relationships among the sheet's formula cells
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Cells each formula cell reads (formula cell -> precedents)
    precedents: HashMap<Address, Vec<Address>, RandomState>,
}

impl DependencyGraph {
    /// Build the graph from the parsed formulas of a sheet
    pub fn build(formulas: &[(Address, Expr)]) -> Self {
        let mut precedents: HashMap<Address, Vec<Address>, RandomState> = HashMap::default();
        for (addr, expr) in formulas {
            let mut refs = Vec::new();
            expr.references(&mut refs);
            let mut cells = Vec::new();
            for item in refs {
                match item {
                    RefItem::Cell(a) => cells.push(a),
                    RefItem::Range(range) => cells.extend(range.cells()),
                }
            }
            cells.sort_unstable();
            cells.dedup();
            precedents.insert(*addr, cells);
        }
        Self { precedents }
    }

    /// Precedents of a formula cell (empty for non-formula cells)
    pub fn precedents(&self, addr: Address) -> &[Address] {
        self.precedents.get(&addr).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every address read by any formula, ranges expanded
    pub fn referenced_cells(&self) -> AddressSet {
        self.precedents.values().flatten().copied().collect()
    }

    /// Find every formula cell that participates in a reference cycle
    ///
    /// Depth-first search with an explicit recursion stack. A cell whose
    /// precedent chain reaches back to itself is a cycle member, as is any
    /// cell on the path that closes the loop.
    pub fn cycle_members(&self) -> AddressSet {
        let mut marks: HashMap<Address, Mark, RandomState> = HashMap::default();
        let mut cycles = AddressSet::default();

        for &start in self.precedents.keys() {
            if marks.contains_key(&start) {
                continue;
            }
            self.visit(start, &mut marks, &mut cycles, &mut Vec::new());
        }
        cycles
    }

    fn visit(
        &self,
        addr: Address,
        marks: &mut HashMap<Address, Mark, RandomState>,
        cycles: &mut AddressSet,
        path: &mut Vec<Address>,
    ) {
        match marks.get(&addr) {
            Some(Mark::Done) => return,
            Some(Mark::Visiting) => {
                // Every cell from the first occurrence on the path onward
                // is part of the cycle.
                if let Some(pos) = path.iter().position(|&a| a == addr) {
                    cycles.extend(path[pos..].iter().copied());
                }
                return;
            }
            None => {}
        }
        // Only formula cells have outgoing edges
        if !self.precedents.contains_key(&addr) {
            marks.insert(addr, Mark::Done);
            return;
        }

        marks.insert(addr, Mark::Visiting);
        path.push(addr);
        for &dep in self.precedents(addr) {
            self.visit(dep, marks, cycles, path);
        }
        path.pop();
        marks.insert(addr, Mark::Done);
    }

    /// Formula cells ordered so every cell follows its formula precedents
    ///
    /// Cycle members are excluded; they are assigned `#CYCLE` before
    /// evaluation and never run.
    pub fn evaluation_order(&self, cycles: &AddressSet) -> Vec<Address> {
        let mut order = Vec::with_capacity(self.precedents.len());
        let mut done: AddressSet = AddressSet::default();

        // Deterministic iteration keeps recalculation reproducible
        let mut roots: Vec<Address> = self.precedents.keys().copied().collect();
        roots.sort_unstable();

        for start in roots {
            self.postorder(start, cycles, &mut done, &mut order);
        }
        order
    }

    fn postorder(
        &self,
        addr: Address,
        cycles: &AddressSet,
        done: &mut AddressSet,
        order: &mut Vec<Address>,
    ) {
        if done.contains(&addr) || cycles.contains(&addr) {
            return;
        }
        if !self.precedents.contains_key(&addr) {
            return;
        }
        done.insert(addr);
        for &dep in self.precedents(addr) {
            self.postorder(dep, cycles, done, order);
        }
        order.push(addr);
    }
}

/// DFS coloring used by cycle detection
#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Done,
}
