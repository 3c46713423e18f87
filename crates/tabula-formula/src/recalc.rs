//! Full-sheet recalculation
//!
//! Every pass recomputes all formula cells from scratch: parse, build the
//! dependency graph, flag cycles, then evaluate in dependency order. The
//! pass is idempotent, so running it twice in a row changes nothing.

use std::collections::HashMap;

use ahash::RandomState;

use crate::ast::Expr;
use crate::dependency::DependencyGraph;
use crate::eval::{evaluate, Context};
use crate::parser::parse_formula;
use tabula_core::{Address, ErrorKind, Sheet, Value};

type AddressSet = std::collections::HashSet<Address, RandomState>;

/// Summary of a recalculation pass
#[derive(Debug, Default)]
pub struct RecalcOutcome {
    /// Number of formula cells evaluated (cycle members included)
    pub formula_count: usize,
    /// Formula cells that were part of a reference cycle
    pub cycle_count: usize,
    /// Cells whose formula text failed to parse, with the parser message
    pub parse_errors: Vec<(Address, String)>,
    /// Every cell some live formula references, ranges expanded
    pub referenced: AddressSet,
}

/// Recalculate every formula cell in the sheet
pub fn recalculate(sheet: &mut Sheet) -> RecalcOutcome {
    let mut outcome = RecalcOutcome::default();

    // Parse every formula. Unparseable formulas keep their raw text but
    // calculate to #VALUE.
    let mut parsed: Vec<(Address, Expr)> = Vec::new();
    let mut failed: Vec<Address> = Vec::new();
    for (addr, formula) in sheet.formula_cells() {
        match parse_formula(&formula) {
            Ok(expr) => parsed.push((addr, expr)),
            Err(e) => {
                failed.push(addr);
                outcome.parse_errors.push((addr, e.to_string()));
            }
        }
    }
    outcome.formula_count = parsed.len() + failed.len();

    let graph = DependencyGraph::build(&parsed);
    let cycles = graph.cycle_members();
    outcome.cycle_count = cycles.len();
    outcome.referenced = graph.referenced_cells();

    // Cycle members and parse failures get their error value up front
    for &addr in &cycles {
        sheet.set_calculated(addr, Some(Value::Error(ErrorKind::Cycle)));
    }
    for addr in failed {
        sheet.set_calculated(addr, Some(Value::Error(ErrorKind::Value)));
    }

    // Evaluate the rest in dependency order. Each result is written back
    // before the next evaluation so dependents observe fresh values.
    let exprs: HashMap<Address, &Expr, RandomState> =
        parsed.iter().map(|(a, e)| (*a, e)).collect();
    for addr in graph.evaluation_order(&cycles) {
        let expr = exprs[&addr];
        let value = evaluate(expr, &Context::new(sheet)).into_value();
        sheet.set_calculated(addr, Some(value));
    }

    log::debug!(
        "recalculated {} formulas ({} in cycles, {} parse errors)",
        outcome.formula_count,
        outcome.cycle_count,
        outcome.parse_errors.len()
    );
    outcome
}
