//! Built-in worksheet functions
//!
//! The registry holds every callable function except IF, which the
//! evaluator special-cases for lazy branch evaluation.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::eval::EvalValue;
use tabula_core::ErrorKind;

/// A built-in function definition
pub struct FunctionDef {
    /// Canonical uppercase name
    pub name: &'static str,
    /// Minimum number of arguments
    pub min_args: usize,
    /// Maximum number of arguments (None = variadic)
    pub max_args: Option<usize>,
    /// The implementation, called with already-evaluated arguments
    pub implementation: fn(&[EvalValue]) -> EvalValue,
}

/// The global function registry, keyed by uppercase name
pub fn registry() -> &'static HashMap<&'static str, FunctionDef> {
    static REGISTRY: OnceLock<HashMap<&'static str, FunctionDef>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let defs = [
            FunctionDef {
                name: "SUM",
                min_args: 1,
                max_args: None,
                implementation: fn_sum,
            },
            FunctionDef {
                name: "AVERAGE",
                min_args: 1,
                max_args: None,
                implementation: fn_average,
            },
            FunctionDef {
                name: "COUNT",
                min_args: 1,
                max_args: None,
                implementation: fn_count,
            },
            FunctionDef {
                name: "MIN",
                min_args: 1,
                max_args: None,
                implementation: fn_min,
            },
            FunctionDef {
                name: "MAX",
                min_args: 1,
                max_args: None,
                implementation: fn_max,
            },
            FunctionDef {
                name: "VLOOKUP",
                min_args: 3,
                max_args: Some(3),
                implementation: fn_vlookup,
            },
        ];
        defs.into_iter().map(|d| (d.name, d)).collect()
    })
}

/// Names of every callable function, IF included, for completion catalogs
pub fn function_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = registry().keys().copied().collect();
    names.push("IF");
    names.sort_unstable();
    names
}

// === Aggregates ===

/// Collect the numeric values among the arguments
///
/// Non-numeric cells and error cells are skipped rather than poisoning the
/// aggregate, so SUM over a column with a header still works. Empty cells
/// are skipped too (they are absent, not zero, for aggregation).
fn numeric_args(args: &[EvalValue]) -> Vec<f64> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            EvalValue::Number(n) => out.push(*n),
            EvalValue::Array(rows) => {
                for row in rows {
                    for value in row {
                        if let EvalValue::Number(n) = value {
                            out.push(*n);
                        }
                    }
                }
            }
            EvalValue::Text(s) => {
                if let Ok(n) = s.trim().parse() {
                    out.push(n);
                }
            }
            _ => {}
        }
    }
    out
}

fn fn_sum(args: &[EvalValue]) -> EvalValue {
    EvalValue::Number(numeric_args(args).iter().sum())
}

fn fn_average(args: &[EvalValue]) -> EvalValue {
    let values = numeric_args(args);
    if values.is_empty() {
        // An average over no values displays as 0 rather than erroring
        return EvalValue::Number(0.0);
    }
    EvalValue::Number(values.iter().sum::<f64>() / values.len() as f64)
}

fn fn_count(args: &[EvalValue]) -> EvalValue {
    EvalValue::Number(numeric_args(args).len() as f64)
}

fn fn_min(args: &[EvalValue]) -> EvalValue {
    let min = numeric_args(args).into_iter().fold(f64::INFINITY, f64::min);
    EvalValue::Number(if min.is_finite() { min } else { 0.0 })
}

fn fn_max(args: &[EvalValue]) -> EvalValue {
    let max = numeric_args(args)
        .into_iter()
        .fold(f64::NEG_INFINITY, f64::max);
    EvalValue::Number(if max.is_finite() { max } else { 0.0 })
}

// === Lookup ===

/// VLOOKUP(needle, table, col_index): exact match on the first column
///
/// `col_index` is 1-based into the table's columns. A missing needle or an
/// out-of-range column index is a `#REF` error.
fn fn_vlookup(args: &[EvalValue]) -> EvalValue {
    // Scalar error arguments never reach here; the evaluator propagates
    // them before the call.
    let needle = &args[0];
    let EvalValue::Array(rows) = &args[1] else {
        return EvalValue::Error(ErrorKind::Value);
    };
    let Some(col_index) = args[2].as_number() else {
        return EvalValue::Error(ErrorKind::Value);
    };
    if col_index < 1.0 || col_index.fract() != 0.0 {
        return EvalValue::Error(ErrorKind::Ref);
    }
    let col = col_index as usize - 1;

    for row in rows {
        let Some(first) = row.first() else { continue };
        if values_match(first, needle) {
            return match row.get(col) {
                Some(value) => value.clone(),
                None => EvalValue::Error(ErrorKind::Ref),
            };
        }
    }
    EvalValue::Error(ErrorKind::Ref)
}

/// Loose equality for lookup: numeric when both sides coerce, else textual
fn values_match(cell: &EvalValue, needle: &EvalValue) -> bool {
    if let (Some(a), Some(b)) = (cell.as_number(), needle.as_number()) {
        return a == b;
    }
    match (cell, needle) {
        (EvalValue::Text(a), EvalValue::Text(b)) => a == b,
        _ => false,
    }
}
