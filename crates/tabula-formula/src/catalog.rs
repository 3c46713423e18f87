//! Function catalog for editor assistance
//!
//! Static signature and usage metadata for every built-in function, for
//! hosts that offer completion or inline help while a formula is typed.

/// Signature metadata for one built-in function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: &'static str,
    /// Human-readable signature, e.g. `SUM(range)`
    pub signature: &'static str,
    pub summary: &'static str,
}

/// Every function the evaluator understands, alphabetically
pub const CATALOG: &[FunctionSpec] = &[
    FunctionSpec {
        name: "AVERAGE",
        signature: "AVERAGE(range)",
        summary: "Arithmetic mean of the numeric cells in the range",
    },
    FunctionSpec {
        name: "COUNT",
        signature: "COUNT(range)",
        summary: "Number of numeric cells in the range",
    },
    FunctionSpec {
        name: "IF",
        signature: "IF(condition, then, else)",
        summary: "Returns one of two values depending on the condition",
    },
    FunctionSpec {
        name: "MAX",
        signature: "MAX(range)",
        summary: "Largest numeric value in the range",
    },
    FunctionSpec {
        name: "MIN",
        signature: "MIN(range)",
        summary: "Smallest numeric value in the range",
    },
    FunctionSpec {
        name: "SUM",
        signature: "SUM(range)",
        summary: "Sum of the numeric cells in the range",
    },
    FunctionSpec {
        name: "VLOOKUP",
        signature: "VLOOKUP(needle, table, col_index)",
        summary: "Finds the needle in the table's first column and returns the cell col_index columns in",
    },
];

/// Catalog entries whose name starts with the prefix, case-insensitively
pub fn matching(prefix: &str) -> Vec<&'static FunctionSpec> {
    let prefix = prefix.to_ascii_uppercase();
    CATALOG
        .iter()
        .filter(|spec| spec.name.starts_with(&prefix))
        .collect()
}

/// Look up one function's spec by exact name, case-insensitively
pub fn lookup(name: &str) -> Option<&'static FunctionSpec> {
    let name = name.to_ascii_uppercase();
    CATALOG.iter().find(|spec| spec.name == name)
}
