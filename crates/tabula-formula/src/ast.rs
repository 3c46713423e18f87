//! Formula expression tree

use tabula_core::{Address, Range};

/// A parsed formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    Text(String),
    /// Boolean literal (TRUE/FALSE)
    Bool(bool),

    // === References ===
    /// Single cell reference
    CellRef(Address),
    /// Rectangular range reference
    RangeRef(Range),

    // === Operators ===
    /// Binary operation
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation
    Unary { op: UnaryOp, operand: Box<Expr> },

    // === Function call ===
    Call { name: String, args: Vec<Expr> },
}

/// A cell or range reference found in an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefItem {
    Cell(Address),
    Range(Range),
}

impl Expr {
    /// Collect every cell and range reference in the expression
    ///
    /// Both branches of IF are included: the dependency graph must cover
    /// everything the formula *could* read.
    pub fn references(&self, out: &mut Vec<RefItem>) {
        match self {
            Expr::Number(_) | Expr::Text(_) | Expr::Bool(_) => {}
            Expr::CellRef(addr) => out.push(RefItem::Cell(*addr)),
            Expr::RangeRef(range) => out.push(RefItem::Range(*range)),
            Expr::Binary { left, right, .. } => {
                left.references(out);
                right.references(out);
            }
            Expr::Unary { operand, .. } => operand.references(out),
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.references(out);
                }
            }
        }
    }
}

/// Binary operators, in this engine's grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,

    // Comparison (used by IF conditions)
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
}
