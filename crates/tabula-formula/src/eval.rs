//! Formula evaluator
//!
//! Evaluates expression trees against the sheet's current values.
//! Evaluation is total: problems surface as error values (`#REF`, `#DIV0`,
//! ...) contained in the result, never as Rust errors, so one bad formula
//! cannot abort a recalculation pass.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::functions::registry;
use tabula_core::{Address, ErrorKind, Range, Sheet, Value};

/// Value of an expression during evaluation
///
/// Extends the cell [`Value`] domain with `Empty` (an unpopulated cell) and
/// `Array` (a materialized range), neither of which can be stored in a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Error(ErrorKind),
    Array(Vec<Vec<EvalValue>>),
    Empty,
}

impl EvalValue {
    /// Try to interpret as a number (Empty counts as 0, errors never coerce)
    pub fn as_number(&self) -> Option<f64> {
        match self {
            EvalValue::Number(n) => Some(*n),
            EvalValue::Bool(true) => Some(1.0),
            EvalValue::Bool(false) => Some(0.0),
            EvalValue::Text(s) => s.trim().parse().ok(),
            EvalValue::Empty => Some(0.0),
            _ => None,
        }
    }

    /// Truthiness for IF conditions (JavaScript-style: 0, empty text, and
    /// error values are false)
    pub fn is_truthy(&self) -> bool {
        match self {
            EvalValue::Number(n) => *n != 0.0,
            EvalValue::Text(s) => !s.is_empty(),
            EvalValue::Bool(b) => *b,
            EvalValue::Error(_) | EvalValue::Empty => false,
            EvalValue::Array(_) => true,
        }
    }

    /// Check if this is an error value
    pub fn is_error(&self) -> bool {
        matches!(self, EvalValue::Error(_))
    }

    /// Convert into a storable cell value
    ///
    /// Empty becomes 0 (a formula that resolves to an empty cell displays
    /// 0); a bare range result is a type error.
    pub fn into_value(self) -> Value {
        match self {
            EvalValue::Number(n) => Value::Number(n),
            EvalValue::Text(s) => Value::Text(s),
            EvalValue::Bool(b) => Value::Bool(b),
            EvalValue::Error(e) => Value::Error(e),
            EvalValue::Empty => Value::Number(0.0),
            EvalValue::Array(_) => Value::Error(ErrorKind::Value),
        }
    }
}

impl From<Value> for EvalValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => EvalValue::Number(n),
            Value::Text(s) => EvalValue::Text(s),
            Value::Bool(b) => EvalValue::Bool(b),
            Value::Error(e) => EvalValue::Error(e),
        }
    }
}

/// Evaluation context: a read-only view of the sheet
pub struct Context<'a> {
    sheet: &'a Sheet,
}

impl<'a> Context<'a> {
    /// Create a context over a sheet
    pub fn new(sheet: &'a Sheet) -> Self {
        Self { sheet }
    }

    /// Read a single cell as an evaluation value
    ///
    /// Out-of-bounds addresses are `#REF`. Unpopulated or cleared cells are
    /// `Empty`. Formula cells expose their calculated value; literal cells
    /// their raw text coerced to a number when it parses as one.
    pub fn cell_value(&self, addr: Address) -> EvalValue {
        if !self.sheet.in_bounds(addr) {
            return EvalValue::Error(ErrorKind::Ref);
        }
        match self.sheet.get(addr) {
            None => EvalValue::Empty,
            Some(cell) if cell.is_blank() && cell.calculated.is_none() => EvalValue::Empty,
            Some(cell) => cell.effective_value().into(),
        }
    }

    /// Materialize a range as a row-major array
    pub fn range_values(&self, range: Range) -> EvalValue {
        if !self.sheet.in_bounds(range.end) {
            return EvalValue::Error(ErrorKind::Ref);
        }
        let mut rows = Vec::with_capacity(range.row_count() as usize);
        for row in range.start.row..=range.end.row {
            let mut cols = Vec::with_capacity(range.col_count() as usize);
            for col in range.start.col..=range.end.col {
                cols.push(self.cell_value(Address::new(row, col)));
            }
            rows.push(cols);
        }
        EvalValue::Array(rows)
    }
}

/// Evaluate an expression against the sheet
pub fn evaluate(expr: &Expr, ctx: &Context<'_>) -> EvalValue {
    match expr {
        Expr::Number(n) => EvalValue::Number(*n),
        Expr::Text(s) => EvalValue::Text(s.clone()),
        Expr::Bool(b) => EvalValue::Bool(*b),

        Expr::CellRef(addr) => ctx.cell_value(*addr),
        Expr::RangeRef(range) => ctx.range_values(*range),

        Expr::Unary { op, operand } => {
            let value = evaluate(operand, ctx);
            if let EvalValue::Error(e) = value {
                return EvalValue::Error(e);
            }
            match op {
                UnaryOp::Negate => match value.as_number() {
                    Some(n) => EvalValue::Number(-n),
                    None => EvalValue::Error(ErrorKind::Value),
                },
            }
        }

        Expr::Binary { op, left, right } => {
            let lhs = evaluate(left, ctx);
            if let EvalValue::Error(e) = lhs {
                return EvalValue::Error(e);
            }
            let rhs = evaluate(right, ctx);
            if let EvalValue::Error(e) = rhs {
                return EvalValue::Error(e);
            }
            apply_binary(*op, &lhs, &rhs)
        }

        Expr::Call { name, args } => {
            // IF evaluates its branches lazily: the untaken branch's errors
            // must not propagate.
            if name == "IF" {
                return evaluate_if(args, ctx);
            }

            let Some(def) = registry().get(name.as_str()) else {
                return EvalValue::Error(ErrorKind::Name);
            };

            if args.len() < def.min_args || def.max_args.is_some_and(|max| args.len() > max) {
                return EvalValue::Error(ErrorKind::Value);
            }

            // A scalar error argument (errored cell, out-of-bounds range)
            // propagates before the function runs. Errors inside an Array's
            // elements stay: aggregates skip them as non-numeric.
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                let value = evaluate(arg, ctx);
                if let EvalValue::Error(e) = value {
                    return EvalValue::Error(e);
                }
                values.push(value);
            }
            (def.implementation)(&values)
        }
    }
}

fn evaluate_if(args: &[Expr], ctx: &Context<'_>) -> EvalValue {
    if args.len() != 3 {
        return EvalValue::Error(ErrorKind::Value);
    }
    let condition = evaluate(&args[0], ctx);
    let branch = if condition.is_truthy() {
        &args[1]
    } else {
        &args[2]
    };
    evaluate(branch, ctx)
}

fn apply_binary(op: BinaryOp, lhs: &EvalValue, rhs: &EvalValue) -> EvalValue {
    use BinaryOp::*;

    match op {
        Add | Subtract | Multiply | Divide => {
            let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) else {
                return EvalValue::Error(ErrorKind::Value);
            };
            match op {
                Add => EvalValue::Number(a + b),
                Subtract => EvalValue::Number(a - b),
                Multiply => EvalValue::Number(a * b),
                Divide => {
                    if b == 0.0 {
                        EvalValue::Error(ErrorKind::Div0)
                    } else {
                        EvalValue::Number(a / b)
                    }
                }
                _ => unreachable!(),
            }
        }

        Equal | NotEqual | LessThan | LessEqual | GreaterThan | GreaterEqual => {
            let ordering = compare(lhs, rhs);
            let Some(ordering) = ordering else {
                return EvalValue::Error(ErrorKind::Value);
            };
            let result = match op {
                Equal => ordering == std::cmp::Ordering::Equal,
                NotEqual => ordering != std::cmp::Ordering::Equal,
                LessThan => ordering == std::cmp::Ordering::Less,
                LessEqual => ordering != std::cmp::Ordering::Greater,
                GreaterThan => ordering == std::cmp::Ordering::Greater,
                GreaterEqual => ordering != std::cmp::Ordering::Less,
                _ => unreachable!(),
            };
            EvalValue::Bool(result)
        }
    }
}

/// Compare two scalars: numerically when both coerce, lexically otherwise
fn compare(lhs: &EvalValue, rhs: &EvalValue) -> Option<std::cmp::Ordering> {
    if let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) {
        return a.partial_cmp(&b);
    }
    match (lhs, rhs) {
        (EvalValue::Text(a), EvalValue::Text(b)) => Some(a.cmp(b)),
        (EvalValue::Array(_), _) | (_, EvalValue::Array(_)) => None,
        // Mixed text/number: compare display forms
        (a, b) => Some(display_form(a).cmp(&display_form(b))),
    }
}

fn display_form(value: &EvalValue) -> String {
    match value {
        EvalValue::Number(n) => n.to_string(),
        EvalValue::Text(s) => s.clone(),
        EvalValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        EvalValue::Error(e) => e.to_string(),
        EvalValue::Empty => String::new(),
        EvalValue::Array(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;
    use tabula_core::Address;

    fn sheet_with(cells: &[(&str, &str)]) -> Sheet {
        let mut sheet = Sheet::default();
        for (addr, raw) in cells {
            sheet.set_raw(Address::parse(addr).unwrap(), *raw).unwrap();
        }
        sheet
    }

    fn eval(formula: &str, sheet: &Sheet) -> EvalValue {
        let ast = parse_formula(formula).unwrap();
        evaluate(&ast, &Context::new(sheet))
    }

    #[test]
    fn test_arithmetic() {
        let sheet = Sheet::default();
        assert_eq!(eval("=1+2*3", &sheet), EvalValue::Number(7.0));
        assert_eq!(eval("=(1+2)*3", &sheet), EvalValue::Number(9.0));
        assert_eq!(eval("=10/4", &sheet), EvalValue::Number(2.5));
        assert_eq!(eval("=-3+5", &sheet), EvalValue::Number(2.0));
    }

    #[test]
    fn test_division_by_zero() {
        let sheet = sheet_with(&[("A1", "0")]);
        assert_eq!(eval("=1/0", &sheet), EvalValue::Error(ErrorKind::Div0));
        assert_eq!(eval("=1/A1", &sheet), EvalValue::Error(ErrorKind::Div0));
    }

    #[test]
    fn test_cell_reference_reads_raw_coerced() {
        let sheet = sheet_with(&[("A1", "5"), ("A2", "text")]);
        assert_eq!(eval("=A1*2", &sheet), EvalValue::Number(10.0));
        assert_eq!(eval("=A2+1", &sheet), EvalValue::Error(ErrorKind::Value));
    }

    #[test]
    fn test_empty_cell_is_zero_in_arithmetic() {
        let sheet = Sheet::default();
        assert_eq!(eval("=A1+5", &sheet), EvalValue::Number(5.0));
    }

    #[test]
    fn test_out_of_bounds_is_ref_error() {
        let sheet = Sheet::new(5, 5);
        assert_eq!(eval("=Z99", &sheet), EvalValue::Error(ErrorKind::Ref));
        assert_eq!(
            eval("=SUM(A1:Z99)", &sheet),
            EvalValue::Error(ErrorKind::Ref)
        );
    }

    #[test]
    fn test_error_propagates_through_reference() {
        let mut sheet = sheet_with(&[("B1", "=1/0")]);
        sheet.set_calculated(
            Address::parse("B1").unwrap(),
            Some(Value::Error(ErrorKind::Div0)),
        );
        assert_eq!(eval("=B1+1", &sheet), EvalValue::Error(ErrorKind::Div0));
    }

    #[test]
    fn test_comparisons() {
        let sheet = sheet_with(&[("A1", "5")]);
        assert_eq!(eval("=A1>3", &sheet), EvalValue::Bool(true));
        assert_eq!(eval("=A1<=4", &sheet), EvalValue::Bool(false));
        assert_eq!(eval("=A1<>5", &sheet), EvalValue::Bool(false));
        assert_eq!(eval("=\"abc\"=\"abc\"", &sheet), EvalValue::Bool(true));
    }

    #[test]
    fn test_if_truthiness() {
        let sheet = sheet_with(&[("A1", "0"), ("A2", "7")]);
        assert_eq!(
            eval("=IF(A1,\"yes\",\"no\")", &sheet),
            EvalValue::Text("no".into())
        );
        assert_eq!(
            eval("=IF(A2,\"yes\",\"no\")", &sheet),
            EvalValue::Text("yes".into())
        );
    }

    #[test]
    fn test_if_untaken_branch_errors_suppressed() {
        let sheet = Sheet::new(5, 5);
        // The untaken branch references out of bounds; its error must not leak
        assert_eq!(eval("=IF(1,42,Z99)", &sheet), EvalValue::Number(42.0));
        assert_eq!(eval("=IF(0,Z99,42)", &sheet), EvalValue::Number(42.0));
        // The taken branch's error still surfaces
        assert_eq!(
            eval("=IF(1,Z99,42)", &sheet),
            EvalValue::Error(ErrorKind::Ref)
        );
    }

    #[test]
    fn test_if_error_condition_is_false() {
        let sheet = Sheet::new(5, 5);
        assert_eq!(eval("=IF(Z99,1,2)", &sheet), EvalValue::Number(2.0));
    }

    #[test]
    fn test_error_arguments_propagate_before_call() {
        let sheet = Sheet::new(5, 5);
        // An out-of-bounds range argument is a scalar #REF, not an empty
        // aggregate
        assert_eq!(
            eval("=SUM(A1:Z99)", &sheet),
            EvalValue::Error(ErrorKind::Ref)
        );
        assert_eq!(
            eval("=VLOOKUP(1,A1:Z99,1)", &sheet),
            EvalValue::Error(ErrorKind::Ref)
        );

        // A directly referenced errored cell propagates its own error
        let mut sheet = sheet_with(&[("B1", "=1/0")]);
        sheet.set_calculated(
            Address::parse("B1").unwrap(),
            Some(Value::Error(ErrorKind::Div0)),
        );
        assert_eq!(
            eval("=SUM(B1)", &sheet),
            EvalValue::Error(ErrorKind::Div0)
        );
    }

    #[test]
    fn test_error_cells_inside_range_still_skipped() {
        let mut sheet = sheet_with(&[("A1", "10"), ("A2", "=1/0"), ("A3", "20")]);
        sheet.set_calculated(
            Address::parse("A2").unwrap(),
            Some(Value::Error(ErrorKind::Div0)),
        );
        assert_eq!(eval("=SUM(A1:A3)", &sheet), EvalValue::Number(30.0));
        assert_eq!(eval("=COUNT(A1:A3)", &sheet), EvalValue::Number(2.0));
    }

    #[test]
    fn test_unknown_function_is_name_error() {
        let sheet = Sheet::default();
        assert_eq!(eval("=NOPE(1)", &sheet), EvalValue::Error(ErrorKind::Name));
    }

    #[test]
    fn test_bad_arg_count_is_value_error() {
        let sheet = Sheet::default();
        assert_eq!(eval("=SUM()", &sheet), EvalValue::Error(ErrorKind::Value));
        assert_eq!(
            eval("=VLOOKUP(1,A1:B2)", &sheet),
            EvalValue::Error(ErrorKind::Value)
        );
    }
}
