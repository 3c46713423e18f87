//! Cell address and range types
//!
//! Addresses use the familiar "A1" notation: a bijective base-26 column
//! letter sequence (A=0, Z=25, AA=26) followed by a 1-based row number.
//! The codec is total and injective over (column, row) pairs, so
//! `Address::parse(addr.to_string())` always round-trips exactly.

use crate::error::{Error, Result};
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single cell address (e.g., "A1", "BC42")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., Z=25, AA=26)
    pub col: u32,
}

impl Address {
    /// Create a new address from 0-based row and column indices
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse an address from strict A1-style notation
    ///
    /// Only uppercase column letters followed by a 1-based row number are
    /// accepted (`^[A-Z]+[0-9]+$`); anything else is an `InvalidAddress`
    /// error.
    ///
    /// # Examples
    /// ```
    /// use tabula_core::Address;
    ///
    /// let addr = Address::parse("B3").unwrap();
    /// assert_eq!(addr.row, 2);
    /// assert_eq!(addr.col, 1);
    /// assert!(Address::parse("b3").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let bytes = s.as_bytes();
        let mut pos = 0;

        while pos < bytes.len() && bytes[pos].is_ascii_uppercase() {
            pos += 1;
        }

        if pos == 0 {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }

        let col = Self::letters_to_column(&s[..pos])?;

        let row_str = &s[pos..];
        if row_str.is_empty() || !row_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }

        let row: u32 = row_str
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;

        // Rows are 1-based in display, 0-based internally
        if row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{}'",
                s
            )));
        }

        Ok(Self { row: row - 1, col })
    }

    /// Convert a column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    ///
    /// Bijective base-26: there is no representation for zero, so each
    /// "digit" runs 1..=26 mapped onto 'A'..='Z'.
    pub fn column_to_letters(col: u32) -> String {
        let mut result = String::new();
        let mut n = u64::from(col) + 1;

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Convert column letters to an index (A = 0, Z = 25, AA = 26, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut col: u64 = 0;
        for c in letters.chars() {
            if !c.is_ascii_uppercase() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col * 26 + (c as u64 - 'A' as u64 + 1);
            if col > u64::from(u32::MAX) {
                return Err(Error::InvalidAddress(format!(
                    "column '{}' too large",
                    letters
                )));
            }
        }

        Ok((col - 1) as u32)
    }

    /// Format as an A1-style string
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.col), self.row + 1)
    }

    /// Create a range from this address to another
    pub fn to(&self, other: Address) -> Range {
        Range::new(*self, other)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// Snapshots key cells by canonical address string, so addresses serialize
// as "A1"-form strings rather than row/col structs.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_a1_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(de::Error::custom)
    }
}

/// A rectangular range of cells (e.g., "A1:B10")
///
/// Corners are normalized on construction so `start` is the top-left and
/// `end` the bottom-right regardless of argument order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    /// Start address (top-left)
    pub start: Address,
    /// End address (bottom-right)
    pub end: Address,
}

impl Range {
    /// Create a new range, normalizing unordered corners
    pub fn new(a: Address, b: Address) -> Self {
        Self {
            start: Address::new(a.row.min(b.row), a.col.min(b.col)),
            end: Address::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Create a range from row/column indices
    pub fn from_indices(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self::new(
            Address::new(start_row, start_col),
            Address::new(end_row, end_col),
        )
    }

    /// Create a single-cell range
    pub fn single(addr: Address) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Parse a range from A1:B10 notation (a bare address is a 1-cell range)
    pub fn parse(s: &str) -> Result<Self> {
        let bad = |_| Error::InvalidRange(s.to_string());
        if let Some(colon_pos) = s.find(':') {
            let start = Address::parse(&s[..colon_pos]).map_err(bad)?;
            let end = Address::parse(&s[colon_pos + 1..]).map_err(bad)?;
            Ok(Self::new(start, end))
        } else {
            Ok(Self::single(Address::parse(s).map_err(bad)?))
        }
    }

    /// Check if an address is within this range
    pub fn contains(&self, addr: Address) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Number of columns in the range
    pub fn col_count(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        u64::from(self.row_count()) * u64::from(self.col_count())
    }

    /// Check if this range overlaps another
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start.row <= other.end.row
            && self.end.row >= other.start.row
            && self.start.col <= other.end.col
            && self.end.col >= other.start.col
    }

    /// Iterate over all addresses in the range, row by row
    pub fn cells(&self) -> RangeIter {
        RangeIter {
            range: *self,
            current_row: self.start.row,
            current_col: self.start.col,
            done: false,
        }
    }

    /// Format as an A1:B10 string
    pub fn to_a1_string(&self) -> String {
        if self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for Range {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Iterator over addresses in a range
pub struct RangeIter {
    range: Range,
    current_row: u32,
    current_col: u32,
    done: bool,
}

impl Iterator for RangeIter {
    type Item = Address;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let addr = Address::new(self.current_row, self.current_col);

        if self.current_col < self.range.end.col {
            self.current_col += 1;
        } else if self.current_row < self.range.end.row {
            self.current_col = self.range.start.col;
            self.current_row += 1;
        } else {
            self.done = true;
        }

        Some(addr)
    }
}
