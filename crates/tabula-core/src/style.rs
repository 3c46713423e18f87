//! Cell formatting attributes
//!
//! Styling is independent of a cell's value: a cell may carry a style and
//! no content, or content and no style.

use serde::{Deserialize, Serialize};

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Formatting attributes applied to a cell
///
/// All fields are optional overrides; `Style::default()` is "no formatting"
/// and is treated the same as no style at all.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
    /// Background color as a CSS-style hex string (e.g. "#ffee00")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Text color as a CSS-style hex string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Style {
    /// Create an empty style
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether every attribute is unset
    pub fn is_empty(&self) -> bool {
        *self == Style::default()
    }

    /// Builder-style bold toggle
    pub fn bold(mut self, on: bool) -> Self {
        self.bold = on;
        self
    }

    /// Builder-style italic toggle
    pub fn italic(mut self, on: bool) -> Self {
        self.italic = on;
        self
    }

    /// Builder-style underline toggle
    pub fn underline(mut self, on: bool) -> Self {
        self.underline = on;
        self
    }

    /// Builder-style alignment
    pub fn align(mut self, align: Alignment) -> Self {
        self.align = Some(align);
        self
    }

    /// Builder-style background color
    pub fn background<S: Into<String>>(mut self, color: S) -> Self {
        self.background = Some(color.into());
        self
    }

    /// Builder-style text color
    pub fn color<S: Into<String>>(mut self, color: S) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Overlay another style's set attributes onto this one
    pub fn merge(&mut self, other: &Style) {
        self.bold |= other.bold;
        self.italic |= other.italic;
        self.underline |= other.underline;
        if other.align.is_some() {
            self.align = other.align;
        }
        if other.background.is_some() {
            self.background = other.background.clone();
        }
        if other.color.is_some() {
            self.color = other.color.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder() {
        let style = Style::new().bold(true).align(Alignment::Center);
        assert!(style.bold);
        assert_eq!(style.align, Some(Alignment::Center));
        assert!(!style.is_empty());
        assert!(Style::new().is_empty());
    }

    #[test]
    fn test_merge_keeps_existing() {
        let mut base = Style::new().bold(true).background("#ffffff");
        base.merge(&Style::new().italic(true));
        assert!(base.bold);
        assert!(base.italic);
        assert_eq!(base.background.as_deref(), Some("#ffffff"));
    }
}
