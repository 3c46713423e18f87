//! Virtualized grid layout
//!
//! Maps scroll position and viewport size to the minimal contiguous window
//! of row and column indices that must be rendered. Offsets are cached in a
//! prefix table per axis; resizing one track invalidates the table only
//! from that index onward.

use std::collections::HashMap;

use ahash::RandomState;

use tabula_core::{Address, Sheet};

/// Extra tracks rendered beyond each viewport edge, so fast scrolling does
/// not flash blank cells
pub const DEFAULT_OVERSCAN: u32 = 3;

/// Default row height in pixels
pub const DEFAULT_ROW_HEIGHT: f64 = 32.0;
/// Default column width in pixels
pub const DEFAULT_COL_WIDTH: f64 = 96.0;
/// Width of the row-number header strip
pub const ROW_HEADER_WIDTH: f64 = 48.0;
/// Height of the column-letter header strip
pub const COL_HEADER_HEIGHT: f64 = 28.0;

/// A contiguous, non-empty, inclusive window of track indices
///
/// An axis with zero tracks has no window at all ([`Axis::window`] returns
/// `None`), so a `Window` always holds at least one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: u32,
    pub end: u32,
}

impl Window {
    /// Iterate the indices in the window
    pub fn indices(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn contains(&self, index: u32) -> bool {
        index >= self.start && index <= self.end
    }
}

/// One dimension of the grid: track count, sizes and cached offsets
#[derive(Debug)]
pub struct Axis {
    count: u32,
    default_size: f64,
    overrides: HashMap<u32, f64, RandomState>,
    /// offsets[i] = pixel offset where track i starts; valid prefix only
    offsets: Vec<f64>,
}

impl Axis {
    pub fn new(count: u32, default_size: f64) -> Self {
        Self {
            count,
            default_size,
            overrides: HashMap::default(),
            offsets: vec![0.0],
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Size of one track
    pub fn size_of(&self, index: u32) -> f64 {
        self.overrides.get(&index).copied().unwrap_or(self.default_size)
    }

    /// Resize one track, invalidating cached offsets after it
    pub fn set_size(&mut self, index: u32, size: f64) {
        if size > 0.0 {
            self.overrides.insert(index, size);
        } else {
            self.overrides.remove(&index);
        }
        // Offsets up to and including the resized track's start stay valid
        self.offsets.truncate(index as usize + 1);
    }

    /// Change the number of tracks
    pub fn set_count(&mut self, count: u32) {
        if count < self.count {
            self.offsets.truncate(count as usize + 1);
        }
        self.count = count;
    }

    /// Pixel offset where a track starts
    pub fn offset_of(&mut self, index: u32) -> f64 {
        self.ensure_offsets(index);
        self.offsets[index as usize]
    }

    /// Total pixel size of the axis
    pub fn total_size(&mut self) -> f64 {
        self.ensure_offsets(self.count);
        self.offsets[self.count as usize]
    }

    /// The track containing a pixel offset (clamped to the last track)
    pub fn index_at(&mut self, offset: f64) -> u32 {
        if self.count == 0 || offset <= 0.0 {
            return 0;
        }
        self.ensure_offsets(self.count);
        // partition_point: first track whose start offset exceeds `offset`,
        // minus one, is the track containing it
        let upper = self.offsets[..=self.count as usize]
            .partition_point(|&start| start <= offset) as u32;
        (upper - 1).min(self.count - 1)
    }

    /// The window of tracks intersecting [scroll, scroll + viewport), padded
    /// by the overscan margin and clamped to the axis
    ///
    /// `None` when the axis has no tracks.
    pub fn window(&mut self, scroll: f64, viewport: f64, overscan: u32) -> Option<Window> {
        if self.count == 0 {
            return None;
        }
        let first = self.index_at(scroll);

        // The viewport end is exclusive: a track starting exactly at
        // scroll + viewport is not visible.
        let end_px = scroll + viewport.max(0.0);
        self.ensure_offsets(self.count);
        let last = if end_px <= 0.0 {
            0
        } else {
            let upper = self.offsets[..=self.count as usize].partition_point(|&start| start < end_px);
            (upper as u32).saturating_sub(1).min(self.count - 1)
        };
        let last = last.max(first);

        Some(Window {
            start: first.saturating_sub(overscan),
            end: (last + overscan).min(self.count - 1),
        })
    }

    fn ensure_offsets(&mut self, through: u32) {
        let through = through.min(self.count) as usize;
        while self.offsets.len() <= through {
            let index = self.offsets.len() - 1;
            let last = *self.offsets.last().unwrap_or(&0.0);
            self.offsets.push(last + self.size_of(index as u32));
        }
    }
}

/// Scroll position of the grid body
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

/// Pixel size of the visible grid body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

/// Pixel rectangle of one cell, relative to the sheet origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The computed render window for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridWindow {
    pub rows: Window,
    pub cols: Window,
}

impl GridWindow {
    /// Iterate all addresses in the window, row-major
    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.rows
            .indices()
            .flat_map(|row| self.cols.indices().map(move |col| Address::new(row, col)))
    }
}

/// Full grid layout: both axes plus the pinned header strips
///
/// Header strips scroll in lock-step with the body along their own axis
/// and stay pinned on the other: the column-letter strip translates by
/// `-scroll.x`, the row-number strip by `-scroll.y`.
#[derive(Debug)]
pub struct GridLayout {
    rows: Axis,
    cols: Axis,
    overscan: u32,
}

impl GridLayout {
    pub fn new(row_count: u32, col_count: u32) -> Self {
        Self {
            rows: Axis::new(row_count, DEFAULT_ROW_HEIGHT),
            cols: Axis::new(col_count, DEFAULT_COL_WIDTH),
            overscan: DEFAULT_OVERSCAN,
        }
    }

    /// Match the layout's track counts to the sheet's declared bounds
    pub fn sync_bounds(&mut self, sheet: &Sheet) {
        self.rows.set_count(sheet.row_count());
        self.cols.set_count(sheet.col_count());
    }

    pub fn rows(&mut self) -> &mut Axis {
        &mut self.rows
    }

    pub fn cols(&mut self) -> &mut Axis {
        &mut self.cols
    }

    pub fn set_overscan(&mut self, overscan: u32) {
        self.overscan = overscan;
    }

    /// Resize one row (drag on the border between row headers)
    pub fn resize_row(&mut self, index: u32, height: f64) {
        self.rows.set_size(index, height);
    }

    /// Resize one column
    pub fn resize_col(&mut self, index: u32, width: f64) {
        self.cols.set_size(index, width);
    }

    /// Compute the window of cells to materialize for this frame
    ///
    /// `None` when either axis has no tracks (nothing to render).
    pub fn window(&mut self, scroll: ScrollOffset, viewport: ViewportSize) -> Option<GridWindow> {
        Some(GridWindow {
            rows: self.rows.window(scroll.y, viewport.height, self.overscan)?,
            cols: self.cols.window(scroll.x, viewport.width, self.overscan)?,
        })
    }

    /// Pixel rectangle of a cell, merge spans included
    ///
    /// For a merge anchor the rectangle covers the whole region; shadowed
    /// cells still report their own single-track rectangle (they are
    /// addressable, just not rendered).
    pub fn cell_rect(&mut self, addr: Address, sheet: &Sheet) -> CellRect {
        let x = self.cols.offset_of(addr.col);
        let y = self.rows.offset_of(addr.row);
        let (row_span, col_span) = match sheet.merge_at(addr) {
            Some(region) if region.anchor == addr => (region.row_span, region.col_span),
            _ => (1, 1),
        };
        let width = (addr.col..addr.col + col_span)
            .map(|c| self.cols.size_of(c))
            .sum();
        let height = (addr.row..addr.row + row_span)
            .map(|r| self.rows.size_of(r))
            .sum();
        CellRect { x, y, width, height }
    }

    /// Whether a cell is hidden under a merge region's anchor
    pub fn is_suppressed(&self, addr: Address, sheet: &Sheet) -> bool {
        sheet.is_merge_shadowed(addr)
    }

    /// Horizontal translation of the column-letter header strip
    pub fn col_header_translate(&self, scroll: ScrollOffset) -> f64 {
        -scroll.x
    }

    /// Vertical translation of the row-number header strip
    pub fn row_header_translate(&self, scroll: ScrollOffset) -> f64 {
        -scroll.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_core::MergeRegion;

    #[test]
    fn test_uniform_offsets() {
        let mut axis = Axis::new(100, 32.0);
        assert_eq!(axis.offset_of(0), 0.0);
        assert_eq!(axis.offset_of(10), 320.0);
        assert_eq!(axis.total_size(), 3200.0);
    }

    #[test]
    fn test_index_at_boundaries() {
        let mut axis = Axis::new(100, 32.0);
        assert_eq!(axis.index_at(0.0), 0);
        assert_eq!(axis.index_at(31.9), 0);
        assert_eq!(axis.index_at(32.0), 1);
        assert_eq!(axis.index_at(1_000_000.0), 99);
    }

    #[test]
    fn test_override_shifts_following_offsets() {
        let mut axis = Axis::new(10, 32.0);
        axis.set_size(2, 100.0);
        assert_eq!(axis.offset_of(2), 64.0);
        assert_eq!(axis.offset_of(3), 164.0);
        assert_eq!(axis.total_size(), 32.0 * 9.0 + 100.0);
    }

    #[test]
    fn test_resize_invalidates_cache_from_index() {
        let mut axis = Axis::new(10, 32.0);
        let before = axis.total_size();
        axis.set_size(5, 64.0);
        assert_eq!(axis.offset_of(5), 160.0);
        assert_eq!(axis.offset_of(6), 224.0);
        assert_eq!(axis.total_size(), before + 32.0);
    }

    #[test]
    fn test_window_at_offset_3200() {
        // 10,000 rows at height 32, viewport 640, scrolled to 3200:
        // visible rows are exactly 100..=119
        let mut axis = Axis::new(10_000, 32.0);
        let window = axis.window(3200.0, 640.0, 0);
        assert_eq!(window, Some(Window { start: 100, end: 119 }));

        // With overscan the window widens but stays within the axis
        let window = axis.window(3200.0, 640.0, 3);
        assert_eq!(window, Some(Window { start: 97, end: 122 }));
    }

    #[test]
    fn test_window_clamps_at_edges() {
        let mut axis = Axis::new(50, 32.0);
        let top = axis.window(0.0, 640.0, 3).unwrap();
        assert_eq!(top.start, 0);
        let bottom = axis.window(1_000_000.0, 640.0, 3).unwrap();
        assert_eq!(bottom.end, 49);
    }

    #[test]
    fn test_empty_axis_has_no_window() {
        let mut axis = Axis::new(0, 32.0);
        assert_eq!(axis.window(0.0, 640.0, 3), None);

        // A zero-track axis empties the whole grid window
        let mut layout = GridLayout::new(0, 26);
        let window = layout.window(
            ScrollOffset::default(),
            ViewportSize {
                width: 640.0,
                height: 640.0,
            },
        );
        assert!(window.is_none());
    }

    #[test]
    fn test_window_never_includes_fully_offscreen_rows() {
        let mut axis = Axis::new(10_000, 32.0);
        let window = axis.window(3200.0, 640.0, 0).unwrap();
        for index in window.indices() {
            let start = axis.offset_of(index);
            let end = start + axis.size_of(index);
            assert!(end > 3200.0 && start < 3840.0, "row {index} is offscreen");
        }
    }

    #[test]
    fn test_grid_window_addresses() {
        let mut layout = GridLayout::new(100, 26);
        layout.set_overscan(0);
        let window = layout.window(
            ScrollOffset { x: 0.0, y: 0.0 },
            ViewportSize {
                width: 96.0 * 2.0,
                height: 32.0 * 2.0,
            },
        )
        .unwrap();
        let addrs: Vec<Address> = window.addresses().collect();
        assert_eq!(addrs.len(), 4);
        assert_eq!(addrs[0], Address::new(0, 0));
        assert_eq!(addrs[3], Address::new(1, 1));
    }

    #[test]
    fn test_merge_anchor_rect_spans_region() {
        let mut layout = GridLayout::new(10, 10);
        let mut sheet = Sheet::new(10, 10);
        let anchor = Address::new(1, 1);
        sheet
            .merge(MergeRegion::new(anchor, 2, 3).unwrap())
            .unwrap();

        let rect = layout.cell_rect(anchor, &sheet);
        assert_eq!(rect.width, 96.0 * 3.0);
        assert_eq!(rect.height, 32.0 * 2.0);

        assert!(layout.is_suppressed(Address::new(1, 2), &sheet));
        assert!(!layout.is_suppressed(anchor, &sheet));
    }

    #[test]
    fn test_header_lock_step() {
        let layout = GridLayout::new(10, 10);
        let scroll = ScrollOffset { x: 120.0, y: 200.0 };
        assert_eq!(layout.col_header_translate(scroll), -120.0);
        assert_eq!(layout.row_header_translate(scroll), -200.0);
    }
}
