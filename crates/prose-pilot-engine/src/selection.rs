//! Selection tracking for the floating toolbar.
//!
//! The document view reports raw selection changes as char offsets plus the
//! screen rectangles of the selection's first and last lines. This module
//! normalizes those into a [`SelectionRange`], decides whether the selection
//! qualifies for showing the toolbar (minimum visible length), and computes
//! the [`AnchorPoint`] the toolbar is positioned at.

use serde::{Deserialize, Serialize};

/// Vertical gap between the top of the selection's first line and the
/// toolbar anchor, in view pixels.
pub const ANCHOR_GAP_PX: f32 = 48.0;

/// Minimum number of visible (trimmed) characters a selection must span
/// before the toolbar opens.
pub const MIN_SELECTION_CHARS: usize = 3;

/// A normalized user selection: `from <= to`, char offsets into the
/// document's linear space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub from: usize,
    pub to: usize,
}

impl SelectionRange {
    /// Build a range from possibly reversed offsets (backwards selections
    /// report `from > to`).
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            from: a.min(b),
            to: a.max(b),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.from == self.to
    }

    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    pub fn as_range(&self) -> std::ops::Range<usize> {
        self.from..self.to
    }
}

/// A rectangle in view (screen) coordinates, as reported by the host
/// document view for a selection endpoint's line box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewRect {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewRect {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }
}

/// A selection-change event from the document view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionUpdate {
    pub from: usize,
    pub to: usize,
    /// Line box of the selection start.
    pub start_rect: ViewRect,
    /// Line box of the selection end.
    pub end_rect: ViewRect,
}

impl SelectionUpdate {
    pub fn range(&self) -> SelectionRange {
        SelectionRange::new(self.from, self.to)
    }
}

/// Screen position the toolbar is anchored at.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnchorPoint {
    pub top: f32,
    pub left: f32,
}

/// Compute the toolbar anchor for a selection: horizontally centred between
/// the start and end line boxes, a fixed offset above the start line.
pub fn anchor_point(update: &SelectionUpdate) -> AnchorPoint {
    AnchorPoint {
        top: update.start_rect.top - ANCHOR_GAP_PX,
        left: (update.start_rect.left + update.end_rect.right()) / 2.0,
    }
}

/// Whether the selected text is long enough to open the toolbar. Counts
/// visible characters, so whitespace padding does not qualify a selection.
pub fn qualifies(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() >= min_chars
}
