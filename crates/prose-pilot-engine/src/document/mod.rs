//! # Document model
//!
//! The post editor's content is a tree of typed block nodes (paragraphs,
//! headings, list items, blockquotes), each holding an ordered sequence of
//! text runs with inline marks. The tree is addressed through a **linear
//! offset space**: the concatenation of every run's text, with one position
//! for the boundary between consecutive blocks. Every offset in
//! `0..Document::len()` maps to exactly one position in the tree, and every
//! structural edit preserves that bijection.
//!
//! Offsets count **characters**, not bytes, matching what the document view
//! reports for user selections.
//!
//! All mutation flows through [`Document::apply`] with an [`Edit`] command:
//! one `apply` is one atomic edit (a single undoable unit), returns a
//! [`Patch`] describing what changed, transforms the live selection through
//! the edit, and bumps the document version for change detection.
//!
//! ```rust
//! use prose_pilot_engine::document::{Block, Document, Edit};
//!
//! let mut doc = Document::new(vec![Block::paragraph("helo wrld")]);
//! let patch = doc.apply(Edit::ReplaceRange {
//!     range: 0..9,
//!     text: "hello world".to_string(),
//! });
//! assert_eq!(doc.text(), "hello world");
//! assert_eq!(patch.version, 1);
//! ```

pub mod edit;
pub mod node;

pub use edit::{Edit, Patch};
pub use node::{Block, BlockKind, Marks, TextRun};

/// A structured rich-text document addressed by linear char offsets.
///
/// The document owns the live selection (as the host editor reports it) and
/// a version counter incremented on every edit. The selection is advisory
/// runtime state: it is transformed through each edit but never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) blocks: Vec<Block>,
    /// Live cursor/selection as char offsets into the linear space.
    pub(crate) selection: std::ops::Range<usize>,
    /// Incremented on each edit (enables change detection).
    pub(crate) version: u64,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct DocumentRepr {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        let mut doc = Self {
            blocks,
            selection: 0..0,
            version: 0,
        };
        let len = doc.len();
        doc.selection = len..len; // start with cursor at end
        doc
    }

    /// Build a document of plain paragraphs, one per line of `text`.
    pub fn from_plain(text: &str) -> Self {
        Self::new(text.lines().map(Block::paragraph).collect())
    }

    /// Decode the persisted JSON form (block tree only; selection and
    /// version are runtime state).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let repr: DocumentRepr = serde_json::from_str(json)?;
        Ok(Self::new(repr.blocks))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&DocumentRepr {
            blocks: self.blocks.clone(),
        })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Total length of the linear offset space in chars, including one
    /// position per block boundary.
    pub fn len(&self) -> usize {
        let text: usize = self.blocks.iter().map(Block::char_len).sum();
        text + self.blocks.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full plain text, block boundaries rendered as `\n`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&block.text());
        }
        out
    }

    /// Range-addressed read of the plain text, clamped to the document
    /// bounds.
    pub fn text_in(&self, range: std::ops::Range<usize>) -> String {
        let len = self.len();
        let start = range.start.min(len);
        let end = range.end.min(len).max(start);
        self.text().chars().skip(start).take(end - start).collect()
    }

    /// Get the current live selection range.
    pub fn selection(&self) -> std::ops::Range<usize> {
        self.selection.clone()
    }

    /// Set the live selection range (host-driven, e.g. focus restoration).
    pub fn set_selection(&mut self, selection: std::ops::Range<usize>) {
        self.selection = selection;
    }

    /// Get the current version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Apply an edit as one atomic change. See [`edit`] for the pipeline.
    pub fn apply(&mut self, edit: Edit) -> Patch {
        edit::apply_edit(self, edit)
    }

    /// Map a linear offset to `(block index, local char offset)`. Offsets
    /// on a block boundary resolve to the end of the earlier block.
    pub(crate) fn locate(&self, at: usize) -> (usize, usize) {
        let mut pos = 0;
        for (i, block) in self.blocks.iter().enumerate() {
            let len = block.char_len();
            if at <= pos + len {
                return (i, at - pos);
            }
            pos += len + 1; // +1 for the block boundary
        }
        let last = self.blocks.len().saturating_sub(1);
        (last, self.blocks.last().map(Block::char_len).unwrap_or(0))
    }
}
