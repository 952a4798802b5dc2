use tracing::trace;

use crate::document::{Block, Document};

/// Edits that can be applied to the document.
///
/// Ranges and offsets are char positions in the document's linear space.
/// Every edit is applied as one atomic change.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    InsertText {
        at: usize,
        text: String,
    },
    DeleteRange {
        range: std::ops::Range<usize>,
    },
    ReplaceRange {
        range: std::ops::Range<usize>,
        text: String,
    },
}

/// Result of applying an edit.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Char ranges holding newly inserted content.
    pub changed: Vec<std::ops::Range<usize>>,
    /// The live selection after transformation through the edit.
    pub new_selection: std::ops::Range<usize>,
    /// Document version after the edit.
    pub version: u64,
}

/// Edit pipeline: normalize the edit to a delete+insert pair, transform the
/// live selection through it, mutate the block tree, bump the version.
pub(crate) fn apply_edit(doc: &mut Document, edit: Edit) -> Patch {
    let (range, text) = match edit {
        Edit::InsertText { at, text } => (at..at, text),
        Edit::DeleteRange { range } => (range, String::new()),
        Edit::ReplaceRange { range, text } => (range, text),
    };
    let len = doc.len();
    let from = range.start.min(len);
    let to = range.end.min(len).max(from);
    let inserted = text.chars().count();

    let new_selection = transform_selection(&doc.selection, from..to, inserted);

    delete_range(doc, from, to);
    insert_text(doc, from, &text);

    doc.selection = new_selection.clone();
    doc.version += 1;
    trace!(from, to, inserted, version = doc.version, "applied edit");

    Patch {
        changed: vec![from..from + inserted],
        new_selection,
        version: doc.version,
    }
}

/// Transform a selection range through a replace of `edited` by `inserted`
/// chars: shift when the edit is before, grow when an insertion lands
/// inside, collapse to the edit start when a deletion overlaps.
fn transform_selection(
    selection: &std::ops::Range<usize>,
    edited: std::ops::Range<usize>,
    inserted: usize,
) -> std::ops::Range<usize> {
    let deleted = edited.len();
    if edited.start == edited.end {
        // Pure insertion.
        let at = edited.start;
        if at <= selection.start {
            (selection.start + inserted)..(selection.end + inserted)
        } else if at < selection.end {
            selection.start..(selection.end + inserted)
        } else {
            selection.clone()
        }
    } else if edited.end <= selection.start {
        // Edit is completely before the selection: shift by the net change.
        let start = (selection.start + inserted).saturating_sub(deleted);
        let end = (selection.end + inserted).saturating_sub(deleted);
        start..end
    } else if edited.start >= selection.end {
        selection.clone()
    } else {
        // Edit overlaps the selection: collapse to the edit start.
        edited.start..edited.start
    }
}

/// Remove the content strictly within `[from, to)`, merging blocks whose
/// separating boundary falls inside the range.
fn delete_range(doc: &mut Document, from: usize, to: usize) {
    if from >= to {
        return;
    }
    let block_count = doc.blocks.len();
    let mut merges: Vec<usize> = Vec::new();
    let mut pos = 0;
    for (i, block) in doc.blocks.iter_mut().enumerate() {
        // Span in the pre-edit offset space.
        let len = block.char_len();
        let start = pos;
        let end = pos + len;
        let del_start = from.max(start);
        let del_end = to.min(end);
        if del_start < del_end {
            block.delete_chars(del_start - start, del_end - start);
        }
        // The boundary after block i occupies position `end`.
        if i + 1 < block_count && from <= end && end < to {
            merges.push(i);
        }
        pos = end + 1;
    }
    // Merge from the back so earlier indices stay valid.
    for &i in merges.iter().rev() {
        let next = doc.blocks.remove(i + 1);
        doc.blocks[i].runs.extend(next.runs);
        doc.blocks[i].coalesce();
    }
}

/// Insert `text` at `at`. Newlines split the containing block; each new
/// block keeps the kind of the block the insertion started in, and inserted
/// text inherits the marks at the insertion point.
fn insert_text(doc: &mut Document, at: usize, text: &str) {
    if text.is_empty() {
        return;
    }
    if doc.blocks.is_empty() {
        doc.blocks.push(Block::with_runs(
            crate::document::BlockKind::Paragraph,
            vec![],
        ));
    }
    let (idx, local) = doc.locate(at);

    if !text.contains('\n') {
        doc.blocks[idx].insert_chars(local, text);
        return;
    }

    let segments: Vec<&str> = text.split('\n').collect();
    let block = &mut doc.blocks[idx];
    let kind = block.kind.clone();
    let marks = block.marks_at(local);

    let tail_runs = block.split_off_chars(local);
    let head_len = block.char_len();
    block.insert_chars(head_len, segments[0]);

    let mut new_blocks = Vec::with_capacity(segments.len() - 1);
    for segment in &segments[1..segments.len() - 1] {
        let runs = if segment.is_empty() {
            vec![]
        } else {
            vec![crate::document::TextRun::new(*segment, marks.clone())]
        };
        new_blocks.push(Block::with_runs(kind.clone(), runs));
    }

    let mut last = Block::with_runs(kind, tail_runs);
    let last_segment = segments[segments.len() - 1];
    if !last_segment.is_empty() {
        last.runs
            .insert(0, crate::document::TextRun::new(last_segment, marks));
        last.coalesce();
    }
    new_blocks.push(last);

    doc.blocks.splice(idx + 1..idx + 1, new_blocks);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BlockKind, Marks, TextRun};
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        Document::new(vec![
            Block::paragraph("Hello World"),
            Block::paragraph("Second"),
        ])
    }

    // ============ InsertText tests ============

    #[test]
    fn test_insert_text_at_beginning() {
        let mut d = doc();
        let patch = d.apply(Edit::InsertText {
            at: 0,
            text: "Start: ".to_string(),
        });
        assert_eq!(d.text(), "Start: Hello World\nSecond");
        assert_eq!(patch.version, 1);
        assert_eq!(patch.changed, vec![0..7]);
    }

    #[test]
    fn test_insert_text_in_middle() {
        let mut d = doc();
        d.apply(Edit::InsertText {
            at: 5,
            text: " Beautiful".to_string(),
        });
        assert_eq!(d.text(), "Hello Beautiful World\nSecond");
    }

    #[test]
    fn test_insert_text_with_newline_splits_block() {
        let mut d = doc();
        d.apply(Edit::InsertText {
            at: 5,
            text: "\n".to_string(),
        });
        assert_eq!(d.text(), "Hello\n World\nSecond");
        assert_eq!(d.blocks().len(), 3);
        // The split keeps the original block kind.
        assert_eq!(d.blocks()[1].kind, BlockKind::Paragraph);
    }

    #[test]
    fn test_insert_multiline_text_creates_blocks_of_same_kind() {
        let mut d = Document::new(vec![Block::list_item(false, "item")]);
        d.apply(Edit::InsertText {
            at: 4,
            text: "\nnext\nlast".to_string(),
        });
        assert_eq!(d.text(), "item\nnext\nlast");
        assert_eq!(d.blocks().len(), 3);
        assert!(
            d.blocks()
                .iter()
                .all(|b| b.kind == BlockKind::ListItem { ordered: false })
        );
    }

    #[test]
    fn test_insert_into_empty_document_creates_paragraph() {
        let mut d = Document::new(vec![]);
        d.apply(Edit::InsertText {
            at: 0,
            text: "fresh".to_string(),
        });
        assert_eq!(d.text(), "fresh");
        assert_eq!(d.blocks()[0].kind, BlockKind::Paragraph);
    }

    // ============ DeleteRange tests ============

    #[test]
    fn test_delete_range_within_block() {
        let mut d = doc();
        d.apply(Edit::DeleteRange { range: 5..11 });
        assert_eq!(d.text(), "Hello\nSecond");
    }

    #[test]
    fn test_delete_range_across_block_boundary_merges_blocks() {
        let mut d = doc();
        // Delete "World\nSec" across the boundary at offset 11.
        d.apply(Edit::DeleteRange { range: 6..15 });
        assert_eq!(d.text(), "Hello ond");
        assert_eq!(d.blocks().len(), 1);
    }

    #[test]
    fn test_delete_exactly_the_boundary_merges_blocks() {
        let mut d = doc();
        d.apply(Edit::DeleteRange { range: 11..12 });
        assert_eq!(d.text(), "Hello WorldSecond");
        assert_eq!(d.blocks().len(), 1);
    }

    #[test]
    fn test_delete_spanning_three_blocks() {
        let mut d = Document::new(vec![
            Block::paragraph("one"),
            Block::paragraph("two"),
            Block::paragraph("three"),
        ]);
        // "one" = 0..3, boundary 3, "two" = 4..7, boundary 7, "three" = 8..13
        d.apply(Edit::DeleteRange { range: 2..10 });
        assert_eq!(d.text(), "onree");
        assert_eq!(d.blocks().len(), 1);
    }

    #[test]
    fn test_delete_entire_block_content_leaves_empty_block() {
        let mut d = doc();
        d.apply(Edit::DeleteRange { range: 0..11 });
        assert_eq!(d.text(), "\nSecond");
        assert_eq!(d.blocks().len(), 2);
        assert_eq!(d.blocks()[0].char_len(), 0);
    }

    #[test]
    fn test_delete_out_of_bounds_is_clamped() {
        let mut d = doc();
        d.apply(Edit::DeleteRange { range: 12..999 });
        assert_eq!(d.text(), "Hello World\n");
    }

    // ============ ReplaceRange tests ============

    #[test]
    fn test_replace_range_basic() {
        let mut d = doc();
        let patch = d.apply(Edit::ReplaceRange {
            range: 6..11,
            text: "Universe".to_string(),
        });
        assert_eq!(d.text(), "Hello Universe\nSecond");
        assert_eq!(patch.changed, vec![6..14]);
    }

    #[test]
    fn test_replace_is_atomic_single_version_bump() {
        let mut d = doc();
        let before = d.text();
        let patch = d.apply(Edit::ReplaceRange {
            range: 0..5,
            text: "Howdy".to_string(),
        });
        let before_chars: Vec<char> = before.chars().collect();
        let expected: String = "Howdy"
            .chars()
            .chain(before_chars[5..].iter().copied())
            .collect();
        assert_eq!(d.text(), expected);
        assert_eq!(patch.version, 1);
        assert_eq!(d.version(), 1);
    }

    #[test]
    fn test_replace_range_vs_delete_insert() {
        let mut d1 = doc();
        d1.apply(Edit::ReplaceRange {
            range: 0..5,
            text: "Goodbye".to_string(),
        });

        let mut d2 = doc();
        d2.apply(Edit::DeleteRange { range: 0..5 });
        d2.apply(Edit::InsertText {
            at: 0,
            text: "Goodbye".to_string(),
        });

        assert_eq!(d1.text(), d2.text());
        assert_eq!(d1.text(), "Goodbye World\nSecond");
    }

    #[test]
    fn test_replace_across_boundary_with_multiline_text() {
        let mut d = doc();
        // Replace "World\nSecond" with two fresh lines.
        d.apply(Edit::ReplaceRange {
            range: 6..18,
            text: "brave\nnew".to_string(),
        });
        assert_eq!(d.text(), "Hello brave\nnew");
        assert_eq!(d.blocks().len(), 2);
    }

    #[test]
    fn test_replace_preserves_surrounding_marks() {
        let mut d = Document::new(vec![Block::with_runs(
            BlockKind::Paragraph,
            vec![
                TextRun::new(
                    "bold",
                    Marks {
                        bold: true,
                        ..Marks::default()
                    },
                ),
                TextRun::plain(" plain"),
            ],
        )]);
        d.apply(Edit::ReplaceRange {
            range: 5..10,
            text: "text!".to_string(),
        });
        assert_eq!(d.text(), "bold text!");
        assert!(d.blocks()[0].runs[0].marks.bold);
        assert_eq!(d.blocks()[0].runs[0].text, "bold");
    }

    #[test]
    fn test_replace_with_multibyte_text() {
        let mut d = Document::new(vec![Block::paragraph("naive cafe")]);
        d.apply(Edit::ReplaceRange {
            range: 0..5,
            text: "naïve".to_string(),
        });
        assert_eq!(d.text(), "naïve cafe");
        assert_eq!(d.len(), 10);
    }

    // ============ Selection transformation tests ============

    #[test]
    fn test_selection_shifts_after_insert_before_it() {
        let mut d = doc();
        d.set_selection(8..10);
        d.apply(Edit::InsertText {
            at: 5,
            text: " Beautiful".to_string(),
        });
        assert_eq!(d.selection(), 18..20);
    }

    #[test]
    fn test_selection_grows_when_insert_lands_inside() {
        let mut d = doc();
        d.set_selection(3..9);
        d.apply(Edit::InsertText {
            at: 5,
            text: "xx".to_string(),
        });
        assert_eq!(d.selection(), 3..11);
    }

    #[test]
    fn test_selection_collapses_when_delete_overlaps() {
        let mut d = doc();
        d.set_selection(8..10);
        d.apply(Edit::DeleteRange { range: 6..11 });
        assert_eq!(d.selection(), 6..6);
    }

    #[test]
    fn test_selection_shifts_left_after_delete_before_it() {
        let mut d = doc();
        d.set_selection(8..10);
        d.apply(Edit::DeleteRange { range: 0..6 });
        assert_eq!(d.selection(), 2..4);
    }

    #[test]
    fn test_selection_unchanged_by_edit_after_it() {
        let mut d = doc();
        d.set_selection(0..5);
        d.apply(Edit::ReplaceRange {
            range: 6..11,
            text: "Universe".to_string(),
        });
        assert_eq!(d.selection(), 0..5);
    }

    #[test]
    fn test_selection_net_shift_after_replace_before_it() {
        let mut d = doc();
        d.set_selection(12..18); // "Second"
        // "World" (5 chars) -> "Universe" (8 chars): +3
        d.apply(Edit::ReplaceRange {
            range: 6..11,
            text: "Universe".to_string(),
        });
        assert_eq!(d.selection(), 15..21);
    }
}
