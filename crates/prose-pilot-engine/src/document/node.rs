use serde::{Deserialize, Serialize};

/// Inline formatting flags carried by a text run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Marks {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A contiguous span of text sharing one set of marks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

impl TextRun {
    pub fn new(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    /// A run with no formatting applied.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Marks::default())
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Block-level node types supported by the post editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading { level: u8 },
    ListItem { ordered: bool },
    Blockquote,
}

/// One block of the document tree: a typed node holding an ordered
/// sequence of marked text runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    #[serde(default)]
    pub runs: Vec<TextRun>,
}

impl Block {
    pub fn with_runs(kind: BlockKind, runs: Vec<TextRun>) -> Self {
        Self { kind, runs }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::with_runs(BlockKind::Paragraph, vec![TextRun::plain(text)])
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::with_runs(
            BlockKind::Heading {
                level: level.clamp(1, 6),
            },
            vec![TextRun::plain(text)],
        )
    }

    pub fn list_item(ordered: bool, text: impl Into<String>) -> Self {
        Self::with_runs(BlockKind::ListItem { ordered }, vec![TextRun::plain(text)])
    }

    pub fn quote(text: impl Into<String>) -> Self {
        Self::with_runs(BlockKind::Blockquote, vec![TextRun::plain(text)])
    }

    /// Length of the block's text in the document's linear offset space.
    pub fn char_len(&self) -> usize {
        self.runs.iter().map(TextRun::char_len).sum()
    }

    /// Plain text of the block (marks stripped).
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Delete the characters in `[from, to)` of this block's local space.
    pub(crate) fn delete_chars(&mut self, from: usize, to: usize) {
        let mut pos = 0;
        for run in &mut self.runs {
            let len = run.char_len();
            let start = from.max(pos);
            let end = to.min(pos + len);
            if start < end {
                let start_byte = char_to_byte(&run.text, start - pos);
                let end_byte = char_to_byte(&run.text, end - pos);
                run.text.replace_range(start_byte..end_byte, "");
            }
            pos += len;
        }
        self.coalesce();
    }

    /// Insert `text` at the local char offset `at`. Text inserted on a run
    /// boundary joins the preceding run, so it inherits the marks of the
    /// character before the insertion point.
    pub(crate) fn insert_chars(&mut self, at: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.runs.is_empty() {
            self.runs.push(TextRun::plain(text));
            return;
        }
        let mut pos = 0;
        for run in &mut self.runs {
            let len = run.char_len();
            if at <= pos + len {
                let byte = char_to_byte(&run.text, at - pos);
                run.text.insert_str(byte, text);
                self.coalesce();
                return;
            }
            pos += len;
        }
        // Offset past the end of the block: append.
        if let Some(last) = self.runs.last_mut() {
            last.text.push_str(text);
        }
        self.coalesce();
    }

    /// Split the block's runs at the local char offset `at`, keeping the
    /// head in place and returning the tail.
    pub(crate) fn split_off_chars(&mut self, at: usize) -> Vec<TextRun> {
        let mut head = Vec::new();
        let mut tail = Vec::new();
        let mut pos = 0;
        for run in self.runs.drain(..) {
            let len = run.char_len();
            if pos + len <= at {
                head.push(run);
            } else if pos >= at {
                tail.push(run);
            } else {
                let byte = char_to_byte(&run.text, at - pos);
                let (left, right) = run.text.split_at(byte);
                head.push(TextRun::new(left, run.marks.clone()));
                tail.push(TextRun::new(right, run.marks));
            }
            pos += len;
        }
        self.runs = head;
        tail
    }

    /// Marks governing an insertion at the local offset `at` (the marks of
    /// the run containing the preceding character).
    pub(crate) fn marks_at(&self, at: usize) -> Marks {
        let mut pos = 0;
        for run in &self.runs {
            let len = run.char_len();
            if at <= pos + len {
                return run.marks.clone();
            }
            pos += len;
        }
        self.runs.last().map(|r| r.marks.clone()).unwrap_or_default()
    }

    /// Drop empty runs and merge adjacent runs with identical marks.
    pub(crate) fn coalesce(&mut self) {
        self.runs.retain(|r| !r.text.is_empty());
        let mut i = 1;
        while i < self.runs.len() {
            if self.runs[i].marks == self.runs[i - 1].marks {
                let text = self.runs.remove(i).text;
                self.runs[i - 1].text.push_str(&text);
            } else {
                i += 1;
            }
        }
    }
}

/// Byte index of the `ch`-th character of `s` (clamped to the end).
pub(crate) fn char_to_byte(s: &str, ch: usize) -> usize {
    s.char_indices().nth(ch).map(|(i, _)| i).unwrap_or(s.len())
}
