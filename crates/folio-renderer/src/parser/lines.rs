//! Line-oriented cursor used by block rules.

use std::cell::RefCell;
use std::collections::HashMap;

/// One input line without its terminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line<'t> {
    /// Line text, no trailing newline.
    pub text: &'t str,
    /// Byte offset of the line start in the original document.
    pub offset: usize,
}

impl<'t> Line<'t> {
    #[must_use]
    pub fn is_blank(&self) -> bool {
        is_blank(self.text)
    }

    /// Number of leading spaces.
    #[must_use]
    pub fn indent(&self) -> usize {
        leading_spaces(self.text)
    }

    /// Text after leading spaces.
    #[must_use]
    pub fn trimmed(&self) -> &'t str {
        self.text.trim_start_matches(' ')
    }

    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Cursor over the lines of a block of text.
///
/// Block rules peek at the current line (and ahead of it) to decide whether
/// they can start, then advance past the lines they consume.
#[derive(Clone, Debug)]
pub struct LineCursor<'t> {
    lines: Vec<Line<'t>>,
    pos: usize,
    end: usize,
    last_marker: RefCell<HashMap<&'static str, Option<usize>>>,
}

impl<'t> LineCursor<'t> {
    /// Split `text` into lines. `base` is the offset of `text` in the document.
    #[must_use]
    pub fn new(text: &'t str, base: usize) -> Self {
        let mut lines = Vec::new();
        let mut offset = base;
        let body = text.strip_suffix('\n').unwrap_or(text);
        if !text.is_empty() {
            for line in body.split('\n') {
                lines.push(Line { text: line, offset });
                offset += line.len() + 1;
            }
        }
        Self {
            lines,
            pos: 0,
            end: base + text.len(),
            last_marker: RefCell::default(),
        }
    }

    /// Current line.
    #[must_use]
    pub fn peek(&self) -> Option<Line<'t>> {
        self.lines.get(self.pos).copied()
    }

    /// Line `n` positions ahead of the current one.
    #[must_use]
    pub fn peek_nth(&self, n: usize) -> Option<Line<'t>> {
        self.lines.get(self.pos + n).copied()
    }

    /// Consume and return the current line.
    pub fn bump(&mut self) -> Option<Line<'t>> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.lines.len()
    }

    /// Index of the current line.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Rewind or fast-forward to a line index previously returned by [`position`](Self::position).
    pub fn reset(&mut self, pos: usize) {
        self.pos = pos.min(self.lines.len());
    }

    /// Lines from the current one to the end.
    #[must_use]
    pub fn remaining(&self) -> &[Line<'t>] {
        &self.lines[self.pos.min(self.lines.len())..]
    }

    /// Number of consecutive blank lines starting at the current one.
    #[must_use]
    pub fn blank_run(&self) -> usize {
        self.remaining().iter().take_while(|line| line.is_blank()).count()
    }

    /// Skip `n` lines.
    pub fn advance(&mut self, n: usize) {
        self.reset(self.pos + n);
    }

    /// Whether a line after the current one trims to `marker`.
    ///
    /// The last such line is located once per cursor and marker.
    #[must_use]
    pub fn has_marker_below(&self, marker: &'static str) -> bool {
        let last = *self
            .last_marker
            .borrow_mut()
            .entry(marker)
            .or_insert_with(|| self.lines.iter().rposition(|line| line.text.trim() == marker));
        last.is_some_and(|idx| idx > self.pos)
    }

    /// Byte offset of the current line, or of the end of input.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.peek().map_or(self.end, |line| line.offset)
    }
}

/// Whether a line holds only whitespace.
#[must_use]
pub fn is_blank(line: &str) -> bool {
    line.chars().all(char::is_whitespace)
}

/// Number of leading space characters.
#[must_use]
pub fn leading_spaces(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ').count()
}

/// Remove at most `n` leading spaces.
#[must_use]
pub fn strip_indent(line: &str, n: usize) -> &str {
    let strip = leading_spaces(line).min(n);
    &line[strip..]
}

/// Normalise line endings to `\n` and expand tabs in leading whitespace to
/// 4-column tab stops.
#[must_use]
pub fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    if !text.contains('\t') {
        return text;
    }

    let mut out = String::with_capacity(text.len());
    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        let mut column = 0;
        let mut rest = line;
        while let Some(ch) = rest.chars().next() {
            match ch {
                ' ' => {
                    out.push(' ');
                    column += 1;
                }
                '\t' => {
                    let width = 4 - column % 4;
                    out.extend(std::iter::repeat_n(' ', width));
                    column += width;
                }
                _ => break,
            }
            rest = &rest[1..];
        }
        out.push_str(rest);
    }
    out
}
