//! Source file tracking and position mapping
//!
//! Keeps the text of every file that contributed a compilation unit so that
//! diagnostics can be rendered with file names, line/column positions, and
//! source snippets. Files are registered once and addressed by `FileId`;
//! line starts are precomputed for cheap offset lookups.

use std::fmt;

/// Unique identifier for a registered source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

impl FileId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

/// A position in source text (1-based line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl SourcePosition {
    pub const fn new(line: usize, column: usize, byte_offset: usize) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }
}

/// A contiguous region of one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub file_id: FileId,
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceSpan {
    pub const fn new(file_id: FileId, start: SourcePosition, end: SourcePosition) -> Self {
        Self {
            file_id,
            start,
            end,
        }
    }

    /// Span covering a single position (one column wide)
    pub const fn point(file_id: FileId, pos: SourcePosition) -> Self {
        Self {
            file_id,
            start: pos,
            end: SourcePosition::new(pos.line, pos.column + 1, pos.byte_offset + 1),
        }
    }

    /// Extend a point span to `len` columns on the same line
    pub fn with_len(file_id: FileId, pos: SourcePosition, len: usize) -> Self {
        let len = len.max(1);
        Self {
            file_id,
            start: pos,
            end: SourcePosition::new(pos.line, pos.column + len, pos.byte_offset + len),
        }
    }
}

/// One registered source file with precomputed line starts
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (i, ch) in text.char_indices() {
            if ch == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            name: name.into(),
            text,
            line_starts,
        }
    }

    /// Number of lines in the file
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Fetch one line of text (1-based), without its trailing newline
    pub fn line(&self, line_number: usize) -> Option<&str> {
        if line_number == 0 || line_number > self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line_number - 1];
        let end = self
            .line_starts
            .get(line_number)
            .copied()
            .unwrap_or(self.text.len());
        Some(self.text[start..end].trim_end_matches(['\n', '\r']))
    }

    /// Map a byte offset to a 1-based (line, column) pair
    pub fn line_col_at(&self, offset: usize) -> (usize, usize) {
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line_index).copied().unwrap_or(0);
        (line_index + 1, offset - line_start + 1)
    }

    /// Build a full `SourcePosition` from a byte offset
    pub fn position_at(&self, offset: usize) -> SourcePosition {
        let (line, column) = self.line_col_at(offset);
        SourcePosition::new(line, column, offset)
    }
}

/// Registry of every source file seen during a build
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and get its id back
    pub fn add_file(&mut self, name: impl Into<String>, text: impl Into<String>) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(SourceFile::new(name, text));
        id
    }

    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }

    /// File name for rendering, or a placeholder if the id is unknown
    pub fn file_name(&self, id: FileId) -> &str {
        self.file(id).map(|f| f.name.as_str()).unwrap_or("<unknown>")
    }

    pub fn line(&self, id: FileId, line_number: usize) -> Option<&str> {
        self.file(id)?.line(line_number)
    }

    /// Span between two byte offsets in one file
    pub fn span(&self, id: FileId, start: usize, end: usize) -> Option<SourceSpan> {
        let file = self.file(id)?;
        Some(SourceSpan::new(
            id,
            file.position_at(start),
            file.position_at(end),
        ))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
