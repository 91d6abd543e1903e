//! Diagnostic records and terminal rendering
//!
//! A diagnostic is a severity, an optional stable code, a message, and a
//! source anchor, plus optional `help` and `note` lines. Diagnostics are
//! accumulated into a `Diagnostics` collection during analysis and rendered
//! at the end with `ErrorFormatter`, which prints the offending source line
//! with a caret underline when the source text is available.

use std::fmt;

pub use source_map::{FileId, SourceFile, SourceMap, SourcePosition, SourceSpan};

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

/// One reported finding, anchored at a span of source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub span: SourceSpan,
    pub help: Vec<String>,
    pub notes: Vec<String>,
}

/// Builder for diagnostics, severity chosen by the constructor
pub struct DiagnosticBuilder {
    diagnostic: Diagnostic,
}

impl DiagnosticBuilder {
    fn new(severity: Severity, message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            diagnostic: Diagnostic {
                severity,
                code: None,
                message: message.into(),
                span,
                help: Vec::new(),
                notes: Vec::new(),
            },
        }
    }

    pub fn error(message: impl Into<String>, span: SourceSpan) -> Self {
        Self::new(Severity::Error, message, span)
    }

    pub fn warning(message: impl Into<String>, span: SourceSpan) -> Self {
        Self::new(Severity::Warning, message, span)
    }

    pub fn info(message: impl Into<String>, span: SourceSpan) -> Self {
        Self::new(Severity::Info, message, span)
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.diagnostic.code = Some(code.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.diagnostic.help.push(help.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.diagnostic.notes.push(note.into());
        self
    }

    pub fn build(self) -> Diagnostic {
        self.diagnostic
    }
}

/// Ordered collection of diagnostics for one build
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

const RESET: &str = "\x1b[0m";
const BOLD_WHITE: &str = "\x1b[1;97m";
const CYAN: &str = "\x1b[96m";
const GREEN: &str = "\x1b[32m";
const BLUE: &str = "\x1b[34m";
const YELLOW: &str = "\x1b[33m";

/// Renders diagnostics for a terminal or a build log
pub struct ErrorFormatter {
    use_colors: bool,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self { use_colors: false }
    }

    pub fn with_colors() -> Self {
        Self { use_colors: true }
    }

    pub fn format_all(&self, diagnostics: &Diagnostics, source_map: &SourceMap) -> String {
        let mut out = String::new();
        for diagnostic in diagnostics.iter() {
            out.push_str(&self.format(diagnostic, source_map));
        }
        out
    }

    pub fn format(&self, diagnostic: &Diagnostic, source_map: &SourceMap) -> String {
        let mut out = String::new();

        // Header: `severity[code]: message`
        let severity_color = if self.use_colors {
            match diagnostic.severity {
                Severity::Error => "\x1b[31m",
                Severity::Warning => "\x1b[33m",
                Severity::Info => "\x1b[36m",
                Severity::Hint => "\x1b[32m",
            }
        } else {
            ""
        };
        let reset = if self.use_colors { RESET } else { "" };
        out.push_str(severity_color);
        out.push_str(&diagnostic.severity.to_string());
        if let Some(code) = &diagnostic.code {
            out.push_str(&format!("[{}]", code));
        }
        out.push_str(reset);
        if self.use_colors {
            out.push_str(&format!(": {}{}{}\n", BOLD_WHITE, diagnostic.message, RESET));
        } else {
            out.push_str(&format!(": {}\n", diagnostic.message));
        }

        // Anchor line and snippet
        let span = diagnostic.span;
        let arrow = if self.use_colors {
            format!("{}-->{}", CYAN, RESET)
        } else {
            "-->".to_string()
        };
        out.push_str(&format!(
            "  {} {}:{}:{}\n",
            arrow,
            source_map.file_name(span.file_id),
            span.start.line,
            span.start.column
        ));

        if let Some(line) = source_map.line(span.file_id, span.start.line) {
            let gutter_width = span.start.line.to_string().len();
            let bar = if self.use_colors {
                format!("{}|{}", CYAN, RESET)
            } else {
                "|".to_string()
            };
            out.push_str(&format!("{:width$} {}\n", "", bar, width = gutter_width));
            out.push_str(&format!("{} {} {}\n", span.start.line, bar, line));

            let padding = " ".repeat(span.start.column.saturating_sub(1));
            let underline_len = self.underline_len(&span, line);
            let carets = "^".repeat(underline_len);
            if self.use_colors {
                out.push_str(&format!(
                    "{:width$} {} {}\x1b[31m{}\x1b[0m\n",
                    "",
                    bar,
                    padding,
                    carets,
                    width = gutter_width
                ));
            } else {
                out.push_str(&format!(
                    "{:width$} {} {}{}\n",
                    "",
                    bar,
                    padding,
                    carets,
                    width = gutter_width
                ));
            }
        }

        for help in &diagnostic.help {
            if self.use_colors {
                out.push_str(&format!("  {}help{}: {}{}{}\n", GREEN, RESET, YELLOW, help, RESET));
            } else {
                out.push_str(&format!("  help: {}\n", help));
            }
        }
        for note in &diagnostic.notes {
            if self.use_colors {
                out.push_str(&format!("  {}note{}: {}\n", BLUE, RESET, note));
            } else {
                out.push_str(&format!("  note: {}\n", note));
            }
        }

        out.push('\n');
        out
    }

    /// Width of the caret underline, clamped to the anchored line. Falls back
    /// to the identifier length under the anchor for one-column spans.
    fn underline_len(&self, span: &SourceSpan, line: &str) -> usize {
        let mut len = if span.start.line == span.end.line {
            span.end.column.saturating_sub(span.start.column)
        } else {
            line.len().saturating_sub(span.start.column.saturating_sub(1))
        };

        if len <= 1 {
            let start = span.start.column.saturating_sub(1);
            if start < line.len() {
                let detected = line[start..]
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .count();
                if detected > 0 {
                    len = detected;
                }
            }
        }

        len.max(1)
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
