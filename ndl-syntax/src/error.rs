//! Error types for NDL parsing

use ndl_core::Location;
use std::sync::Arc;
use thiserror::Error;

/// Result type for syntax operations
pub type Result<T> = std::result::Result<T, SyntaxError>;

/// Error type for lexing and parsing
#[derive(Debug, Error)]
pub enum SyntaxError {
    /// Lexer error (invalid token, bad indentation)
    #[error("{file}:{line}:{column}: {message}")]
    Tokenize {
        file: Arc<str>,
        line: u32,
        column: u32,
        message: String,
    },

    /// Parser error (unexpected token or invalid structure)
    #[error("{file}:{line}:{column}: {message}")]
    Parse {
        file: Arc<str>,
        line: u32,
        column: u32,
        message: String,
    },
}

impl SyntaxError {
    /// Create a tokenize error
    pub fn tokenize(file: Arc<str>, line: u32, column: u32, message: impl Into<String>) -> Self {
        Self::Tokenize {
            file,
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(file: Arc<str>, line: u32, column: u32, message: impl Into<String>) -> Self {
        Self::Parse {
            file,
            line,
            column,
            message: message.into(),
        }
    }

    /// The error position as a core location.
    pub fn location(&self) -> Location {
        match self {
            SyntaxError::Tokenize {
                file, line, column, ..
            }
            | SyntaxError::Parse {
                file, line, column, ..
            } => Location {
                file: file.clone(),
                line: *line,
                column: *column,
                length: 0,
            },
        }
    }
}

/// Convert a byte position to (line, column), 1-indexed.
pub(crate) fn line_col(input: &str, position: usize) -> (u32, u32) {
    let mut line = 1;
    let mut col = 1;

    for (i, c) in input.char_indices() {
        if i >= position {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Get the content of a specific line (1-indexed).
pub(crate) fn source_line(input: &str, line_num: u32) -> &str {
    input
        .lines()
        .nth(line_num.saturating_sub(1) as usize)
        .unwrap_or("")
}

/// Render a message with the offending source line and a caret pointer.
pub(crate) fn render_pointer(input: &str, position: usize, message: &str) -> (u32, u32, String) {
    let (line, col) = line_col(input, position);
    let content = source_line(input, line);
    let pointer = " ".repeat(col.saturating_sub(1) as usize);
    let rendered = format!("{message}\n  |\n{line} | {content}\n  | {pointer}^");
    (line, col, rendered)
}
