//! Source locations for load-time diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Position of a definition or error in a source file.
///
/// Lines and columns are 1-indexed; `length` is the span in characters
/// (0 when unknown).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Source filename (as handed to the file fetcher)
    pub file: Arc<str>,
    /// 1-indexed line
    pub line: u32,
    /// 1-indexed column
    pub column: u32,
    /// Span length in characters
    pub length: u32,
}

impl Location {
    /// Create a new location.
    pub fn new(file: impl AsRef<str>, line: u32, column: u32, length: u32) -> Self {
        Self {
            file: Arc::from(file.as_ref()),
            line,
            column,
            length,
        }
    }

    /// Location for entities that have no source position
    /// (internally generated objects, runtime patch requests).
    pub fn internal(context: impl AsRef<str>) -> Self {
        Self {
            file: Arc::from(context.as_ref()),
            line: 0,
            column: 0,
            length: 0,
        }
    }

    /// True if this location points into a real file.
    pub fn is_source(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_source() {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        } else {
            write!(f, "{}", self.file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let loc = Location::new("game/units.ndl", 3, 7, 2);
        assert_eq!(loc.to_string(), "game/units.ndl:3:7");

        let internal = Location::internal("patch request");
        assert_eq!(internal.to_string(), "patch request");
        assert!(!internal.is_source());
    }
}
