//! Source file database

use codespan_reporting::files::{Files, SimpleFiles};

use super::{FileId, Loc};

/// Line/column position of a diagnostic, 1-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub path: String,
    pub line: usize,
    pub column: usize,
}

/// All source files taking part in one compilation.
///
/// Files are only added by the driver before analysis starts, so the map is
/// shared read-only with every unit checker.
pub struct SourceMap {
    files: SimpleFiles<String, String>,
    count: usize,
}

impl SourceMap {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            count: 0,
        }
    }

    pub fn add(&mut self, path: impl Into<String>, source: impl Into<String>) -> FileId {
        self.count += 1;
        self.files.add(path.into(), source.into())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn path(&self, file: FileId) -> Option<&str> {
        self.files.get(file).ok().map(|f| f.name().as_str())
    }

    pub fn source(&self, file: FileId) -> Option<&str> {
        self.files.get(file).ok().map(|f| f.source().as_str())
    }

    /// Resolve a location to path, line and column
    pub fn position(&self, loc: Loc) -> Option<Position> {
        let location = self.files.location(loc.file, loc.span.start).ok()?;
        Some(Position {
            path: self.path(loc.file)?.to_string(),
            line: location.line_number,
            column: location.column_number,
        })
    }

    pub(crate) fn files(&self) -> &SimpleFiles<String, String> {
        &self.files
    }
}

impl Default for SourceMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Span;

    #[test]
    fn test_position_is_one_based() {
        let mut map = SourceMap::new();
        let file = map.add("main.x", "fn main() {\n  var x i32 = 1\n}\n");

        let pos = map.position(Loc::new(file, Span::new(16, 17))).unwrap();
        assert_eq!(pos.path, "main.x");
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 5);
    }

    #[test]
    fn test_unknown_file_has_no_position() {
        let map = SourceMap::new();
        assert!(map.position(Loc::new(3, Span::new(0, 1))).is_none());
        assert!(map.is_empty());
    }
}
