//! Compiler logs
//!
//! Every problem found while compiling is recorded as a [`CompilerLog`].
//! Analysis never aborts on user errors; it keeps collecting logs and the
//! driver decides afterwards whether code generation may run.

use std::fmt;

use super::{Loc, Position, SourceMap};

/// Classification of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// Error without a source position (whole-unit failures)
    FlatError,
    /// Warning without a source position
    FlatWarning,
    /// Positioned error
    Error,
    /// Positioned warning
    Warning,
}

impl LogKind {
    pub fn is_error(self) -> bool {
        matches!(self, LogKind::Error | LogKind::FlatError)
    }
}

/// One diagnostic entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerLog {
    pub kind: LogKind,
    pub message: String,
    pub position: Option<Position>,
    pub loc: Option<Loc>,
}

impl CompilerLog {
    pub fn flat_error(message: impl Into<String>) -> Self {
        Self {
            kind: LogKind::FlatError,
            message: message.into(),
            position: None,
            loc: None,
        }
    }

    pub fn flat_warning(message: impl Into<String>) -> Self {
        Self {
            kind: LogKind::FlatWarning,
            message: message.into(),
            position: None,
            loc: None,
        }
    }

    /// Positioned error; falls back to a flat error if `loc` is unknown to `sources`
    pub fn error(sources: &SourceMap, loc: Loc, message: impl Into<String>) -> Self {
        Self::positioned(sources, loc, message.into(), LogKind::Error, LogKind::FlatError)
    }

    pub fn warning(sources: &SourceMap, loc: Loc, message: impl Into<String>) -> Self {
        Self::positioned(sources, loc, message.into(), LogKind::Warning, LogKind::FlatWarning)
    }

    fn positioned(
        sources: &SourceMap,
        loc: Loc,
        message: String,
        kind: LogKind,
        flat: LogKind,
    ) -> Self {
        match sources.position(loc) {
            Some(position) => Self {
                kind,
                message,
                position: Some(position),
                loc: Some(loc),
            },
            None => Self {
                kind: flat,
                message,
                position: None,
                loc: None,
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind.is_error()
    }
}

impl fmt::Display for CompilerLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.is_error() { "ERROR" } else { "WARNING" };
        match &self.position {
            Some(pos) => write!(
                f,
                "{}: {}:{}:{} {}",
                label, pos.path, pos.line, pos.column, self.message
            ),
            None => write!(f, "{}: {}", label, self.message),
        }
    }
}

/// Whether any entry is an error
pub fn has_errors(logs: &[CompilerLog]) -> bool {
    logs.iter().any(CompilerLog::is_error)
}

/// Write logs in the compact one-line form, one entry per line
pub fn print_logs(out: &mut impl std::io::Write, logs: &[CompilerLog]) -> std::io::Result<()> {
    for log in logs {
        writeln!(out, "{}", log)?;
    }
    Ok(())
}
