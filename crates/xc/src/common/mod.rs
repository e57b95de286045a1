//! Common infrastructure shared across the frontend, analysis and backend

mod error;
mod log;
mod source;
mod span;

pub use error::{CompileError, CompileResult, DiagnosticReporter};
pub use log::{has_errors, print_logs, CompilerLog, LogKind};
pub use source::{Position, SourceMap};
pub use span::{FileId, Loc, Span};
