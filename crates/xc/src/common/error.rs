//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;

use super::{CompilerLog, LogKind, SourceMap, Span};
use crate::types::TypeTagError;

/// Compile error that stops the current unit or the whole compilation
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at {span:?}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span:?}: {message}")]
    Parser { message: String, span: Span },

    #[error("Code generation error: {message}")]
    Codegen { message: String },

    #[error("internal compiler error: {0}")]
    Internal(#[from] TypeTagError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        Self::Codegen {
            message: message.into(),
        }
    }

    /// Span of the error inside its file, if it has one
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Lexer { span, .. } | CompileError::Parser { span, .. } => Some(*span),
            _ => None,
        }
    }

    /// Message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            CompileError::Lexer { message, .. }
            | CompileError::Parser { message, .. }
            | CompileError::Codegen { message } => message.clone(),
            CompileError::Internal(err) => format!("internal compiler error: {}", err),
            CompileError::Io(err) => err.to_string(),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Diagnostic reporter for pretty log output
pub struct DiagnosticReporter {
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn with_color(choice: ColorChoice) -> Self {
        Self {
            writer: StandardStream::stderr(choice),
            config: term::Config::default(),
        }
    }

    /// Render one log entry; positioned entries get a source snippet
    pub fn report(&self, sources: &SourceMap, log: &CompilerLog) {
        let diagnostic = to_diagnostic(log);
        let _ = term::emit(&mut self.writer.lock(), &self.config, sources.files(), &diagnostic);
    }

    /// Render all logs in order and report whether any of them is an error
    pub fn report_all(&self, sources: &SourceMap, logs: &[CompilerLog]) -> bool {
        for log in logs {
            self.report(sources, log);
        }
        super::has_errors(logs)
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn to_diagnostic(log: &CompilerLog) -> Diagnostic<usize> {
    let diagnostic = match log.kind {
        LogKind::Error | LogKind::FlatError => Diagnostic::error(),
        LogKind::Warning | LogKind::FlatWarning => Diagnostic::warning(),
    };

    match log.loc {
        Some(loc) => diagnostic.with_message(&log.message).with_labels(vec![
            Label::primary(loc.file, loc.span.start..loc.span.end).with_message(&log.message),
        ]),
        None => diagnostic.with_message(&log.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Loc;

    #[test]
    fn test_positioned_log_gets_label() {
        let mut sources = SourceMap::new();
        let file = sources.add("m.x", "var a = b\n");
        let log = CompilerLog::error(&sources, Loc::new(file, Span::new(8, 9)), "undefined identifier 'b'");

        let diagnostic = to_diagnostic(&log);
        assert_eq!(diagnostic.labels.len(), 1);
        assert_eq!(diagnostic.labels[0].range, 8..9);
    }

    #[test]
    fn test_flat_log_has_no_label() {
        let diagnostic = to_diagnostic(&CompilerLog::flat_warning("w"));
        assert!(diagnostic.labels.is_empty());
    }

    #[test]
    fn test_error_message_strips_prefix() {
        let err = CompileError::parser("expected `;`", Span::new(1, 2));
        assert_eq!(err.message(), "expected `;`");
        assert_eq!(err.span(), Some(Span::new(1, 2)));
        assert!(CompileError::codegen("x").span().is_none());
    }
}
