//! X compiler - transpiles X source code to C++
//!
//! ## Architecture
//!
//! The compiler is organized into:
//! - **Frontend** (`frontend/`): lexing and parsing into an AST
//! - **Sema** (`sema/`): symbol tables, scope chains, packages and checking
//! - **Backend** (`backend/`): C++ generation wrapped in the runtime prelude
//! - **Driver** (`driver/`): the pipeline tying the phases together
//! - **Common** (`common/`): shared infrastructure (errors, spans, logs)
//! - **Config** (`config/`): settings file and language constants
//! - **Types** (`types/`): built-in type tags

pub mod common;
pub mod config;
pub mod types;
pub mod frontend;
pub mod sema;
pub mod backend;
pub mod driver;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, CompilerLog, DiagnosticReporter, Span};
pub use config::{CompilerContext, Settings};
pub use frontend::FrontendConfig;
pub use backend::{Backend, BackendConfig, BackendOutput, CppBackend};
pub use driver::{Compilation, Pipeline};
