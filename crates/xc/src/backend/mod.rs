//! Backend trait and implementations
//!
//! A backend turns the annotated [`Program`] produced by analysis into target
//! output. Code generation only runs when analysis logged no errors, so
//! backends may assume every reference in the program resolves.

pub mod cpp;

use crate::common::CompileResult;
use crate::config::VERSION;
use crate::sema::Program;
use std::path::Path;

pub use cpp::CppBackend;

/// Configuration options for backends
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Write the "auto generated" banner at the top of the output
    pub banner: bool,
    pub version: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            banner: true,
            version: VERSION.to_string(),
        }
    }
}

/// Output from a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutput {
    /// Source text
    Text(String),
}

impl BackendOutput {
    /// Write to `path`, creating missing parent directories
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match self {
            BackendOutput::Text(s) => std::fs::write(path, s),
        }
    }

    pub fn as_text(&self) -> &str {
        match self {
            BackendOutput::Text(s) => s,
        }
    }
}

/// Trait for code generation backends
pub trait Backend: Send + Sync {
    /// The name of this backend (e.g., "cpp")
    fn name(&self) -> &'static str;

    /// Generate output from an analyzed program
    fn generate(&self, program: &Program, config: &BackendConfig) -> CompileResult<BackendOutput>;
}
