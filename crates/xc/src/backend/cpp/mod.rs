//! C++ transpiler backend
//!
//! Produces a single self-contained C++17 translation unit: the runtime
//! prelude with the emitted program spliced in.

mod emit;
mod prelude;

pub use emit::{local_name, mangle, symbol_name, type_name, CppEmitter};
pub use prelude::{wrap, BODY_MARKER, ENTRY_SYMBOL, PRELUDE};

use tracing::debug;

use crate::backend::{Backend, BackendConfig, BackendOutput};
use crate::common::{CompileError, CompileResult};
use crate::sema::Program;

/// C++ source backend
pub struct CppBackend;

impl CppBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CppBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for CppBackend {
    fn name(&self) -> &'static str {
        "cpp"
    }

    fn generate(&self, program: &Program, config: &BackendConfig) -> CompileResult<BackendOutput> {
        let entry = mangle(&program.entry);
        if entry != ENTRY_SYMBOL {
            return Err(CompileError::codegen(format!(
                "entry point '{}' does not match the runtime entry '{}'",
                program.entry, ENTRY_SYMBOL
            )));
        }

        debug!(packages = program.packages.len(), "emitting C++");
        let body = CppEmitter::new().emit(program)?;

        let mut text = String::new();
        if config.banner {
            text.push_str("// Auto generated by X compiler.\n");
            text.push_str(&format!("// X compiler version: {}\n\n", config.version));
        }
        text.push_str(&wrap(&body));
        Ok(BackendOutput::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::{Module, SymbolTable};
    use std::sync::Arc;

    fn empty_program(entry: &str) -> Program {
        Program {
            packages: Vec::new(),
            root: Module::new(None, Arc::new(SymbolTable::new())),
            entry: entry.to_string(),
        }
    }

    #[test]
    fn test_banner_and_prelude() {
        let backend = CppBackend::new();
        let config = BackendConfig {
            banner: true,
            version: "1.2.3".to_string(),
        };
        let output = backend.generate(&empty_program("main"), &config).unwrap();
        let text = output.as_text();
        assert!(text.starts_with("// Auto generated by X compiler.\n// X compiler version: 1.2.3\n"));
        assert!(text.contains("#pragma region X_ENTRY_POINT"));
        assert!(!text.contains(BODY_MARKER));

        let bare = BackendConfig {
            banner: false,
            ..BackendConfig::default()
        };
        let output = backend.generate(&empty_program("main"), &bare).unwrap();
        assert!(output.as_text().starts_with("#pragma region X_STANDARD_IMPORTS"));
    }

    #[test]
    fn test_entry_must_match_runtime() {
        let err = CppBackend::new()
            .generate(&empty_program("start"), &BackendConfig::default())
            .unwrap_err();
        assert_eq!(
            err.message(),
            "entry point 'start' does not match the runtime entry '_main'"
        );
    }
}
