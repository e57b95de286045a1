//! Compiler settings and language constants
//!
//! Settings live in a JSON file (`x.set`) next to the project. The
//! [`CompilerContext`] bundles them with the locations the compiler needs
//! and is passed by reference through the pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extension of source files
pub const SRC_EXT: &str = ".x";
pub const SETTINGS_FILE: &str = "x.set";
/// Name of the standard library directory under the executable directory
pub const STDLIB_DIR: &str = "std";
/// Name of the function the program starts at
pub const ENTRY_POINT: &str = "main";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings in '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write settings file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory the generated C++ is written to
    pub cxx_out_dir: String,
    pub cxx_out_name: String,
    /// Name of the executable built from the C++ output
    pub out_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cxx_out_dir: "./dist/".to_string(),
            cxx_out_name: "x.cxx".to_string(),
            out_name: "main".to_string(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the default settings file into `dir`, returning its path
    pub fn write_default(dir: &Path) -> Result<PathBuf, SettingsError> {
        let path = dir.join(SETTINGS_FILE);
        let write_err = |source| SettingsError::Write {
            path: path.clone(),
            source,
        };
        let text = serde_json::to_string_pretty(&Self::default()).map_err(|source| {
            SettingsError::Parse {
                path: path.clone(),
                source,
            }
        })?;
        std::fs::write(&path, text + "\n").map_err(write_err)?;
        Ok(path)
    }

    /// Full path of the generated C++ file, relative to `base`
    pub fn cxx_out_path(&self, base: &Path) -> PathBuf {
        base.join(&self.cxx_out_dir).join(&self.cxx_out_name)
    }
}

/// Everything the pipeline needs besides the input file
#[derive(Debug, Clone)]
pub struct CompilerContext {
    pub exec_dir: PathBuf,
    pub stdlib_path: PathBuf,
    pub settings: Settings,
}

impl CompilerContext {
    pub fn new(exec_dir: impl Into<PathBuf>, settings: Settings) -> Self {
        let exec_dir = exec_dir.into();
        Self {
            stdlib_path: exec_dir.join(STDLIB_DIR),
            exec_dir,
            settings,
        }
    }

    pub fn with_stdlib(mut self, stdlib_path: impl Into<PathBuf>) -> Self {
        self.stdlib_path = stdlib_path.into();
        self
    }

    /// Directory of package `ident` inside the standard library
    pub fn package_dir(&self, ident: &str) -> PathBuf {
        self.stdlib_path.join(ident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.cxx_out_dir, "./dist/");
        assert_eq!(settings.cxx_out_name, "x.cxx");
        assert_eq!(settings.out_name, "main");
        assert_eq!(
            settings.cxx_out_path(Path::new("/work")),
            Path::new("/work/./dist/x.cxx")
        );
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = Settings::write_default(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("x.set"));
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{ "cxx_out_name": "app.cpp" }"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.cxx_out_name, "app.cpp");
        assert_eq!(settings.cxx_out_dir, "./dist/");
    }

    #[test]
    fn test_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ cxx_out_dir = 1 }").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().starts_with("invalid settings in"));

        let missing = Settings::load_or_default(&dir.path().join("none.set")).unwrap();
        assert_eq!(missing, Settings::default());
    }

    #[test]
    fn test_context_paths() {
        let ctx = CompilerContext::new("/opt/x", Settings::default());
        assert_eq!(ctx.stdlib_path, Path::new("/opt/x/std"));
        assert_eq!(ctx.package_dir("io"), Path::new("/opt/x/std/io"));
        let ctx = ctx.with_stdlib("/usr/lib/x");
        assert_eq!(ctx.package_dir("io"), Path::new("/usr/lib/x/io"));
    }
}
