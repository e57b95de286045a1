//! Compilation driver and pipeline orchestration
//!
//! The pipeline runs in fixed phases: environment checks, reading and
//! parsing the input, discovering the packages it uses, loading their
//! declarations in dependency order, checking every unit, and finally code
//! generation. Each phase only starts when the previous one left no error
//! that makes it pointless.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendConfig, BackendOutput, CppBackend};
use crate::common::{has_errors, CompileResult, CompilerLog, FileId, Loc, SourceMap};
use crate::config::{CompilerContext, ENTRY_POINT, SRC_EXT};
use crate::frontend::{self, FrontendConfig};
use crate::sema::{
    check_entry, check_unit, load_package, load_program, Module, Package, Program, Sema, Unit,
};

/// Everything one compilation produced
pub struct Compilation {
    pub sources: SourceMap,
    pub logs: Vec<CompilerLog>,
    /// Token and AST dumps requested by the frontend configuration
    pub dumps: Vec<String>,
    /// Generated code; `None` when any error was logged
    pub output: Option<BackendOutput>,
}

impl Compilation {
    fn new() -> Self {
        Self {
            sources: SourceMap::new(),
            logs: Vec::new(),
            dumps: Vec::new(),
            output: None,
        }
    }

    pub fn has_errors(&self) -> bool {
        has_errors(&self.logs)
    }
}

/// Package found through `use` declarations, before loading
struct PackageSource {
    ident: String,
    dir: PathBuf,
    units: Vec<Unit>,
    /// Packages its units use
    deps: Vec<String>,
}

/// Compilation pipeline from source file to backend output
pub struct Pipeline<'c> {
    ctx: &'c CompilerContext,
    frontend: FrontendConfig,
    backend: Box<dyn Backend>,
    backend_config: BackendConfig,
}

impl<'c> Pipeline<'c> {
    pub fn new(ctx: &'c CompilerContext) -> Self {
        Self {
            ctx,
            frontend: FrontendConfig::default(),
            backend: Box::new(CppBackend::new()),
            backend_config: BackendConfig::default(),
        }
    }

    pub fn with_frontend_config(mut self, config: FrontendConfig) -> Self {
        self.frontend = config;
        self
    }

    pub fn with_backend(mut self, backend: Box<dyn Backend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_backend_config(mut self, config: BackendConfig) -> Self {
        self.backend_config = config;
        self
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Compile `input` and write the output under `base` when it succeeded.
    ///
    /// Returns the path written to, if any.
    pub fn build(&self, input: &Path, base: &Path) -> CompileResult<(Compilation, Option<PathBuf>)> {
        let compilation = self.compile(input);
        let Some(output) = &compilation.output else {
            return Ok((compilation, None));
        };
        let path = self.ctx.settings.cxx_out_path(base);
        output.write_to(&path)?;
        info!(path = %path.display(), "output written");
        Ok((compilation, Some(path)))
    }

    /// Run every phase on `input`; problems end up in the returned logs
    pub fn compile(&self, input: &Path) -> Compilation {
        info!(input = %input.display(), backend = self.backend.name(), "compiling");
        let mut comp = Compilation::new();

        if !self.ctx.stdlib_path.is_dir() {
            comp.logs
                .push(CompilerLog::flat_error("standard library directory not found"));
            return comp;
        }

        let Some(root) = self.read_root(input, &mut comp) else {
            return comp;
        };
        let Some(sources) = self.discover_packages(&root, &mut comp) else {
            return comp;
        };
        let Some(order) = package_order(&sources, &mut comp.logs) else {
            return comp;
        };

        let program = self.analyze(root, sources, &order, &mut comp);

        if !comp.has_errors() {
            match self.backend.generate(&program, &self.backend_config) {
                Ok(output) => comp.output = Some(output),
                Err(err) => comp.logs.push(CompilerLog::flat_error(err.message())),
            }
        }

        info!(
            logs = comp.logs.len(),
            errors = comp.has_errors(),
            "compilation finished"
        );
        comp
    }

    fn read_root(&self, input: &Path, comp: &mut Compilation) -> Option<Unit> {
        let text = match std::fs::read_to_string(input) {
            Ok(text) => text,
            Err(err) => {
                comp.logs.push(CompilerLog::flat_error(format!(
                    "cannot read '{}': {}",
                    input.display(),
                    err
                )));
                return None;
            }
        };

        if self.frontend.dump_tokens {
            if let Ok(tokens) = frontend::dump_tokens(&text) {
                comp.dumps.push(tokens);
            }
        }
        if self.frontend.dump_ast {
            if let Ok(ast) = frontend::dump_ast(&text) {
                comp.dumps.push(ast);
            }
        }

        let file = comp.sources.add(input.display().to_string(), text);
        let mut units = parse_files(&comp.sources, &[file], &mut comp.logs)?;
        units.pop()
    }

    /// Find every package reachable through `use`, parsing one wave of
    /// newly named packages at a time
    fn discover_packages(&self, root: &Unit, comp: &mut Compilation) -> Option<Vec<PackageSource>> {
        let mut found: Vec<PackageSource> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut wave: Vec<String> = uses_of(std::slice::from_ref(root));
        wave.retain(|ident| seen.insert(ident.clone()));

        while !wave.is_empty() {
            debug!(packages = ?wave, "discovering packages");
            let mut files: Vec<(String, PathBuf, Vec<FileId>)> = Vec::new();
            for ident in &wave {
                let dir = self.ctx.package_dir(ident);
                let ids = read_package_dir(ident, &dir, comp)?;
                files.push((ident.clone(), dir, ids));
            }

            let mut next = Vec::new();
            for (ident, dir, ids) in files {
                let units = parse_files(&comp.sources, &ids, &mut comp.logs)?;
                if units.is_empty() {
                    comp.logs
                        .push(CompilerLog::flat_warning(format!("package '{}' is empty", ident)));
                }
                let deps = uses_of(&units);
                next.extend(deps.iter().filter(|d| seen.insert((*d).clone())).cloned());
                found.push(PackageSource {
                    ident,
                    dir,
                    units,
                    deps,
                });
            }
            wave = next;
        }
        Some(found)
    }

    fn analyze(
        &self,
        root: Unit,
        sources: Vec<PackageSource>,
        order: &[usize],
        comp: &mut Compilation,
    ) -> Program {
        let mut packages: Vec<Arc<Package>> = Vec::with_capacity(order.len());
        let mut package_units: Vec<Vec<Unit>> = Vec::with_capacity(order.len());
        let mut by_index: Vec<Option<PackageSource>> = sources.into_iter().map(Some).collect();
        for &index in order {
            let Some(source) = by_index.get_mut(index).and_then(Option::take) else {
                continue;
            };
            let (package, logs) =
                load_package(&source.ident, &source.dir, &source.units, &packages, &comp.sources);
            comp.logs.extend(logs);
            packages.push(Arc::new(package));
            package_units.push(source.units);
        }

        let roots = vec![root];
        let (sema, logs) = load_program(&roots, packages.clone(), &comp.sources);
        comp.logs.extend(logs);
        if let Some(log) = check_entry(&sema) {
            comp.logs.push(log);
        }

        let views: Vec<Sema> = packages.iter().map(|p| sema.for_package(p)).collect();
        let mut jobs: Vec<(usize, &Sema, &Unit)> = Vec::new();
        for (index, (view, units)) in views.iter().zip(&package_units).enumerate() {
            jobs.extend(units.iter().map(|unit| (index, view, unit)));
        }
        jobs.extend(roots.iter().map(|unit| (packages.len(), &sema, unit)));

        debug!(units = jobs.len(), "checking units");
        let sources = &comp.sources;
        let outputs: Vec<_> = jobs
            .par_iter()
            .map(|&(index, view, unit)| (index, check_unit(view, sources, unit)))
            .collect();

        let mut modules: Vec<Module> = packages
            .iter()
            .map(|p| Module::new(Some(p.ident.clone()), Arc::clone(&p.table)))
            .collect();
        modules.push(Module::new(None, Arc::clone(&sema.globals)));
        for (index, output) in outputs {
            comp.logs.extend(output.logs);
            if let Some(module) = modules.get_mut(index) {
                module.globals.extend(output.globals);
                module.fns.extend(output.fns);
            }
        }

        let root = modules.pop().unwrap_or_else(|| Module::new(None, Arc::clone(&sema.globals)));
        Program {
            packages: modules,
            root,
            entry: ENTRY_POINT.to_string(),
        }
    }
}

/// Parse already registered files concurrently. Parse errors are logged at
/// their position; `None` when any file failed.
fn parse_files(sources: &SourceMap, files: &[FileId], logs: &mut Vec<CompilerLog>) -> Option<Vec<Unit>> {
    let results: Vec<_> = files
        .par_iter()
        .map(|&file| {
            debug!(file = sources.path(file).unwrap_or_default(), "parsing");
            let text = sources.source(file).unwrap_or_default();
            (file, frontend::parse_source(text))
        })
        .collect();

    let mut units = Vec::with_capacity(results.len());
    let mut failed = false;
    for (file, result) in results {
        match result {
            Ok(ast) => units.push(Unit::new(file, ast)),
            Err(err) => {
                failed = true;
                let log = match err.span() {
                    Some(span) => CompilerLog::error(sources, Loc::new(file, span), err.message()),
                    None => CompilerLog::flat_error(err.message()),
                };
                logs.push(log);
            }
        }
    }
    (!failed).then_some(units)
}

/// Source files of a package directory, registered in name order
fn read_package_dir(ident: &str, dir: &Path, comp: &mut Compilation) -> Option<Vec<FileId>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(package = ident, dir = %dir.display(), error = %err, "package directory unreadable");
            comp.logs.push(CompilerLog::flat_error(format!(
                "package '{}' not found in the standard library",
                ident
            )));
            return None;
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.to_string_lossy().ends_with(SRC_EXT))
        .collect();
    paths.sort();

    let mut ids = Vec::with_capacity(paths.len());
    for path in paths {
        match std::fs::read_to_string(&path) {
            Ok(text) => ids.push(comp.sources.add(path.display().to_string(), text)),
            Err(err) => {
                comp.logs.push(CompilerLog::flat_error(format!(
                    "cannot read '{}': {}",
                    path.display(),
                    err
                )));
                return None;
            }
        }
    }
    Some(ids)
}

/// Distinct package names used by `units`, in first-use order
fn uses_of(units: &[Unit]) -> Vec<String> {
    let mut seen = HashSet::new();
    units
        .iter()
        .flat_map(|unit| &unit.ast.uses)
        .map(|u| u.name.name.clone())
        .filter(|ident| seen.insert(ident.clone()))
        .collect()
}

/// Indices of `packages` with every package after the packages it uses.
/// A cycle is a flat error.
fn package_order(packages: &[PackageSource], logs: &mut Vec<CompilerLog>) -> Option<Vec<usize>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    fn visit(
        index: usize,
        packages: &[PackageSource],
        by_name: &HashMap<&str, usize>,
        marks: &mut [Mark],
        path: &mut Vec<usize>,
        order: &mut Vec<usize>,
    ) -> Result<(), Vec<usize>> {
        match marks[index] {
            Mark::Done => return Ok(()),
            Mark::Active => {
                let start = path.iter().position(|&i| i == index).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(index);
                return Err(cycle);
            }
            Mark::New => {}
        }
        marks[index] = Mark::Active;
        path.push(index);
        for dep in &packages[index].deps {
            if let Some(&dep) = by_name.get(dep.as_str()) {
                visit(dep, packages, by_name, marks, path, order)?;
            }
        }
        path.pop();
        marks[index] = Mark::Done;
        order.push(index);
        Ok(())
    }

    let by_name: HashMap<&str, usize> = packages
        .iter()
        .enumerate()
        .map(|(i, p)| (p.ident.as_str(), i))
        .collect();
    let mut marks = vec![Mark::New; packages.len()];
    let mut order = Vec::with_capacity(packages.len());
    for index in 0..packages.len() {
        let mut path = Vec::new();
        if let Err(cycle) = visit(index, packages, &by_name, &mut marks, &mut path, &mut order) {
            let names: Vec<&str> = cycle.iter().map(|&i| packages[i].ident.as_str()).collect();
            logs.push(CompilerLog::flat_error(format!(
                "import cycle between packages: {}",
                names.join(" -> ")
            )));
            return None;
        }
    }
    Some(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::SourceUnit;
    use pretty_assertions::assert_eq;

    fn source(ident: &str, deps: &[&str]) -> PackageSource {
        PackageSource {
            ident: ident.to_string(),
            dir: PathBuf::from(ident),
            units: Vec::new(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn names(packages: &[PackageSource], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| packages[i].ident.clone()).collect()
    }

    #[test]
    fn test_package_order_follows_uses() {
        let packages = vec![source("app", &["fmt", "io"]), source("fmt", &["io"]), source("io", &[])];
        let mut logs = Vec::new();
        let order = package_order(&packages, &mut logs).unwrap();
        assert!(logs.is_empty());
        assert_eq!(names(&packages, &order), vec!["io", "fmt", "app"]);
    }

    #[test]
    fn test_package_cycle_is_flat_error() {
        let packages = vec![source("a", &["b"]), source("b", &["c"]), source("c", &["a"])];
        let mut logs = Vec::new();
        assert!(package_order(&packages, &mut logs).is_none());
        assert_eq!(
            logs.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["ERROR: import cycle between packages: a -> b -> c -> a"]
        );
    }

    #[test]
    fn test_uses_are_distinct() {
        let unit = |text: &str| Unit::new(0, frontend::parse_source(text).unwrap());
        let units = vec![unit("use io\nuse fmt\n"), unit("use io;\nuse math\n")];
        assert_eq!(uses_of(&units), vec!["io", "fmt", "math"]);
        let empty = Unit::new(0, SourceUnit {
            uses: Vec::new(),
            items: Vec::new(),
            span: Default::default(),
        });
        assert!(uses_of(&[empty]).is_empty());
    }

    #[test]
    fn test_parse_errors_are_positioned() {
        let mut sources = SourceMap::new();
        let good = sources.add("a.x", "fn main() {}\n");
        let bad = sources.add("b.x", "fn main( {}\n");
        let mut logs = Vec::new();
        assert!(parse_files(&sources, &[good, bad], &mut logs).is_none());
        assert_eq!(logs.len(), 1);
        assert!(logs[0].to_string().starts_with("ERROR: b.x:1:"), "{}", logs[0]);
    }
}
