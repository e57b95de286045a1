//! End-to-end tests of the compilation pipeline

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use x_compiler::config::{CompilerContext, Settings};
use x_compiler::driver::{Compilation, Pipeline};

/// Temporary project: an executable directory with `std/` and a work dir
struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("bin/std")).unwrap();
        fs::create_dir_all(dir.path().join("work")).unwrap();
        Self { dir }
    }

    fn package(&self, ident: &str, files: &[(&str, &str)]) -> &Self {
        let dir = self.dir.path().join("bin/std").join(ident);
        fs::create_dir_all(&dir).unwrap();
        for (name, text) in files {
            fs::write(dir.join(name), text).unwrap();
        }
        self
    }

    fn main(&self, text: &str) -> PathBuf {
        let path = self.work().join("main.x");
        fs::write(&path, text).unwrap();
        path
    }

    fn work(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    fn context(&self) -> CompilerContext {
        CompilerContext::new(self.dir.path().join("bin"), Settings::default())
    }

    fn build(&self, text: &str) -> (Compilation, Option<PathBuf>) {
        let input = self.main(text);
        let ctx = self.context();
        Pipeline::new(&ctx).build(&input, &self.work()).unwrap()
    }
}

/// Log lines without the directory part of paths
fn messages(compilation: &Compilation, root: &Path) -> Vec<String> {
    let prefix = format!("{}/", root.display());
    compilation
        .logs
        .iter()
        .map(|log| log.to_string().replace(&prefix, ""))
        .collect()
}

#[test]
fn test_hello_world_is_written() {
    let project = Project::new();
    let (compilation, written) = project.build("fn main() {\n  outln(\"hello\")\n}\n");

    assert!(compilation.logs.is_empty(), "{:?}", compilation.logs);
    let path = written.unwrap();
    assert_eq!(path, project.work().join("./dist/").join("x.cxx"));

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("// Auto generated by X compiler."));
    assert!(text.contains("void _main();\n"));
    assert!(text.contains("void _main() {\n  _outln(str(L\"hello\"));\n}\n"));
    assert!(text.contains("setlocale(0x0, \"\");"));
}

#[test]
fn test_missing_stdlib_halts() {
    let project = Project::new();
    let input = project.main("fn main() {}\n");
    let ctx = project.context().with_stdlib(project.dir.path().join("nowhere"));
    let compilation = Pipeline::new(&ctx).compile(&input);
    assert_eq!(
        messages(&compilation, project.dir.path()),
        vec!["ERROR: standard library directory not found"]
    );
    assert!(compilation.output.is_none());
    assert!(compilation.sources.is_empty());
}

#[test]
fn test_package_use() {
    let project = Project::new();
    project.package(
        "geo",
        &[(
            "point.x",
            "struct Point { x f64, y f64 }\n\
             fn origin() Point { return Point(0.0, 0.0) }\n",
        )],
    );
    let (compilation, written) = project.build(
        "use geo\n\
         fn main() {\n\
         \x20 var p geo::Point = geo::origin();\n\
         \x20 outln(p.x)\n\
         }\n",
    );
    assert!(compilation.logs.is_empty(), "{:?}", compilation.logs);

    let text = fs::read_to_string(written.unwrap()).unwrap();
    let namespace = text.find("namespace geo {").unwrap();
    let main = text.find("void _main() {").unwrap();
    assert!(namespace < main);
    assert!(text.contains("\n::geo::_Point _origin();\n"), "{}", text);
    assert!(text.contains("::geo::_Point _p = ::geo::_origin();"));
    assert!(text.contains("} // namespace geo"));
}

#[test]
fn test_transitive_package_needs_use() {
    let project = Project::new();
    project
        .package("geo", &[("geo.x", "var unit = 1.0\n")])
        .package("shapes", &[("shapes.x", "use geo\nfn scale() f64 { return geo::unit }\n")]);
    let (compilation, written) = project.build(
        "use shapes\n\
         fn main() {\n\
         \x20 outln(shapes::scale());\n\
         \x20 outln(geo::unit)\n\
         }\n",
    );
    assert!(written.is_none());
    assert_eq!(
        messages(&compilation, project.dir.path()),
        vec!["ERROR: work/main.x:4:9 package 'geo' is used without `use geo`"]
    );
}

#[test]
fn test_parse_error_stops_compilation() {
    let project = Project::new();
    let (compilation, written) = project.build("fn main() {\n  var = 1\n}\n");
    assert!(written.is_none());
    assert!(compilation.output.is_none());
    let logs = messages(&compilation, project.dir.path());
    assert_eq!(logs.len(), 1);
    assert!(logs[0].starts_with("ERROR: work/main.x:2:"), "{:?}", logs);
}

#[test]
fn test_semantic_errors_suppress_output() {
    let project = Project::new();
    let (compilation, written) = project.build("fn main() {\n  outln(missing)\n}\n");
    assert!(written.is_none());
    assert!(!project.work().join("dist").exists());
    assert_eq!(
        messages(&compilation, project.dir.path()),
        vec!["ERROR: work/main.x:2:9 undefined identifier 'missing'"]
    );
}

#[test]
fn test_entry_point_required() {
    let project = Project::new();
    let (compilation, _) = project.build("fn start() {}\n");
    assert_eq!(
        messages(&compilation, project.dir.path()),
        vec!["ERROR: entry point 'main' is not defined"]
    );
}

#[test]
fn test_package_environment_errors() {
    let project = Project::new();
    let (compilation, _) = project.build("use nope\nfn main() {}\n");
    assert_eq!(
        messages(&compilation, project.dir.path()),
        vec!["ERROR: package 'nope' not found in the standard library"]
    );

    project
        .package("a", &[("a.x", "use b\n")])
        .package("b", &[("b.x", "use a\n")]);
    let (compilation, _) = project.build("use a\nfn main() {}\n");
    assert_eq!(
        messages(&compilation, project.dir.path()),
        vec!["ERROR: import cycle between packages: a -> b -> a"]
    );
}

#[test]
fn test_empty_package_warns() {
    let project = Project::new();
    project.package("io", &[]);
    let (compilation, written) = project.build("use io\nfn main() {}\n");
    assert!(written.is_some());
    assert_eq!(
        messages(&compilation, project.dir.path()),
        vec!["WARNING: package 'io' is empty"]
    );
}

#[test]
fn test_custom_output_location() {
    let project = Project::new();
    let input = project.main("fn main() {}\n");
    let settings = Settings {
        cxx_out_dir: "gen".to_string(),
        cxx_out_name: "app.cpp".to_string(),
        ..Settings::default()
    };
    let ctx = CompilerContext::new(project.dir.path().join("bin"), settings);
    let (_, written) = Pipeline::new(&ctx).build(&input, &project.work()).unwrap();
    assert_eq!(written.unwrap(), project.work().join("gen/app.cpp"));
    assert!(project.work().join("gen/app.cpp").is_file());
}

#[test]
fn test_most_negative_i64_literal() {
    let project = Project::new();
    let (compilation, written) = project.build("fn main() {\n  var x i64 = -0x8000000000000000;\n  outln(x)\n}\n");
    assert!(compilation.logs.is_empty(), "{:?}", compilation.logs);

    let text = fs::read_to_string(written.unwrap()).unwrap();
    assert!(text.contains("i64 _x = (-9223372036854775807LL - 1);"), "{}", text);
}

#[test]
fn test_out_of_range_literal_is_logged() {
    let project = Project::new();
    let (compilation, written) = project.build("fn main() {\n  var x i64 = 9223372036854775808\n}\n");
    assert!(written.is_none());
    assert_eq!(
        messages(&compilation, project.dir.path()),
        vec!["ERROR: work/main.x:2:15 constant 9223372036854775808 overflows i64"]
    );
}
