//! xc - X to C++ compiler
//!
//! Usage: xc build <input> [--stdlib <dir>] [--settings <file>]

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use x_compiler::common::DiagnosticReporter;
use x_compiler::config::{CompilerContext, Settings, SETTINGS_FILE, VERSION};
use x_compiler::driver::Pipeline;
use x_compiler::frontend::FrontendConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(ClapParser, Debug)]
#[command(name = "xc")]
#[command(author = "The X Programming Language Authors")]
#[command(version = VERSION)]
#[command(about = "Compiles X programs to C++", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level of compiler internals (overridden per module by RUST_LOG)
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transpile a source file to C++
    Build {
        /// Input source file (.x)
        input: PathBuf,

        /// Standard library directory (default: `std` next to the executable)
        #[arg(long)]
        stdlib: Option<PathBuf>,

        /// Settings file
        #[arg(long, default_value = SETTINGS_FILE)]
        settings: PathBuf,

        /// Dump tokens (for debugging)
        #[arg(long)]
        dump_tokens: bool,

        /// Dump AST (for debugging)
        #[arg(long)]
        dump_ast: bool,
    },
    /// Write a default settings file into the current directory
    Init,
    /// Print the compiler version
    Version,
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::from_default_env().add_directive(args.log_level.as_tracing_level().into());
    let subscriber = tracing_subscriber::registry().with(filter);
    if args.log_json {
        subscriber.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        subscriber.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    match &args.command {
        Command::Version => {
            println!("xc {}", VERSION);
            Ok(ExitCode::SUCCESS)
        }
        Command::Init => {
            let cwd = std::env::current_dir().context("cannot determine the current directory")?;
            let path = Settings::write_default(&cwd)?;
            println!("created {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Build {
            input,
            stdlib,
            settings,
            dump_tokens,
            dump_ast,
        } => {
            let settings = Settings::load_or_default(settings)?;
            let mut ctx = CompilerContext::new(exec_dir()?, settings);
            if let Some(stdlib) = stdlib {
                ctx = ctx.with_stdlib(stdlib);
            }

            let pipeline = Pipeline::new(&ctx).with_frontend_config(FrontendConfig {
                dump_tokens: *dump_tokens,
                dump_ast: *dump_ast,
            });
            let cwd = std::env::current_dir().context("cannot determine the current directory")?;
            let (compilation, written) = pipeline
                .build(input, &cwd)
                .with_context(|| format!("failed to write output for {}", input.display()))?;

            for dump in &compilation.dumps {
                eprintln!("{}", dump);
            }
            let reporter = DiagnosticReporter::new();
            if reporter.report_all(&compilation.sources, &compilation.logs) {
                return Ok(ExitCode::FAILURE);
            }
            if let Some(path) = written {
                eprintln!("compiled {} -> {}", input.display(), path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Directory holding the running executable
fn exec_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot locate the compiler executable")?;
    Ok(exe.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf))
}
