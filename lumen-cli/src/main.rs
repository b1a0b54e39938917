use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lumen_core::natives::argument;
use lumen_core::{HostFunction, Limits, NativeFunction, Value, load_scripts, parse, tokenize};

/// Command line interface of the Lumen interpreter.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Script file, or a directory whose `.lm` scripts are run in order.
    /// Reads standard input when omitted.
    input: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Emit::Value, help = "What to print")]
    emit: Emit,

    #[arg(long, value_name = "N", help = "Maximum number of nested contexts")]
    max_depth: Option<usize>,

    #[arg(long, value_name = "N", help = "Maximum iterations of a single loop")]
    max_iterations: Option<usize>,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Final value of the program.
    Value,
    /// Parsed syntax tree.
    Ast,
    /// One token per line.
    Tokens,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn execute(cli: Cli) -> Result<()> {
    let mut limits = Limits::default();
    if let Some(depth) = cli.max_depth {
        limits.max_depth = depth;
    }
    if let Some(iterations) = cli.max_iterations {
        limits.max_loop_iterations = iterations;
    }

    match &cli.input {
        Some(path) if path.is_dir() => {
            let scripts = load_scripts(path)
                .with_context(|| format!("failed to load scripts from {}", path.display()))?;
            for script in scripts {
                println!("== {}", script.path.display());
                emit(&script.contents, cli.emit, limits)
                    .with_context(|| format!("in {}", script.path.display()))?;
            }
        }
        Some(path) => {
            let source = read_file(path)?;
            emit(&source, cli.emit, limits)?;
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read standard input")?;
            emit(&buffer, cli.emit, limits)?;
        }
    }

    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))
}

fn emit(source: &str, emit: Emit, limits: Limits) -> Result<()> {
    match emit {
        Emit::Tokens => {
            for token in tokenize(source)? {
                println!("{token}");
            }
        }
        Emit::Ast => {
            let program = parse(source)?;
            println!("{program:#?}");
        }
        Emit::Value => {
            let value = lumen_core::run(source, host_natives(), limits)?;
            println!("{value}");
        }
    }
    Ok(())
}

/// Natives the CLI registers for every program.
fn host_natives() -> Vec<Rc<dyn NativeFunction>> {
    let print = HostFunction::new("print", &["value"], |_, context| {
        println!("{}", argument(context, "value"));
        Ok(Value::Null)
    });
    let debug = HostFunction::new("debug", &["value"], |_, context| {
        let value = argument(context, "value");
        eprintln!("[debug] {value:?}");
        Ok(value)
    });
    vec![Rc::new(print), Rc::new(debug)]
}
