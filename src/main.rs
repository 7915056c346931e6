use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use monkey_interpreter as monkey;

use monkey::environment::Environment;
use monkey::error::MonkeyError;
use monkey::interpreter::Interpreter;
use monkey::parser;
use monkey::repl;
use monkey::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Monkey language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Starts an interactive session (the default)
    Repl,

    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses input from a file and prints its syntax tree as JSON
    Parse { filename: PathBuf },

    /// Runs input from a file as a Monkey program and prints the result
    Run { filename: PathBuf },
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    let text = String::from_utf8(buf)
        .map_err(MonkeyError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?;

    Ok(text)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'monkey_interpreter::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("monkey_interpreter::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn print_errors(errors: &[MonkeyError]) {
    for e in errors {
        debug!("Front-end error: {}", e);
        eprintln!("\t{}", e);
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands.unwrap_or(Commands::Repl) {
        Commands::Repl => {
            info!("Running Repl subcommand");
            let stdin = io::stdin();
            repl::start(stdin.lock(), io::stdout())?;
        }

        Commands::Tokenize { filename } => {
            info!("Running Tokenize subcommand");
            let source = read_file(filename)?;
            let mut tokenized = true;

            for token in Scanner::new(&source) {
                match token {
                    Ok(token) => println!("{}", token),
                    Err(e) => {
                        tokenized = false;
                        eprintln!("{}", e);
                    }
                }
            }

            if !tokenized {
                debug!("Tokenization failed, exiting with code 65");
                std::process::exit(65);
            }
        }

        Commands::Parse { filename } => {
            info!("Running Parse subcommand");
            let source = read_file(filename)?;

            match parser::parse(&source) {
                Ok(program) => {
                    let json = serde_json::to_string_pretty(&program)
                        .context("Failed to serialize syntax tree")?;
                    println!("{}", json);
                }
                Err(errors) => {
                    print_errors(&errors);
                    std::process::exit(65);
                }
            }
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");
            let source = read_file(filename)?;

            let program = match parser::parse(&source) {
                Ok(program) => program,
                Err(errors) => {
                    print_errors(&errors);
                    std::process::exit(65);
                }
            };

            let env = Environment::new_global();
            let mut interpreter = Interpreter::new();
            let value = interpreter.evaluate(&program, &env);

            println!("{}", value);

            if value.is_error() {
                debug!("Runtime error, exiting with code 70");
                std::process::exit(70);
            }
        }
    }

    Ok(())
}
