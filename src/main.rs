use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use treelox as lox;

use lox::error::LoxError;
use lox::interpreter::Interpreter;
use lox::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking Lox interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Runs input from a file as a program
    Run { filename: PathBuf },

    /// Starts an interactive session with a persistent global environment
    Repl,
}

/// Reads the contents of a file into a Vec<u8>
fn read_file(filename: &PathBuf) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Write to file with module path and source line per record.
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("treelox::")
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
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Report all diagnostics of one run and pick the host exit code:
/// 65 for static errors, 70 when any runtime error occurred.
fn report_errors(errors: &[LoxError]) -> i32 {
    let mut code = 65;

    for e in errors {
        debug!("Reported diagnostic: {}", e);
        eprintln!("{}", e);

        if matches!(e, LoxError::Runtime { .. }) {
            code = 70;
        }
    }

    code
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename } => {
            info!("Running Tokenize subcommand");
            let buf = read_file(&filename)?;
            let mut tokenized = true;

            for token in Scanner::new(&buf) {
                match token {
                    Ok(token) => {
                        println!("{}", token);
                    }

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

            info!("Tokenization completed successfully");
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");
            let buf = read_file(&filename)?;

            let mut interpreter = Interpreter::new();

            if let Err(errors) = lox::run_source(&mut interpreter, &buf) {
                let code = report_errors(&errors);
                std::process::exit(code);
            }

            info!("Program executed successfully");
        }

        Commands::Repl => {
            info!("Starting interactive session");

            // One interpreter for the whole session: definitions persist
            // across lines, and an error on one line does not prevent the
            // next from being attempted.
            let mut interpreter = Interpreter::new();
            let stdin = std::io::stdin();

            print!("> ");
            std::io::stdout().flush()?;

            for line in stdin.lock().lines() {
                let line = line?;

                if let Err(errors) = lox::run_source(&mut interpreter, line.as_bytes()) {
                    report_errors(&errors);
                }

                print!("> ");
                std::io::stdout().flush()?;
            }

            info!("Interactive session ended");
        }
    }

    Ok(())
}
