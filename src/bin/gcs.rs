//! `gcs` — build and query Golomb Compressed Set filters from the command
//! line.
//!
//! This binary is thin argument-parsing glue over `gcs_filter`; all of the
//! codec logic lives in the library (spec §1, "out of scope: the
//! command-line front end").

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use gcs_filter::{GcsBuilder, GcsFilter, HashId, InputMode};

#[derive(Parser, Debug)]
#[command(name = "gcs", about = "Golomb Compressed Set filter builder/query tool")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a filter from a list of input items.
    Create {
        /// How to interpret each input line before hashing.
        #[arg(long = "hash", value_enum)]
        mode: ModeArg,
        /// Inverse false-positive rate (must be >= 2).
        #[arg(short = 'p', long = "p")]
        p: u64,
        /// Input file, or "-" to read from stdin.
        input: String,
        /// Output filter file to write.
        output: PathBuf,
    },
    /// Query an existing filter, reading probes from stdin.
    Query {
        /// Filter file produced by `create`.
        file: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Raw,
    Hex,
}

impl From<ModeArg> for InputMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Raw => InputMode::Raw,
            ModeArg::Hex => InputMode::Hex,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gcs=info")),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Create {
            mode,
            p,
            input,
            output,
        } => run_create(mode.into(), p, &input, &output),
        Command::Query { file } => run_query(&file),
    }
}

fn run_create(mode: InputMode, p: u64, input: &str, output: &PathBuf) -> ExitCode {
    let mut builder = match GcsBuilder::new(HashId::SipHash24, p) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("gcs: {e}");
            return ExitCode::FAILURE;
        }
    };

    let reader: Box<dyn BufRead> = if input == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        match File::open(input) {
            Ok(f) => Box::new(BufReader::new(f)),
            Err(e) => {
                eprintln!("gcs: cannot open input {input}: {e}");
                return ExitCode::FAILURE;
            }
        }
    };

    for (i, line) in reader.lines().enumerate() {
        let line_no = (i + 1) as u64;
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("gcs: read error at line {line_no}: {e}");
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = builder.ingest_line(mode, &line, line_no) {
            eprintln!("gcs: {e}");
            return ExitCode::FAILURE;
        }
    }
    info!(items = builder.len(), "ingested input");

    let out_file = match File::create(output) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("gcs: cannot create output {}: {e}", output.display());
            return ExitCode::FAILURE;
        }
    };
    match builder.finish(out_file) {
        Ok(bytes) => {
            info!(bytes, "wrote filter");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("gcs: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_query(file: &PathBuf) -> ExitCode {
    let filter = match GcsFilter::open(file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("gcs: cannot open {}: {e}", file.display());
            return ExitCode::FAILURE;
        }
    };
    info!(p = filter.p(), "filter opened");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("stdin read error: {e}");
                break;
            }
        };
        let start = Instant::now();
        let found = filter.contains(line.as_bytes());
        let elapsed = start.elapsed();
        let _ = writeln!(
            out,
            "{} ({:.3?})",
            if found { "Found" } else { "Not found" },
            elapsed
        );
    }
    ExitCode::SUCCESS
}
