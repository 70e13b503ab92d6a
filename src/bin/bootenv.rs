//! bootenv CLI
//!
//! Prints or edits a redundant boot environment on a device or image file.
//! Edits (`-a`, `-d`) are applied in command-line order.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use bootenv::config::{DEFAULT_ALTERNATE_OFFSET, DEFAULT_BLOCK_SIZE, DEFAULT_DEVICE, DEFAULT_PRIMARY_OFFSET};
use bootenv::{Config, EnvError, EnvStore};
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use tracing_subscriber::{fmt, EnvFilter};

/// bootenv
#[derive(Parser, Debug)]
#[command(name = "bootenv")]
#[command(about = "Inspect and edit a redundant boot environment")]
#[command(version)]
struct Args {
    /// Image or device to modify
    #[arg(short = 'i', long, default_value = DEFAULT_DEVICE)]
    device: PathBuf,

    /// Print variables and do not update the device
    #[arg(short, long)]
    print: bool,

    /// Variable to add or update
    #[arg(
        short,
        long,
        num_args = 2,
        value_names = ["KEY", "VALUE"],
        allow_hyphen_values = true,
        action = ArgAction::Append
    )]
    add: Vec<String>,

    /// Variable to remove
    #[arg(short, long, value_name = "KEY", action = ArgAction::Append)]
    delete: Vec<String>,

    /// Block size in bytes (decimal or 0x hex)
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE as u64, value_parser = parse_number)]
    size: u64,

    /// Offset of the primary block
    #[arg(long, default_value_t = DEFAULT_PRIMARY_OFFSET, value_parser = parse_number)]
    primary: u64,

    /// Offset of the alternate block
    #[arg(long, default_value_t = DEFAULT_ALTERNATE_OFFSET, value_parser = parse_number)]
    alternate: u64,

    /// More log output (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// One requested change, in command-line order
#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    Add { key: String, value: String },
    Delete { key: String },
}

fn main() -> ExitCode {
    let matches = Args::command().get_matches();
    let args = match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    };

    init_tracing(args.verbose);

    let edits = ordered_edits(&matches);

    match run(&args, edits) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}: {}", args.device.display(), e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn,bootenv=info",
        1 => "info,bootenv=debug",
        _ => "debug,bootenv=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args, edits: Vec<Edit>) -> bootenv::Result<()> {
    let block_size = usize::try_from(args.size)
        .map_err(|_| EnvError::Config(format!("block size {:#x} too large", args.size)))?;

    let config = Config::builder()
        .device(&args.device)
        .block_size(block_size)
        .primary_offset(args.primary)
        .alternate_offset(args.alternate)
        .build();

    let mut store = EnvStore::new(config)?;

    let mut device = OpenOptions::new()
        .read(true)
        .write(!args.print)
        .open(&args.device)?;

    store.load(&mut device)?;

    for edit in edits {
        match edit {
            Edit::Add { key, value } => store.upsert(key, value)?,
            Edit::Delete { key } => store.remove(&key)?,
        }
    }

    if args.print {
        let stdout = io::stdout();
        store.write_entries(&mut stdout.lock())?;
        return Ok(());
    }

    store.save(&mut device)?;
    tracing::info!("completed update");

    Ok(())
}

/// Merge `-a` and `-d` occurrences back into command-line order
fn ordered_edits(matches: &ArgMatches) -> Vec<Edit> {
    let mut edits: Vec<(usize, Edit)> = Vec::new();

    if let (Some(values), Some(indices)) = (
        matches.get_many::<String>("add"),
        matches.indices_of("add"),
    ) {
        let values: Vec<&String> = values.collect();
        let indices: Vec<usize> = indices.collect();
        for (pair, at) in values.chunks(2).zip(indices.chunks(2)) {
            if let [key, value] = pair {
                edits.push((
                    at[0],
                    Edit::Add {
                        key: key.to_string(),
                        value: value.to_string(),
                    },
                ));
            }
        }
    }

    if let (Some(values), Some(indices)) = (
        matches.get_many::<String>("delete"),
        matches.indices_of("delete"),
    ) {
        for (key, at) in values.zip(indices) {
            edits.push((at, Edit::Delete { key: key.to_string() }));
        }
    }

    edits.sort_by_key(|(at, _)| *at);
    edits.into_iter().map(|(_, edit)| edit).collect()
}

/// Parse a decimal or `0x`-prefixed hexadecimal number
fn parse_number(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number {:?}: {}", s, e))
}
