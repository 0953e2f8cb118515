//! lrush - command shell for an in-process LRU cache

mod command;
mod handler;
mod reply;
mod shell;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fmt::Display;
use std::fs::File;
use std::hash::Hash;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::handler::CommandHandler;

/// Key type the cache is instantiated with
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum KeyKind {
    /// Arbitrary text keys
    String,
    /// 64-bit unsigned integer keys
    U64,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of items)
    #[arg(short, long, default_value_t = 1024)]
    capacity: usize,

    /// Key type
    #[arg(short, long, value_enum, default_value_t = KeyKind::String)]
    keys: KeyKind,

    /// Read commands from a file instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries replies only
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(args.log_level.into()),
        )
        .init();

    info!("Starting lrush v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", args.capacity);
    info!("Key type: {:?}", args.keys);

    let input = open_input(args.script.as_deref())?;

    let executed = match args.keys {
        KeyKind::String => serve::<String>(args.capacity, input)?,
        KeyKind::U64 => serve::<u64>(args.capacity, input)?,
    };

    info!("Executed {} commands", executed);
    Ok(())
}

fn open_input(script: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            info!("Reading commands from {}", path.display());
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn serve<K>(capacity: usize, input: Box<dyn BufRead>) -> Result<usize>
where
    K: FromStr + Display + Hash + Eq + Clone + 'static,
{
    let mut handler = CommandHandler::<K>::new(capacity).context("invalid cache configuration")?;
    let mut stdout = io::stdout().lock();
    let executed = shell::run(&mut handler, input, &mut stdout)?;
    Ok(executed)
}
