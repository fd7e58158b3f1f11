//! Recall shell - drive an in-memory LRU cache one command per line

mod handler;
mod reply;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use recache::LruCache;
use tracing::{info, warn};

use crate::handler::CommandHandler;
use crate::reply::Reply;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of items)
    #[arg(short, long, default_value_t = 10)]
    capacity: usize,

    /// Read commands from a file instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Echo each command before its reply
    #[arg(long)]
    echo: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: tracing::Level,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout only carries replies
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(args.log_level.into()),
        )
        .init();

    let cache = LruCache::new(args.capacity)
        .with_context(|| format!("invalid --capacity {}", args.capacity))?;
    info!("Cache capacity: {}", args.capacity);

    let mut handler = CommandHandler::new(cache);
    let stdout = io::stdout();
    let mut output = stdout.lock();

    match &args.script {
        Some(path) => {
            info!("Reading commands from {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            run(&mut handler, BufReader::new(file), &mut output, args.echo)
        }
        None => run(&mut handler, io::stdin().lock(), &mut output, args.echo),
    }
}

/// Feed every line of `input` to the handler, writing one reply per command
fn run<R: BufRead, W: Write>(
    handler: &mut CommandHandler,
    input: R,
    output: &mut W,
    echo: bool,
) -> Result<()> {
    for line in input.lines() {
        let line = line.context("failed to read command")?;
        let Some(reply) = handler.handle(&line) else {
            continue;
        };

        if echo {
            writeln!(output, "> {}", line.trim())?;
        }
        if let Reply::Error(msg) = &reply {
            warn!("{}", msg);
        }
        if reply == Reply::Quit {
            break;
        }
        writeln!(output, "{}", reply)?;
    }

    output.flush()?;
    Ok(())
}
