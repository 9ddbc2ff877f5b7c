//! mocache: inspect and exercise translation caches from the shell.
//!
//! Build: `cargo build --bin mocache --features cli`

use std::path::PathBuf;
use std::process;

use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mocache::config::ConfigFile;
use mocache::snapshot::read_snapshot;
use mocache::{TranslationCache, TranslationCacheBuilder};

/// mocache CLI
#[derive(Parser)]
#[command(name = "mocache")]
#[command(version = mocache::PKG_VERSION)]
#[command(about = "Persistent translation lookup cache")]
struct Args {
    /// Config file path
    #[arg(short, long, env = "MOCACHE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Identifies one cache: a domain and its catalog.
#[derive(ClapArgs)]
struct Target {
    /// Text domain
    #[arg(short, long)]
    domain: String,
    /// Compiled catalog (.mo)
    #[arg(long)]
    catalog: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Translate a text through the cache and persist the result
    Lookup {
        #[command(flatten)]
        target: Target,
        /// Message context
        #[arg(long)]
        context: Option<String>,
        /// Plural source text (requires --count)
        #[arg(long, requires = "count")]
        plural: Option<String>,
        /// Count selecting the plural form
        #[arg(long, requires = "plural")]
        count: Option<u64>,
        /// Source text
        text: String,
    },

    /// Print the snapshot path for a domain and catalog
    Path {
        #[command(flatten)]
        target: Target,
    },

    /// Validate a snapshot file and summarise it
    Inspect {
        /// Snapshot file
        snapshot: PathBuf,
        /// Also print every entry
        #[arg(long)]
        entries: bool,
    },

    /// Delete the snapshot for a domain and catalog
    Clear {
        #[command(flatten)]
        target: Target,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::load(args.config.as_deref())?.cache;
    let builder = |target: Target| {
        TranslationCache::builder(target.domain, target.catalog).config(config.clone())
    };

    match args.command {
        Command::Lookup {
            target,
            context,
            plural,
            count,
            text,
        } => {
            let cache = builder(target).build()?;
            let answer = match (plural, count) {
                (Some(plural), Some(count)) => {
                    cache.translate_plural(&text, &plural, count, context.as_deref())
                }
                _ => cache.translate(&text, context.as_deref()),
            };
            println!("{answer}");
            if let mocache::PersistOutcome::Failed { reason } = cache.close() {
                eprintln!("warning: snapshot not written: {reason}");
            }
        }

        Command::Path { target } => {
            println!("{}", builder(target).snapshot_path()?.display());
        }

        Command::Inspect { snapshot, entries } => {
            inspect(&snapshot, entries)?;
        }

        Command::Clear { target } => {
            clear(builder(target))?;
        }
    }

    Ok(())
}

fn inspect(path: &std::path::Path, show_entries: bool) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = read_snapshot(path)?;
    println!("version:       {}", snapshot.version);
    println!("domain:        {}", snapshot.domain);
    match snapshot.catalog_mtime_ns {
        Some(mtime) => println!("catalog mtime: {mtime} ns"),
        None => println!("catalog mtime: (none, never trusted)"),
    }
    println!("entries:       {}", snapshot.entries.len());
    if show_entries {
        for (key, value) in &snapshot.entries {
            println!("  {key}  {value:?}");
        }
    }
    Ok(())
}

fn clear(builder: TranslationCacheBuilder) -> Result<(), Box<dyn std::error::Error>> {
    let path = builder.snapshot_path()?;
    match std::fs::remove_file(&path) {
        Ok(()) => println!("removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("no snapshot at {}", path.display())
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
