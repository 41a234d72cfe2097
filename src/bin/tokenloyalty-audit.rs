use std::{
    fs,
    path::{Path, PathBuf},
    process,
};

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tokenloyalty::{export::StateExport, ledger::replay_balances, EntryKind};

/// Replays the ledger of an exported session and checks it against the
/// exported balances.
#[derive(Parser)]
#[command(name = "tokenloyalty-audit", version)]
struct Cli {
    /// Export or session file to inspect
    file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let default = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();

    match audit(&cli.file) {
        Ok(0) => {}
        Ok(_) => process::exit(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(2);
        }
    }
}

/// Returns the number of mismatching programs.
fn audit(path: &Path) -> Result<usize> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let doc = StateExport::from_json_slice(&bytes)
        .with_context(|| format!("parsing {}", path.display()))?;
    debug!(entries = doc.ledger.len(), programs = doc.programs.len(), "export loaded");

    // exported ledger is most recent first
    let replayed = replay_balances(doc.ledger.iter().rev())
        .with_context(|| format!("replaying ledger of {}", path.display()))?;

    let mut ids: Vec<_> = doc.balances.keys().chain(replayed.keys()).collect();
    ids.sort();
    ids.dedup();

    let mut mismatches = 0usize;
    for id in ids {
        let exported = doc.balances.get(id).copied().unwrap_or(Decimal::ZERO);
        let computed = replayed.get(id).copied().unwrap_or(Decimal::ZERO);
        let symbol = doc
            .programs
            .iter()
            .find(|p| &p.id == id)
            .map(|p| p.token_symbol.as_str())
            .unwrap_or("-");
        if exported == computed {
            println!("OK       {symbol:<6} {id}  {exported} pts");
        } else {
            mismatches += 1;
            println!("MISMATCH {symbol:<6} {id}  exported {exported} pts, ledger says {computed} pts");
        }
    }

    let issued = doc.ledger.iter().filter(|e| e.kind == EntryKind::Issue).count();
    println!(
        "{} entries ({} issue, {} redeem), {} mismatch(es)",
        doc.ledger.len(),
        issued,
        doc.ledger.len() - issued,
        mismatches
    );
    Ok(mismatches)
}
