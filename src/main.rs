use std::{path::PathBuf, process};

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use tokenloyalty::{
    conversion::points_per_currency_unit,
    export::{export_session, load_session, save_session, DirectorySink},
    Command, EntryKind, LoyaltyError, Network, Outcome, ProgramDraft, ProgramId, Session,
};

//==================== CLI surface ====================//

#[derive(Parser)]
#[command(name = "tokenloyalty")]
#[command(version, about = "Tokenized loyalty demo: issue and redeem fixed-value points", long_about = None)]
struct Cli {
    /// Session file, reloaded and written back on every command
    #[arg(long, global = true, default_value = "tokenloyalty-session.json")]
    state: PathBuf,

    /// Seed for mock wallet addresses and program ids
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Connect a mock wallet (demo, evm or solana)
    Connect {
        #[arg(long, default_value = "demo")]
        network: Network,
    },
    /// Forget the connected wallet
    Disconnect,
    /// List loyalty programs
    Programs,
    /// Create a loyalty program and select it
    Create(ProgramArgs),
    /// Replace the economics of an existing program
    Update {
        id: String,
        #[command(flatten)]
        program: ProgramArgs,
    },
    /// Delete a program definition (its history is kept)
    Remove { id: String },
    /// Make a program the active one
    Select { id: String },
    /// Preview the points a purchase would earn
    Quote {
        #[arg(allow_hyphen_values = true)]
        amount: Decimal,
        #[arg(long)]
        program: Option<String>,
    },
    /// Simulate a purchase and issue the earned points
    Issue {
        #[arg(allow_hyphen_values = true)]
        amount: Decimal,
        #[arg(long)]
        program: Option<String>,
    },
    /// Redeem points for their fixed currency value
    Redeem {
        #[arg(allow_hyphen_values = true)]
        points: Decimal,
        #[arg(long)]
        program: Option<String>,
    },
    /// Balances with redeemable value and liability estimate
    Balances,
    /// Show the ledger, most recent first
    Ledger {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Write a JSON snapshot of the session
    Export {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Restore the seed programs and clear balances and ledger
    Reset,
}

#[derive(Args)]
struct ProgramArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    symbol: String,
    /// Cents of value per point (clamped to at least 1)
    #[arg(long, default_value_t = 100, allow_hyphen_values = true)]
    cents_per_point: i64,
    /// Percent of purchase value returned as points
    #[arg(long, default_value = "5", allow_hyphen_values = true)]
    earn_rate: Decimal,
    /// Modeled unredeemed percent, used only for the liability estimate
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    breakage: Decimal,
}

impl From<ProgramArgs> for ProgramDraft {
    fn from(args: ProgramArgs) -> Self {
        ProgramDraft {
            name: args.name,
            token_symbol: args.symbol,
            fixed_cents_per_point: args.cents_per_point,
            earn_rate_pct: args.earn_rate,
            breakage_pct: args.breakage,
        }
    }
}

//==================== read-only views ====================//

fn print_programs(session: &Session) {
    let selected = session.registry().selected_id();
    for p in session.registry().list() {
        let marker = if Some(&p.id) == selected { "*" } else { " " };
        println!(
            "{marker} {:<38} {:<24} {:<6} {:>5}¢/pt  {:>8} pts/$  earn {}%  breakage {}%",
            p.id.as_str(),
            p.name,
            p.token_symbol,
            p.fixed_cents_per_point,
            points_per_currency_unit(p).round_dp(2),
            p.earn_rate_pct,
            p.breakage_pct,
        );
    }
}

fn print_balances(session: &Session) -> Result<()> {
    match session.wallet() {
        Some(w) => println!("wallet: {} ({})", w.short_address(), w.network.label()),
        None => println!("wallet: not connected"),
    }
    for row in session.summaries()? {
        println!(
            "{:<6} {:>12} pts  redeemable ${:.2}  est. liability ${:.2}",
            row.program.token_symbol, row.balance, row.redeemable_usd, row.estimated_liability
        );
    }
    let orphaned = session
        .ledger()
        .balances()
        .iter()
        .filter(|(id, _)| session.registry().get(id).is_none());
    for (id, balance) in orphaned {
        println!("{:<6} {:>12} pts  (program {id} removed)", "-", balance);
    }
    Ok(())
}

fn print_ledger(session: &Session, limit: Option<usize>) {
    if session.ledger().is_empty() {
        println!("ledger is empty");
        return;
    }
    let limit = limit.unwrap_or(usize::MAX);
    for entry in session.ledger().entries().take(limit) {
        let when = Utc
            .timestamp_millis_opt(entry.ts)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| entry.ts.to_string());
        let kind = match entry.kind {
            EntryKind::Issue => "ISSUE",
            EntryKind::Redeem => "REDEEM",
        };
        println!(
            "{when}  {kind:<6} {:>12} pts  ${:>10.2}  {}",
            entry.points_amount, entry.value_amount, entry.note
        );
    }
}

fn print_outcome(session: &Session, outcome: &Outcome) {
    match outcome {
        Outcome::WalletConnected(w) => {
            println!("connected {} on {}", w.address, w.network.label())
        }
        Outcome::WalletDisconnected => println!("wallet disconnected"),
        Outcome::ProgramCreated(p) => println!("created {} ({}) → {}", p.name, p.token_symbol, p.id),
        Outcome::ProgramUpdated(p) => println!("updated {} ({})", p.name, p.token_symbol),
        Outcome::ProgramRemoved(p) => println!("removed {} ({})", p.name, p.token_symbol),
        Outcome::ProgramSelected(id) => println!("selected {id}"),
        Outcome::BalanceChanged { program, balance } => {
            if let Some(entry) = session.ledger().entries().next() {
                println!("{}", entry.note);
            }
            println!("balance {program}: {balance} pts");
        }
        Outcome::Reset => println!("session reset"),
    }
}

//==================== main ====================//

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut session = load_session(&cli.state, rng)
        .with_context(|| format!("loading session {}", cli.state.display()))?;

    let command = match cli.command {
        Cmd::Programs => {
            print_programs(&session);
            return Ok(());
        }
        Cmd::Balances => {
            return print_balances(&session);
        }
        Cmd::Ledger { limit } => {
            print_ledger(&session, limit);
            return Ok(());
        }
        Cmd::Quote { amount, program } => {
            if amount <= Decimal::ZERO {
                return Err(LoyaltyError::InvalidAmount { amount }.into());
            }
            let program = program.map(ProgramId::new);
            let q = session.quote(program.as_ref(), amount)?;
            println!(
                "${:.2} purchase → ${} value → {} pts ({} pts/$)",
                q.purchase_amount,
                q.earned_value,
                q.earned_points,
                q.points_per_currency_unit.round_dp(2)
            );
            return Ok(());
        }
        Cmd::Export { out_dir } => {
            let mut sink = DirectorySink::new(&out_dir);
            let name = export_session(&session, &mut sink, Utc::now().timestamp_millis())
                .with_context(|| format!("exporting to {}", out_dir.display()))?;
            println!("exported → {}", out_dir.join(name).display());
            return Ok(());
        }
        Cmd::Connect { network } => Command::ConnectWallet(network),
        Cmd::Disconnect => Command::DisconnectWallet,
        Cmd::Create(args) => Command::CreateProgram(args.into()),
        Cmd::Update { id, program } => Command::UpdateProgram {
            id: ProgramId::new(id),
            draft: program.into(),
        },
        Cmd::Remove { id } => Command::RemoveProgram(ProgramId::new(id)),
        Cmd::Select { id } => Command::SelectProgram(ProgramId::new(id)),
        Cmd::Issue { amount, program } => Command::Issue {
            program: program.map(ProgramId::new),
            purchase_amount: amount,
        },
        Cmd::Redeem { points, program } => Command::Redeem {
            program: program.map(ProgramId::new),
            points,
        },
        Cmd::Reset => Command::Reset,
    };

    let outcome = session.apply(command)?;
    save_session(&cli.state, &session)
        .with_context(|| format!("saving session {}", cli.state.display()))?;
    print_outcome(&session, &outcome);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli) {
        if let Some(invalid) = err.downcast_ref::<LoyaltyError>() {
            eprintln!("error: {invalid}");
            process::exit(1);
        }
        eprintln!("error: {err:#}");
        process::exit(2);
    }
}
