//! Application state for one demo session and the commands that mutate it.

use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::conversion::{estimated_liability, quote, redeem_value, Quote};
use crate::error::LoyaltyError;
use crate::ledger::{Ledger, Points};
use crate::programs::{Program, ProgramDraft, ProgramId, ProgramRegistry};
use crate::wallet::{Network, Wallet};

/// Everything a command can do to a session.
#[derive(Clone, Debug)]
pub enum Command {
    ConnectWallet(Network),
    DisconnectWallet,
    CreateProgram(ProgramDraft),
    UpdateProgram { id: ProgramId, draft: ProgramDraft },
    RemoveProgram(ProgramId),
    SelectProgram(ProgramId),
    /// `program: None` acts on the selected program.
    Issue {
        program: Option<ProgramId>,
        purchase_amount: Decimal,
    },
    Redeem {
        program: Option<ProgramId>,
        points: Points,
    },
    Reset,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    WalletConnected(Wallet),
    WalletDisconnected,
    ProgramCreated(Program),
    ProgramUpdated(Program),
    ProgramRemoved(Program),
    ProgramSelected(ProgramId),
    BalanceChanged { program: ProgramId, balance: Points },
    Reset,
}

/// Per-program figures shown next to the balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramSummary {
    pub program: Program,
    pub balance: Points,
    pub redeemable_usd: Decimal,
    pub estimated_liability: Decimal,
}

pub struct Session {
    wallet: Option<Wallet>,
    registry: ProgramRegistry,
    ledger: Ledger,
    rng: StdRng,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self::from_parts(None, ProgramRegistry::seeded(), Ledger::new(), rng)
    }

    pub fn from_parts(
        wallet: Option<Wallet>,
        registry: ProgramRegistry,
        ledger: Ledger,
        rng: StdRng,
    ) -> Self {
        Self {
            wallet,
            registry,
            ledger,
            rng,
        }
    }

    pub fn wallet(&self) -> Option<&Wallet> {
        self.wallet.as_ref()
    }

    pub fn registry(&self) -> &ProgramRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Applies `command` stamped with the current wall-clock time.
    pub fn apply(&mut self, command: Command) -> Result<Outcome, LoyaltyError> {
        self.apply_at(command, Utc::now().timestamp_millis())
    }

    /// Applies `command` with an explicit timestamp (unix epoch millis).
    pub fn apply_at(&mut self, command: Command, ts: i64) -> Result<Outcome, LoyaltyError> {
        debug!(?command, ts, "applying command");
        match command {
            Command::ConnectWallet(network) => {
                let wallet = Wallet::mock(network, &mut self.rng);
                info!(address = %wallet.address, %network, "wallet connected");
                self.wallet = Some(wallet.clone());
                Ok(Outcome::WalletConnected(wallet))
            }
            Command::DisconnectWallet => {
                self.wallet = None;
                Ok(Outcome::WalletDisconnected)
            }
            Command::CreateProgram(draft) => {
                let program = self.registry.create(&draft, &mut self.rng)?;
                Ok(Outcome::ProgramCreated(program))
            }
            Command::UpdateProgram { id, draft } => {
                let program = self.registry.update(&id, &draft)?;
                Ok(Outcome::ProgramUpdated(program))
            }
            Command::RemoveProgram(id) => {
                let program = self.registry.remove(&id)?;
                Ok(Outcome::ProgramRemoved(program))
            }
            Command::SelectProgram(id) => {
                self.registry.select(&id)?;
                Ok(Outcome::ProgramSelected(id))
            }
            Command::Issue {
                program,
                purchase_amount,
            } => {
                let program = self.resolve(program.as_ref())?.clone();
                let balance =
                    self.ledger
                        .issue(self.wallet.as_ref(), &program, purchase_amount, ts)?;
                Ok(Outcome::BalanceChanged {
                    program: program.id,
                    balance,
                })
            }
            Command::Redeem { program, points } => {
                let program = self.resolve(program.as_ref())?.clone();
                let balance = self
                    .ledger
                    .redeem(self.wallet.as_ref(), &program, points, ts)?;
                Ok(Outcome::BalanceChanged {
                    program: program.id,
                    balance,
                })
            }
            Command::Reset => {
                self.registry.reset();
                self.ledger.reset();
                info!("session reset to seed programs");
                Ok(Outcome::Reset)
            }
        }
    }

    /// Preview of an issue against `program` (or the selected one).
    pub fn quote(&self, program: Option<&ProgramId>, purchase_amount: Decimal) -> Result<Quote, LoyaltyError> {
        let program = self.resolve(program)?;
        quote(purchase_amount, program)
    }

    /// Balances and liability estimates for every registered program, in
    /// registry order.
    pub fn summaries(&self) -> Result<Vec<ProgramSummary>, LoyaltyError> {
        self.registry
            .list()
            .iter()
            .map(|program| {
                let balance = self.ledger.balance(&program.id);
                Ok(ProgramSummary {
                    program: program.clone(),
                    balance,
                    redeemable_usd: redeem_value(balance, program)?,
                    estimated_liability: estimated_liability(balance, program)?,
                })
            })
            .collect()
    }

    fn resolve(&self, id: Option<&ProgramId>) -> Result<&Program, LoyaltyError> {
        match id {
            Some(id) => self
                .registry
                .get(id)
                .ok_or_else(|| LoyaltyError::UnknownProgram(id.clone())),
            None => self.registry.selected().ok_or(LoyaltyError::NoProgramSelected),
        }
    }
}
