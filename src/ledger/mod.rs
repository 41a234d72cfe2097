use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conversion::{earned_points, earned_value, redeem_value};
use crate::error::LoyaltyError;
use crate::programs::{Program, ProgramId};
use crate::wallet::Wallet;

pub type Points = Decimal;
pub type Usd = Decimal;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    Issue,
    Redeem,
}

/// One immutable issue/redeem record. `value_amount` is frozen at the
/// program's economics at the time of the event.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    pub ts: i64,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(rename = "programId")]
    pub program_id: ProgramId,
    #[serde(rename = "amountPts")]
    pub points_amount: Points,
    #[serde(rename = "amountUsd")]
    pub value_amount: Usd,
    pub note: String,
}

/// Per-program balances plus the append-only event log. The only place
/// balances change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    balances: BTreeMap<ProgramId, Points>,
    /// Oldest first.
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// `entries` must be oldest first.
    pub fn from_parts(balances: BTreeMap<ProgramId, Points>, entries: Vec<LedgerEntry>) -> Self {
        Self { balances, entries }
    }

    /// Zero for programs never touched.
    pub fn balance(&self, program: &ProgramId) -> Points {
        self.balances.get(program).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn balances(&self) -> &BTreeMap<ProgramId, Points> {
        &self.balances
    }

    /// Most recent first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &LedgerEntry> + ExactSizeIterator {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Credits the points earned on `purchase_amount` and records an ISSUE
    /// entry. Returns the new balance.
    pub fn issue(
        &mut self,
        wallet: Option<&Wallet>,
        program: &Program,
        purchase_amount: Usd,
        ts: i64,
    ) -> Result<Points, LoyaltyError> {
        if wallet.is_none() {
            return Err(LoyaltyError::WalletNotConnected);
        }
        if purchase_amount <= Decimal::ZERO {
            return Err(LoyaltyError::InvalidAmount {
                amount: purchase_amount,
            });
        }

        let points = earned_points(purchase_amount, program)?;
        let value = earned_value(purchase_amount, program)?;
        let balance = self
            .balance(&program.id)
            .checked_add(points)
            .ok_or(LoyaltyError::AmountOutOfRange {
                amount: purchase_amount,
            })?;
        self.balances.insert(program.id.clone(), balance);

        self.entries.push(LedgerEntry {
            ts,
            kind: EntryKind::Issue,
            program_id: program.id.clone(),
            points_amount: points,
            value_amount: value,
            note: format!(
                "{} ({}): Purchase ${:.2} @ {}% earn",
                program.name, program.token_symbol, purchase_amount, program.earn_rate_pct
            ),
        });
        debug!(program = %program.id, %points, %value, %balance, "points issued");
        Ok(balance)
    }

    /// Debits `points` and records a REDEEM entry. Returns the new balance.
    pub fn redeem(
        &mut self,
        wallet: Option<&Wallet>,
        program: &Program,
        points: Points,
        ts: i64,
    ) -> Result<Points, LoyaltyError> {
        if wallet.is_none() {
            return Err(LoyaltyError::WalletNotConnected);
        }
        if points <= Decimal::ZERO {
            return Err(LoyaltyError::InvalidAmount { amount: points });
        }
        let available = self.balance(&program.id);
        if points > available {
            return Err(LoyaltyError::InsufficientBalance {
                program: program.id.clone(),
                requested: points,
                available,
            });
        }

        let value = redeem_value(points, program)?;
        let balance = available - points;
        self.balances.insert(program.id.clone(), balance);

        self.entries.push(LedgerEntry {
            ts,
            kind: EntryKind::Redeem,
            program_id: program.id.clone(),
            points_amount: points,
            value_amount: value,
            note: format!(
                "{} ({}): Redeemed for ${:.2}",
                program.name, program.token_symbol, value
            ),
        });
        debug!(program = %program.id, %points, %value, %balance, "points redeemed");
        Ok(balance)
    }

    pub fn reset(&mut self) {
        self.balances.clear();
        self.entries.clear();
    }
}

/// Recomputes balances from history alone, oldest entry first.
pub fn replay_balances<'a, I>(entries: I) -> Result<BTreeMap<ProgramId, Points>, LoyaltyError>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let mut balances: BTreeMap<ProgramId, Points> = BTreeMap::new();
    for entry in entries {
        let balance = balances.entry(entry.program_id.clone()).or_default();
        let next = match entry.kind {
            EntryKind::Issue => balance.checked_add(entry.points_amount),
            EntryKind::Redeem => balance.checked_sub(entry.points_amount),
        };
        *balance = next.ok_or(LoyaltyError::AmountOutOfRange {
            amount: entry.points_amount,
        })?;
    }
    Ok(balances)
}
