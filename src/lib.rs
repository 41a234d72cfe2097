//! Accounting kernel for a fixed-value tokenized loyalty demo.
//!
//! The crate is split into small, focused modules:
//!
//! * [`programs`]: loyalty program definitions and the registry holding them.
//! * [`conversion`]: purchase to points and points to currency arithmetic.
//! * [`ledger`]: per-program balances and the append-only issue/redeem log.
//! * [`wallet`]: cosmetic mock wallet connections.
//! * [`session`]: explicit application state driven by [`session::Command`]s.
//! * [`export`]: JSON snapshots of a session and the sinks that receive them.
//!
//! Everything is synchronous and in-memory; a command either applies in full
//! or is rejected with a [`LoyaltyError`] before any state changes.

pub mod conversion;
pub mod export;
pub mod ledger;
pub mod programs;
pub mod session;
pub mod wallet;

mod error;

pub use error::{ExportError, LoyaltyError};
pub use ledger::{EntryKind, Ledger, LedgerEntry};
pub use programs::{Program, ProgramDraft, ProgramId, ProgramRegistry};
pub use session::{Command, Outcome, Session};
pub use wallet::{Network, Wallet};
