//! JSON snapshot of a session and the sinks it can be handed to.
//!
//! The document carries `wallet`, `programs`, `balances` and `ledger` (most
//! recent first), plus the selected program id so a snapshot can be loaded
//! back into a working session.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ExportError;
use crate::ledger::{Ledger, LedgerEntry, Points};
use crate::programs::{Program, ProgramId, ProgramRegistry};
use crate::session::Session;
use crate::wallet::Wallet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateExport {
    pub wallet: Option<Wallet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_program_id: Option<ProgramId>,
    pub programs: Vec<Program>,
    pub balances: BTreeMap<ProgramId, Points>,
    /// Most recent first.
    pub ledger: Vec<LedgerEntry>,
}

impl StateExport {
    pub fn capture(session: &Session) -> Self {
        Self {
            wallet: session.wallet().cloned(),
            selected_program_id: session.registry().selected_id().cloned(),
            programs: session.registry().list().to_vec(),
            balances: session.ledger().balances().clone(),
            ledger: session.ledger().entries().cloned().collect(),
        }
    }

    /// Rebuilds a live session. The random generator is not part of the
    /// snapshot and must be supplied.
    pub fn into_session(self, rng: StdRng) -> Session {
        let registry = ProgramRegistry::from_parts(self.programs, self.selected_program_id);
        let mut entries = self.ledger;
        entries.reverse();
        let ledger = Ledger::from_parts(self.balances, entries);
        Session::from_parts(self.wallet, registry, ledger, rng)
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ExportError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ExportError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// `tokenloyalty-demo-<unix-epoch-ms>.json`
pub fn export_file_name(now_ms: i64) -> String {
    format!("tokenloyalty-demo-{now_ms}.json")
}

/// Host-side file save mechanism.
pub trait ExportSink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), ExportError>;
}

/// Writes exports as files into a directory, creating it if needed.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for DirectorySink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), ExportError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(file_name), bytes)?;
        Ok(())
    }
}

/// Keeps exports in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl ExportSink for MemorySink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), ExportError> {
        self.files.push((file_name.to_string(), bytes.to_vec()));
        Ok(())
    }
}

/// Serialises `session` and hands it to `sink`. Returns the file name used.
pub fn export_session<S: ExportSink + ?Sized>(
    session: &Session,
    sink: &mut S,
    now_ms: i64,
) -> Result<String, ExportError> {
    let bytes = StateExport::capture(session).to_json_bytes()?;
    let file_name = export_file_name(now_ms);
    sink.save(&file_name, &bytes)?;
    info!(file = %file_name, bytes = bytes.len(), "session exported");
    Ok(file_name)
}

/// Loads a session file written by [`save_session`]. A missing file yields a
/// fresh session.
pub fn load_session(path: &Path, rng: StdRng) -> Result<Session, ExportError> {
    if !path.exists() {
        return Ok(Session::with_rng(rng));
    }
    let bytes = fs::read(path)?;
    Ok(StateExport::from_json_slice(&bytes)?.into_session(rng))
}

pub fn save_session(path: &Path, session: &Session) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, StateExport::capture(session).to_json_bytes()?)?;
    Ok(())
}
