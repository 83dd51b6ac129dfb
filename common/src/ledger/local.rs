use std::{
    ffi::OsString,
    fs::{self, File, OpenOptions},
    io::{self, BufReader, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{
    AppCall, AppId, AppInfo, CallResult, DeployParams, DeployResult, LedgerAdmin, LedgerError,
    LedgerService, OperationPerformed, TxId,
};
use crate::{
    config::MAX_BOX_KEY_SIZE,
    contract::HelloWorld,
    greeting::{BoxKey, GreetingMode},
    storage::{required_min_balance, AppStorage, GlobalValue, MemoryAppStorage, StagedStorage},
};

// First application id handed out by a fresh ledger
const FIRST_APP_ID: AppId = 1001;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AppRecord {
    name: String,
    mode: GreetingMode,
    balance: u64,
    created_round: u64,
    storage: MemoryAppStorage,
}

impl AppRecord {
    fn info(&self, app_id: AppId) -> Result<AppInfo, LedgerError> {
        Ok(AppInfo {
            app_id,
            name: self.name.clone(),
            mode: self.mode,
            balance: self.balance,
            min_balance: required_min_balance(&self.storage)?,
            box_count: self.storage.box_count(),
            created_round: self.created_round,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerState {
    round: u64,
    next_app_id: AppId,
    apps: IndexMap<AppId, AppRecord>,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            round: 0,
            next_app_id: FIRST_APP_ID,
            apps: IndexMap::new(),
        }
    }
}

impl LedgerState {
    fn app(&self, app_id: AppId) -> Result<&AppRecord, LedgerError> {
        self.apps.get(&app_id).ok_or(LedgerError::AppNotFound(app_id))
    }

    fn app_mut(&mut self, app_id: AppId) -> Result<&mut AppRecord, LedgerError> {
        self.apps
            .get_mut(&app_id)
            .ok_or(LedgerError::AppNotFound(app_id))
    }

    // Latest application deployed under `name`
    fn find_by_name(&self, name: &str) -> Option<(AppId, &AppRecord)> {
        self.apps
            .iter()
            .rev()
            .find(|(_, app)| app.name == name)
            .map(|(app_id, app)| (*app_id, app))
    }
}

/// In-process ledger hosting HelloWorld applications
///
/// All calls are serialized by a single write lock, and each one runs
/// against a staged overlay of the application storage. The overlay is
/// applied only when:
/// - the contract call succeeded
/// - every box written was declared in the call's box references
/// - the application balance still covers the storage minimum balance
///
/// When opened from a file, the ledger holds an exclusive lock on
/// `<file>.lock` until it is dropped, so only one process at a time works
/// on a snapshot. The state is written back after every mutation; a failed
/// write rolls the in-memory state back too.
pub struct LocalLedger {
    state: RwLock<LedgerState>,
    file: Option<LedgerFile>,
}

// Snapshot location and the lock guarding it
struct LedgerFile {
    path: PathBuf,
    // Never read: the OS lock lives as long as this descriptor
    _lock: fd_lock::RwLock<File>,
}

// `<file><suffix>` next to the snapshot
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

// Take the exclusive lock of the ledger at `path`, failing if another
// ledger instance holds it
fn lock_ledger(path: &Path) -> Result<fd_lock::RwLock<File>, LedgerError> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(sibling_path(path, ".lock"))?;

    let mut lock = fd_lock::RwLock::new(file);
    match lock.try_write() {
        // Released when the descriptor is closed, not when the guard drops
        Ok(guard) => std::mem::forget(guard),
        Err(source) => {
            return Err(LedgerError::Locked {
                path: path.display().to_string(),
                source,
            })
        }
    }
    Ok(lock)
}

// Write the snapshot to a sibling file first, then move it in place
fn write_snapshot(path: &Path, json: &[u8]) -> io::Result<()> {
    let tmp_path = sibling_path(path, ".tmp");
    let mut file = File::create(&tmp_path)?;
    file.write_all(json)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)
}

impl LocalLedger {
    /// Ledger living only in memory
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            file: None,
        }
    }

    /// Open the ledger persisted at `path`, starting empty if it does not exist
    ///
    /// Fails with [`LedgerError::Locked`] while another `LocalLedger`, in
    /// this process or another one, has the same file open.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let lock = lock_ledger(&path)?;

        let state = if path.exists() {
            let file = File::open(&path)?;
            let state: LedgerState = serde_json::from_reader(BufReader::new(file))?;
            if log::log_enabled!(log::Level::Info) {
                info!(
                    "Loaded ledger from {} ({} applications, round {})",
                    path.display(),
                    state.apps.len(),
                    state.round
                );
            }
            state
        } else {
            if log::log_enabled!(log::Level::Info) {
                info!("No ledger found at {}, starting a new one", path.display());
            }
            LedgerState::default()
        };

        Ok(Self {
            state: RwLock::new(state),
            file: Some(LedgerFile { path, _lock: lock }),
        })
    }

    /// Current round, incremented by every accepted call and deployment
    pub async fn round(&self) -> u64 {
        self.state.read().await.round
    }

    // Persist `state`, running `undo` on it if the snapshot cannot be written.
    // The file write runs on the blocking pool while the state lock is held,
    // so snapshots land on disk in mutation order.
    async fn commit<F>(&self, state: &mut LedgerState, undo: F) -> Result<(), LedgerError>
    where
        F: FnOnce(&mut LedgerState) + Send,
    {
        let Some(file) = self.file.as_ref() else {
            return Ok(());
        };

        let result = match serde_json::to_vec_pretty(&*state) {
            Ok(json) => {
                let path = file.path.clone();
                tokio::task::spawn_blocking(move || write_snapshot(&path, &json))
                    .await
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
                    .and_then(|written| written)
                    .map_err(LedgerError::from)
            }
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            warn!("Error while persisting ledger state: {}", e);
            undo(state);
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerService for LocalLedger {
    async fn submit_call(&self, call: AppCall) -> Result<CallResult, LedgerError> {
        let mut state = self.state.write().await;
        let previous_round = state.round;
        let round = previous_round + 1;
        let app_id = call.app_id;

        let app = state.app_mut(app_id)?;
        let contract = HelloWorld::new(app.mode);

        let (return_value, changes, required) = {
            let mut staged = StagedStorage::new(&app.storage);
            let return_value = contract.call(&mut staged, &call.method, &call.args)?;

            for key in staged.changes().box_keys() {
                if !call.box_references.contains(key) {
                    return Err(LedgerError::BoxNotReferenced { key: key.clone() });
                }
                if key.len() > MAX_BOX_KEY_SIZE {
                    return Err(LedgerError::BoxKeyTooLong {
                        key: key.clone(),
                        max: MAX_BOX_KEY_SIZE,
                    });
                }
            }

            let required = required_min_balance(&staged)?;
            (return_value, staged.into_changes(), required)
        };

        if app.balance < required {
            return Err(LedgerError::InsufficientStorageFunding {
                app_id,
                required,
                available: app.balance,
            });
        }

        // Only the touched application is kept aside for a failed write
        let previous = self.file.as_ref().map(|_| app.storage.clone());
        app.storage.apply(changes)?;
        state.round = round;
        self.commit(&mut state, move |state| {
            if let (Some(storage), Some(app)) = (previous, state.apps.get_mut(&app_id)) {
                app.storage = storage;
            }
            state.round = previous_round;
        })
        .await?;

        let tx_id = TxId::compute(app_id, round, &call);
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Call {}({}) on app {} confirmed in round {} as {}",
                call.method,
                call.args
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                app_id,
                round,
                tx_id
            );
        }

        Ok(CallResult {
            tx_id,
            round,
            return_value,
        })
    }

    async fn read_global_state(
        &self,
        app_id: AppId,
        key: &str,
    ) -> Result<Option<GlobalValue>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.app(app_id)?.storage.get_global(key)?)
    }
}

#[async_trait]
impl LedgerAdmin for LocalLedger {
    async fn deploy(&self, params: DeployParams) -> Result<DeployResult, LedgerError> {
        let mut state = self.state.write().await;

        let operation = match state.find_by_name(&params.name) {
            Some((app_id, app)) if app.mode == params.mode => {
                if log::log_enabled!(log::Level::Debug) {
                    debug!("Application {} '{}' is up to date", app_id, params.name);
                }
                return Ok(DeployResult {
                    app_id,
                    operation: OperationPerformed::Nothing,
                });
            }
            Some((app_id, app)) => {
                if log::log_enabled!(log::Level::Info) {
                    info!(
                        "Application {} '{}' uses {} mode, appending a {} application",
                        app_id, params.name, app.mode, params.mode
                    );
                }
                OperationPerformed::Append
            }
            None => OperationPerformed::Create,
        };

        let mut storage = MemoryAppStorage::new();
        HelloWorld::new(params.mode).create(&mut storage)?;

        let app_id = state.next_app_id;
        state.next_app_id += 1;
        state.round += 1;
        let created_round = state.round;
        state.apps.insert(
            app_id,
            AppRecord {
                name: params.name.clone(),
                mode: params.mode,
                balance: 0,
                created_round,
                storage,
            },
        );
        self.commit(&mut state, move |state| {
            state.apps.shift_remove(&app_id);
            state.next_app_id = app_id;
            state.round = created_round - 1;
        })
        .await?;

        if log::log_enabled!(log::Level::Info) {
            info!(
                "Created application {} '{}' ({} mode) in round {}",
                app_id, params.name, params.mode, created_round
            );
        }
        Ok(DeployResult { app_id, operation })
    }

    async fn fund_app(&self, app_id: AppId, amount: u64) -> Result<u64, LedgerError> {
        let mut state = self.state.write().await;

        let app = state.app_mut(app_id)?;
        let previous = app.balance;
        let balance = previous
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow(app_id))?;
        app.balance = balance;
        self.commit(&mut state, move |state| {
            if let Some(app) = state.apps.get_mut(&app_id) {
                app.balance = previous;
            }
        })
        .await?;

        if log::log_enabled!(log::Level::Debug) {
            debug!("Funded app {} with {}, balance is {}", app_id, amount, balance);
        }
        Ok(balance)
    }

    async fn app_info(&self, app_id: AppId) -> Result<AppInfo, LedgerError> {
        let state = self.state.read().await;
        state.app(app_id)?.info(app_id)
    }

    async fn read_box(&self, app_id: AppId, key: &BoxKey) -> Result<Option<Vec<u8>>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.app(app_id)?.storage.get_box(key)?)
    }

    async fn list_boxes(&self, app_id: AppId) -> Result<Vec<BoxKey>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.app(app_id)?.storage.box_keys()?)
    }
}
