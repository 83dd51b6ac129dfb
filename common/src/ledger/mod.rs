//! Ledger service interface
//!
//! Everything outside the contract talks to the ledger through these
//! traits. [`LedgerService`] is the narrow surface a caller needs: submit an
//! application call and read global state. [`LedgerAdmin`] adds the
//! deployment, funding and inspection operations used by tooling.
//!
//! ```text
//! client (deploy / call / boxes)
//!     ↓
//! LedgerAdmin / LedgerService
//!     ↓
//! LocalLedger ── HelloWorld::call() on a staged overlay
//! ```

mod error;
mod local;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use strum::Display;

use crate::{
    config::{COUNTER_GLOBAL_KEY, HELLO_METHOD},
    contract::AbiValue,
    greeting::{BoxKey, GreetingMode},
    storage::GlobalValue,
};

pub use error::LedgerError;
pub use local::LocalLedger;

/// Identifier of a deployed application
pub type AppId = u64;

/// Identifier of an accepted call
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(#[serde(with = "hex")] [u8; 32]);

impl TxId {
    /// Keccak-256 of the application, round, method and encoded arguments
    pub fn compute(app_id: AppId, round: u64, call: &AppCall) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(app_id.to_be_bytes());
        hasher.update(round.to_be_bytes());
        hasher.update(call.method.as_bytes());
        for arg in &call.args {
            hasher.update(arg.encode());
        }
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self)
    }
}

/// An application call as submitted to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCall {
    pub app_id: AppId,
    pub method: String,
    pub args: Vec<AbiValue>,
    /// Boxes the call is allowed to write
    #[serde(default)]
    pub box_references: Vec<BoxKey>,
}

impl AppCall {
    /// `hello(name)` writing to `box_reference`
    pub fn hello(app_id: AppId, name: &str, box_reference: BoxKey) -> Self {
        Self {
            app_id,
            method: HELLO_METHOD.to_owned(),
            args: vec![AbiValue::from(name)],
            box_references: vec![box_reference],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    pub tx_id: TxId,
    /// Round the call was confirmed in
    pub round: u64,
    pub return_value: AbiValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployParams {
    pub name: String,
    pub mode: GreetingMode,
}

/// What a deployment ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum OperationPerformed {
    /// No application with that name existed
    Create,
    /// The existing application matches, it is reused as is
    Nothing,
    /// The existing application uses another greeting mode, a new one
    /// is created next to it
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResult {
    pub app_id: AppId,
    pub operation: OperationPerformed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub app_id: AppId,
    pub name: String,
    pub mode: GreetingMode,
    pub balance: u64,
    pub min_balance: u64,
    pub box_count: usize,
    pub created_round: u64,
}

/// Narrow interface the greeting glue depends on
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Submit an application call and wait for its result
    ///
    /// A failed call leaves the application state untouched.
    async fn submit_call(&self, call: AppCall) -> Result<CallResult, LedgerError>;

    async fn read_global_state(
        &self,
        app_id: AppId,
        key: &str,
    ) -> Result<Option<GlobalValue>, LedgerError>;
}

/// Deployment, funding and storage inspection
#[async_trait]
pub trait LedgerAdmin: LedgerService {
    async fn deploy(&self, params: DeployParams) -> Result<DeployResult, LedgerError>;

    /// Credit the application account, returns the new balance
    async fn fund_app(&self, app_id: AppId, amount: u64) -> Result<u64, LedgerError>;

    async fn app_info(&self, app_id: AppId) -> Result<AppInfo, LedgerError>;

    async fn read_box(&self, app_id: AppId, key: &BoxKey) -> Result<Option<Vec<u8>>, LedgerError>;

    async fn list_boxes(&self, app_id: AppId) -> Result<Vec<BoxKey>, LedgerError>;
}

/// Read the greeting counter of an application, 0 if never set
pub async fn read_counter<L: LedgerService + ?Sized>(
    ledger: &L,
    app_id: AppId,
) -> Result<u64, LedgerError> {
    match ledger.read_global_state(app_id, COUNTER_GLOBAL_KEY).await? {
        None => Ok(0),
        Some(GlobalValue::Uint(counter)) => Ok(counter),
        Some(other) => Err(LedgerError::UnexpectedGlobalType {
            key: COUNTER_GLOBAL_KEY.to_owned(),
            expected: "uint",
            found: other.kind(),
        }),
    }
}
