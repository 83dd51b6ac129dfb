use anyhow::{Context, Result};
use greeter_common::{
    contract::HelloWorld,
    greeting::{BoxKey, GreetingMode},
    ledger::{read_counter, AppCall, AppId, LedgerAdmin, LedgerService, TxId},
};
use log::{debug, info};
use serde::Serialize;

/// Outcome of one `hello` call
#[derive(Debug, Clone, Serialize)]
pub struct CallReport {
    pub name: String,
    /// Counter the greeting was stored under, `None` in fixed-key mode
    pub counter: Option<u64>,
    pub box_key: BoxKey,
    pub greeting: String,
    pub tx_id: TxId,
    pub round: u64,
}

/// A box read back from the application
#[derive(Debug, Clone, Serialize)]
pub struct StoredGreeting {
    pub key: BoxKey,
    pub name: Option<String>,
    pub counter: Option<u64>,
    pub value: String,
}

/// Call `hello(name)` on the application
///
/// The counter is read first so the call can reference the box it will
/// write. Two callers racing on the same counter make one of the calls
/// fail on its box reference, nothing is written for it.
pub async fn call_hello<L: LedgerService + ?Sized>(
    ledger: &L,
    app_id: AppId,
    mode: GreetingMode,
    name: &str,
) -> Result<CallReport> {
    let contract = HelloWorld::new(mode);
    let counter = match mode {
        GreetingMode::CounterKeyed => Some(
            read_counter(ledger, app_id)
                .await
                .context("Error while reading the greeting counter")?,
        ),
        GreetingMode::FixedKey => None,
    };

    let box_key = contract.box_reference(name, counter.unwrap_or_default());
    debug!("Calling hello('{}') on app {} with box {}", name, app_id, box_key);

    let result = ledger
        .submit_call(AppCall::hello(app_id, name, box_key.clone()))
        .await
        .with_context(|| format!("Error while calling hello('{}')", name))?;

    let greeting = result
        .return_value
        .as_str()
        .context("hello did not return a string")?
        .to_owned();

    match counter {
        Some(counter) => info!(
            "Called hello('{}') on app {}: '{}' as greeting #{} (tx {}, round {})",
            name, app_id, greeting, counter, result.tx_id, result.round
        ),
        None => info!(
            "Called hello('{}') on app {}: '{}' (tx {}, round {})",
            name, app_id, greeting, result.tx_id, result.round
        ),
    }

    Ok(CallReport {
        name: name.to_owned(),
        counter,
        box_key,
        greeting,
        tx_id: result.tx_id,
        round: result.round,
    })
}

/// Read every box of the application, in creation order
pub async fn list_greetings<L: LedgerAdmin + ?Sized>(
    ledger: &L,
    app_id: AppId,
) -> Result<Vec<StoredGreeting>> {
    let keys = ledger
        .list_boxes(app_id)
        .await
        .context("Error while listing the application boxes")?;

    let mut greetings = Vec::with_capacity(keys.len());
    for key in keys {
        let Some(value) = ledger.read_box(app_id, &key).await? else {
            continue;
        };

        let (name, counter) = match key.decode_greeting() {
            Some((name, counter)) => (Some(name.to_owned()), Some(counter)),
            None => (None, None),
        };

        greetings.push(StoredGreeting {
            name,
            counter,
            value: String::from_utf8_lossy(&value).into_owned(),
            key,
        });
    }

    Ok(greetings)
}
