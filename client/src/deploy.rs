use anyhow::{Context, Result};
use greeter_common::ledger::{AppId, DeployParams, LedgerAdmin, OperationPerformed};
use log::{debug, info};
use serde::Serialize;

use crate::{
    caller::{call_hello, CallReport},
    config::AppConfig,
};

/// Names greeted right after a deployment
pub const DEPLOY_GREETING_NAMES: [&str; 2] = ["John Doe", "Ledger Developer"];

#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub app_id: AppId,
    pub operation: OperationPerformed,
    /// Amount sent to the application account, if a top-up was needed
    pub funded: Option<u64>,
    pub greetings: Vec<CallReport>,
}

/// Find the application deployed under the configured name, creating it
/// when missing or when it uses another greeting mode
pub async fn ensure_app<L: LedgerAdmin + ?Sized>(
    ledger: &L,
    config: &AppConfig,
) -> Result<(AppId, OperationPerformed)> {
    let result = ledger
        .deploy(DeployParams {
            name: config.app_name.clone(),
            mode: config.greeting_mode,
        })
        .await
        .context("Error while deploying the application")?;

    info!(
        "Application '{}' ({} mode) is app {}: {}",
        config.app_name, config.greeting_mode, result.app_id, result.operation
    );
    Ok((result.app_id, result.operation))
}

/// Bring the application balance up to `min_funding`
///
/// Returns the amount sent, `None` when the balance was already enough.
pub async fn top_up<L: LedgerAdmin + ?Sized>(
    ledger: &L,
    app_id: AppId,
    min_funding: u64,
) -> Result<Option<u64>> {
    let app = ledger.app_info(app_id).await?;
    if app.balance >= min_funding {
        debug!(
            "App {} balance {} already covers {}",
            app_id, app.balance, min_funding
        );
        return Ok(None);
    }

    let amount = min_funding - app.balance;
    let balance = ledger
        .fund_app(app_id, amount)
        .await
        .context("Error while funding the application")?;
    info!("Funded app {} with {}, balance is now {}", app_id, amount, balance);
    Ok(Some(amount))
}

/// Deploy or reuse the application, fund it and greet [`DEPLOY_GREETING_NAMES`]
pub async fn deploy<L: LedgerAdmin + ?Sized>(ledger: &L, config: &AppConfig) -> Result<DeployReport> {
    let (app_id, operation) = ensure_app(ledger, config).await?;
    let funded = top_up(ledger, app_id, config.min_funding).await?;

    let mut greetings = Vec::with_capacity(DEPLOY_GREETING_NAMES.len());
    for name in DEPLOY_GREETING_NAMES {
        greetings.push(call_hello(ledger, app_id, config.greeting_mode, name).await?);
    }

    Ok(DeployReport {
        app_id,
        operation,
        funded,
        greetings,
    })
}
