use futures::future::join_all;
use greeter_common::{
    config::{box_min_balance, COUNTER_GLOBAL_KEY, MIN_ACCOUNT_BALANCE},
    contract::{AbiValue, HelloWorld},
    greeting::{BoxKey, GreetingMode},
    ledger::{
        read_counter, AppCall, AppId, DeployParams, LedgerAdmin, LedgerError, LedgerService,
        LocalLedger,
    },
    storage::GlobalValue,
};
use tempfile::TempDir;

async fn deploy_funded(ledger: &LocalLedger, mode: GreetingMode) -> AppId {
    let app_id = ledger
        .deploy(DeployParams {
            name: "HelloWorld".to_owned(),
            mode,
        })
        .await
        .unwrap()
        .app_id;
    ledger.fund_app(app_id, 1_000_000).await.unwrap();
    app_id
}

async fn hello(ledger: &LocalLedger, app_id: AppId, name: &str) -> Result<String, LedgerError> {
    let counter = read_counter(ledger, app_id).await?;
    let box_ref = BoxKey::for_greeting(name, counter);
    let result = ledger.submit_call(AppCall::hello(app_id, name, box_ref)).await?;
    Ok(result.return_value.as_str().unwrap().to_owned())
}

#[tokio::test]
async fn test_hello_returns_greeting_and_stores_box() {
    let ledger = LocalLedger::in_memory();
    let app_id = deploy_funded(&ledger, GreetingMode::CounterKeyed).await;

    assert_eq!(hello(&ledger, app_id, "John Doe").await.unwrap(), "Hello, John Doe");

    let value = ledger
        .read_box(app_id, &BoxKey::for_greeting("John Doe", 0))
        .await
        .unwrap();
    assert_eq!(value.as_deref(), Some(&b"Hello, John Doe"[..]));
    assert_eq!(
        ledger.read_global_state(app_id, COUNTER_GLOBAL_KEY).await.unwrap(),
        Some(GlobalValue::Uint(1))
    );
}

#[tokio::test]
async fn test_every_call_keeps_its_own_box() {
    let ledger = LocalLedger::in_memory();
    let app_id = deploy_funded(&ledger, GreetingMode::CounterKeyed).await;

    for name in ["Alice", "Bob", "Alice"] {
        hello(&ledger, app_id, name).await.unwrap();
    }

    let boxes = ledger.list_boxes(app_id).await.unwrap();
    assert_eq!(
        boxes,
        vec![
            BoxKey::for_greeting("Alice", 0),
            BoxKey::for_greeting("Bob", 1),
            BoxKey::for_greeting("Alice", 2),
        ]
    );
    assert_eq!(read_counter(&ledger, app_id).await.unwrap(), 3);

    let info = ledger.app_info(app_id).await.unwrap();
    let expected_min_balance = MIN_ACCOUNT_BALANCE
        + boxes
            .iter()
            .map(|key| {
                let name_len = key.decode_greeting().unwrap().0.len();
                box_min_balance(key.len(), "Hello, ".len() + name_len)
            })
            .sum::<u64>();
    assert_eq!(info.min_balance, expected_min_balance);
    assert_eq!(info.box_count, 3);
}

#[tokio::test]
async fn test_fixed_key_box_is_overwritten() {
    let ledger = LocalLedger::in_memory();
    let app_id = deploy_funded(&ledger, GreetingMode::FixedKey).await;

    for name in ["Alice", "Bob"] {
        let call = AppCall::hello(app_id, name, BoxKey::fixed_greeting());
        ledger.submit_call(call).await.unwrap();
    }

    let value = ledger
        .read_box(app_id, &BoxKey::fixed_greeting())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(value, b"Hello, Bob");
    assert_eq!(ledger.list_boxes(app_id).await.unwrap(), vec![BoxKey::fixed_greeting()]);
    assert_eq!(
        ledger.read_global_state(app_id, COUNTER_GLOBAL_KEY).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_racing_calls_on_same_counter() {
    let ledger = LocalLedger::in_memory();
    let app_id = deploy_funded(&ledger, GreetingMode::CounterKeyed).await;

    // Every caller saw counter 0, only the first call to run may use it
    let names = ["Alice", "Bob", "Carol", "Dave"];
    let results = join_all(names.iter().map(|name| {
        let call = AppCall::hello(app_id, name, BoxKey::for_greeting(name, 0));
        ledger.submit_call(call)
    }))
    .await;

    let accepted = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(accepted, 1);
    assert!(results
        .iter()
        .filter_map(|result| result.as_ref().err())
        .all(|err| matches!(err, LedgerError::BoxNotReferenced { .. })));

    assert_eq!(read_counter(&ledger, app_id).await.unwrap(), 1);
    assert_eq!(ledger.list_boxes(app_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejected_call_changes_nothing() {
    let ledger = LocalLedger::in_memory();
    let app_id = deploy_funded(&ledger, GreetingMode::CounterKeyed).await;
    hello(&ledger, app_id, "Alice").await.unwrap();
    let round = ledger.round().await;

    let call = AppCall {
        app_id,
        method: "hello".to_owned(),
        args: vec![AbiValue::Uint64(7)],
        box_references: vec![BoxKey::for_greeting("Bob", 1)],
    };
    assert!(matches!(
        ledger.submit_call(call).await,
        Err(LedgerError::Contract(_))
    ));

    assert_eq!(ledger.round().await, round);
    assert_eq!(read_counter(&ledger, app_id).await.unwrap(), 1);
    assert_eq!(ledger.list_boxes(app_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_persisted_ledger_reopens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("localnet.json");

    let app_id = {
        let ledger = LocalLedger::open(&path).unwrap();
        let app_id = deploy_funded(&ledger, GreetingMode::CounterKeyed).await;
        hello(&ledger, app_id, "Alice").await.unwrap();
        hello(&ledger, app_id, "Bob").await.unwrap();
        app_id
    };

    let ledger = LocalLedger::open(&path).unwrap();
    assert_eq!(read_counter(&ledger, app_id).await.unwrap(), 2);
    assert_eq!(hello(&ledger, app_id, "Carol").await.unwrap(), "Hello, Carol");
    assert_eq!(
        ledger.list_boxes(app_id).await.unwrap().last(),
        Some(&BoxKey::for_greeting("Carol", 2))
    );

    // The deployed application is found again under its name
    let redeploy = ledger
        .deploy(DeployParams {
            name: "HelloWorld".to_owned(),
            mode: HelloWorld::new(GreetingMode::CounterKeyed).mode(),
        })
        .await
        .unwrap();
    assert_eq!(redeploy.app_id, app_id);
}
