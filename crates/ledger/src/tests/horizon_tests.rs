use super::*;
use crate::{
    amount::Amount,
    keypair::Keypair,
    transaction::{Network, Operation, TransactionBuilder, BASE_FEE},
};
use axum::{
    extract::{Path, State},
    http::StatusCode as HttpStatus,
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct HorizonState {
    submitted: Arc<Mutex<Vec<String>>>,
    reject: bool,
}

async fn handle_account(Path(id): Path<String>) -> (HttpStatus, Json<serde_json::Value>) {
    if id.starts_with("GAAAA") {
        return (
            HttpStatus::NOT_FOUND,
            Json(json!({ "title": "Resource Missing", "status": 404 })),
        );
    }
    (
        HttpStatus::OK,
        Json(json!({ "id": id, "account_id": id, "sequence": "4294967296" })),
    )
}

async fn handle_submit(
    State(state): State<HorizonState>,
    Form(form): Form<HashMap<String, String>>,
) -> (HttpStatus, Json<serde_json::Value>) {
    let envelope = form.get("tx").cloned().unwrap_or_default();
    state.submitted.lock().await.push(envelope);
    if state.reject {
        return (
            HttpStatus::BAD_REQUEST,
            Json(json!({
                "title": "Transaction Failed",
                "status": 400,
                "extras": {
                    "result_codes": {
                        "transaction": "tx_failed",
                        "operations": ["op_success", "op_bad_price"]
                    }
                }
            })),
        );
    }
    (
        HttpStatus::OK,
        Json(json!({ "hash": "f00dfeed", "successful": true })),
    )
}

async fn spawn_horizon(state: HorizonState) -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/accounts/:id", get(handle_account))
        .route("/transactions", post(handle_submit))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/"))
}

fn signed_withdrawal(keypair: &Keypair) -> SignedTransaction {
    TransactionBuilder::new(
        Account {
            account_id: keypair.public_key(),
            sequence: 1,
        },
        BASE_FEE,
        Network::testnet(),
    )
    .add_operation(Operation::LiquidityPoolWithdraw {
        pool_id: "ab".repeat(32).parse().expect("pool id"),
        amount: Amount::parse("1").expect("amount"),
        min_amount_a: Amount::ZERO,
        min_amount_b: Amount::ZERO,
    })
    .set_timeout(Duration::from_secs(30))
    .build()
    .expect("build")
    .sign(keypair)
    .expect("sign")
}

#[tokio::test]
async fn loads_account_sequence() {
    let base = spawn_horizon(HorizonState::default()).await.expect("spawn");
    let client = HorizonClient::new(base);
    let keypair = Keypair::random();

    let account = client.account(&keypair.public_key()).await.expect("account");
    assert_eq!(account.account_id, keypair.public_key());
    assert_eq!(account.sequence, 4_294_967_296);
}

#[tokio::test]
async fn missing_account_maps_to_not_found() {
    let base = spawn_horizon(HorizonState::default()).await.expect("spawn");
    let client = HorizonClient::new(base);
    let missing: AccountId = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF"
        .parse()
        .expect("account");

    let err = client.account(&missing).await.expect_err("must fail");
    assert!(matches!(err, LedgerError::AccountNotFound(_)), "{err}");
    assert_eq!(err.code(), shared::error::ErrorCode::NotFound);
}

#[tokio::test]
async fn submits_base64_envelope_and_returns_hash() {
    let state = HorizonState::default();
    let base = spawn_horizon(state.clone()).await.expect("spawn");
    let client = HorizonClient::new(base);
    let keypair = Keypair::random();
    let signed = signed_withdrawal(&keypair);

    let response = client.submit(&signed).await.expect("submit");
    assert_eq!(response.hash, "f00dfeed");

    let submitted = state.submitted.lock().await;
    assert_eq!(submitted.as_slice(), &[signed.to_envelope_xdr_base64()]);
}

#[tokio::test]
async fn rejected_submission_carries_result_codes() {
    let state = HorizonState {
        reject: true,
        ..HorizonState::default()
    };
    let base = spawn_horizon(state).await.expect("spawn");
    let client: Arc<dyn LedgerClient> = Arc::new(HorizonClient::new(base));
    let keypair = Keypair::random();

    let err = client
        .submit_transaction(&signed_withdrawal(&keypair))
        .await
        .expect_err("must reject");
    assert_eq!(
        err.to_string(),
        "transaction rejected: tx_failed [op_success, op_bad_price]"
    );
}

#[tokio::test]
async fn unreachable_horizon_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = HorizonClient::new(format!("http://{addr}"));
    let err = client
        .account(&Keypair::random().public_key())
        .await
        .expect_err("must fail");
    assert_eq!(err.code(), shared::error::ErrorCode::Network);
}
