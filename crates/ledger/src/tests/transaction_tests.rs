use base64::Engine as _;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use stellar_xdr::curr::ReadXdr;

use super::*;
use crate::asset::{pool_id, Asset, PoolKind, LIQUIDITY_POOL_FEE_V18};

fn account(keypair: &Keypair, sequence: i64) -> Account {
    Account {
        account_id: keypair.public_key(),
        sequence,
    }
}

fn withdraw_op() -> Operation {
    Operation::LiquidityPoolWithdraw {
        pool_id: "abcd1234".repeat(8).parse().expect("pool id"),
        amount: Amount::parse("100").expect("amount"),
        min_amount_a: Amount::ZERO,
        min_amount_b: Amount::ZERO,
    }
}

fn signed_withdrawal(keypair: &Keypair, network: Network) -> SignedTransaction {
    TransactionBuilder::new(account(keypair, 7), BASE_FEE, network)
        .add_operation(withdraw_op())
        .set_timeout(Duration::from_secs(30))
        .build_at(Duration::from_secs(10))
        .expect("build")
        .sign(keypair)
        .expect("sign")
}

#[test]
fn builder_sequences_and_prices_per_operation() {
    let keypair = Keypair::random();
    let issuer = keypair.public_key();
    let pool = LiquidityPoolAsset::new(
        Asset::native(),
        Asset::credit("FOO", issuer).expect("asset"),
        LIQUIDITY_POOL_FEE_V18,
    )
    .expect("pool");
    let id = pool_id(PoolKind::ConstantProduct, &pool).expect("pool id");

    let tx = TransactionBuilder::new(account(&keypair, 41), BASE_FEE, Network::testnet())
        .add_operation(Operation::change_trust(pool))
        .add_operation(Operation::LiquidityPoolDeposit {
            pool_id: id,
            max_amount_a: Amount::parse("10").expect("a"),
            max_amount_b: Amount::parse("10").expect("b"),
            min_price: Price::ONE,
            max_price: Price::ONE,
        })
        .set_timeout(Duration::from_secs(30))
        .build_at(Duration::from_secs(1_000))
        .expect("build");

    assert_eq!(tx.source(), issuer);
    assert_eq!(tx.sequence(), 42);
    assert_eq!(tx.fee(), 200);
    assert_eq!(
        tx.time_bounds(),
        TimeBounds {
            min_time: 0,
            max_time: 1_030
        }
    );
    assert_eq!(tx.operations().len(), 2);
    assert_eq!(tx.operations()[0].name(), "change_trust");
    assert_eq!(tx.operations()[1].name(), "liquidity_pool_deposit");
}

#[test]
fn builder_requires_operations_and_timeout() {
    let keypair = Keypair::random();
    let empty = TransactionBuilder::new(account(&keypair, 1), BASE_FEE, Network::testnet())
        .set_timeout(Duration::from_secs(30))
        .build();
    assert!(matches!(empty, Err(LedgerError::EmptyTransaction)));

    let untimed = TransactionBuilder::new(account(&keypair, 1), BASE_FEE, Network::testnet())
        .add_operation(withdraw_op())
        .build();
    assert!(matches!(untimed, Err(LedgerError::MissingTimeout)));
}

#[test]
fn zero_timeout_leaves_transaction_unbounded() {
    let keypair = Keypair::random();
    let tx = TransactionBuilder::new(account(&keypair, 1), BASE_FEE, Network::testnet())
        .add_operation(withdraw_op())
        .set_timeout(Duration::ZERO)
        .build_at(Duration::from_secs(500))
        .expect("build");
    assert_eq!(tx.time_bounds().max_time, 0);
}

#[test]
fn oversized_timeout_is_an_error_not_a_panic() {
    let keypair = Keypair::random();
    let result = TransactionBuilder::new(account(&keypair, 1), BASE_FEE, Network::testnet())
        .add_operation(withdraw_op())
        .set_timeout(Duration::from_secs(u64::MAX))
        .build();

    let err = result.expect_err("deadline overflows");
    assert!(matches!(err, LedgerError::TimeoutOutOfRange(u64::MAX)), "{err}");
    assert_eq!(err.code(), shared::error::ErrorCode::Validation);
}

#[test]
fn exhausted_sequence_is_an_error_not_a_panic() {
    let keypair = Keypair::random();
    let result = TransactionBuilder::new(account(&keypair, i64::MAX), BASE_FEE, Network::testnet())
        .add_operation(withdraw_op())
        .set_timeout(Duration::from_secs(30))
        .build();

    assert!(matches!(
        result,
        Err(LedgerError::SequenceExhausted(i64::MAX))
    ));
}

#[test]
fn signature_covers_network_bound_hash() {
    let keypair = Keypair::random();
    let on_testnet = signed_withdrawal(&keypair, Network::testnet());
    let on_public = signed_withdrawal(
        &keypair,
        Network::new("Public Global Stellar Network ; September 2015"),
    );
    assert_ne!(
        on_testnet.transaction().hash_hex(),
        on_public.transaction().hash_hex()
    );

    let hash = hex::decode(on_testnet.transaction().hash_hex()).expect("hex");
    let signatures = on_testnet.signatures();
    assert_eq!(signatures.len(), 1);
    assert_eq!(signatures[0].hint, keypair.signature_hint());
    let verifying_key = VerifyingKey::from_bytes(keypair.public_key().as_bytes()).expect("key");
    assert!(verifying_key
        .verify(&hash, &Signature::from_bytes(&signatures[0].signature))
        .is_ok());
}

#[test]
fn envelope_decodes_as_a_v1_transaction_envelope() {
    let keypair = Keypair::random();
    let signed = signed_withdrawal(&keypair, Network::testnet());
    let envelope = signed.to_envelope_xdr();

    let decoded = xdr::TransactionEnvelope::from_xdr(envelope, Limits::none()).expect("decode");
    assert_eq!(decoded.to_xdr(Limits::none()).expect("encode"), envelope);

    let xdr::TransactionEnvelope::Tx(v1) = decoded else {
        panic!("expected a v1 envelope");
    };
    assert_eq!(
        v1.tx.source_account,
        xdr::MuxedAccount::from(keypair.public_key())
    );
    assert_eq!(v1.tx.fee, 100);
    assert_eq!(v1.tx.seq_num, xdr::SequenceNumber(8));
    assert_eq!(v1.tx.memo, xdr::Memo::None);
    assert_eq!(
        v1.tx.cond,
        xdr::Preconditions::Time(xdr::TimeBounds {
            min_time: xdr::TimePoint(0),
            max_time: xdr::TimePoint(40),
        })
    );
    assert_eq!(v1.tx.operations.len(), 1);
    assert_eq!(v1.tx.operations[0], xdr::Operation::from(&withdraw_op()));
    assert_eq!(v1.signatures.len(), 1);
    assert_eq!(v1.signatures[0].hint.0, keypair.signature_hint());

    // The hash is recomputable from the decoded transaction alone.
    let payload = xdr::TransactionSignaturePayload {
        network_id: xdr::Hash(Network::testnet().network_id()),
        tagged_transaction: xdr::TransactionSignaturePayloadTaggedTransaction::Tx(v1.tx),
    };
    let recomputed = Sha256::digest(payload.to_xdr(Limits::none()).expect("payload"));
    assert_eq!(hex::encode(recomputed), signed.transaction().hash_hex());

    let base64 = STANDARD
        .decode(signed.to_envelope_xdr_base64())
        .expect("base64");
    assert_eq!(base64, envelope);
}

#[test]
fn deposit_amounts_and_prices_reach_the_wire_in_stroops() {
    let pool_id: PoolId = "ab".repeat(32).parse().expect("pool id");
    let operation = Operation::LiquidityPoolDeposit {
        pool_id,
        max_amount_a: Amount::parse("1.5").expect("a"),
        max_amount_b: Amount::parse("0.0000001").expect("b"),
        min_price: Price { n: 1, d: 2 },
        max_price: Price { n: 3, d: 1 },
    };

    let xdr::OperationBody::LiquidityPoolDeposit(deposit) = xdr::Operation::from(&operation).body
    else {
        panic!("expected deposit body");
    };
    assert_eq!(deposit.liquidity_pool_id, xdr::PoolId::from(pool_id));
    assert_eq!(deposit.max_amount_a, 15_000_000);
    assert_eq!(deposit.max_amount_b, 1);
    assert_eq!(deposit.min_price, xdr::Price { n: 1, d: 2 });
    assert_eq!(deposit.max_price, xdr::Price { n: 3, d: 1 });
}

#[test]
fn network_id_is_hash_of_passphrase() {
    assert_eq!(
        hex::encode(Network::testnet().network_id()),
        "cee0302d59844d32bdca915c8203dd44b33fbb7edc19051ea37abedf28ecd472"
    );
}
