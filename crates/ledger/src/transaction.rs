use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{self as xdr, Limits, WriteXdr};

use crate::{
    amount::{Amount, Price},
    asset::{LiquidityPoolAsset, PoolId},
    error::{LedgerError, Result},
    keypair::{AccountId, Keypair},
};

pub const BASE_FEE: u32 = 100;
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    passphrase: String,
}

impl Network {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: passphrase.into(),
        }
    }

    pub fn testnet() -> Self {
        Self::new(TESTNET_PASSPHRASE)
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn network_id(&self) -> [u8; 32] {
        Sha256::digest(self.passphrase.as_bytes()).into()
    }
}

/// On-ledger account state needed to sequence a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub account_id: AccountId,
    pub sequence: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ChangeTrust {
        line: LiquidityPoolAsset,
        limit: Amount,
    },
    LiquidityPoolDeposit {
        pool_id: PoolId,
        max_amount_a: Amount,
        max_amount_b: Amount,
        min_price: Price,
        max_price: Price,
    },
    LiquidityPoolWithdraw {
        pool_id: PoolId,
        amount: Amount,
        min_amount_a: Amount,
        min_amount_b: Amount,
    },
}

impl Operation {
    /// Trust line for a pool share with the maximum limit.
    pub fn change_trust(line: LiquidityPoolAsset) -> Self {
        Operation::ChangeTrust {
            line,
            limit: Amount::MAX,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::ChangeTrust { .. } => "change_trust",
            Operation::LiquidityPoolDeposit { .. } => "liquidity_pool_deposit",
            Operation::LiquidityPoolWithdraw { .. } => "liquidity_pool_withdraw",
        }
    }
}

impl From<&Operation> for xdr::Operation {
    fn from(operation: &Operation) -> Self {
        let body = match operation {
            Operation::ChangeTrust { line, limit } => {
                xdr::OperationBody::ChangeTrust(xdr::ChangeTrustOp {
                    line: line.into(),
                    limit: limit.stroops(),
                })
            }
            Operation::LiquidityPoolDeposit {
                pool_id,
                max_amount_a,
                max_amount_b,
                min_price,
                max_price,
            } => xdr::OperationBody::LiquidityPoolDeposit(xdr::LiquidityPoolDepositOp {
                liquidity_pool_id: (*pool_id).into(),
                max_amount_a: max_amount_a.stroops(),
                max_amount_b: max_amount_b.stroops(),
                min_price: (*min_price).into(),
                max_price: (*max_price).into(),
            }),
            Operation::LiquidityPoolWithdraw {
                pool_id,
                amount,
                min_amount_a,
                min_amount_b,
            } => xdr::OperationBody::LiquidityPoolWithdraw(xdr::LiquidityPoolWithdrawOp {
                liquidity_pool_id: (*pool_id).into(),
                amount: amount.stroops(),
                min_amount_a: min_amount_a.stroops(),
                min_amount_b: min_amount_b.stroops(),
            }),
        };
        xdr::Operation {
            source_account: None,
            body,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

pub struct TransactionBuilder {
    source: Account,
    base_fee: u32,
    network: Network,
    operations: Vec<Operation>,
    timeout: Option<Duration>,
}

impl TransactionBuilder {
    pub fn new(source: Account, base_fee: u32, network: Network) -> Self {
        Self {
            source,
            base_fee,
            network,
            operations: Vec::new(),
            timeout: None,
        }
    }

    pub fn add_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Zero means the transaction never expires.
    pub fn set_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Transaction> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        self.build_at(now)
    }

    pub fn build_at(self, now: Duration) -> Result<Transaction> {
        if self.operations.is_empty() {
            return Err(LedgerError::EmptyTransaction);
        }
        let timeout = self.timeout.ok_or(LedgerError::MissingTimeout)?;
        let max_time = if timeout.is_zero() {
            0
        } else {
            now.as_secs()
                .checked_add(timeout.as_secs())
                .ok_or(LedgerError::TimeoutOutOfRange(timeout.as_secs()))?
        };
        let sequence = self
            .source
            .sequence
            .checked_add(1)
            .ok_or(LedgerError::SequenceExhausted(self.source.sequence))?;
        let fee = self.base_fee.saturating_mul(self.operations.len() as u32);
        let time_bounds = TimeBounds {
            min_time: 0,
            max_time,
        };

        let envelope_tx = xdr::Transaction {
            source_account: self.source.account_id.into(),
            fee,
            seq_num: xdr::SequenceNumber(sequence),
            cond: xdr::Preconditions::Time(xdr::TimeBounds {
                min_time: xdr::TimePoint(time_bounds.min_time),
                max_time: xdr::TimePoint(time_bounds.max_time),
            }),
            memo: xdr::Memo::None,
            operations: self
                .operations
                .iter()
                .map(xdr::Operation::from)
                .collect::<Vec<_>>()
                .try_into()?,
            ext: xdr::TransactionExt::V0,
        };
        let payload = xdr::TransactionSignaturePayload {
            network_id: xdr::Hash(self.network.network_id()),
            tagged_transaction: xdr::TransactionSignaturePayloadTaggedTransaction::Tx(
                envelope_tx.clone(),
            ),
        };
        let hash = Sha256::digest(payload.to_xdr(Limits::none())?).into();

        Ok(Transaction {
            source: self.source.account_id,
            fee,
            sequence,
            time_bounds,
            operations: self.operations,
            envelope_tx,
            hash,
        })
    }
}

/// A built transaction together with its network-bound hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    source: AccountId,
    fee: u32,
    sequence: i64,
    time_bounds: TimeBounds,
    operations: Vec<Operation>,
    envelope_tx: xdr::Transaction,
    hash: [u8; 32],
}

impl Transaction {
    pub fn source(&self) -> AccountId {
        self.source
    }

    pub fn fee(&self) -> u32 {
        self.fee
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    pub fn time_bounds(&self) -> TimeBounds {
        self.time_bounds
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn sign(self, keypair: &Keypair) -> Result<SignedTransaction> {
        let signature = DecoratedSignature {
            hint: keypair.signature_hint(),
            signature: keypair.sign(&self.hash),
        };
        let envelope = xdr::TransactionEnvelope::Tx(xdr::TransactionV1Envelope {
            tx: self.envelope_tx.clone(),
            signatures: vec![xdr::DecoratedSignature::try_from(&signature)?].try_into()?,
        })
        .to_xdr(Limits::none())?;

        Ok(SignedTransaction {
            transaction: self,
            signatures: vec![signature],
            envelope,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoratedSignature {
    pub hint: [u8; 4],
    pub signature: [u8; 64],
}

impl TryFrom<&DecoratedSignature> for xdr::DecoratedSignature {
    type Error = xdr::Error;

    fn try_from(signature: &DecoratedSignature) -> std::result::Result<Self, Self::Error> {
        Ok(xdr::DecoratedSignature {
            hint: xdr::SignatureHint(signature.hint),
            signature: xdr::Signature(signature.signature.to_vec().try_into()?),
        })
    }
}

/// Signed transaction with its envelope already encoded for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    transaction: Transaction,
    signatures: Vec<DecoratedSignature>,
    envelope: Vec<u8>,
}

impl SignedTransaction {
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn signatures(&self) -> &[DecoratedSignature] {
        &self.signatures
    }

    pub fn operations(&self) -> &[Operation] {
        self.transaction.operations()
    }

    pub fn to_envelope_xdr(&self) -> &[u8] {
        &self.envelope
    }

    pub fn to_envelope_xdr_base64(&self) -> String {
        STANDARD.encode(&self.envelope)
    }
}

#[cfg(test)]
#[path = "tests/transaction_tests.rs"]
mod tests;
