//! Ledger-side collaborators: keys, assets, transactions and the HTTP
//! clients that load accounts, submit transactions and request testnet funds.

use async_trait::async_trait;

pub mod amount;
pub mod asset;
pub mod error;
pub mod faucet;
pub mod horizon;
pub mod keypair;
pub mod transaction;

pub use amount::{Amount, Price};
pub use asset::{
    pool_id, Asset, AssetCode, LiquidityPoolAsset, PoolId, PoolKind, LIQUIDITY_POOL_FEE_V18,
};
pub use error::{LedgerError, Result};
pub use faucet::FriendbotClient;
pub use horizon::HorizonClient;
pub use keypair::{AccountId, Keypair};
pub use transaction::{
    Account, Network, Operation, SignedTransaction, Transaction, TransactionBuilder, BASE_FEE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingStatus {
    Funded,
    Declined { status: u16 },
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    fn generate_keypair(&self) -> Keypair {
        Keypair::random()
    }

    async fn load_account(&self, account_id: &AccountId) -> anyhow::Result<Account>;

    async fn submit_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> anyhow::Result<SubmitResponse>;
}

/// Transport failures are `Err`; a non-success HTTP status is `Declined`.
#[async_trait]
pub trait Faucet: Send + Sync {
    async fn fund(&self, account_id: &AccountId) -> anyhow::Result<FundingStatus>;
}
