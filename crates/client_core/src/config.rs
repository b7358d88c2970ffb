use std::time::Duration;

use ledger::{Amount, Network, Price, BASE_FEE, LIQUIDITY_POOL_FEE_V18};

pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(30);
pub const TESTNET_EXPLORER_TX_URL: &str = "https://stellar.expert/explorer/testnet/tx";

/// Acceptable deposit price range. Equal bounds pin the deposit to one exact ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBounds {
    pub min: Price,
    pub max: Price,
}

impl Default for PriceBounds {
    fn default() -> Self {
        Self {
            min: Price::ONE,
            max: Price::ONE,
        }
    }
}

/// Minimum amounts of each pool asset a withdrawal must return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WithdrawMinimums {
    pub amount_a: Amount,
    pub amount_b: Amount,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub network: Network,
    pub base_fee: u32,
    pub tx_timeout: Duration,
    pub pool_fee: i32,
    pub deposit_price_bounds: PriceBounds,
    pub withdraw_minimums: WithdrawMinimums,
    pub explorer_tx_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            network: Network::testnet(),
            base_fee: BASE_FEE,
            tx_timeout: DEFAULT_TX_TIMEOUT,
            pool_fee: LIQUIDITY_POOL_FEE_V18,
            deposit_price_bounds: PriceBounds::default(),
            withdraw_minimums: WithdrawMinimums::default(),
            explorer_tx_url: TESTNET_EXPLORER_TX_URL.into(),
        }
    }
}

impl SessionConfig {
    pub fn transaction_url(&self, hash: &str) -> String {
        format!("{}/{hash}", self.explorer_tx_url.trim_end_matches('/'))
    }
}
