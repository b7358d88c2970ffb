use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use client_core::{
    config::TESTNET_EXPLORER_TX_URL, PriceBounds, SessionConfig, WithdrawMinimums,
};
use ledger::{
    faucet::TESTNET_FRIENDBOT_URL, horizon::TESTNET_HORIZON_URL, transaction::TESTNET_PASSPHRASE,
    Amount, Network, Price, BASE_FEE, LIQUIDITY_POOL_FEE_V18,
};
use serde::Deserialize;
use url::Url;

/// Upper bound on how far in the future a transaction deadline may be set.
pub const MAX_TX_TIMEOUT_SECONDS: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub horizon_url: String,
    pub friendbot_url: String,
    pub network_passphrase: String,
    pub base_fee: u32,
    pub tx_timeout_seconds: u64,
    pub deposit_min_price: String,
    pub deposit_max_price: String,
    pub withdraw_min_amount_a: String,
    pub withdraw_min_amount_b: String,
    pub explorer_tx_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            horizon_url: TESTNET_HORIZON_URL.into(),
            friendbot_url: TESTNET_FRIENDBOT_URL.into(),
            network_passphrase: TESTNET_PASSPHRASE.into(),
            base_fee: BASE_FEE,
            tx_timeout_seconds: 30,
            deposit_min_price: "1/1".into(),
            deposit_max_price: "1/1".into(),
            withdraw_min_amount_a: "0".into(),
            withdraw_min_amount_b: "0".into(),
            explorer_tx_url: TESTNET_EXPLORER_TX_URL.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    horizon_url: Option<String>,
    friendbot_url: Option<String>,
    network_passphrase: Option<String>,
    base_fee: Option<u32>,
    tx_timeout_seconds: Option<u64>,
    deposit_min_price: Option<String>,
    deposit_max_price: Option<String>,
    withdraw_min_amount_a: Option<String>,
    withdraw_min_amount_b: Option<String>,
    explorer_tx_url: Option<String>,
}

/// Defaults, then the TOML file if it exists, then `APP__*` variables.
pub fn load_settings(path: &Path) -> Result<Settings> {
    load_settings_from(path, |key| std::env::var(key).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
        apply_file(&mut settings, file_cfg);
    }

    if let Some(v) = env("APP__HORIZON_URL") {
        settings.horizon_url = v;
    }
    if let Some(v) = env("APP__FRIENDBOT_URL") {
        settings.friendbot_url = v;
    }
    if let Some(v) = env("APP__NETWORK_PASSPHRASE") {
        settings.network_passphrase = v;
    }
    if let Some(v) = env("APP__BASE_FEE") {
        settings.base_fee = v
            .parse()
            .with_context(|| format!("APP__BASE_FEE must be an integer, got '{v}'"))?;
    }
    if let Some(v) = env("APP__TX_TIMEOUT_SECONDS") {
        settings.tx_timeout_seconds = v
            .parse()
            .with_context(|| format!("APP__TX_TIMEOUT_SECONDS must be an integer, got '{v}'"))?;
    }
    if let Some(v) = env("APP__DEPOSIT_MIN_PRICE") {
        settings.deposit_min_price = v;
    }
    if let Some(v) = env("APP__DEPOSIT_MAX_PRICE") {
        settings.deposit_max_price = v;
    }
    if let Some(v) = env("APP__WITHDRAW_MIN_AMOUNT_A") {
        settings.withdraw_min_amount_a = v;
    }
    if let Some(v) = env("APP__WITHDRAW_MIN_AMOUNT_B") {
        settings.withdraw_min_amount_b = v;
    }
    if let Some(v) = env("APP__EXPLORER_TX_URL") {
        settings.explorer_tx_url = v;
    }

    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    let FileSettings {
        horizon_url,
        friendbot_url,
        network_passphrase,
        base_fee,
        tx_timeout_seconds,
        deposit_min_price,
        deposit_max_price,
        withdraw_min_amount_a,
        withdraw_min_amount_b,
        explorer_tx_url,
    } = file_cfg;

    if let Some(v) = horizon_url {
        settings.horizon_url = v;
    }
    if let Some(v) = friendbot_url {
        settings.friendbot_url = v;
    }
    if let Some(v) = network_passphrase {
        settings.network_passphrase = v;
    }
    if let Some(v) = base_fee {
        settings.base_fee = v;
    }
    if let Some(v) = tx_timeout_seconds {
        settings.tx_timeout_seconds = v;
    }
    if let Some(v) = deposit_min_price {
        settings.deposit_min_price = v;
    }
    if let Some(v) = deposit_max_price {
        settings.deposit_max_price = v;
    }
    if let Some(v) = withdraw_min_amount_a {
        settings.withdraw_min_amount_a = v;
    }
    if let Some(v) = withdraw_min_amount_b {
        settings.withdraw_min_amount_b = v;
    }
    if let Some(v) = explorer_tx_url {
        settings.explorer_tx_url = v;
    }
}

impl Settings {
    pub fn session_config(&self) -> Result<SessionConfig> {
        for (name, value) in [
            ("horizon_url", &self.horizon_url),
            ("friendbot_url", &self.friendbot_url),
            ("explorer_tx_url", &self.explorer_tx_url),
        ] {
            Url::parse(value).with_context(|| format!("{name} is not a valid url: '{value}'"))?;
        }
        if self.network_passphrase.trim().is_empty() {
            bail!("network_passphrase must not be empty");
        }
        if self.base_fee == 0 {
            bail!("base_fee must be at least 1 stroop");
        }
        if self.tx_timeout_seconds > MAX_TX_TIMEOUT_SECONDS {
            bail!("tx_timeout_seconds must be at most {MAX_TX_TIMEOUT_SECONDS}");
        }

        let min: Price = self
            .deposit_min_price
            .parse()
            .context("invalid deposit_min_price")?;
        let max: Price = self
            .deposit_max_price
            .parse()
            .context("invalid deposit_max_price")?;
        if i64::from(min.n) * i64::from(max.d) > i64::from(max.n) * i64::from(min.d) {
            bail!("deposit_min_price {min} exceeds deposit_max_price {max}");
        }

        let amount_a =
            Amount::parse(&self.withdraw_min_amount_a).context("invalid withdraw_min_amount_a")?;
        let amount_b =
            Amount::parse(&self.withdraw_min_amount_b).context("invalid withdraw_min_amount_b")?;

        Ok(SessionConfig {
            network: Network::new(self.network_passphrase.clone()),
            base_fee: self.base_fee,
            tx_timeout: Duration::from_secs(self.tx_timeout_seconds),
            pool_fee: LIQUIDITY_POOL_FEE_V18,
            deposit_price_bounds: PriceBounds { min, max },
            withdraw_minimums: WithdrawMinimums { amount_a, amount_b },
            explorer_tx_url: self.explorer_tx_url.clone(),
        })
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
