use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::{error::Result, keypair::AccountId, Faucet, FundingStatus};

pub const TESTNET_FRIENDBOT_URL: &str = "https://friendbot.stellar.org";

/// Testnet faucet: one GET per funding request, no retries.
pub struct FriendbotClient {
    http: Client,
    base_url: String,
}

impl FriendbotClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn request_funding(&self, account_id: &AccountId) -> Result<FundingStatus> {
        debug!(base_url = %self.base_url, %account_id, "friendbot: requesting funds");
        let res = self
            .http
            .get(&self.base_url)
            .query(&[("addr", account_id.to_string())])
            .send()
            .await?;
        let status = res.status();
        if status.is_success() {
            Ok(FundingStatus::Funded)
        } else {
            Ok(FundingStatus::Declined {
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl Faucet for FriendbotClient {
    async fn fund(&self, account_id: &AccountId) -> anyhow::Result<FundingStatus> {
        Ok(self.request_funding(account_id).await?)
    }
}
