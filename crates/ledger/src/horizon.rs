use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::{LedgerError, Result},
    keypair::AccountId,
    transaction::{Account, Operation, SignedTransaction},
    LedgerClient, SubmitResponse,
};

pub const TESTNET_HORIZON_URL: &str = "https://horizon-testnet.stellar.org";

#[derive(Debug, Deserialize)]
struct AccountResponse {
    sequence: String,
}

#[derive(Debug, Deserialize)]
struct SubmitSuccess {
    hash: String,
}

#[derive(Debug, Default, Deserialize)]
struct Problem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
    #[serde(default)]
    extras: Option<ProblemExtras>,
}

#[derive(Debug, Default, Deserialize)]
struct ProblemExtras {
    #[serde(default)]
    result_codes: Option<ResultCodes>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultCodes {
    #[serde(default)]
    transaction: Option<String>,
    #[serde(default)]
    operations: Vec<String>,
}

impl Problem {
    fn describe(&self, status: StatusCode) -> String {
        let codes = self
            .extras
            .as_ref()
            .and_then(|extras| extras.result_codes.as_ref());
        match codes {
            Some(codes) => {
                let tx = codes.transaction.as_deref().unwrap_or("unknown");
                if codes.operations.is_empty() {
                    tx.to_string()
                } else {
                    format!("{tx} [{}]", codes.operations.join(", "))
                }
            }
            None if !self.detail.is_empty() => format!("{}: {}", self.title, self.detail),
            None if !self.title.is_empty() => self.title.clone(),
            None => format!("status {status}"),
        }
    }
}

/// Horizon REST client for account lookups and transaction submission.
pub struct HorizonClient {
    http: Client,
    base_url: String,
}

impl HorizonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(Client::new(), base_url)
    }

    pub fn with_http(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn account(&self, account_id: &AccountId) -> Result<Account> {
        let endpoint = format!("{}/accounts/{account_id}", self.base_url);
        debug!(%endpoint, "horizon: loading account");
        let res = self.http.get(&endpoint).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Err(LedgerError::AccountNotFound(account_id.to_string()));
        }
        let body: AccountResponse = res.error_for_status()?.json().await?;
        let sequence = body
            .sequence
            .parse::<i64>()
            .map_err(|_| LedgerError::UnexpectedResponse {
                endpoint: endpoint.clone(),
                detail: format!("sequence '{}' is not an integer", body.sequence),
            })?;
        Ok(Account {
            account_id: *account_id,
            sequence,
        })
    }

    pub async fn submit(&self, transaction: &SignedTransaction) -> Result<SubmitResponse> {
        let endpoint = format!("{}/transactions", self.base_url);
        let tx = transaction.transaction();
        let operations: Vec<&str> = tx.operations().iter().map(Operation::name).collect();
        debug!(
            %endpoint,
            hash = %tx.hash_hex(),
            source = %tx.source(),
            sequence = tx.sequence(),
            fee = tx.fee(),
            max_time = tx.time_bounds().max_time,
            operations = %operations.join(","),
            signatures = transaction.signatures().len(),
            "horizon: submitting transaction"
        );
        let res = self
            .http
            .post(&endpoint)
            .form(&[("tx", transaction.to_envelope_xdr_base64())])
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            let body: SubmitSuccess = res.json().await?;
            return Ok(SubmitResponse { hash: body.hash });
        }

        let problem = res.json::<Problem>().await.unwrap_or_default();
        if status.is_client_error() {
            return Err(LedgerError::Rejected(problem.describe(status)));
        }
        Err(LedgerError::UnexpectedResponse {
            endpoint,
            detail: problem.describe(status),
        })
    }
}

#[async_trait]
impl LedgerClient for HorizonClient {
    async fn load_account(&self, account_id: &AccountId) -> anyhow::Result<Account> {
        Ok(self.account(account_id).await?)
    }

    async fn submit_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> anyhow::Result<SubmitResponse> {
        Ok(self.submit(transaction).await?)
    }
}

#[cfg(test)]
#[path = "tests/horizon_tests.rs"]
mod tests;
