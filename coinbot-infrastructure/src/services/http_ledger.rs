use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use coinbot_domain::{Ledger, LedgerTransactionRequest, UserHash};

/// Client for the ledger service's JSON API.
pub struct HttpLedger {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct LastTransactionResponse {
    /// Seconds since the epoch.
    timestamp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    valid: bool,
}

impl HttpLedger {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.max(1)))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn seconds_to_utc(seconds: f64) -> Result<DateTime<Utc>> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(anyhow!("ledger returned invalid timestamp {}", seconds));
    }
    let micros = (seconds * 1_000_000.0).round() as i64;
    DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or_else(|| anyhow!("ledger timestamp {} out of range", seconds))
}

#[async_trait]
impl Ledger for HttpLedger {
    async fn submit_transaction(&self, request: &LedgerTransactionRequest) -> Result<()> {
        let response = self
            .client
            .post(self.url("/transactions"))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("ledger rejected transaction: {} {}", status, body));
        }
        Ok(())
    }

    async fn get_balance(&self, user: &UserHash) -> Result<Option<i64>> {
        let response = self
            .client
            .get(self.url(&format!("/balance/{}", user)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: BalanceResponse = response.error_for_status()?.json().await?;
        Ok(body.balance)
    }

    async fn last_transaction_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        let response = self
            .client
            .get(self.url("/transactions/last"))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: LastTransactionResponse = response.error_for_status()?.json().await?;
        body.timestamp.map(seconds_to_utc).transpose()
    }

    async fn validate_chain(&self) -> Result<bool> {
        let response = self.client.get(self.url("/validate")).send().await?;
        let body: ValidateResponse = response.error_for_status()?.json().await?;
        Ok(body.valid)
    }
}
