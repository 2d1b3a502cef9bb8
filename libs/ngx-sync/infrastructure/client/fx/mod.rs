//! Reference FX rate client.
//!
//! Fetches the USD rate table from a public endpoint and reads out one
//! quote currency. Any failure here degrades to the configured fallback
//! rate: the FX phase is best-effort and must never take the equity
//! results down with it.

use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum FxError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Rate endpoint returned status {0}")]
    BadStatus(reqwest::StatusCode),

    #[error("Currency {0} missing from rate response")]
    MissingCurrency(String),
}

pub type Result<T> = std::result::Result<T, FxError>;

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

/// Client for the external rates endpoint.
pub struct FxClient {
    url: String,
    quote_currency: String,
    fallback_rate: f64,
    client: Client,
}

impl FxClient {
    pub fn new(url: impl Into<String>, quote_currency: impl Into<String>, fallback_rate: f64) -> Self {
        Self {
            url: url.into(),
            quote_currency: quote_currency.into(),
            fallback_rate,
            client: Client::new(),
        }
    }

    /// Fetch the reference rate, substituting the fallback on any failure.
    ///
    /// Returns `(rate, used_fallback)`.
    pub async fn fetch_rate(&self) -> (f64, bool) {
        match self.try_fetch().await {
            Ok(rate) => {
                debug!("Fetched {} rate: {}", self.quote_currency, rate);
                (rate, false)
            }
            Err(e) => {
                warn!(
                    "FX rate fetch failed ({}); using fallback rate {}",
                    e, self.fallback_rate
                );
                (self.fallback_rate, true)
            }
        }
    }

    async fn try_fetch(&self) -> Result<f64> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::BadStatus(status));
        }

        let body: RatesResponse = response.json().await?;
        body.rates
            .get(&self.quote_currency)
            .copied()
            .ok_or_else(|| FxError::MissingCurrency(self.quote_currency.clone()))
    }
}
