//! Listings-page client: fetches the public equities page and turns its
//! table into watchlist quotes.

pub mod normalize;
pub mod table;

use std::time::Duration;

use reqwest::header::{ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::domain::models::EquityQuote;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Listings page returned status {0}")]
    BadStatus(reqwest::StatusCode),

    #[error("No table on the page matched the listings heuristic")]
    TableNotFound,
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Some hosts serve bots an empty shell; present a plain browser profile.
const REQUEST_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const REQUEST_LANGUAGE: &str = "en-US,en;q=0.9";

/// Client for the listings page.
pub struct ListingsClient {
    url: String,
    client: Client,
}

impl ListingsClient {
    /// Build a client with the given page URL and request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Fetch the raw page markup.
    ///
    /// A network error, timeout, or non-2xx status fails the whole
    /// invocation; there is no retry here, the scheduler's next firing is
    /// the retry.
    pub async fn fetch_markup(&self) -> Result<String> {
        debug!("GET {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header(USER_AGENT, REQUEST_USER_AGENT)
            .header(ACCEPT_LANGUAGE, REQUEST_LANGUAGE)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::BadStatus(status));
        }

        Ok(response.text().await?)
    }

    /// Fetch and extract in one step.
    pub async fn fetch_quotes(&self) -> Result<Vec<EquityQuote>> {
        let markup = self.fetch_markup().await?;
        table::parse_quotes(&markup)
    }
}
