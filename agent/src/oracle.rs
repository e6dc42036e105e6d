//! Pyth Hermes price oracle

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::time::Duration;

use crate::error::{AgentError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Yield proxy: price / 1000
const YIELD_DIVISOR: f64 = 1000.0;

/// A single normalized price observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub price: f64,
    /// unix seconds
    pub publish_time: i64,
}

impl PriceQuote {
    /// Reject stale or non-positive quotes
    pub fn validate(&self, now: i64, max_staleness: u64) -> Result<()> {
        let age = now - self.publish_time;
        if age > i64::try_from(max_staleness).unwrap_or(i64::MAX) {
            return Err(AgentError::StaleData { age, max: max_staleness });
        }
        if self.price.is_nan() || self.price <= 0.0 {
            return Err(AgentError::InvalidPrice(self.price));
        }
        Ok(())
    }
}

/// Market inputs handed to the decision model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketSample {
    pub price: f64,
    pub yield_rate: f64,
    pub volatility: f64,
}

#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn latest_price(&self) -> Result<PriceQuote>;
}

#[derive(Debug, Deserialize)]
struct HermesResponse {
    parsed: Vec<ParsedUpdate>,
}

#[derive(Debug, Deserialize)]
struct ParsedUpdate {
    price: HermesPrice,
}

#[derive(Debug, Deserialize)]
struct HermesPrice {
    price: String,
    expo: i32,
    publish_time: i64,
}

/// Decode a Hermes `latest` response body into a quote
pub fn parse_hermes_response(body: &str) -> Result<PriceQuote> {
    let response: HermesResponse = serde_json::from_str(body)
        .map_err(|e| AgentError::Oracle(format!("Malformed response: {}", e)))?;

    let update = response
        .parsed
        .into_iter()
        .next()
        .ok_or_else(|| AgentError::Oracle("Response carries no parsed updates".to_string()))?;

    let raw: f64 = update
        .price
        .price
        .parse()
        .map_err(|_| AgentError::Oracle(format!("Unparseable price `{}`", update.price.price)))?;

    Ok(PriceQuote {
        price: raw / 10f64.powi(update.price.expo.abs()),
        publish_time: update.price.publish_time,
    })
}

pub struct HermesOracle {
    client: Client,
    base_url: String,
    asset_id: String,
}

impl HermesOracle {
    pub fn new(base_url: &str, asset_id: &str) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            asset_id: asset_id.to_string(),
        })
    }
}

#[async_trait]
impl PriceOracle for HermesOracle {
    async fn latest_price(&self) -> Result<PriceQuote> {
        let url = format!("{}/v2/updates/price/latest", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("ids[]", self.asset_id.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AgentError::Oracle(format!("HTTP {} from oracle", resp.status())));
        }

        let body = resp.text().await?;
        let quote = parse_hermes_response(&body)?;
        tracing::debug!(price = quote.price, publish_time = quote.publish_time, "Oracle quote");
        Ok(quote)
    }
}

/// Rolling window of recent prices
#[derive(Debug, Clone)]
pub struct PriceWindow {
    capacity: usize,
    prices: VecDeque<f64>,
}

impl PriceWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            prices: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a price and derive the current market sample
    pub fn push(&mut self, price: f64) -> MarketSample {
        if self.prices.len() == self.capacity {
            self.prices.pop_front();
        }
        self.prices.push_back(price);

        MarketSample {
            price,
            yield_rate: price / YIELD_DIVISOR,
            volatility: self.volatility(),
        }
    }

    /// Population standard deviation, zero below two samples
    pub fn volatility(&self) -> f64 {
        let n = self.prices.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.prices.iter().sum::<f64>() / n as f64;
        let variance = self.prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n as f64;
        variance.sqrt()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
