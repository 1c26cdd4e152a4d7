//! Exchange-rate lookup with silent fallbacks.
//!
//! Rates come from the CBR daily JSON feed and are fetched fresh for every
//! calculation. Any transport or parse failure is logged and replaced by a
//! hard-coded fallback; callers never see an error.

use async_trait::async_trait;

/// Fallback yuan rate (RUB per CNY, service margin included).
pub const YUAN_FALLBACK: f64 = 13.8;

/// Fallback euro rate (RUB per EUR).
pub const EURO_FALLBACK: f64 = 100.0;

/// Fixed service margin added on top of the live CNY rate.
const YUAN_MARGIN: f64 = 1.3;

const DEFAULT_RATES_URL: &str = "https://www.cbr-xml-daily.ru/daily_json.js";

/// Source of the exchange rates used by the calculator flow.
///
/// Implementations must be infallible: substitute a fallback internally
/// rather than surfacing lookup errors.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// RUB per CNY, margin included.
    async fn yuan_rate(&self) -> f64;

    /// RUB per EUR.
    async fn euro_rate(&self) -> f64;
}

/// CBR daily-feed backed rate source.
pub struct CbrRateSource {
    client: reqwest::Client,
    url: String,
}

impl CbrRateSource {
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.unwrap_or_else(|| DEFAULT_RATES_URL.to_string()),
        }
    }

    /// Fetch the feed and extract one currency's `Value` field.
    async fn fetch_value(&self, code: &str) -> anyhow::Result<f64> {
        let resp = self.client.get(&self.url).send().await?;

        if !resp.status().is_success() {
            anyhow::bail!("rate feed returned {}", resp.status());
        }

        let data: serde_json::Value = resp.json().await?;
        data.get("Valute")
            .and_then(|v| v.get(code))
            .and_then(|c| c.get("Value"))
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| anyhow::anyhow!("missing Valute.{code}.Value in rate feed"))
    }
}

#[async_trait]
impl RateSource for CbrRateSource {
    async fn yuan_rate(&self) -> f64 {
        match self.fetch_value("CNY").await {
            Ok(rate) => rate + YUAN_MARGIN,
            Err(e) => {
                tracing::warn!("yuan rate lookup failed, using fallback {YUAN_FALLBACK}: {e}");
                YUAN_FALLBACK
            }
        }
    }

    async fn euro_rate(&self) -> f64 {
        match self.fetch_value("EUR").await {
            Ok(rate) => rate,
            Err(e) => {
                tracing::warn!("euro rate lookup failed, using fallback {EURO_FALLBACK}: {e}");
                EURO_FALLBACK
            }
        }
    }
}

/// Fixed rates for tests and offline runs.
#[derive(Debug, Clone, Copy)]
pub struct StaticRates {
    pub yuan: f64,
    pub euro: f64,
}

#[async_trait]
impl RateSource for StaticRates {
    async fn yuan_rate(&self) -> f64 {
        self.yuan
    }

    async fn euro_rate(&self) -> f64 {
        self.euro
    }
}
