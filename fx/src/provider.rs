//! Rate provider trait and implementations.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use fxwatch_common::Currency;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{FxError, FxResult};

/// Marker the remote source uses for a successful response.
pub const SUCCESS_RESULT: &str = "success";

/// Placeholder substituted with the uppercased base code.
pub const BASE_PLACEHOLDER: &str = "{base}";

/// Default endpoint template.
pub const DEFAULT_ENDPOINT_TEMPLATE: &str = "https://open.er-api.com/v6/latest/{base}";

/// Rates against one base currency, as returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseRates {
    /// Base currency the rates are quoted against.
    pub base: Currency,
    /// Quote currency code (uppercased) to rate.
    pub rates: HashMap<String, f64>,
    /// Provider status marker, e.g. `"success"`.
    pub provider_status: String,
}

impl BaseRates {
    /// Create rates for a base, uppercasing the quote codes.
    pub fn new(
        base: Currency,
        rates: impl IntoIterator<Item = (String, f64)>,
        provider_status: impl Into<String>,
    ) -> Self {
        Self {
            base,
            rates: rates
                .into_iter()
                .map(|(code, rate)| (code.trim().to_uppercase(), rate))
                .collect(),
            provider_status: provider_status.into(),
        }
    }

    /// Look up the rate for a quote currency.
    pub fn rate_for(&self, quote: &Currency) -> Option<f64> {
        self.rates.get(quote.code()).copied()
    }
}

/// Trait for FX rate providers.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch all rates quoted against `base`.
    ///
    /// No retries happen here; the next scheduled cycle is the retry.
    async fn fetch_rates(&self, base: &Currency) -> FxResult<BaseRates>;
}

/// Configuration for the HTTP provider.
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// URL template containing `{base}`.
    pub endpoint_template: String,
    /// Upper bound for one request, connect to last body byte.
    pub request_timeout: Duration,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        Self {
            endpoint_template: DEFAULT_ENDPOINT_TEMPLATE.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Wire format of the remote response.
#[derive(Debug, Deserialize)]
struct RateResponse {
    result: String,
    base_code: Option<String>,
    rates: Option<HashMap<String, f64>>,
}

/// Provider backed by a JSON-over-HTTP rate endpoint.
#[derive(Clone)]
pub struct HttpRateProvider {
    http: Client,
    config: HttpProviderConfig,
}

impl HttpRateProvider {
    /// Create a new HTTP provider.
    pub fn new(config: HttpProviderConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, config })
    }

    /// URL queried for `base`.
    pub fn url_for(&self, base: &Currency) -> String {
        self.config
            .endpoint_template
            .replace(BASE_PLACEHOLDER, base.code())
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        "HTTP"
    }

    #[instrument(skip(self, base), fields(base = %base), level = "debug")]
    async fn fetch_rates(&self, base: &Currency) -> FxResult<BaseRates> {
        let url = self.url_for(base);
        let transport = |e: reqwest::Error| FxError::Transport {
            base: base.code().to_string(),
            message: e.to_string(),
        };

        let resp = self.http.get(&url).send().await.map_err(transport)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(transport)?;

        let rates = decode_response(base, status, &body)?;

        debug!(quotes = rates.rates.len(), "Rates fetched");
        Ok(rates)
    }
}

/// Interpret a raw HTTP status and body from the rate endpoint.
pub fn decode_response(base: &Currency, status: u16, body: &str) -> FxResult<BaseRates> {
    if !(200..300).contains(&status) {
        return Err(FxError::Remote {
            base: base.code().to_string(),
            status,
            body: body.to_string(),
        });
    }

    let protocol = |message: String| FxError::Protocol {
        base: base.code().to_string(),
        message,
    };

    let response: RateResponse =
        serde_json::from_str(body).map_err(|e| protocol(e.to_string()))?;

    if response.result != SUCCESS_RESULT {
        return Err(FxError::ProviderRejected {
            base: base.code().to_string(),
            result: response.result,
        });
    }

    let echoed = response
        .base_code
        .ok_or_else(|| protocol("missing field `base_code`".to_string()))?;
    let rates = response
        .rates
        .ok_or_else(|| protocol("missing field `rates`".to_string()))?;

    if Currency::new(&echoed) != *base {
        warn!(base = %base, echoed = %echoed, "Rate source echoed a different base");
    }

    Ok(BaseRates::new(base.clone(), rates, response.result))
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    rates: dashmap::DashMap<Currency, HashMap<String, f64>>,
    failures: dashmap::DashMap<Currency, u16>,
    calls: dashmap::DashMap<Currency, usize>,
    delay: parking_lot::Mutex<Option<Duration>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a new mock provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rates: dashmap::DashMap::new(),
            failures: dashmap::DashMap::new(),
            calls: dashmap::DashMap::new(),
            delay: parking_lot::Mutex::new(None),
        }
    }

    /// Set one quote for a base.
    pub fn set_rate(&self, base: &str, quote: &str, rate: f64) {
        self.rates
            .entry(Currency::new(base))
            .or_default()
            .insert(quote.trim().to_uppercase(), rate);
    }

    /// Make every request for `base` fail with the given HTTP status.
    pub fn fail_base(&self, base: &str, status: u16) {
        self.failures.insert(Currency::new(base), status);
    }

    /// Stop failing requests for `base`.
    pub fn heal_base(&self, base: &str) {
        self.failures.remove(&Currency::new(base));
    }

    /// Delay every response.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Number of requests made for `base`.
    pub fn calls_for(&self, base: &str) -> usize {
        self.calls
            .get(&Currency::new(base))
            .map(|c| *c)
            .unwrap_or(0)
    }

    /// Number of requests made across all bases.
    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| *c.value()).sum()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(&self, base: &Currency) -> FxResult<BaseRates> {
        *self.calls.entry(base.clone()).or_insert(0) += 1;

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(status) = self.failures.get(base).map(|s| *s) {
            return Err(FxError::Remote {
                base: base.code().to_string(),
                status,
                body: "mock failure".to_string(),
            });
        }

        match self.rates.get(base) {
            Some(rates) => Ok(BaseRates::new(
                base.clone(),
                rates.value().clone(),
                SUCCESS_RESULT,
            )),
            None => Err(FxError::ProviderRejected {
                base: base.code().to_string(),
                result: "error".to_string(),
            }),
        }
    }
}
