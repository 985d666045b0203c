use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::adapters::Upstream;
use crate::data_source::{FetchFuture, HealthStatus, PriceSource, SeriesRequest, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::provider_policy::ProviderPolicy;
use crate::{PriceSeries, ProviderId};

const KLINES_ENDPOINT: &str = "https://api.binance.com/api/v3/klines";
const MAX_KLINES: usize = 1_000;
const CLOSE_INDEX: usize = 4;

/// Binance spot klines adapter for crypto pairs (`BTCUSDT`).
#[derive(Clone)]
pub struct BinanceAdapter {
    upstream: Upstream,
    base_url: String,
}

impl Default for BinanceAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl BinanceAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_policy(http_client, &ProviderPolicy::binance_default())
    }

    pub fn with_policy(http_client: Arc<dyn HttpClient>, policy: &ProviderPolicy) -> Self {
        Self {
            upstream: Upstream::new(policy, http_client),
            base_url: String::from(KLINES_ENDPOINT),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn klines_url(&self, req: &SeriesRequest) -> String {
        format!(
            "{}?symbol={}&interval={}&limit={}",
            self.base_url,
            urlencoding::encode(&req.symbol.to_ascii_uppercase()),
            req.interval.as_str(),
            req.limit.min(MAX_KLINES)
        )
    }

    async fn fetch_klines(&self, req: SeriesRequest) -> Result<PriceSeries, SourceError> {
        let body = self
            .upstream
            .fetch_body(HttpRequest::get(self.klines_url(&req)))
            .await?;
        parse_kline_closes(&body, req.limit)
    }
}

impl PriceSource for BinanceAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Binance
    }

    fn fetch_closes<'a>(&'a self, req: SeriesRequest) -> FetchFuture<'a> {
        Box::pin(self.fetch_klines(req))
    }

    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>> {
        Box::pin(async move { self.upstream.health() })
    }
}

/// Klines are arrays; the close is a decimal string at index 4.
fn parse_kline_closes(body: &str, limit: usize) -> Result<PriceSeries, SourceError> {
    let klines: Vec<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse binance klines: {e}")))?;

    if klines.is_empty() {
        return Err(SourceError::unavailable("binance returned no klines"));
    }

    let closes = klines
        .iter()
        .enumerate()
        .map(|(index, kline)| {
            kline
                .get(CLOSE_INDEX)
                .and_then(close_value)
                .ok_or_else(|| {
                    SourceError::internal(format!("binance kline {index} has no numeric close"))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    PriceSeries::new(closes)
        .map(|series| series.truncate_front(limit))
        .map_err(|e| SourceError::internal(e.to_string()))
}

fn close_value(value: &Value) -> Option<f64> {
    match value {
        Value::String(text) => text.parse::<f64>().ok(),
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
    .filter(|close| close.is_finite())
}
