use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use crate::adapters::Upstream;
use crate::data_source::{FetchFuture, HealthStatus, PriceSource, SeriesRequest, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::provider_policy::ProviderPolicy;
use crate::{PriceSeries, ProviderId};

const CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart adapter.
///
/// Uses the public v8 chart endpoint, which serves hourly closes for futures
/// (`GC=F`), FX (`EURUSD=X`) and indices (`^NDX`) without a crumb.
#[derive(Clone)]
pub struct YahooAdapter {
    upstream: Upstream,
    base_url: String,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_policy(http_client, &ProviderPolicy::yahoo_default())
    }

    pub fn with_policy(http_client: Arc<dyn HttpClient>, policy: &ProviderPolicy) -> Self {
        Self {
            upstream: Upstream::new(policy, http_client),
            base_url: String::from(CHART_ENDPOINT),
        }
    }

    /// Overrides the chart endpoint, e.g. for a local mirror.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn chart_url(&self, req: &SeriesRequest) -> String {
        // Yahoo only accepts ranges in whole days; weekends and session
        // breaks make the answer shorter than the span, never longer.
        let range = format!("{}d", req.interval.days_spanned(req.limit));
        format!(
            "{}/{}?range={}&interval={}",
            self.base_url,
            urlencoding::encode(&req.symbol),
            range,
            req.interval.as_str()
        )
    }

    async fn fetch_chart(&self, req: SeriesRequest) -> Result<PriceSeries, SourceError> {
        let request = HttpRequest::get(self.chart_url(&req))
            .with_header("referer", "https://finance.yahoo.com/")
            .with_header("accept", "application/json");

        let body = self.upstream.fetch_body(request).await?;
        parse_chart_closes(&body, req.limit)
    }
}

impl PriceSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn fetch_closes<'a>(&'a self, req: SeriesRequest) -> FetchFuture<'a> {
        Box::pin(self.fetch_chart(req))
    }

    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>> {
        Box::pin(async move { self.upstream.health() })
    }
}

/// Extracts the most recent `limit` non-null closes from a chart payload.
fn parse_chart_closes(body: &str, limit: usize) -> Result<PriceSeries, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error {
        return Err(SourceError::unavailable(format!(
            "yahoo chart API error: {} ({})",
            error.description.unwrap_or_default(),
            error.code.unwrap_or_default()
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::unavailable("yahoo chart returned no result"))?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter(|close| close.is_finite())
        .collect::<Vec<_>>();

    if closes.is_empty() {
        return Err(SourceError::unavailable("yahoo chart contained no closes"));
    }

    PriceSeries::new(closes)
        .map(|series| series.truncate_front(limit))
        .map_err(|e| SourceError::internal(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
