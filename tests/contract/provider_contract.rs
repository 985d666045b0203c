use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use ferrowatch_core::{
    BinanceAdapter, HealthState, HttpClient, HttpError, HttpRequest, HttpResponse, PriceSource,
    ProviderId, SeriesRequest, SourceErrorKind, YahooAdapter,
};

#[derive(Default)]
struct RecordingHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingHttpClient {
    fn replying(responses: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("requests lock")
            .iter()
            .map(|request| request.url.clone())
            .collect()
    }
}

impl HttpClient for RecordingHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests.lock().expect("requests lock").push(request);
        let next = self
            .responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::new("no scripted response")));
        Box::pin(async move { next })
    }
}

struct ProviderCase {
    id: ProviderId,
    symbol: &'static str,
    build: fn(Arc<dyn HttpClient>) -> Arc<dyn PriceSource>,
    body: String,
    expected_url: &'static str,
}

fn yahoo_chart(closes: &[Option<f64>]) -> String {
    let closes = closes
        .iter()
        .map(|close| close.map_or_else(|| String::from("null"), |value| value.to_string()))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        r#"{{"chart":{{"result":[{{"meta":{{"symbol":"GC=F"}},"indicators":{{"quote":[{{"close":[{closes}]}}]}}}}],"error":null}}}}"#
    )
}

fn binance_klines(closes: &[f64]) -> String {
    let rows = closes
        .iter()
        .enumerate()
        .map(|(index, close)| {
            format!(r#"[{index},"1","2","0.5","{close}","10",{index},"0",1,"0","0","0"]"#)
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("[{rows}]")
}

fn provider_cases() -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            id: ProviderId::Yahoo,
            symbol: "GC=F",
            build: |client| Arc::new(YahooAdapter::with_http_client(client)),
            body: yahoo_chart(&[Some(2000.5), None, Some(2001.0), Some(2002.25)]),
            expected_url: "https://query1.finance.yahoo.com/v8/finance/chart/GC%3DF?range=2d&interval=1h",
        },
        ProviderCase {
            id: ProviderId::Binance,
            symbol: "BTCUSDT",
            build: |client| Arc::new(BinanceAdapter::with_http_client(client)),
            body: binance_klines(&[2000.5, 2001.0, 2002.25]),
            expected_url: "https://api.binance.com/api/v3/klines?symbol=BTCUSDT&interval=1h&limit=48",
        },
    ]
}

#[tokio::test]
async fn closes_are_chronological_and_finite_for_all_providers() {
    for case in provider_cases() {
        let client = RecordingHttpClient::replying(vec![Ok(HttpResponse::ok_json(case.body))]);
        let source = (case.build)(client.clone());
        assert_eq!(source.id(), case.id);

        let series = source
            .fetch_closes(SeriesRequest::hourly(case.symbol, 48).expect("valid request"))
            .await
            .unwrap_or_else(|error| panic!("provider '{}' fetch failed: {error}", case.id));

        assert_eq!(
            series.closes(),
            &[2000.5, 2001.0, 2002.25],
            "provider '{}': closes",
            case.id
        );
        assert_eq!(client.urls(), vec![case.expected_url], "provider '{}': url", case.id);
    }
}

#[tokio::test]
async fn limit_keeps_most_recent_closes_for_all_providers() {
    for case in provider_cases() {
        let client = RecordingHttpClient::replying(vec![Ok(HttpResponse::ok_json(case.body))]);
        let source = (case.build)(client);

        let series = source
            .fetch_closes(SeriesRequest::hourly(case.symbol, 2).expect("valid request"))
            .await
            .unwrap_or_else(|error| panic!("provider '{}' fetch failed: {error}", case.id));

        assert_eq!(series.closes(), &[2001.0, 2002.25], "provider '{}'", case.id);
    }
}

#[tokio::test]
async fn server_errors_are_unavailable_for_all_providers() {
    for case in provider_cases() {
        let client = RecordingHttpClient::replying(vec![Ok(HttpResponse::with_status(503, ""))]);
        let source = (case.build)(client);

        let error = source
            .fetch_closes(SeriesRequest::hourly(case.symbol, 48).expect("valid request"))
            .await
            .expect_err("503 must fail");

        assert_eq!(
            error.kind(),
            SourceErrorKind::Unavailable,
            "provider '{}'",
            case.id
        );
    }
}

#[tokio::test]
async fn malformed_bodies_never_yield_a_series() {
    for case in provider_cases() {
        let client =
            RecordingHttpClient::replying(vec![Ok(HttpResponse::ok_json("<html>oops</html>"))]);
        let source = (case.build)(client);

        let result = source
            .fetch_closes(SeriesRequest::hourly(case.symbol, 48).expect("valid request"))
            .await;

        assert!(result.is_err(), "provider '{}' accepted garbage", case.id);
    }
}

#[tokio::test]
async fn repeated_transport_failures_open_the_circuit_for_all_providers() {
    for case in provider_cases() {
        let client = RecordingHttpClient::replying(vec![
            Err(HttpError::new("connection reset")),
            Err(HttpError::new("connection reset")),
            Err(HttpError::new("connection reset")),
        ]);
        let source = (case.build)(client.clone());
        let request = SeriesRequest::hourly(case.symbol, 48).expect("valid request");

        for _ in 0..3 {
            let error = source
                .fetch_closes(request.clone())
                .await
                .expect_err("transport failure");
            assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        }

        assert_eq!(
            source.health().await.state,
            HealthState::Unhealthy,
            "provider '{}'",
            case.id
        );

        let error = source
            .fetch_closes(request)
            .await
            .expect_err("open circuit must short-circuit");
        assert!(error.message().contains("circuit"), "provider '{}'", case.id);
        assert_eq!(client.urls().len(), 3, "provider '{}': no fourth call", case.id);
    }
}
