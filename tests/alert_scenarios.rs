use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ferrowatch_core::{
    DetectionSettings, DetectorError, Direction, EvaluationAnomaly, FetchFuture, Feed, Instrument,
    InstrumentEvaluator, InstrumentId, InstrumentKind, InstrumentOutcome, PriceSeries, PriceSource,
    ProviderId, ScheduleSettings, SeriesRequest, SignalKind, SourceError, SourceErrorKind,
    SourceRouter, WatchConfig,
};

/// Serves canned closes per symbol and records every symbol requested.
struct ScriptedSource {
    id: ProviderId,
    series: HashMap<&'static str, Result<Vec<f64>, SourceError>>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn new(id: ProviderId) -> Self {
        Self {
            id,
            series: HashMap::new(),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn serving(mut self, symbol: &'static str, closes: Vec<f64>) -> Self {
        self.series.insert(symbol, Ok(closes));
        self
    }

    fn failing(mut self, symbol: &'static str, error: SourceError) -> Self {
        self.series.insert(symbol, Err(error));
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().expect("requested lock").clone()
    }
}

impl PriceSource for ScriptedSource {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn fetch_closes<'a>(&'a self, req: SeriesRequest) -> FetchFuture<'a> {
        Box::pin(async move {
            self.requested
                .lock()
                .expect("requested lock")
                .push(req.symbol.clone());
            match self.series.get(req.symbol.as_str()) {
                Some(Ok(closes)) => PriceSeries::new(closes.clone())
                    .map_err(|error| SourceError::internal(error.to_string())),
                Some(Err(error)) => Err(error.clone()),
                None => Err(SourceError::unavailable(format!("{} not scripted", req.symbol))),
            }
        })
    }
}

fn id(value: &str) -> InstrumentId {
    InstrumentId::parse(value).expect("valid id")
}

fn yahoo(symbol: &str) -> Feed {
    Feed::new(ProviderId::Yahoo, symbol).expect("valid feed")
}

fn direct(name: &str, primary: Option<Feed>, fallback: Option<Feed>) -> Instrument {
    Instrument::direct(id(name), primary, fallback).expect("valid instrument")
}

fn evaluator(instruments: Vec<Instrument>, source: Arc<ScriptedSource>) -> InstrumentEvaluator {
    let config = WatchConfig::new(
        DetectionSettings::default(),
        ScheduleSettings::default(),
        instruments,
    )
    .expect("valid config");
    InstrumentEvaluator::new(Arc::new(config), Arc::new(SourceRouter::new(vec![source])))
}

/// High 50, low 45; the last five closes stay within 1% so no movement fires.
fn reversal_window(last: f64) -> Vec<f64> {
    let mut closes = vec![47.0; 24];
    closes[2] = 50.0;
    closes[12] = 45.0;
    for close in &mut closes[19..23] {
        *close = 49.7;
    }
    closes[23] = last;
    closes
}

#[tokio::test]
async fn scenario_a_strong_rise_alerts_with_long_levels() {
    let source = Arc::new(
        ScriptedSource::new(ProviderId::Yahoo)
            .serving("^NDX", vec![100.0, 101.0, 102.0, 103.0, 104.0, 106.0]),
    );
    let nas = direct("NAS100", Some(yahoo("^NDX")), None);
    let evaluator = evaluator(vec![nas.clone()], source);

    let outcome = evaluator.evaluate(&nas).await;
    let alert = outcome.alert().expect("movement alert");

    assert_eq!(alert.instrument, id("NAS100"));
    assert_eq!(alert.signal.kind(), SignalKind::Movement);
    assert_eq!(alert.signal.direction(), Direction::Up);
    let pct = alert.signal.percent_change().expect("movement carries pct");
    assert!((pct - 4.950495).abs() < 1e-5, "pct = {pct}");
    assert_eq!(alert.levels.entry, 106.0);
    assert_eq!(alert.levels.stop_loss, 105.258);
    assert_eq!(alert.levels.take_profit, 107.696);
    assert!(alert.render_text().contains("Change: +4.95%"));
}

#[tokio::test]
async fn scenario_b_close_near_window_high_anticipates_pullback() {
    let source = Arc::new(
        ScriptedSource::new(ProviderId::Yahoo).serving("GC=F", reversal_window(49.9)),
    );
    let gold = direct("XAU/USD", Some(yahoo("GC=F")), None);
    let evaluator = evaluator(vec![gold.clone()], source);

    let outcome = evaluator.evaluate(&gold).await;
    let alert = outcome.alert().expect("reversal alert");

    assert_eq!(alert.signal.kind(), SignalKind::Reversal);
    assert_eq!(alert.signal.direction(), Direction::Down);
    assert_eq!(alert.signal.percent_change(), None);
    assert_eq!(alert.levels.entry, 49.9);
    assert_eq!(alert.levels.stop_loss, 50.2493);
    assert_eq!(alert.levels.take_profit, 49.1016);
    assert!(alert.render_text().starts_with("XAU/USD - ANTICIPATED"));
}

#[tokio::test]
async fn scenario_c_fallback_series_with_small_move_is_quiet() {
    // 10 closes, last vs series[-5] = 100.5 vs 100.0 (+0.5%).
    let closes = vec![
        99.0, 99.5, 99.8, 100.2, 100.1, 100.0, 100.3, 100.1, 100.4, 100.5,
    ];
    let source = Arc::new(
        ScriptedSource::new(ProviderId::Yahoo)
            .failing("GBPJPY=X", SourceError::unavailable("upstream down"))
            .serving("GBPJPY.FX", closes),
    );
    let pair = direct("GBP/JPY", Some(yahoo("GBPJPY=X")), Some(yahoo("GBPJPY.FX")));
    let evaluator = evaluator(vec![pair.clone()], source.clone());

    let outcome = evaluator.evaluate(&pair).await;

    assert!(
        matches!(outcome, InstrumentOutcome::NoSignal { samples: 10 }),
        "{outcome:?}"
    );
    assert_eq!(source.requested(), vec!["GBPJPY=X", "GBPJPY.FX"]);
}

#[tokio::test]
async fn scenario_d_short_synthetic_leg_skips_the_cross() {
    let source = Arc::new(
        ScriptedSource::new(ProviderId::Yahoo)
            .serving("GC=F", vec![2000.0, 2010.0, 2020.0, 2030.0, 2040.0, 2090.0])
            .serving("EURUSD=X", vec![1.08, 1.09, 1.10]),
    );
    let gold = direct("XAU/USD", Some(yahoo("GC=F")), None);
    let euro = direct("EUR/USD", Some(yahoo("EURUSD=X")), None);
    let cross = Instrument::synthetic(id("XAU/EUR"), id("XAU/USD"), id("EUR/USD"))
        .expect("valid synthetic");
    let evaluator = evaluator(vec![gold, euro, cross.clone()], source);

    let outcome = evaluator.evaluate(&cross).await;

    let InstrumentOutcome::Unavailable { error } = outcome else {
        panic!("expected unavailable, got {outcome:?}");
    };
    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
}

#[tokio::test]
async fn synthetic_cross_is_evaluated_on_the_ratio() {
    // Gold flat at 2000; EUR/USD falls 2.5% so the cross rises.
    let source = Arc::new(
        ScriptedSource::new(ProviderId::Yahoo)
            .serving("GC=F", vec![2000.0; 6])
            .serving("EURUSD=X", vec![1.0, 1.0, 0.99, 0.985, 0.98, 0.975]),
    );
    let gold = direct("XAU/USD", Some(yahoo("GC=F")), None);
    let euro = direct("EUR/USD", Some(yahoo("EURUSD=X")), None);
    let cross = Instrument::synthetic(id("XAU/EUR"), id("XAU/USD"), id("EUR/USD"))
        .expect("valid synthetic");
    let evaluator = evaluator(vec![gold, euro, cross.clone()], source);

    let outcome = evaluator.evaluate(&cross).await;
    let alert = outcome.alert().expect("cross moved");

    assert_eq!(alert.instrument, id("XAU/EUR"));
    assert_eq!(alert.signal.direction(), Direction::Up);
    assert_eq!(alert.signal.reference_price(), 2000.0 / 0.975);
}

#[tokio::test]
async fn primary_is_used_when_it_has_enough_closes() {
    let source = Arc::new(
        ScriptedSource::new(ProviderId::Yahoo)
            .serving("EURUSD=X", vec![1.0; 6])
            .serving("EUR=X", vec![2.0; 6]),
    );
    let pair = direct("EUR/USD", Some(yahoo("EURUSD=X")), Some(yahoo("EUR=X")));
    let evaluator = evaluator(vec![pair.clone()], source.clone());

    let outcome = evaluator.evaluate(&pair).await;

    assert_eq!(outcome.label(), "no_signal");
    assert_eq!(source.requested(), vec!["EURUSD=X"]);
}

#[tokio::test]
async fn fallback_only_instrument_is_fetched_from_fallback() {
    let source = Arc::new(
        ScriptedSource::new(ProviderId::Yahoo).serving("BZ=F", vec![80.0, 80.2, 80.4, 80.6, 81.0]),
    );
    let oil = direct("UKOIL", None, Some(yahoo("BZ=F")));
    let evaluator = evaluator(vec![oil.clone()], source);

    let outcome = evaluator.evaluate(&oil).await;
    let alert = outcome.alert().expect("1.25% rise");

    assert_eq!(alert.signal.direction(), Direction::Up);
}

#[tokio::test]
async fn zero_close_is_an_anomaly_not_a_quiet_market() {
    let source = Arc::new(
        ScriptedSource::new(ProviderId::Yahoo).serving("BZ=F", vec![0.0, 80.0, 80.0, 80.0, 80.0]),
    );
    let oil = direct("UKOIL", Some(yahoo("BZ=F")), None);
    let evaluator = evaluator(vec![oil.clone()], source);

    let outcome = evaluator.evaluate(&oil).await;

    assert!(
        matches!(
            outcome,
            InstrumentOutcome::Anomaly {
                error: EvaluationAnomaly::Detector(DetectorError::ZeroDivisor {
                    detector: SignalKind::Movement,
                    ..
                })
            }
        ),
        "{outcome:?}"
    );
}

#[tokio::test]
async fn short_direct_series_without_fallback_is_unavailable() {
    let source = Arc::new(
        ScriptedSource::new(ProviderId::Yahoo).serving("GBPUSD=X", vec![1.27, 1.28, 1.30]),
    );
    let pair = direct("GBP/USD", Some(yahoo("GBPUSD=X")), None);
    let evaluator = evaluator(vec![pair.clone()], source);

    let outcome = evaluator.evaluate(&pair).await;

    assert_eq!(outcome.label(), "unavailable");
}

#[test]
fn default_registry_routes_crypto_to_binance() {
    let config = WatchConfig::default();
    let btc = config.instrument(&id("BTC/USDT")).expect("registered");

    let InstrumentKind::Direct {
        primary: Some(feed),
        ..
    } = &btc.kind
    else {
        panic!("expected a direct binance instrument");
    };
    assert_eq!(feed.source, ProviderId::Binance);
    assert_eq!(feed.symbol, "BTCUSDT");
}
