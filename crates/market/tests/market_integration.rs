use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use kabuka_cache::mem::MemCache;
use kabuka_cache::ttl::BucketedCache;
use kabuka_core::common::time::FakeClockProvider;
use kabuka_core::common::{Stock, TimeFrame};
use kabuka_core::config::AppConfig;
use kabuka_core::indicator::entity::{MaPair, RsiZone, TrendPosture, VolumeRegime};
use kabuka_core::market::entity::{Candle, CompanyInfo};
use kabuka_core::market::error::MarketError;
use kabuka_core::market::port::{FxRateProvider, Market, MarketDataProvider};
use kabuka_market::manager::MarketImpl;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

/// # Summary
/// 为测试提供的模拟数据源，记录每类请求的次数。
struct MockProvider {
    candles: Vec<Candle>,
    company: Option<CompanyInfo>,
    candle_calls: AtomicUsize,
    company_calls: AtomicUsize,
    fx_calls: AtomicUsize,
    fx_range: Mutex<Option<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl MockProvider {
    fn new(candles: Vec<Candle>, company: Option<CompanyInfo>) -> Self {
        Self {
            candles,
            company,
            candle_calls: AtomicUsize::new(0),
            company_calls: AtomicUsize::new(0),
            fx_calls: AtomicUsize::new(0),
            fx_range: Mutex::new(None),
        }
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn fetch_candles(
        &self,
        _: &Stock,
        _: TimeFrame,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError> {
        assert!(start < end);
        self.candle_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.candles.clone())
    }

    async fn fetch_company_info(&self, stock: &Stock) -> Result<CompanyInfo, MarketError> {
        self.company_calls.fetch_add(1, Ordering::SeqCst);
        match &self.company {
            Some(info) => Ok(CompanyInfo {
                symbol: stock.symbol.clone(),
                ..info.clone()
            }),
            None => Err(MarketError::Network("HTTP 401 Unauthorized".into())),
        }
    }
}

#[async_trait]
impl FxRateProvider for MockProvider {
    async fn fetch_rate(
        &self,
        _: &str,
        _: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64, MarketError> {
        self.fx_calls.fetch_add(1, Ordering::SeqCst);
        *self.fx_range.lock().unwrap() = Some((start, end));
        Ok(32.5)
    }
}

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap()
}

/// 120 根日线，收盘价由 100 加速上涨至 150，最后一根放量 3 倍。
fn rising_candles() -> Vec<Candle> {
    (0..120u32)
        .map(|i| {
            let close = 100.0 * 1.5f64.powf(f64::from(i) / 119.0);
            Candle {
                time: start_time() + Duration::days(i64::from(i)),
                open: close,
                high: close * 1.01,
                low: close * 0.99,
                close,
                adj_close: None,
                volume: if i == 119 { 3_000_000.0 } else { 1_000_000.0 },
            }
        })
        .collect()
}

fn large_cap() -> CompanyInfo {
    CompanyInfo {
        long_name: Some("Apple Inc.".into()),
        sector: Some("Technology".into()),
        market_cap: Some(3.0e12),
        currency: Some("USD".into()),
        ..CompanyInfo::default()
    }
}

fn setup(
    provider: Arc<MockProvider>,
) -> (MarketImpl<MemCache>, Arc<FakeClockProvider>) {
    let clock = Arc::new(FakeClockProvider::new(
        start_time() + Duration::days(120),
    ));
    let config = AppConfig::default();
    let cache = BucketedCache::new(MemCache::new(), clock.clone(), config.cache.ttl_secs).unwrap();
    let market = MarketImpl::new(provider.clone(), provider, cache, clock.clone(), config);
    (market, clock)
}

#[tokio::test]
async fn test_history_is_cached_within_bucket() {
    let provider = Arc::new(MockProvider::new(rising_candles(), Some(large_cap())));
    let (market, clock) = setup(provider.clone());

    let first = market.history("AAPL").await.unwrap();
    let second = market.history(" aapl ").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.symbol(), "AAPL");
    assert_eq!(provider.candle_calls.load(Ordering::SeqCst), 1);

    clock.advance(Duration::seconds(i64::try_from(market.config().cache.ttl_secs).unwrap()));
    market.history("AAPL").await.unwrap();
    assert_eq!(provider.candle_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_snapshot_for_large_cap() {
    let provider = Arc::new(MockProvider::new(rising_candles(), Some(large_cap())));
    let (market, _) = setup(provider.clone());

    let snapshot = market.snapshot("AAPL").await.unwrap();
    assert_eq!(snapshot.symbol, "AAPL");
    assert_eq!(snapshot.ma_pair, MaPair::new(10, 20));
    let signal = snapshot.signal.unwrap();
    assert_eq!(signal.ma_pair, MaPair::new(10, 20));
    assert_eq!(snapshot.as_of, start_time() + Duration::days(119));
    assert_eq!(snapshot.company.display_name(), "Apple Inc.");

    let expected_change = snapshot.last_close - snapshot.prev_close;
    assert!((snapshot.change - expected_change).abs() < 1e-12);
    assert!((snapshot.change_pct - expected_change / snapshot.prev_close * 100.0).abs() < 1e-12);

    assert_eq!(signal.trend, TrendPosture::Bull);
    assert_eq!(signal.rsi_zone, RsiZone::Overbought);
    assert_eq!(signal.volume_regime, VolumeRegime::Explosive);
    assert!(snapshot.trend_ma.is_some());
    assert!(snapshot.macd_histogram.is_some_and(|h| h > 0.0));

    // 快照复用缓存中的历史与资料
    market.snapshot("AAPL").await.unwrap();
    assert_eq!(provider.candle_calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.company_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_company_failure_degrades_to_fallback_pair() {
    let provider = Arc::new(MockProvider::new(rising_candles(), None));
    let (market, _) = setup(provider.clone());

    let info = market.company_info("0050.TW").await.unwrap();
    assert_eq!(info, CompanyInfo::empty("0050.TW"));

    let snapshot = market.snapshot("0050.TW").await.unwrap();
    assert_eq!(snapshot.ma_pair, MaPair::new(5, 20));
    assert_eq!(snapshot.company.display_name(), "0050.TW");
    // 降级结果不写入缓存，下次仍会重试
    assert_eq!(provider.company_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_small_cap_uses_short_pair() {
    let company = CompanyInfo {
        market_cap: Some(2.0e9),
        ..CompanyInfo::default()
    };
    let provider = Arc::new(MockProvider::new(rising_candles(), Some(company)));
    let (market, _) = setup(provider);

    let snapshot = market.snapshot("SMALL").await.unwrap();
    assert_eq!(snapshot.ma_pair, MaPair::new(5, 10));
}

#[tokio::test]
async fn test_snapshot_requires_two_bars() {
    let single = rising_candles().into_iter().take(1).collect();
    let provider = Arc::new(MockProvider::new(single, Some(large_cap())));
    let (market, _) = setup(provider);

    let result = market.snapshot("AAPL").await;
    assert!(matches!(result, Err(MarketError::NotFound)));
}

#[tokio::test]
async fn test_short_history_still_yields_snapshot() {
    // 30 根不足以得到 MACD 信号线，信号无法判定
    let short = rising_candles().into_iter().take(30).collect();
    let provider = Arc::new(MockProvider::new(short, Some(large_cap())));
    let (market, _) = setup(provider);

    let snapshot = market.snapshot("AAPL").await.unwrap();
    assert!(snapshot.signal.is_none());
    assert_eq!(snapshot.as_of, start_time() + Duration::days(29));
    assert!(snapshot.change > 0.0);
    assert!(snapshot.rvol.is_some());
    assert!(snapshot.fast_ma.is_some());
    assert!(snapshot.slow_ma.is_some());
    assert!(snapshot.rsi.is_some());
    assert!(snapshot.trend_ma.is_none());
    assert!(snapshot.macd_signal.is_none());
    assert!(snapshot.macd_histogram.is_none());
}

#[tokio::test]
async fn test_empty_history_is_not_found_and_not_cached() {
    let provider = Arc::new(MockProvider::new(Vec::new(), Some(large_cap())));
    let (market, _) = setup(provider.clone());

    assert!(matches!(market.history("GONE").await, Err(MarketError::NotFound)));
    assert!(matches!(market.history("GONE").await, Err(MarketError::NotFound)));
    assert_eq!(provider.candle_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_fx_rate_is_cached() {
    let provider = Arc::new(MockProvider::new(rising_candles(), None));
    let (market, clock) = setup(provider.clone());

    assert_eq!(market.fx_rate("USD", "TWD").await.unwrap(), 32.5);
    assert_eq!(market.fx_rate("usd", "twd").await.unwrap(), 32.5);
    assert_eq!(provider.fx_calls.load(Ordering::SeqCst), 1);

    clock.advance(Duration::minutes(5));
    market.fx_rate("USD", "TWD").await.unwrap();
    assert_eq!(provider.fx_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_fx_range_follows_injected_clock() {
    let provider = Arc::new(MockProvider::new(rising_candles(), None));
    let (market, clock) = setup(provider.clone());
    clock.advance(Duration::days(3));

    market.fx_rate("USD", "TWD").await.unwrap();
    let (start, end) = provider.fx_range.lock().unwrap().unwrap();
    let now = start_time() + Duration::days(123);
    assert_eq!(end, now);
    assert_eq!(start, now - Duration::days(7));
}
