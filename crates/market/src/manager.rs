use async_trait::async_trait;
use chrono::Duration;
use kabuka_cache::mem::MemCache;
use kabuka_cache::ttl::BucketedCache;
use kabuka_core::cache::port::Cache;
use kabuka_core::common::Stock;
use kabuka_core::common::time::TimeProvider;
use kabuka_core::config::AppConfig;
use kabuka_core::indicator::entity::{IndicatorSet, MaPair, SignalState};
use kabuka_core::indicator::error::IndicatorError;
use kabuka_core::market::entity::{Candle, CompanyInfo, MarketSnapshot, Series};
use kabuka_core::market::error::MarketError;
use kabuka_core::market::port::{FxRateProvider, Market, MarketDataProvider};
use kabuka_indicator::{classify_signal_with, compute_indicators};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 汇率取最近一段日线的最后收盘价，回溯天数覆盖长假休市。
const FX_LOOKBACK_DAYS: i64 = 7;

/// # Summary
/// Market 领域服务的具体实现。
///
/// # Invariants
/// - 所有外部数据都经过 `BucketedCache`，同一时间桶内同一标的只访问一次数据源。
/// - 公司资料获取失败只降级为空资料，不影响快照。
/// - 不启动任何后台任务。
pub struct MarketImpl<C: Cache = MemCache> {
    provider: Arc<dyn MarketDataProvider>,
    fx: Arc<dyn FxRateProvider>,
    cache: BucketedCache<C>,
    clock: Arc<dyn TimeProvider>,
    config: AppConfig,
}

impl<C: Cache> MarketImpl<C> {
    /// # Summary
    /// 组装 Market 服务。
    ///
    /// # Arguments
    /// * `provider`: K 线与公司资料数据源。
    /// * `fx`: 汇率数据源。
    /// * `cache`: 分桶缓存，时钟应与 `clock` 为同一实例。
    /// * `clock`: 用于计算回溯区间。
    /// * `config`: 应用配置。
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        fx: Arc<dyn FxRateProvider>,
        cache: BucketedCache<C>,
        clock: Arc<dyn TimeProvider>,
        config: AppConfig,
    ) -> Self {
        Self {
            provider,
            fx,
            cache,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    async fn fetch_history(&self, stock: &Stock) -> Result<Vec<Candle>, MarketError> {
        let end = self.clock.now();
        let start = end - Duration::days(self.config.market.history_days);
        let candles = self
            .provider
            .fetch_candles(stock, self.config.market.timeframe, start, end)
            .await?;
        if candles.is_empty() {
            return Err(MarketError::NotFound);
        }
        info!(symbol = %stock.symbol, bars = candles.len(), "history loaded from provider");
        Ok(candles)
    }

    /// 判定信号；历史不足时返回 `None`，其余错误照常传播。
    fn classify(
        &self,
        set: &IndicatorSet,
        pair: MaPair,
        symbol: &str,
    ) -> Result<Option<SignalState>, MarketError> {
        match classify_signal_with(set, pair, &self.config.indicator.thresholds) {
            Ok(state) => Ok(Some(state)),
            Err(IndicatorError::InsufficientHistory(reason)) => {
                debug!(symbol, %reason, "signal left undefined");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<C: Cache> Market for MarketImpl<C> {
    /// # Summary
    /// 获取配置回溯区间内的 K 线序列。
    ///
    /// # Logic
    /// 1. 以 `history:{symbol}:{timeframe}` 为键查询缓存。
    /// 2. 未命中时向数据源请求，空结果返回 `NotFound` 且不写缓存。
    /// 3. 校验为 `Series`。
    async fn history(&self, symbol: &str) -> Result<Series, MarketError> {
        let stock = Stock::new(symbol);
        let key = format!("history:{}:{}", stock.symbol, self.config.market.timeframe);
        let candles: Vec<Candle> = self
            .cache
            .get_or_fetch(&key, || self.fetch_history(&stock))
            .await?;
        Series::new(stock.symbol, candles)
    }

    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo, MarketError> {
        let stock = Stock::new(symbol);
        let key = format!("company:{}", stock.symbol);
        let fetched = self
            .cache
            .get_or_fetch(&key, || self.provider.fetch_company_info(&stock))
            .await;

        match fetched {
            Ok(info) => Ok(info),
            Err(e) => {
                warn!(symbol = %stock.symbol, error = %e, "company info unavailable, degrading to empty");
                Ok(CompanyInfo::empty(&stock.symbol))
            }
        }
    }

    async fn fx_rate(&self, base: &str, quote: &str) -> Result<f64, MarketError> {
        let key = format!(
            "fx:{}{}",
            base.trim().to_uppercase(),
            quote.trim().to_uppercase()
        );
        let end = self.clock.now();
        let start = end - Duration::days(FX_LOOKBACK_DAYS);
        self.cache
            .get_or_fetch(&key, || self.fx.fetch_rate(base, quote, start, end))
            .await
    }

    /// # Summary
    /// 组装最新一根 K 线的看板快照。
    ///
    /// # Logic
    /// 1. 获取历史序列 (不足两根返回 `NotFound`) 与公司资料。
    /// 2. 按市值选择快慢均线组合，合并出本次计算的窗口。
    /// 3. 计算指标并判定信号，历史不足以判定时信号为 `None`。
    /// 4. 由最后两根收盘价计算涨跌额与涨跌幅。
    async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketError> {
        let series = self.history(symbol).await?;
        let [.., prev, last] = series.candles() else {
            return Err(MarketError::NotFound);
        };
        let company = self.company_info(symbol).await?;

        let indicator_config = &self.config.indicator;
        let pair = self.config.ma_selection.select(company.market_cap);
        let windows = indicator_config.windows_for(pair);
        let set = compute_indicators(&series, &windows)?;
        let signal = self.classify(&set, pair, series.symbol())?;

        let change = last.close - prev.close;
        let change_pct = change / prev.close * 100.0;

        debug!(
            symbol = series.symbol(),
            %pair,
            classified = signal.is_some(),
            "snapshot assembled"
        );

        Ok(MarketSnapshot {
            symbol: series.symbol().to_string(),
            as_of: last.time,
            last_close: last.close,
            prev_close: prev.close,
            change,
            change_pct,
            rvol: IndicatorSet::latest(&set.rvol),
            ma_pair: pair,
            fast_ma: set.latest_sma(pair.fast),
            slow_ma: set.latest_sma(pair.slow),
            trend_ma: set.latest_sma(indicator_config.trend_window),
            rsi: IndicatorSet::latest(&set.rsi),
            macd: IndicatorSet::latest(&set.macd),
            macd_signal: IndicatorSet::latest(&set.macd_signal),
            macd_histogram: IndicatorSet::latest(&set.macd_histogram),
            signal,
            company,
        })
    }
}
