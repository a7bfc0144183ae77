use crate::indicator::entity::{MaPair, SignalState};
use crate::market::error::MarketError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 单根 K 线数据实体，记录特定时段内的行情波动。
///
/// # Invariants
/// - `open`, `high`, `low`, `close` 均为有限正数。
/// - `volume` 非负。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    // K 线开始时间
    pub time: DateTime<Utc>,
    // 开盘价
    pub open: f64,
    // 最高价
    pub high: f64,
    // 最低价
    pub low: f64,
    // 收盘价
    pub close: f64,
    // 调整后收盘价 (用于处理分红、拆股等复权情况)
    pub adj_close: Option<f64>,
    // 成交量
    pub volume: f64,
}

impl Candle {
    fn validate(&self) -> Result<(), String> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(format!("非法价格 @ {}", self.time));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(format!("非法成交量 {} @ {}", self.volume, self.time));
        }
        Ok(())
    }
}

/// # Summary
/// 单一标的的有序 K 线序列。
///
/// # Invariants
/// - 时间戳严格递增，不允许重复。
/// - 非交易日造成的缺口保留原样，不做插补。
/// - 构造完成后不可变，指标计算只读取不修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    symbol: String,
    candles: Vec<Candle>,
}

impl Series {
    /// # Summary
    /// 校验并构造 K 线序列。
    ///
    /// # Logic
    /// 1. 逐根校验价格与成交量取值。
    /// 2. 校验相邻两根 K 线时间严格递增。
    ///
    /// # Arguments
    /// * `symbol`: 证券代码。
    /// * `candles`: 按时间升序排列的 K 线。
    ///
    /// # Returns
    /// 校验通过返回序列，否则返回 `MarketError::InvalidSeries`。
    pub fn new(symbol: impl Into<String>, candles: Vec<Candle>) -> Result<Self, MarketError> {
        for candle in &candles {
            candle.validate().map_err(MarketError::InvalidSeries)?;
        }
        if let Some(pair) = candles.windows(2).find(|w| w[1].time <= w[0].time) {
            return Err(MarketError::InvalidSeries(format!(
                "时间戳未严格递增: {} -> {}",
                pair[0].time, pair[1].time
            )));
        }
        Ok(Self {
            symbol: symbol.into(),
            candles,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// 收盘价列
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// 成交量列
    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }
}

/// # Summary
/// 数据源返回的公司基本资料。
///
/// # Invariants
/// - 数据源缺失的字段一律为 `None`，不做默认值填充。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub symbol: String,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    // 市值 (以 `currency` 计价)
    pub market_cap: Option<f64>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub trailing_pe: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
}

impl CompanyInfo {
    /// 仅含代码的空资料，用于元数据获取失败时降级。
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..Self::default()
        }
    }

    /// 优先返回全称，其次简称，最后退回代码。
    pub fn display_name(&self) -> &str {
        self.long_name
            .as_deref()
            .or(self.short_name.as_deref())
            .unwrap_or(&self.symbol)
    }
}

/// # Summary
/// 单一标的在最新一根 K 线上的看板快照。
///
/// # Invariants
/// - 所有数值均取自同一次指标计算，`None` 表示历史长度不足。
/// - 历史不足以判定信号时 `signal` 为 `None`，价格与其余指标照常给出。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    // 最新 K 线时间
    pub as_of: DateTime<Utc>,
    pub last_close: f64,
    pub prev_close: f64,
    // 涨跌额
    pub change: f64,
    // 涨跌幅 (百分比)
    pub change_pct: f64,
    pub rvol: Option<f64>,
    pub ma_pair: MaPair,
    pub fast_ma: Option<f64>,
    pub slow_ma: Option<f64>,
    // 趋势线 (生命线) 均线
    pub trend_ma: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub signal: Option<SignalState>,
    pub company: CompanyInfo,
}
