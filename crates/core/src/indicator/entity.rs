use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// # Summary
/// MACD 参数 (快线 EMA、慢线 EMA、信号线 EMA 的窗口)。
///
/// # Invariants
/// - 三个窗口均大于 0，且 `fast < slow`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

/// # Summary
/// 一次指标计算所需的全部窗口参数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorWindows {
    // 需要计算的简单均线窗口，例如 [5, 10, 20, 60]
    pub sma: Vec<usize>,
    pub rsi: usize,
    pub macd: MacdParams,
    // 均量窗口 (用于相对成交量)
    pub volume_ma: usize,
}

impl Default for IndicatorWindows {
    fn default() -> Self {
        Self {
            sma: vec![5, 10, 20, 60],
            rsi: 14,
            macd: MacdParams::default(),
            volume_ma: 20,
        }
    }
}

/// # Summary
/// 与 K 线序列逐根对齐的指标结果集。
///
/// # Invariants
/// - 所有列长度等于原序列长度。
/// - 历史不足的位置取值为 `f64::NAN`。
/// - 序列变化时整体重算，不做增量更新。
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndicatorSet {
    pub close: Vec<f64>,
    // 窗口 -> 简单均线列
    pub sma: BTreeMap<usize, Vec<f64>>,
    pub rsi: Vec<f64>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub macd_histogram: Vec<f64>,
    pub volume_ma: Vec<f64>,
    // 相对成交量
    pub rvol: Vec<f64>,
}

impl IndicatorSet {
    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn sma(&self, window: usize) -> Option<&[f64]> {
        self.sma.get(&window).map(Vec::as_slice)
    }

    /// 指定列在 `index` 处的值，未定义 (NaN) 或越界返回 `None`。
    pub fn defined_at(column: &[f64], index: usize) -> Option<f64> {
        column.get(index).copied().filter(|v| !v.is_nan())
    }

    /// 指定列最后一根 K 线的值。
    pub fn latest(column: &[f64]) -> Option<f64> {
        column.len().checked_sub(1).and_then(|i| Self::defined_at(column, i))
    }

    pub fn latest_sma(&self, window: usize) -> Option<f64> {
        self.sma(window).and_then(Self::latest)
    }
}

/// # Summary
/// 快慢均线组合，用于趋势判定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaPair {
    pub fast: usize,
    pub slow: usize,
}

impl MaPair {
    pub fn new(fast: usize, slow: usize) -> Self {
        Self { fast, slow }
    }
}

impl std::fmt::Display for MaPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MA{} vs MA{}", self.fast, self.slow)
    }
}

/// # Summary
/// 信号判定阈值。默认值取自最新版看板，调用方可覆盖。
///
/// # Invariants
/// - `rsi_oversold < rsi_overbought`。
/// - `volume_moderate <= volume_explosive`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub volume_explosive: f64,
    pub volume_moderate: f64,
}

impl SignalThresholds {
    pub const RSI_OVERBOUGHT: f64 = 70.0;
    pub const RSI_OVERSOLD: f64 = 30.0;
    // 早期版本使用 1.5 倍
    pub const VOLUME_EXPLOSIVE: f64 = 2.0;
    pub const VOLUME_MODERATE: f64 = 1.0;
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            rsi_overbought: Self::RSI_OVERBOUGHT,
            rsi_oversold: Self::RSI_OVERSOLD,
            volume_explosive: Self::VOLUME_EXPLOSIVE,
            volume_moderate: Self::VOLUME_MODERATE,
        }
    }
}

/// 均线排列：多头、空头或盘整。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendPosture {
    Bull,
    Bear,
    Neutral,
}

/// RSI 区间。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

/// MACD 柱状图方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdPosture {
    Bullish,
    Bearish,
}

/// MACD 动能变化 (柱状图绝对值相对前一根)。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdMomentum {
    Strengthening,
    Weakening,
}

/// 成交量状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeRegime {
    Explosive,
    Moderate,
    Quiet,
}

/// 短线控盘方：收盘价相对快线。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShortTermControl {
    Buyers,
    Sellers,
}

/// 长线格局：快线相对慢线。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LongTermStructure {
    Uptrend,
    Consolidation,
}

/// # Summary
/// 最新一根 K 线的信号快照。
///
/// # Invariants
/// - 仅由指标结果集最后两行及均线组合决定，不持久化。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalState {
    pub ma_pair: MaPair,
    pub trend: TrendPosture,
    pub rsi_zone: RsiZone,
    pub macd_posture: MacdPosture,
    pub macd_momentum: MacdMomentum,
    pub volume_regime: VolumeRegime,
    pub short_term: ShortTermControl,
    pub long_term: LongTermStructure,
}

macro_rules! impl_display {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $text),)+
                }
            }
        }
    };
}

impl_display!(TrendPosture { Bull => "bull", Bear => "bear", Neutral => "neutral" });
impl_display!(RsiZone { Overbought => "overbought", Oversold => "oversold", Neutral => "neutral" });
impl_display!(MacdPosture { Bullish => "bullish", Bearish => "bearish" });
impl_display!(MacdMomentum { Strengthening => "strengthening", Weakening => "weakening" });
impl_display!(VolumeRegime { Explosive => "explosive", Moderate => "moderate", Quiet => "quiet" });
impl_display!(ShortTermControl { Buyers => "buyers", Sellers => "sellers" });
impl_display!(LongTermStructure { Uptrend => "uptrend", Consolidation => "consolidation" });
