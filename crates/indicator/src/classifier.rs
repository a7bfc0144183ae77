use kabuka_core::indicator::entity::{
    IndicatorSet, LongTermStructure, MaPair, MacdMomentum, MacdPosture, RsiZone, ShortTermControl,
    SignalState, SignalThresholds, TrendPosture, VolumeRegime,
};
use kabuka_core::indicator::error::IndicatorError;

/// 使用默认阈值判定最新一根 K 线的信号。
pub fn classify_signal(
    set: &IndicatorSet,
    fast: usize,
    slow: usize,
) -> Result<SignalState, IndicatorError> {
    classify_signal_with(set, MaPair::new(fast, slow), &SignalThresholds::default())
}

/// # Summary
/// 将最新两行指标值映射为信号快照。
///
/// # Logic
/// 1. 取最后一行的收盘价、快慢均线、RSI、柱状图、相对成交量，以及前一行的柱状图。
/// 2. 任一所需值未定义即返回 `InsufficientHistory`。
/// 3. 逐项按固定阈值判定。
///
/// # Arguments
/// * `set`: 指标结果集。
/// * `pair`: 快慢均线组合，两个窗口必须都在结果集中。
/// * `thresholds`: 判定阈值。
///
/// # Returns
/// 不可变的 `SignalState`，相同输入多次调用结果一致。
pub fn classify_signal_with(
    set: &IndicatorSet,
    pair: MaPair,
    thresholds: &SignalThresholds,
) -> Result<SignalState, IndicatorError> {
    let fast_column = set.sma(pair.fast).ok_or(IndicatorError::UnknownWindow(pair.fast))?;
    let slow_column = set.sma(pair.slow).ok_or(IndicatorError::UnknownWindow(pair.slow))?;

    if set.len() < 2 {
        return Err(IndicatorError::InsufficientHistory(format!(
            "至少需要 2 根 K 线，实际 {}",
            set.len()
        )));
    }
    let t = set.len() - 1;

    let close = require(&set.close, t, "close")?;
    let ma_fast = require(fast_column, t, "fast MA")?;
    let ma_slow = require(slow_column, t, "slow MA")?;
    let rsi = require(&set.rsi, t, "RSI")?;
    let histogram = require(&set.macd_histogram, t, "MACD histogram")?;
    let prev_histogram = require(&set.macd_histogram, t - 1, "previous MACD histogram")?;
    let rvol = require(&set.rvol, t, "RVol")?;

    Ok(SignalState {
        ma_pair: pair,
        trend: trend_posture(close, ma_fast, ma_slow),
        rsi_zone: rsi_zone(rsi, thresholds),
        macd_posture: macd_posture(histogram),
        macd_momentum: macd_momentum(histogram, prev_histogram),
        volume_regime: volume_regime(rvol, thresholds),
        short_term: if close > ma_fast {
            ShortTermControl::Buyers
        } else {
            ShortTermControl::Sellers
        },
        long_term: if ma_fast > ma_slow {
            LongTermStructure::Uptrend
        } else {
            LongTermStructure::Consolidation
        },
    })
}

fn require(column: &[f64], index: usize, name: &str) -> Result<f64, IndicatorError> {
    IndicatorSet::defined_at(column, index)
        .ok_or_else(|| IndicatorError::InsufficientHistory(format!("{} 在第 {} 根未定义", name, index)))
}

/// 严格不等式：任意位置相等都判为盘整。
pub fn trend_posture(close: f64, ma_fast: f64, ma_slow: f64) -> TrendPosture {
    if close > ma_fast && ma_fast > ma_slow {
        TrendPosture::Bull
    } else if close < ma_fast && ma_fast < ma_slow {
        TrendPosture::Bear
    } else {
        TrendPosture::Neutral
    }
}

pub fn rsi_zone(rsi: f64, thresholds: &SignalThresholds) -> RsiZone {
    if rsi > thresholds.rsi_overbought {
        RsiZone::Overbought
    } else if rsi < thresholds.rsi_oversold {
        RsiZone::Oversold
    } else {
        RsiZone::Neutral
    }
}

/// 柱状图恰为 0 时判为空方。
pub fn macd_posture(histogram: f64) -> MacdPosture {
    if histogram > 0.0 {
        MacdPosture::Bullish
    } else {
        MacdPosture::Bearish
    }
}

pub fn macd_momentum(histogram: f64, prev_histogram: f64) -> MacdMomentum {
    if histogram.abs() > prev_histogram.abs() {
        MacdMomentum::Strengthening
    } else {
        MacdMomentum::Weakening
    }
}

pub fn volume_regime(rvol: f64, thresholds: &SignalThresholds) -> VolumeRegime {
    if rvol > thresholds.volume_explosive {
        VolumeRegime::Explosive
    } else if rvol > thresholds.volume_moderate {
        VolumeRegime::Moderate
    } else {
        VolumeRegime::Quiet
    }
}
