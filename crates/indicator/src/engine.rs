use crate::primitives::{
    defined_len, exponential_moving_average, simple_moving_average, wilder_moving_average,
};
use kabuka_core::indicator::entity::{IndicatorSet, IndicatorWindows, MacdParams};
use kabuka_core::indicator::error::IndicatorError;
use kabuka_core::market::entity::Series;
use std::collections::BTreeMap;
use tracing::debug;

type Primitive = fn(&[f64], usize) -> Result<Vec<f64>, IndicatorError>;

/// # Summary
/// 由 K 线序列计算完整的指标结果集。
///
/// # Logic
/// 1. 校验全部窗口参数。
/// 2. 逐个窗口计算收盘价 SMA。
/// 3. 计算 RSI、MACD 三线与均量、相对成交量。
/// 4. 历史不足的列整列为 NaN，而不是报错。
///
/// # Arguments
/// * `series`: 已校验的 K 线序列，只读。
/// * `windows`: 窗口参数。
///
/// # Returns
/// 与序列逐根对齐的 `IndicatorSet`；参数非法返回 `InvalidParameter`。
pub fn compute_indicators(
    series: &Series,
    windows: &IndicatorWindows,
) -> Result<IndicatorSet, IndicatorError> {
    validate_windows(windows)?;

    let close = series.closes();
    let volume = series.volumes();

    let mut sma = BTreeMap::new();
    for &window in &windows.sma {
        sma.insert(window, column(&close, window, simple_moving_average)?);
    }

    let rsi = relative_strength_index(&close, windows.rsi)?;
    let (macd, macd_signal, macd_histogram) = macd(&close, windows.macd)?;
    let volume_ma = column(&volume, windows.volume_ma, simple_moving_average)?;
    let rvol = relative_volume(&volume, &volume_ma);

    debug!(
        symbol = series.symbol(),
        bars = close.len(),
        sma_windows = ?windows.sma,
        "indicators computed"
    );

    Ok(IndicatorSet {
        close,
        sma,
        rsi,
        macd,
        macd_signal,
        macd_histogram,
        volume_ma,
        rvol,
    })
}

fn validate_windows(windows: &IndicatorWindows) -> Result<(), IndicatorError> {
    let MacdParams { fast, slow, signal } = windows.macd;
    let all = windows
        .sma
        .iter()
        .copied()
        .chain([windows.rsi, fast, slow, signal, windows.volume_ma]);
    for window in all {
        if window == 0 {
            return Err(IndicatorError::InvalidParameter("窗口必须大于 0".into()));
        }
    }
    if fast >= slow {
        return Err(IndicatorError::InvalidParameter(format!(
            "MACD 快线窗口 {} 必须小于慢线窗口 {}",
            fast, slow
        )));
    }
    Ok(())
}

/// 历史不足时返回整列 NaN，其余错误照常向上传播。
fn column(values: &[f64], window: usize, f: Primitive) -> Result<Vec<f64>, IndicatorError> {
    if window > defined_len(values) {
        return Ok(vec![f64::NAN; values.len()]);
    }
    f(values, window)
}

/// # Summary
/// Wilder RSI。
///
/// # Logic
/// 1. 计算相邻收盘价差，拆分为涨幅与跌幅 (跌幅取正值)。
/// 2. 分别做 Wilder 平滑。
/// 3. `RSI = 100 - 100 / (1 + 平均涨幅 / 平均跌幅)`；平均跌幅为 0 时取 100，涨跌均为 0 时取 50。
///
/// # Returns
/// 前 `window` 根为 NaN，首个有效值位于下标 `window`。
fn relative_strength_index(close: &[f64], window: usize) -> Result<Vec<f64>, IndicatorError> {
    let mut out = vec![f64::NAN; close.len()];
    if close.len() <= window {
        return Ok(out);
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = close
        .windows(2)
        .map(|w| {
            let delta = w[1] - w[0];
            (delta.max(0.0), (-delta).max(0.0))
        })
        .unzip();

    let avg_gain = wilder_moving_average(&gains, window)?;
    let avg_loss = wilder_moving_average(&losses, window)?;

    for (i, (&gain, &loss)) in avg_gain.iter().zip(&avg_loss).enumerate() {
        if gain.is_nan() || loss.is_nan() {
            continue;
        }
        out[i + 1] = rsi_from_averages(gain, loss);
    }
    Ok(out)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        let rs = avg_gain / avg_loss;
        (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
    }
}

/// # Summary
/// MACD 线、信号线与柱状图。
///
/// # Logic
/// 1. `macd = EMA(close, fast) - EMA(close, slow)`。
/// 2. `signal = EMA(macd, signal)`，只对 MACD 线的有效部分平滑。
/// 3. `histogram = macd - signal`。
fn macd(
    close: &[f64],
    params: MacdParams,
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>), IndicatorError> {
    let fast = column(close, params.fast, exponential_moving_average)?;
    let slow = column(close, params.slow, exponential_moving_average)?;

    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = column(&line, params.signal, exponential_moving_average)?;
    let histogram = line.iter().zip(&signal).map(|(m, s)| m - s).collect();

    Ok((line, signal, histogram))
}

/// 均量为 0 时以 1.0 (中性) 代替，均量未定义时保持 NaN。
fn relative_volume(volume: &[f64], volume_ma: &[f64]) -> Vec<f64> {
    volume
        .iter()
        .zip(volume_ma)
        .map(|(&v, &ma)| {
            if ma.is_nan() {
                f64::NAN
            } else if ma > 0.0 {
                v / ma
            } else {
                1.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_all_gains_is_100() {
        let close: Vec<f64> = (1..=30).map(f64::from).collect();
        let rsi = relative_strength_index(&close, 14).unwrap();
        assert!(rsi[..14].iter().all(|v| v.is_nan()));
        assert!(rsi[14..].iter().all(|&v| (v - 100.0).abs() < 1e-10));
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let close: Vec<f64> = (1..=30).rev().map(f64::from).collect();
        let rsi = relative_strength_index(&close, 14).unwrap();
        assert!(rsi[14..].iter().all(|&v| v.abs() < 1e-10));
    }

    #[test]
    fn rsi_flat_market_is_50() {
        let rsi = relative_strength_index(&[100.0; 30], 14).unwrap();
        assert!(rsi[14..].iter().all(|&v| (v - 50.0).abs() < 1e-10));
    }

    #[test]
    fn rsi_short_history_all_nan() {
        let rsi = relative_strength_index(&[1.0; 14], 14).unwrap();
        assert_eq!(rsi.len(), 14);
        assert!(rsi.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_stays_in_range() {
        let close = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        let rsi = relative_strength_index(&close, 14).unwrap();
        for v in rsi.iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(v), "RSI {v} out of range");
        }
    }

    #[test]
    fn macd_undefined_until_windows_satisfied() {
        let close: Vec<f64> = (1..=40).map(f64::from).collect();
        let (line, signal, hist) = macd(&close, MacdParams::default()).unwrap();
        assert!(line[..25].iter().all(|v| v.is_nan()));
        assert!(!line[25].is_nan());
        assert!(signal[..33].iter().all(|v| v.is_nan()));
        assert!(!signal[33].is_nan());
        assert!(hist[..33].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rvol_zero_average_is_neutral() {
        let rvol = relative_volume(&[0.0, 0.0, 50.0], &[f64::NAN, 0.0, 25.0]);
        assert!(rvol[0].is_nan());
        assert_eq!(rvol[1], 1.0);
        assert_eq!(rvol[2], 2.0);
    }

    #[test]
    fn rejects_inverted_macd() {
        let windows = IndicatorWindows {
            macd: MacdParams { fast: 26, slow: 12, signal: 9 },
            ..IndicatorWindows::default()
        };
        assert!(matches!(
            validate_windows(&windows),
            Err(IndicatorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_zero_sma_window() {
        let windows = IndicatorWindows {
            sma: vec![5, 0],
            ..IndicatorWindows::default()
        };
        assert!(validate_windows(&windows).is_err());
    }
}
