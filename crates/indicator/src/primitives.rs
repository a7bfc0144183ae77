use kabuka_core::indicator::error::IndicatorError;

/// # Summary
/// 窗口长度转为浮点数。
///
/// # Logic
/// 窗口远小于 `u32::MAX`，经 `u32` 中转避免有损的 `as` 转换。
pub(crate) fn window_len(window: usize) -> f64 {
    u32::try_from(window).map_or(f64::from(u32::MAX), f64::from)
}

/// 序列去掉前导 NaN 之后的长度。
pub fn defined_len(values: &[f64]) -> usize {
    values.len() - leading_nan(values)
}

fn leading_nan(values: &[f64]) -> usize {
    values
        .iter()
        .position(|v| !v.is_nan())
        .unwrap_or(values.len())
}

fn check_window(window: usize, available: usize) -> Result<(), IndicatorError> {
    if window == 0 {
        return Err(IndicatorError::InvalidParameter("窗口必须大于 0".into()));
    }
    if window > available {
        return Err(IndicatorError::InvalidParameter(format!(
            "窗口 {} 超过可用数据长度 {}",
            window, available
        )));
    }
    Ok(())
}

/// # Summary
/// 简单移动平均 (SMA)。
///
/// # Logic
/// 下标 `i >= window - 1` 处为 `values[i-window+1..=i]` 的算术平均，之前为 NaN。
///
/// # Arguments
/// * `values`: 输入序列。
/// * `window`: 窗口长度。
///
/// # Returns
/// 与输入等长的结果；`window == 0` 或 `window > values.len()` 返回 `InvalidParameter`。
pub fn simple_moving_average(values: &[f64], window: usize) -> Result<Vec<f64>, IndicatorError> {
    check_window(window, values.len())?;
    let n = window_len(window);

    let mut out = vec![f64::NAN; window - 1];
    out.extend(values.windows(window).map(|w| w.iter().sum::<f64>() / n));
    Ok(out)
}

/// # Summary
/// 指数移动平均 (EMA)，平滑系数 `α = 2 / (window + 1)`。
///
/// # Logic
/// 1. 跳过前导 NaN (例如对 MACD 线再求 EMA)。
/// 2. 以首个 `window` 个有效值的 SMA 作为种子。
/// 3. 递推 `ema[i] = α * v[i] + (1 - α) * ema[i-1]`。
///
/// # Returns
/// 与输入等长的结果，种子之前为 NaN。
pub fn exponential_moving_average(
    values: &[f64],
    window: usize,
) -> Result<Vec<f64>, IndicatorError> {
    let alpha = 2.0 / (window_len(window) + 1.0);
    seeded_smoothing(values, window, alpha)
}

/// # Summary
/// Wilder 平滑移动平均，平滑系数 `α = 1 / window`，用于 RSI。
///
/// # Logic
/// 等价于 `avg[i] = (avg[i-1] * (window - 1) + v[i]) / window`，种子同样为 SMA。
pub fn wilder_moving_average(values: &[f64], window: usize) -> Result<Vec<f64>, IndicatorError> {
    let alpha = 1.0 / window_len(window);
    seeded_smoothing(values, window, alpha)
}

fn seeded_smoothing(values: &[f64], window: usize, alpha: f64) -> Result<Vec<f64>, IndicatorError> {
    let start = leading_nan(values);
    check_window(window, values.len() - start)?;

    let mut out = vec![f64::NAN; values.len()];
    let seed_end = start + window;
    let mut prev = values[start..seed_end].iter().sum::<f64>() / window_len(window);
    out[seed_end - 1] = prev;

    for (slot, &value) in out[seed_end..].iter_mut().zip(&values[seed_end..]) {
        prev = alpha * value + (1.0 - alpha) * prev;
        *slot = prev;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close_to(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn sma_matches_window_mean() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let sma = simple_moving_average(&values, 3).unwrap();
        assert_eq!(sma.len(), values.len());
        assert!(sma[0].is_nan() && sma[1].is_nan());
        for i in 2..values.len() {
            let expected = values[i - 2..=i].iter().sum::<f64>() / 3.0;
            assert!(close_to(sma[i], expected), "index {i}: {} vs {expected}", sma[i]);
        }
    }

    #[test]
    fn sma_window_one_is_identity() {
        let values = [3.0, 1.0, 4.0];
        assert_eq!(simple_moving_average(&values, 1).unwrap(), values.to_vec());
    }

    #[test]
    fn sma_rejects_zero_and_oversized_window() {
        assert!(matches!(
            simple_moving_average(&[1.0, 2.0], 0),
            Err(IndicatorError::InvalidParameter(_))
        ));
        assert!(matches!(
            simple_moving_average(&[1.0, 2.0], 3),
            Err(IndicatorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn ema_seeded_with_sma() {
        // 5 日 EMA，种子为前 5 个值的均值 3.0，α = 1/3
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let ema = exponential_moving_average(&values, 5).unwrap();
        assert!(ema[..4].iter().all(|v| v.is_nan()));
        assert!(close_to(ema[4], 3.0));

        let alpha = 2.0 / 6.0;
        let mut expected = 3.0;
        for i in 5..values.len() {
            expected = alpha * values[i] + (1.0 - alpha) * expected;
            assert!(close_to(ema[i], expected));
        }
    }

    #[test]
    fn ema_skips_leading_nan() {
        let values = [f64::NAN, f64::NAN, 2.0, 4.0, 6.0, 8.0];
        let ema = exponential_moving_average(&values, 3).unwrap();
        assert!(ema[..4].iter().all(|v| v.is_nan()));
        assert!(close_to(ema[4], 4.0));
        assert!(close_to(ema[5], 0.5 * 8.0 + 0.5 * 4.0));
        assert_eq!(defined_len(&values), 4);
    }

    #[test]
    fn ema_insufficient_after_nan_prefix() {
        let values = [f64::NAN, 1.0, 2.0];
        assert!(exponential_moving_average(&values, 3).is_err());
    }

    #[test]
    fn wilder_recurrence() {
        let values = [2.0, 4.0, 6.0, 10.0];
        let wilder = wilder_moving_average(&values, 3).unwrap();
        assert!(close_to(wilder[2], 4.0));
        assert!(close_to(wilder[3], (4.0 * 2.0 + 10.0) / 3.0));
    }
}
