use crate::common::TimeFrame;
use crate::indicator::entity::{IndicatorWindows, MaPair, SignalThresholds};
use crate::trade::entity::{FeeSchedule, InstrumentClass};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub market: MarketConfig,
    pub cache: CacheConfig,
    pub indicator: IndicatorConfig,
    pub ma_selection: MaSelectionConfig,
    pub fees: FeeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub timeframe: TimeFrame,
    // 向前回溯的自然日天数 (原看板固定取 1 年)
    pub history_days: i64,
    // 预算所用货币
    pub budget_currency: String,
    // 标的计价货币
    pub quote_currency: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            timeframe: TimeFrame::Day1,
            history_days: 365,
            budget_currency: "TWD".to_string(),
            quote_currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub windows: IndicatorWindows,
    pub thresholds: SignalThresholds,
    // 趋势线 (生命线) 均线窗口，必须包含在 `windows.sma` 中
    pub trend_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            windows: IndicatorWindows::default(),
            thresholds: SignalThresholds::default(),
            trend_window: 60,
        }
    }
}

impl IndicatorConfig {
    /// # Summary
    /// 合并出一次计算需要的均线窗口。
    ///
    /// # Logic
    /// 1. 以配置的窗口为基础。
    /// 2. 补入快慢均线与趋势线窗口，去重并升序。
    pub fn windows_for(&self, pair: MaPair) -> IndicatorWindows {
        let mut windows = self.windows.clone();
        windows.sma.extend([pair.fast, pair.slow, self.trend_window]);
        windows.sma.sort_unstable();
        windows.sma.dedup();
        windows
    }
}

/// # Summary
/// 按市值自动选择快慢均线组合的业务规则。
///
/// # Invariants
/// - 市值大于等于 `large_cap_threshold` 使用 `large_cap`，否则使用 `small_cap`。
/// - 市值未知时使用 `fallback`。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaSelectionConfig {
    pub large_cap_threshold: f64,
    pub large_cap: MaPair,
    pub small_cap: MaPair,
    pub fallback: MaPair,
}

impl Default for MaSelectionConfig {
    fn default() -> Self {
        Self {
            large_cap_threshold: 10_000_000_000.0,
            large_cap: MaPair::new(10, 20),
            small_cap: MaPair::new(5, 10),
            fallback: MaPair::new(5, 20),
        }
    }
}

impl MaSelectionConfig {
    pub fn select(&self, market_cap: Option<f64>) -> MaPair {
        match market_cap {
            Some(cap) if cap.is_finite() && cap >= self.large_cap_threshold => self.large_cap,
            Some(cap) if cap.is_finite() => self.small_cap,
            _ => self.fallback,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    pub equity: FeeSchedule,
    pub fund: FeeSchedule,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            equity: FeeSchedule {
                buy_fixed: Decimal::ZERO,
                sell_fixed: Decimal::ZERO,
                buy_pct: Decimal::new(1, 3),
                sell_pct: Decimal::new(12778, 7),
            },
            fund: FeeSchedule {
                buy_fixed: Decimal::ZERO,
                sell_fixed: Decimal::ZERO,
                buy_pct: Decimal::new(1, 3),
                sell_pct: Decimal::new(1, 3),
            },
        }
    }
}

impl FeeConfig {
    pub fn schedule(&self, class: InstrumentClass) -> FeeSchedule {
        match class {
            InstrumentClass::Equity => self.equity,
            InstrumentClass::Fund => self.fund,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.market.timeframe, TimeFrame::Day1);
        assert_eq!(config.market.history_days, 365);
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.indicator.trend_window, 60);
        assert_eq!(config.fees.equity.buy_pct, dec!(0.001));
        assert_eq!(config.fees.equity.sell_pct, dec!(0.0012778));
    }

    #[test]
    fn test_ma_pair_selection_by_market_cap() {
        let rule = MaSelectionConfig::default();
        assert_eq!(rule.select(Some(2.5e12)), MaPair::new(10, 20));
        assert_eq!(rule.select(Some(1e10)), MaPair::new(10, 20));
        assert_eq!(rule.select(Some(8e8)), MaPair::new(5, 10));
        assert_eq!(rule.select(None), MaPair::new(5, 20));
        assert_eq!(rule.select(Some(f64::NAN)), MaPair::new(5, 20));
    }

    #[test]
    fn test_windows_for_merges_pair_and_trend() {
        let config = IndicatorConfig {
            windows: IndicatorWindows {
                sma: vec![20, 5],
                ..IndicatorWindows::default()
            },
            ..IndicatorConfig::default()
        };
        let windows = config.windows_for(MaPair::new(10, 20));
        assert_eq!(windows.sma, vec![5, 10, 20, 60]);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"cache": {"ttl_secs": 60}}"#).unwrap();
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.ma_selection.small_cap, MaPair::new(5, 10));
        assert_eq!(config.fees.schedule(InstrumentClass::Fund).sell_pct, dec!(0.001));
    }
}
