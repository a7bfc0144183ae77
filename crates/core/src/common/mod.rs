pub mod time;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 证券标的实体，代表看板关注的特定股票或基金。
///
/// # Invariants
/// - `symbol` 统一保存为大写形式。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stock {
    // 股票代码 (例如: TSLA, 2330.TW)
    pub symbol: String,
    // 交易所代码 (可选，例如: NASDAQ, TWSE)
    pub exchange: Option<String>,
}

impl Stock {
    /// 以代码创建标的，去除首尾空白并转为大写。
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            exchange: None,
        }
    }
}

/// # Summary
/// K 线周期枚举，定义单根 K 线的时间跨度。
///
/// # Invariants
/// - 无特定约束。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeFrame {
    // 1小时
    Hour1,
    // 1日
    Day1,
    // 1周
    Week1,
}

impl FromStr for TimeFrame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1h" | "hour1" => Ok(TimeFrame::Hour1),
            "1d" | "day1" => Ok(TimeFrame::Day1),
            "1w" | "1wk" | "week1" => Ok(TimeFrame::Week1),
            _ => Err(format!("Unknown TimeFrame: {}", s)),
        }
    }
}

impl std::fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeFrame::Hour1 => write!(f, "1h"),
            TimeFrame::Day1 => write!(f, "1d"),
            TimeFrame::Week1 => write!(f, "1w"),
        }
    }
}
