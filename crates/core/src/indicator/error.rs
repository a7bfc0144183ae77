use thiserror::Error;

/// # Summary
/// 指标计算与信号判定中的错误。
///
/// # Invariants
/// - 历史长度不足在结果列中以 NaN 表达，只有判定信号必须使用某个值时才返回 `InsufficientHistory`。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    // 窗口为 0、窗口超过序列长度、MACD 快线不小于慢线等
    #[error("参数不合法: {0}")]
    InvalidParameter(String),
    // 请求的均线窗口不在结果集中
    #[error("结果集中不存在 MA{0}")]
    UnknownWindow(usize),
    #[error("历史数据不足: {0}")]
    InsufficientHistory(String),
}
