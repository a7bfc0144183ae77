use rust_decimal::Decimal;
use thiserror::Error;

/// # Summary
/// 交易试算中可能发生的错误。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradeError {
    #[error("参数不合法: {0}")]
    InvalidParameter(String),
    #[error("预算不足以支付固定手续费. 扣除后可用: {usable}")]
    InsufficientBudget { usable: Decimal },
}
