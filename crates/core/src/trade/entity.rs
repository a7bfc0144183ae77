use crate::trade::error::TradeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// # Summary
/// 标的类别，决定适用的手续费表。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentClass {
    /// 个股
    Equity,
    /// 基金 / ETF 类
    Fund,
}

impl std::str::FromStr for InstrumentClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "equity" | "stock" => Ok(InstrumentClass::Equity),
            "fund" | "etf" => Ok(InstrumentClass::Fund),
            _ => Err(format!("Unknown InstrumentClass: {}", s)),
        }
    }
}

/// # Summary
/// 买卖双边不对称的手续费表。
///
/// # Invariants
/// - 固定费用非负。
/// - 比例费用位于 `[0, 1)`。
/// - 单次计算调用中不可变。
/// - 反序列化时缺失的字段按 0 处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// 每笔买入的固定费用
    pub buy_fixed: Decimal,
    /// 每笔卖出的固定费用
    pub sell_fixed: Decimal,
    /// 买入按成交额收取的比例
    pub buy_pct: Decimal,
    /// 卖出按成交额收取的比例 (含交易税)
    pub sell_pct: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::zero()
    }
}

impl FeeSchedule {
    /// 无任何费用的手续费表。
    pub fn zero() -> Self {
        Self {
            buy_fixed: Decimal::ZERO,
            sell_fixed: Decimal::ZERO,
            buy_pct: Decimal::ZERO,
            sell_pct: Decimal::ZERO,
        }
    }

    /// # Summary
    /// 校验手续费表的取值范围。
    ///
    /// # Returns
    /// 合法返回 Ok，否则返回 `TradeError::InvalidParameter`。
    pub fn validate(&self) -> Result<(), TradeError> {
        if self.buy_fixed.is_sign_negative() || self.sell_fixed.is_sign_negative() {
            return Err(TradeError::InvalidParameter("固定手续费不能为负".into()));
        }
        for pct in [self.buy_pct, self.sell_pct] {
            if pct.is_sign_negative() || pct >= Decimal::ONE {
                return Err(TradeError::InvalidParameter(format!(
                    "手续费比例 {} 超出 [0, 1)",
                    pct
                )));
            }
        }
        Ok(())
    }

    /// 股数为 0 的一侧不收取固定费用。
    pub fn buy_fixed_for(&self, shares: Decimal) -> Decimal {
        if shares > Decimal::ZERO { self.buy_fixed } else { Decimal::ZERO }
    }

    pub fn sell_fixed_for(&self, shares: Decimal) -> Decimal {
        if shares > Decimal::ZERO { self.sell_fixed } else { Decimal::ZERO }
    }
}

/// # Summary
/// 持仓：股数与每股平均成本 (不含手续费)。
///
/// # Invariants
/// - `shares` 非负，允许小数股。
/// - 合并持仓是纯函数，不修改历史持仓。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub shares: Decimal,
    pub average_price: Decimal,
}

impl Position {
    pub fn new(shares: Decimal, average_price: Decimal) -> Self {
        Self {
            shares,
            average_price,
        }
    }

    /// 初始化一个空持仓
    pub fn empty() -> Self {
        Self::new(Decimal::ZERO, Decimal::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_zero()
    }
}

/// # Summary
/// 持仓按现价估值的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    /// 按现价卖出扣除卖方费用后的净值
    pub market_value: Decimal,
    /// 含手续费的总取得成本
    pub acquisition_cost: Decimal,
    /// 未实现损益
    pub unrealized_pnl: Decimal,
    /// 未实现损益相对取得成本的百分比，成本为 0 时为 `None`
    pub pnl_pct: Option<Decimal>,
}
