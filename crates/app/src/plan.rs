use kabuka_core::trade::entity::{FeeSchedule, Position, Valuation};
use kabuka_core::trade::error::TradeError;
use kabuka_trade::economics::{
    acquisition_cost, blend_positions, breakeven_price, estimate_pnl, max_affordable_shares,
    target_sell_price, valuate_position,
};
use rust_decimal::Decimal;

/// 目标卖价对应的报酬率 (相对含费成本)。
pub const TARGET_RETURN: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// 以预算买入的试算结果。
#[derive(Debug, Clone, PartialEq)]
pub struct PurchasePlan {
    pub budget: Decimal,
    pub shares: Decimal,
    pub cost: Decimal,
    pub breakeven: Decimal,
    pub target: Decimal,
    pub target_pnl: Decimal,
}

/// 既有持仓的估值，若同时给出预算则附带加码后的合并持仓。
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingPlan {
    pub position: Position,
    pub valuation: Valuation,
    pub breakeven: Decimal,
    pub blended: Option<Position>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradePlan {
    pub price: Decimal,
    pub fx_rate: Decimal,
    pub purchase: Option<PurchasePlan>,
    pub holding: Option<HoldingPlan>,
}

/// # Summary
/// 解析 `SHARES@PRICE` 形式的持仓参数。
pub fn parse_position(raw: &str) -> Result<Position, String> {
    let (shares, price) = raw
        .split_once('@')
        .ok_or_else(|| format!("持仓格式应为 SHARES@PRICE，实际: {}", raw))?;
    let shares: Decimal = shares
        .trim()
        .parse()
        .map_err(|e| format!("股数无法解析 '{}': {}", shares, e))?;
    let price: Decimal = price
        .trim()
        .parse()
        .map_err(|e| format!("均价无法解析 '{}': {}", price, e))?;
    if shares.is_sign_negative() || price <= Decimal::ZERO {
        return Err(format!("股数不能为负且均价必须为正: {}", raw));
    }
    Ok(Position::new(shares, price))
}

/// # Summary
/// 组合交易试算。
///
/// # Logic
/// 1. 给出预算时计算可买股数、含费成本、损益平衡价与目标卖价。
/// 2. 给出持仓时按现价估值并计算持仓的损益平衡价。
/// 3. 两者都有时把可买部分按现价并入持仓。
///
/// # Arguments
/// * `price`: 标的现价 (标的货币)。
/// * `fx_rate`: 1 单位标的货币兑换的预算货币数量。
/// * `budget`: 预算 (预算货币)。
/// * `position`: 既有持仓。
/// * `fees`: 手续费表。
pub fn build(
    price: Decimal,
    fx_rate: Decimal,
    budget: Option<Decimal>,
    position: Option<Position>,
    fees: &FeeSchedule,
) -> Result<TradePlan, TradeError> {
    let purchase = budget
        .map(|budget| purchase_plan(budget, fx_rate, price, fees))
        .transpose()?;

    let holding = match position.filter(|p| !p.is_empty()) {
        Some(position) => {
            let blended = purchase
                .as_ref()
                .map(|p| blend_positions(&position, &Position::new(p.shares, price), fees))
                .transpose()?;
            Some(HoldingPlan {
                position,
                valuation: valuate_position(&position, price, fees)?,
                breakeven: breakeven_price(position.shares, position.average_price, fees)?,
                blended,
            })
        }
        None => None,
    };

    Ok(TradePlan {
        price,
        fx_rate,
        purchase,
        holding,
    })
}

fn purchase_plan(
    budget: Decimal,
    fx_rate: Decimal,
    price: Decimal,
    fees: &FeeSchedule,
) -> Result<PurchasePlan, TradeError> {
    let shares = max_affordable_shares(budget, fx_rate, price, fees)?;
    let cost = acquisition_cost(shares, price, fees)?;
    let target = target_sell_price(shares, price, cost * TARGET_RETURN, fees)?;
    Ok(PurchasePlan {
        budget,
        shares,
        cost,
        breakeven: breakeven_price(shares, price, fees)?,
        target,
        target_pnl: estimate_pnl(shares, price, target, fees)?,
    })
}
