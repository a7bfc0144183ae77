use kabuka_core::trade::entity::{FeeSchedule, Position, Valuation};
use kabuka_core::trade::error::TradeError;
use rust_decimal::Decimal;

fn ensure_price(name: &str, price: Decimal) -> Result<(), TradeError> {
    if price <= Decimal::ZERO {
        return Err(TradeError::InvalidParameter(format!(
            "{} 必须为正数, 实际: {}",
            name, price
        )));
    }
    Ok(())
}

fn ensure_shares(shares: Decimal) -> Result<(), TradeError> {
    if shares < Decimal::ZERO {
        return Err(TradeError::InvalidParameter(format!(
            "股数不能为负, 实际: {}",
            shares
        )));
    }
    Ok(())
}

fn overflow() -> TradeError {
    TradeError::InvalidParameter("金额溢出".into())
}

fn mul(a: Decimal, b: Decimal) -> Result<Decimal, TradeError> {
    a.checked_mul(b).ok_or_else(overflow)
}

fn div(a: Decimal, b: Decimal) -> Result<Decimal, TradeError> {
    a.checked_div(b).ok_or_else(overflow)
}

fn add(a: Decimal, b: Decimal) -> Result<Decimal, TradeError> {
    a.checked_add(b).ok_or_else(overflow)
}

fn sub(a: Decimal, b: Decimal) -> Result<Decimal, TradeError> {
    a.checked_sub(b).ok_or_else(overflow)
}

/// 卖出时每股实际到手的比例。
fn sell_keep_ratio(fees: &FeeSchedule) -> Decimal {
    Decimal::ONE - fees.sell_pct
}

/// # Summary
/// 含手续费的取得成本。
///
/// # Logic
/// `shares * price * (1 + buy_pct) + buy_fixed`，股数为 0 时不收取固定费用。
pub fn acquisition_cost(
    shares: Decimal,
    price: Decimal,
    fees: &FeeSchedule,
) -> Result<Decimal, TradeError> {
    fees.validate()?;
    ensure_shares(shares)?;
    ensure_price("买入价", price)?;
    let gross = mul(mul(shares, price)?, Decimal::ONE + fees.buy_pct)?;
    add(gross, fees.buy_fixed_for(shares))
}

/// 按 `sell_price` 全部卖出后扣除卖方费用的净所得。
pub fn net_proceeds(
    shares: Decimal,
    sell_price: Decimal,
    fees: &FeeSchedule,
) -> Result<Decimal, TradeError> {
    fees.validate()?;
    ensure_shares(shares)?;
    ensure_price("卖出价", sell_price)?;
    let kept = mul(mul(sell_price, shares)?, sell_keep_ratio(fees))?;
    sub(kept, fees.sell_fixed_for(shares))
}

/// # Summary
/// 预算可买入的最大股数 (允许小数股)。
///
/// # Logic
/// 1. 预算按汇率换算为标的计价货币并扣除买入固定费用。
/// 2. 余额不为正时返回 `InsufficientBudget`。
/// 3. `余额 / (price * (1 + buy_pct))`，不做取整。
///
/// # Arguments
/// * `budget`: 预算 (以预算货币计)。
/// * `fx_rate`: 1 单位标的货币可兑换的预算货币数量。
/// * `price`: 标的现价。
/// * `fees`: 手续费表。
pub fn max_affordable_shares(
    budget: Decimal,
    fx_rate: Decimal,
    price: Decimal,
    fees: &FeeSchedule,
) -> Result<Decimal, TradeError> {
    fees.validate()?;
    ensure_price("汇率", fx_rate)?;
    ensure_price("现价", price)?;

    let usable = sub(div(budget, fx_rate)?, fees.buy_fixed)?;
    if usable <= Decimal::ZERO {
        return Err(TradeError::InsufficientBudget { usable });
    }
    div(usable, mul(price, Decimal::ONE + fees.buy_pct)?)
}

/// # Summary
/// 损益平衡卖价：卖出净所得恰好等于含费取得成本。
///
/// # Logic
/// `(取得成本 + sell_fixed) / (shares * (1 - sell_pct))`。
///
/// # Returns
/// 股数不为正时返回 `InvalidParameter`。
pub fn breakeven_price(
    shares: Decimal,
    price: Decimal,
    fees: &FeeSchedule,
) -> Result<Decimal, TradeError> {
    target_sell_price(shares, price, Decimal::ZERO, fees)
}

/// # Summary
/// 达成期望获利所需的卖价。
///
/// # Logic
/// `(desired_profit + 取得成本 + sell_fixed) / (shares * (1 - sell_pct))`。
pub fn target_sell_price(
    shares: Decimal,
    price: Decimal,
    desired_profit: Decimal,
    fees: &FeeSchedule,
) -> Result<Decimal, TradeError> {
    if shares <= Decimal::ZERO {
        return Err(TradeError::InvalidParameter(format!(
            "股数必须为正数, 实际: {}",
            shares
        )));
    }
    let cost = acquisition_cost(shares, price, fees)?;
    let required = add(add(desired_profit, cost)?, fees.sell_fixed)?;
    div(required, mul(shares, sell_keep_ratio(fees))?)
}

/// 以 `sell_price` 全部卖出的估算损益 (净所得 - 含费取得成本)。
pub fn estimate_pnl(
    shares: Decimal,
    price: Decimal,
    sell_price: Decimal,
    fees: &FeeSchedule,
) -> Result<Decimal, TradeError> {
    sub(
        net_proceeds(shares, sell_price, fees)?,
        acquisition_cost(shares, price, fees)?,
    )
}

/// # Summary
/// 合并既有持仓与加码持仓，得到新的均价。
///
/// # Logic
/// 1. 任一侧股数为 0 时校验另一侧均价后直接返回 (单位元)。
/// 2. 否则两侧分别计算含费取得成本，`均价 = (cost1 + cost2) / (shares1 + shares2)`。
///
/// # Returns
/// 新的 `Position`，原持仓不被修改。
pub fn blend_positions(
    existing: &Position,
    incremental: &Position,
    fees: &FeeSchedule,
) -> Result<Position, TradeError> {
    fees.validate()?;
    ensure_shares(existing.shares)?;
    ensure_shares(incremental.shares)?;

    match (existing.is_empty(), incremental.is_empty()) {
        (true, true) => return Ok(Position::empty()),
        (true, false) => {
            ensure_price("加码均价", incremental.average_price)?;
            return Ok(*incremental);
        }
        (false, true) => {
            ensure_price("持仓均价", existing.average_price)?;
            return Ok(*existing);
        }
        (false, false) => {}
    }

    let total_cost = add(
        acquisition_cost(existing.shares, existing.average_price, fees)?,
        acquisition_cost(incremental.shares, incremental.average_price, fees)?,
    )?;
    let total_shares = add(existing.shares, incremental.shares)?;
    let blended = Position::new(total_shares, div(total_cost, total_shares)?);

    tracing::debug!(
        "持仓合并: {} @ {} + {} @ {} -> {} @ {}",
        existing.shares,
        existing.average_price,
        incremental.shares,
        incremental.average_price,
        blended.shares,
        blended.average_price
    );
    Ok(blended)
}

/// # Summary
/// 持仓按现价估值。
///
/// # Logic
/// 1. 市值 = 按现价全部卖出的净所得。
/// 2. 未实现损益 = 市值 - 含费取得成本。
/// 3. 成本为正时计算百分比。
pub fn valuate_position(
    position: &Position,
    current_price: Decimal,
    fees: &FeeSchedule,
) -> Result<Valuation, TradeError> {
    let market_value = net_proceeds(position.shares, current_price, fees)?;
    let acquisition_cost = if position.is_empty() {
        Decimal::ZERO
    } else {
        acquisition_cost(position.shares, position.average_price, fees)?
    };
    let unrealized_pnl = sub(market_value, acquisition_cost)?;
    let pnl_pct = if acquisition_cost > Decimal::ZERO {
        Some(mul(div(unrealized_pnl, acquisition_cost)?, Decimal::ONE_HUNDRED)?)
    } else {
        None
    };

    Ok(Valuation {
        market_value,
        acquisition_cost,
        unrealized_pnl,
        pnl_pct,
    })
}
