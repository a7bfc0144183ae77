use crate::plan::TradePlan;
use kabuka_core::indicator::entity::{
    LongTermStructure, MacdMomentum, MacdPosture, RsiZone, ShortTermControl, SignalState,
    TrendPosture, VolumeRegime,
};
use kabuka_core::market::entity::MarketSnapshot;
use std::fmt::Write;

fn num(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}", v))
}

fn trend_label(trend: TrendPosture) -> &'static str {
    match trend {
        TrendPosture::Bull => "多头排列",
        TrendPosture::Bear => "空头排列",
        TrendPosture::Neutral => "盘整",
    }
}

fn rsi_label(zone: RsiZone) -> &'static str {
    match zone {
        RsiZone::Overbought => "超买",
        RsiZone::Oversold => "超卖",
        RsiZone::Neutral => "中性",
    }
}

fn volume_label(regime: VolumeRegime) -> &'static str {
    match regime {
        VolumeRegime::Explosive => "爆量",
        VolumeRegime::Moderate => "温和放量",
        VolumeRegime::Quiet => "量缩",
    }
}

/// 信号无法判定时显示 N/A。
fn label(signal: Option<&SignalState>, f: fn(&SignalState) -> &'static str) -> &'static str {
    signal.map_or("N/A", f)
}

/// 台股惯例：上涨 ▲，下跌 ▼。
fn change_arrow(change: f64) -> &'static str {
    if change > 0.0 {
        "▲"
    } else if change < 0.0 {
        "▼"
    } else {
        "-"
    }
}

/// # Summary
/// 把看板快照渲染为纯文本报告。
///
/// # Logic
/// 依次输出公司行、价格卡、相对成交量卡、均线卡、RSI 卡、MACD 卡与多空结论。
pub fn render_snapshot(snapshot: &MarketSnapshot) -> String {
    let signal = snapshot.signal.as_ref();
    let company = &snapshot.company;
    let mut out = String::new();

    let mut header = format!("{} ({})", company.display_name(), snapshot.symbol);
    for part in [&company.sector, &company.industry].into_iter().flatten() {
        header.push_str(" | ");
        header.push_str(part);
    }
    // writeln! 写入 String 不会失败
    writeln!(out, "{}", header).ok();
    writeln!(out, "资料时间: {}", snapshot.as_of.format("%Y-%m-%d %H:%M UTC")).ok();
    writeln!(
        out,
        "收盘价  {:.2} {}  {} {:+.2} ({:+.2}%)",
        snapshot.last_close,
        company.currency.as_deref().unwrap_or(""),
        change_arrow(snapshot.change),
        snapshot.change,
        snapshot.change_pct
    )
    .ok();
    writeln!(
        out,
        "相对成交量  {}x  {}",
        num(snapshot.rvol),
        label(signal, |s| volume_label(s.volume_regime))
    )
    .ok();
    writeln!(
        out,
        "均线 ({})  MA{} {} / MA{} {} / 生命线 {}  {}",
        snapshot.ma_pair,
        snapshot.ma_pair.fast,
        num(snapshot.fast_ma),
        snapshot.ma_pair.slow,
        num(snapshot.slow_ma),
        num(snapshot.trend_ma),
        label(signal, |s| trend_label(s.trend))
    )
    .ok();
    writeln!(out, "RSI  {}  {}", num(snapshot.rsi), label(signal, |s| rsi_label(s.rsi_zone))).ok();
    writeln!(
        out,
        "MACD  {} / 信号 {} / 柱 {}  {}，{}",
        num(snapshot.macd),
        num(snapshot.macd_signal),
        num(snapshot.macd_histogram),
        label(signal, |s| match s.macd_posture {
            MacdPosture::Bullish => "多方",
            MacdPosture::Bearish => "空方",
        }),
        label(signal, |s| match s.macd_momentum {
            MacdMomentum::Strengthening => "动能增强",
            MacdMomentum::Weakening => "动能减弱",
        })
    )
    .ok();
    writeln!(
        out,
        "短线: {}  长线: {}",
        label(signal, |s| match s.short_term {
            ShortTermControl::Buyers => "买方控盘",
            ShortTermControl::Sellers => "卖方控盘",
        }),
        label(signal, |s| match s.long_term {
            LongTermStructure::Uptrend => "上升趋势",
            LongTermStructure::Consolidation => "盘整格局",
        })
    )
    .ok();
    if let Some(cap) = company.market_cap {
        writeln!(out, "市值  {:.2e}", cap).ok();
    }
    out
}

/// 交易试算部分的文本报告。
pub fn render_plan(plan: &TradePlan, budget_currency: &str) -> String {
    let mut out = String::new();
    writeln!(out, "--- 交易试算 (现价 {:.2}，汇率 {:.4}) ---", plan.price, plan.fx_rate).ok();

    if let Some(purchase) = &plan.purchase {
        writeln!(
            out,
            "预算 {} {}: 可买 {:.4} 股，含费成本 {:.2}",
            purchase.budget, budget_currency, purchase.shares, purchase.cost
        )
        .ok();
        writeln!(out, "损益平衡价 {:.4}", purchase.breakeven).ok();
        writeln!(
            out,
            "目标卖价 (+5%) {:.4}，预估获利 {:.2}",
            purchase.target, purchase.target_pnl
        )
        .ok();
    }

    if let Some(holding) = &plan.holding {
        let valuation = &holding.valuation;
        writeln!(
            out,
            "持仓 {} 股 @ {:.4}: 市值 {:.2}，成本 {:.2}，未实现损益 {:.2}{}",
            holding.position.shares,
            holding.position.average_price,
            valuation.market_value,
            valuation.acquisition_cost,
            valuation.unrealized_pnl,
            valuation
                .pnl_pct
                .map(|pct| format!(" ({:+.2}%)", pct))
                .unwrap_or_default()
        )
        .ok();
        writeln!(out, "持仓损益平衡价 {:.4}", holding.breakeven).ok();
        if let Some(blended) = &holding.blended {
            writeln!(
                out,
                "加码后: {:.4} 股，均价 {:.4}",
                blended.shares, blended.average_price
            )
            .ok();
        }
    }
    out
}
