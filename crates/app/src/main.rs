mod plan;
mod report;
mod settings;

use clap::Parser;
use kabuka_cache::mem::MemCache;
use kabuka_cache::ttl::BucketedCache;
use kabuka_core::common::time::RealTimeProvider;
use kabuka_core::market::port::Market;
use kabuka_core::trade::entity::{InstrumentClass, Position};
use kabuka_core::trade::error::TradeError;
use kabuka_feed::yahoo::YahooProvider;
use kabuka_market::manager::MarketImpl;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// 技术指标看板与交易试算。
#[derive(Parser, Debug)]
#[command(name = "kabuka-app", version)]
struct Cli {
    /// 证券代码，例如 AAPL、2330.TW
    symbol: String,
    /// 预算 (以预算货币计)
    budget: Option<Decimal>,
    /// 既有持仓，格式 SHARES@PRICE
    #[arg(value_parser = plan::parse_position)]
    position: Option<Position>,
    /// 标的类别: equity | fund
    #[arg(long, default_value = "equity")]
    class: InstrumentClass,
    /// 配置文件路径，默认尝试 config/kabuka.toml
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// 未设置 RUST_LOG 时的日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
///
/// # Logic
/// 1. 解析命令行，安装 rustls 加密后端，初始化日志与配置。
/// 2. 实例化基础设施层 (Yahoo 数据源、分桶缓存)。
/// 3. 实例化领域服务 `MarketImpl` 并取得快照。
/// 4. 输出看板报告；给出预算或持仓时追加交易试算。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _guard = settings::init_logging(&cli.log_level);

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider already installed");
    }

    let config = settings::load(cli.config.as_deref())?;
    info!(symbol = %cli.symbol, ttl_secs = config.cache.ttl_secs, "Kabuka starting...");

    let feed = Arc::new(YahooProvider::new()?);
    let clock = Arc::new(RealTimeProvider);
    let cache = BucketedCache::new(MemCache::new(), clock.clone(), config.cache.ttl_secs)?;
    let market = MarketImpl::new(feed.clone(), feed, cache, clock, config);

    let snapshot = market.snapshot(&cli.symbol).await?;
    println!("{}", report::render_snapshot(&snapshot));

    if cli.budget.is_none() && cli.position.is_none() {
        return Ok(());
    }

    let market_config = &market.config().market;
    let instrument_currency = snapshot
        .company
        .currency
        .clone()
        .unwrap_or_else(|| market_config.quote_currency.clone());
    let fx_rate = market
        .fx_rate(&instrument_currency, &market_config.budget_currency)
        .await?;
    let fees = market.config().fees.schedule(cli.class);

    let plan = plan::build(
        Decimal::try_from(snapshot.last_close)?,
        Decimal::try_from(fx_rate)?,
        cli.budget,
        cli.position,
        &fees,
    );
    match plan {
        Ok(plan) => println!("{}", report::render_plan(&plan, &market_config.budget_currency)),
        Err(TradeError::InsufficientBudget { usable }) => {
            println!(
                "预算不足：换算并扣除固定手续费后余额为 {:.2} {}",
                usable, instrument_currency
            );
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
