use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use kabuka_core::config::{AppConfig, FeeConfig};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// 未显式指定配置文件时尝试读取的路径 (不含扩展名)。
pub const DEFAULT_CONFIG: &str = "config/kabuka";
/// 环境变量前缀，层级分隔符为 `__`，例如 `KABUKA__CACHE__TTL_SECS=60`。
pub const ENV_PREFIX: &str = "KABUKA";

/// # Summary
/// 加载应用配置。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 为底。
/// 2. 各类别手续费以默认费率为底，只覆盖给出的字段。
/// 3. 叠加配置文件：显式路径必须存在，默认路径可缺失。
/// 4. 叠加 `KABUKA__*` 环境变量。
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_CONFIG).required(false),
    };

    fee_defaults(Config::builder())?
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

fn fee_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = FeeConfig::default();
    let mut builder = builder;
    for (class, fees) in [("equity", defaults.equity), ("fund", defaults.fund)] {
        for (field, value) in [
            ("buy_fixed", fees.buy_fixed),
            ("sell_fixed", fees.sell_fixed),
            ("buy_pct", fees.buy_pct),
            ("sell_pct", fees.sell_pct),
        ] {
            builder = builder.set_default(format!("fees.{}.{}", class, field), value.to_string())?;
        }
    }
    Ok(builder)
}

/// # Summary
/// 初始化全局日志。
///
/// # Logic
/// 1. `RUST_LOG` 优先，否则使用 `level`。
/// 2. 日志经 `tracing-appender` 非阻塞写入 stderr，stdout 只留给报告。
///
/// # Returns
/// 写入线程的守卫，必须持有到进程退出。
pub fn init_logging(level: &str) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_target(false))
        .try_init();
    if let Err(e) = installed {
        eprintln!("日志初始化失败: {}", e);
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use kabuka_core::common::TimeFrame;
    use kabuka_core::indicator::entity::MaPair;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn missing_default_file_yields_defaults() {
        let config = load(None).unwrap();
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.market.timeframe, TimeFrame::Day1);
    }

    #[test]
    fn explicit_file_overrides_sections() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[cache]
ttl_secs = 60

[ma_selection.small_cap]
fast = 3
slow = 8

[indicator.thresholds]
volume_explosive = 1.5

[fees.fund]
buy_fixed = 0.0
sell_fixed = 0.0
buy_pct = 0.0005
sell_pct = 0.0005
"#
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.ma_selection.small_cap, MaPair::new(3, 8));
        assert_eq!(config.ma_selection.large_cap, MaPair::new(10, 20));
        assert_eq!(config.indicator.thresholds.volume_explosive, 1.5);
        assert_eq!(config.indicator.thresholds.rsi_overbought, 70.0);
        assert_eq!(config.fees.fund.sell_pct, dec!(0.0005));
    }

    #[test]
    fn partial_fee_table_keeps_class_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[fees.equity]\nsell_pct = 0.002").unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.fees.equity.sell_pct, dec!(0.002));
        assert_eq!(config.fees.equity.buy_pct, dec!(0.001));
        assert_eq!(config.fees.equity.buy_fixed, dec!(0));
        assert_eq!(config.fees.fund.sell_pct, dec!(0.001));
    }

    #[test]
    fn explicit_missing_file_is_error() {
        assert!(load(Some(Path::new("/nonexistent/kabuka.toml"))).is_err());
    }
}
