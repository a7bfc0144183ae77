use crate::common::{Stock, TimeFrame};
use crate::market::entity::{Candle, CompanyInfo, MarketSnapshot, Series};
use crate::market::error::MarketError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// # Summary
/// 市场行情数据提供者接口（原始数据源）。
///
/// # Invariants
/// - 返回的 K 线按时间升序排列。
/// - 实现者不做缓存，缓存由上游 Market 服务负责。
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// # Summary
    /// 获取特定证券在指定时间范围内的 K 线数据。
    ///
    /// # Logic
    /// 1. 构建数据源请求。
    /// 2. 执行网络请求并解析响应数据。
    /// 3. 丢弃任一 OHLCV 字段缺失的行。
    ///
    /// # Arguments
    /// * `stock`: 证券身份。
    /// * `timeframe`: K 线周期。
    /// * `start`: 开始时间。
    /// * `end`: 结束时间。
    ///
    /// # Returns
    /// 成功返回 K 线列表。
    async fn fetch_candles(
        &self,
        stock: &Stock,
        timeframe: TimeFrame,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError>;

    /// # Summary
    /// 获取公司基本资料。
    ///
    /// # Returns
    /// 成功返回资料，缺失字段为 `None`。
    async fn fetch_company_info(&self, stock: &Stock) -> Result<CompanyInfo, MarketError>;
}

/// # Summary
/// 汇率提供者接口。
#[async_trait]
pub trait FxRateProvider: Send + Sync {
    /// # Summary
    /// 获取 1 单位 `base` 可兑换的 `quote` 数量。
    ///
    /// # Arguments
    /// * `base`: 基准货币，例如 `USD`。
    /// * `quote`: 报价货币，例如 `TWD`。
    /// * `start`/`end`: 取价区间，由调用方按注入的时钟给出。
    ///
    /// # Returns
    /// 成功返回区间内最后一个正数汇率。
    async fn fetch_rate(
        &self,
        base: &str,
        quote: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64, MarketError>;
}

/// # Summary
/// Market 领域服务契约：带缓存的数据获取与看板快照组装。
///
/// # Invariants
/// - 同一缓存时间桶内对同一标的的重复请求不得重复访问数据源。
#[async_trait]
pub trait Market: Send + Sync {
    /// 获取配置回溯区间内的 K 线序列。
    async fn history(&self, symbol: &str) -> Result<Series, MarketError>;

    /// 获取公司资料，数据源失败时降级为空资料。
    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo, MarketError>;

    /// 获取汇率。
    async fn fx_rate(&self, base: &str, quote: &str) -> Result<f64, MarketError>;

    /// # Summary
    /// 组装最新一根 K 线的看板快照。
    ///
    /// # Logic
    /// 1. 获取历史序列与公司资料。
    /// 2. 计算全部指标。
    /// 3. 按市值选择快慢均线组合并判定信号。
    /// 4. 计算涨跌额与涨跌幅。
    ///
    /// # Returns
    /// 成功返回快照；序列不足两根 K 线时返回 `MarketError::NotFound`。
    async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketError>;
}
