use crate::cache::error::CacheError;
use crate::indicator::error::IndicatorError;
use thiserror::Error;

/// 行情获取与快照计算过程中的错误。
///
/// 数据源相关的失败 (`Network`/`Parse`/`Upstream`) 保留原始描述，
/// 下游的指标与缓存错误经 `#[from]` 原样包装。
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("malformed payload: {0}")]
    Parse(String),
    // 代码不存在，或区间内没有任何 K 线
    #[error("no data for requested symbol")]
    NotFound,
    // 数据源在报文中自报的错误
    #[error("upstream rejected request: {0}")]
    Upstream(String),
    #[error("invalid candle series: {0}")]
    InvalidSeries(String),
    #[error(transparent)]
    Indicator(#[from] IndicatorError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}
