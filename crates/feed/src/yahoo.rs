use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use kabuka_core::common::{Stock, TimeFrame};
use kabuka_core::market::entity::{Candle, CompanyInfo};
use kabuka_core::market::error::MarketError;
use kabuka_core::market::port::{FxRateProvider, MarketDataProvider};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// # Summary
/// Yahoo Finance 行情提供者。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端，不做任何缓存。
/// - HTTP 与 JSON 解析分离，解析函数可用固定报文单独测试。
#[derive(Clone)]
pub struct YahooProvider {
    client: Client,
    chart_url: String,
    summary_url: String,
}

impl YahooProvider {
    /// # Summary
    /// 创建 YahooProvider。
    ///
    /// # Logic
    /// 1. 配置 10 秒超时。
    /// 2. 设置浏览器 User-Agent 以减少被拦截。
    ///
    /// # Returns
    /// HTTP 客户端构建失败时返回 `MarketError::Network`。
    pub fn new() -> Result<Self, MarketError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MarketError::Network(format!("无法构建 HTTP 客户端: {}", e)))?;
        Ok(Self::with_client(client))
    }

    /// 使用外部构建的客户端。
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            chart_url: CHART_URL.to_string(),
            summary_url: SUMMARY_URL.to_string(),
        }
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, MarketError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketError::NotFound);
        }
        if !status.is_success() {
            return Err(MarketError::Network(format!("HTTP {}", status)));
        }
        resp.text()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))
    }

    async fn chart(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError> {
        let url = format!("{}/{}", self.chart_url, symbol);
        let body = self
            .get_text(
                &url,
                &[
                    ("period1", start.timestamp().to_string()),
                    ("period2", end.timestamp().to_string()),
                    ("interval", interval.to_string()),
                ],
            )
            .await?;
        parse_chart(&body)
    }
}

/// TimeFrame 到 Yahoo interval 参数的映射。
pub fn interval(timeframe: TimeFrame) -> &'static str {
    match timeframe {
        TimeFrame::Hour1 => "60m",
        TimeFrame::Day1 => "1d",
        TimeFrame::Week1 => "1wk",
    }
}

/// 汇率在 Yahoo 上的代码，例如 `USDTWD=X`。
pub fn fx_symbol(base: &str, quote: &str) -> String {
    format!("{}{}=X", base.trim().to_uppercase(), quote.trim().to_uppercase())
}

#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Deserialize, Debug)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    code: Option<String>,
    description: String,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    // 无成交的区间 Yahoo 会省略 timestamp
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Deserialize, Debug)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
    adjclose: Option<Vec<ChartAdjClose>>,
}

#[derive(Deserialize, Debug)]
struct ChartAdjClose {
    adjclose: Vec<Option<f64>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ChartQuote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

fn api_error(err: ApiError) -> MarketError {
    match err.code.as_deref() {
        Some("Not Found") => MarketError::NotFound,
        _ => MarketError::Upstream(err.description),
    }
}

/// # Summary
/// 解析 v8 chart 接口报文。
///
/// # Logic
/// 1. 报文携带 error 时映射为 `NotFound` 或 `Upstream`。
/// 2. 按下标对齐 timestamp 与 OHLCV，任一字段缺失 (null) 的行直接丢弃。
/// 3. adjclose 可选，缺失时为 `None`。
///
/// # Returns
/// 按时间升序的 K 线列表；结果为空返回 `NotFound`。
pub fn parse_chart(body: &str) -> Result<Vec<Candle>, MarketError> {
    let json: ChartResponse =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(e.to_string()))?;

    if let Some(err) = json.chart.error {
        return Err(api_error(err));
    }

    let result = json
        .chart
        .result
        .and_then(|mut r| r.pop())
        .ok_or(MarketError::NotFound)?;

    let quote = result
        .indicators
        .quote
        .first()
        .ok_or_else(|| MarketError::Parse("No quote data".into()))?;
    let adj_close_list = result
        .indicators
        .adjclose
        .as_ref()
        .and_then(|v| v.first())
        .map(|v| &v.adjclose);

    let mut candles = Vec::with_capacity(result.timestamp.len());
    let mut dropped = 0usize;
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let row = (
            Utc.timestamp_opt(ts, 0).single(),
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
            quote.volume.get(i).copied().flatten(),
        );
        let (Some(time), Some(open), Some(high), Some(low), Some(close), Some(volume)) = row else {
            dropped += 1;
            continue;
        };
        candles.push(Candle {
            time,
            open,
            high,
            low,
            close,
            adj_close: adj_close_list.and_then(|list| list.get(i)).copied().flatten(),
            volume,
        });
    }

    if dropped > 0 {
        debug!(dropped, kept = candles.len(), "dropped incomplete chart rows");
    }
    Ok(candles)
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryBody,
}

#[derive(Deserialize, Debug)]
struct SummaryBody {
    result: Option<Vec<SummaryResult>>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
struct SummaryResult {
    price: Option<PriceModule>,
    summary_profile: Option<ProfileModule>,
    summary_detail: Option<DetailModule>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
    currency: Option<String>,
    exchange_name: Option<String>,
    market_cap: Option<RawValue>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ProfileModule {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
struct DetailModule {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    dividend_yield: Option<RawValue>,
    fifty_two_week_high: Option<RawValue>,
    fifty_two_week_low: Option<RawValue>,
    market_cap: Option<RawValue>,
}

/// Yahoo 数值字段形如 `{"raw": 1.5, "fmt": "1.50"}`，无数据时为 `{}`。
#[derive(Deserialize, Debug, Default, Clone, Copy)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(value: Option<RawValue>) -> Option<f64> {
    value.and_then(|v| v.raw).filter(|v| v.is_finite())
}

/// # Summary
/// 解析 v10 quoteSummary 报文 (price / summaryProfile / summaryDetail 模块)。
///
/// # Logic
/// 所有字段均可缺失；市值优先取 price 模块，其次 summaryDetail。
pub fn parse_company_info(symbol: &str, body: &str) -> Result<CompanyInfo, MarketError> {
    let json: SummaryResponse =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(e.to_string()))?;

    if let Some(err) = json.quote_summary.error {
        return Err(api_error(err));
    }

    let result = json
        .quote_summary
        .result
        .and_then(|mut r| r.pop())
        .ok_or(MarketError::NotFound)?;

    let price = result.price.unwrap_or_default();
    let profile = result.summary_profile.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();

    Ok(CompanyInfo {
        symbol: symbol.to_string(),
        long_name: price.long_name,
        short_name: price.short_name,
        sector: profile.sector,
        industry: profile.industry,
        market_cap: raw(price.market_cap).or(raw(detail.market_cap)),
        currency: price.currency,
        exchange: price.exchange_name,
        trailing_pe: raw(detail.trailing_pe),
        dividend_yield: raw(detail.dividend_yield),
        fifty_two_week_high: raw(detail.fifty_two_week_high),
        fifty_two_week_low: raw(detail.fifty_two_week_low),
    })
}

/// 取最后一个有效收盘价作为汇率。
pub fn last_rate(candles: &[Candle]) -> Result<f64, MarketError> {
    candles
        .iter()
        .rev()
        .map(|c| c.close)
        .find(|rate| rate.is_finite() && *rate > 0.0)
        .ok_or(MarketError::NotFound)
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    /// # Summary
    /// 从 v8 chart 接口抓取 K 线。
    ///
    /// # Logic
    /// 1. 映射 TimeFrame 为 Yahoo interval。
    /// 2. 以 period1 / period2 指定时间范围发起请求。
    /// 3. 交给 `parse_chart` 解析。
    async fn fetch_candles(
        &self,
        stock: &Stock,
        timeframe: TimeFrame,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError> {
        let candles = self
            .chart(&stock.symbol, interval(timeframe), start, end)
            .await?;
        debug!(symbol = %stock.symbol, %timeframe, bars = candles.len(), "fetched candles");
        Ok(candles)
    }

    async fn fetch_company_info(&self, stock: &Stock) -> Result<CompanyInfo, MarketError> {
        let url = format!("{}/{}", self.summary_url, stock.symbol);
        let body = self
            .get_text(
                &url,
                &[("modules", "price,summaryProfile,summaryDetail".to_string())],
            )
            .await?;
        parse_company_info(&stock.symbol, &body)
    }
}

#[async_trait]
impl FxRateProvider for YahooProvider {
    /// # Summary
    /// 通过 `{base}{quote}=X` 的日线取最近收盘价作为汇率。
    ///
    /// # Logic
    /// 1. 币种相同直接返回 1.0。
    /// 2. 拉取 `[start, end]` 区间日线，取最后一个有效收盘价。
    async fn fetch_rate(
        &self,
        base: &str,
        quote: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64, MarketError> {
        if base.trim().eq_ignore_ascii_case(quote.trim()) {
            return Ok(1.0);
        }

        let symbol = fx_symbol(base, quote);
        let candles = self.chart(&symbol, "1d", start, end).await?;
        let rate = last_rate(&candles).inspect_err(|_| {
            warn!(%symbol, %start, %end, "no usable FX quote in range");
        })?;
        debug!(%symbol, rate, "fetched FX rate");
        Ok(rate)
    }
}
