use chrono::{Duration, TimeZone, Utc};
use kabuka_cache::mem::MemCache;
use kabuka_cache::ttl::BucketedCache;
use kabuka_core::cache::error::CacheError;
use kabuka_core::cache::port::{Cache, CacheExt};
use kabuka_core::common::time::FakeClockProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
struct Quote {
    symbol: String,
    close_cents: u64,
}

fn quote(close_cents: u64) -> Quote {
    Quote {
        symbol: "2330.TW".to_string(),
        close_cents,
    }
}

fn clock() -> Arc<FakeClockProvider> {
    // 2024-01-02 09:30:00 UTC 恰为 300 秒桶的边界
    Arc::new(FakeClockProvider::new(
        Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap(),
    ))
}

#[tokio::test]
async fn test_mem_cache_raw_ops() {
    let cache = MemCache::new();
    let value = vec![1, 2, 3, 4];

    cache.set_raw("raw_key", value.clone()).await.unwrap();
    assert_eq!(cache.get_raw("raw_key").await.unwrap(), Some(value));

    cache.del("raw_key").await.unwrap();
    assert!(cache.get_raw("raw_key").await.unwrap().is_none());
}

#[tokio::test]
async fn test_mem_cache_typed_ops() {
    let cache = MemCache::new();
    cache.set("typed_key", &quote(58_950)).await.unwrap();

    let result: Quote = cache.get("typed_key").await.unwrap().unwrap();
    assert_eq!(result, quote(58_950));
}

#[tokio::test]
async fn test_evict_prefix_keeps_current_key() {
    let cache = MemCache::new();
    for key in ["history:AAPL@1", "history:AAPL@2", "history:AAPL@3", "history:MSFT@3"] {
        cache.set_raw(key, vec![0]).await.unwrap();
    }

    let evicted = cache
        .evict_prefix("history:AAPL@", "history:AAPL@3")
        .await
        .unwrap();
    assert_eq!(evicted, 2);
    assert_eq!(cache.len(), 2);
    assert!(cache.get_raw("history:AAPL@3").await.unwrap().is_some());
    assert!(cache.get_raw("history:MSFT@3").await.unwrap().is_some());
}

#[tokio::test]
async fn test_bucketed_cache_expires_on_bucket_change() {
    let clock = clock();
    let cache = BucketedCache::new(MemCache::new(), clock.clone(), 300).unwrap();

    cache.set("quote:2330.TW", &quote(100)).await.unwrap();
    clock.advance(Duration::seconds(299));
    let hit: Option<Quote> = cache.get("quote:2330.TW").await.unwrap();
    assert_eq!(hit, Some(quote(100)));

    clock.advance(Duration::seconds(1));
    let miss: Option<Quote> = cache.get("quote:2330.TW").await.unwrap();
    assert!(miss.is_none());
}

#[tokio::test]
async fn test_get_or_fetch_calls_upstream_once_per_bucket() {
    let clock = clock();
    let cache = BucketedCache::new(MemCache::new(), clock.clone(), 300).unwrap();
    let calls = AtomicUsize::new(0);

    let fetch = || async {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, CacheError>(quote(100 + u64::try_from(n).unwrap()))
    };

    let first = cache.get_or_fetch("quote:2330.TW", fetch).await.unwrap();
    let second = cache.get_or_fetch("quote:2330.TW", fetch).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    clock.advance(Duration::seconds(300));
    let third = cache.get_or_fetch("quote:2330.TW", fetch).await.unwrap();
    assert_eq!(third, quote(101));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_fetch_error_is_not_cached() {
    let clock = clock();
    let cache = BucketedCache::new(MemCache::new(), clock, 300).unwrap();

    let failed: Result<Quote, CacheError> = cache
        .get_or_fetch("quote:FAIL", || async {
            Err(CacheError::Storage("upstream down".into()))
        })
        .await;
    assert!(failed.is_err());

    let recovered = cache
        .get_or_fetch("quote:FAIL", || async { Ok::<_, CacheError>(quote(1)) })
        .await
        .unwrap();
    assert_eq!(recovered, quote(1));
}

#[test]
fn test_zero_ttl_is_rejected() {
    let result = BucketedCache::new(MemCache::new(), clock(), 0);
    assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
}
