//! Refresh-or-serve behaviour of the MOM tax-rate cache.

use crate::clock::ManualClock;
use crate::mom::{
    domain::MomTaxRate,
    ports::{MomError, MomResult, MomTaxRateSource},
};
use crate::taxes::services::TaxRateSyncCache;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use mockall::{Sequence, mock};
use rstest::{fixture, rstest};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Source {}

    #[async_trait]
    impl MomTaxRateSource for Source {
        async fn load_tax_rates(&self) -> MomResult<Vec<MomTaxRate>>;
    }
}

const HOUR: Duration = Duration::from_secs(60 * 60);

#[fixture]
fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 5, 4, 6, 0, 0).single().expect("valid instant"),
    ))
}

fn california() -> Vec<MomTaxRate> {
    vec![
        MomTaxRate::new("US", "CA", "", None, dec!(7.25)).expect("valid rate"),
        MomTaxRate::new("US", "CA", "90001", Some("Los Angeles".to_owned()), dec!(9.5))
            .expect("valid rate"),
    ]
}

fn source_loading(times: usize) -> MockSource {
    let mut source = MockSource::new();
    source
        .expect_load_tax_rates()
        .times(times)
        .returning(|| Ok(california()));
    source
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fresh_snapshot_is_served_without_reloading(clock: Arc<ManualClock>) {
    let source = source_loading(1);
    let cache = TaxRateSyncCache::new(HOUR, Arc::clone(&clock));

    let first = cache.snapshot(&source).await.expect("initial load");
    clock.advance(ChronoDuration::minutes(59));
    let second = cache.snapshot(&source).await.expect("cached");

    assert_eq!(first, second);
    assert_eq!(second.len(), 2);
    assert!(!cache.is_stale().await);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn snapshot_reloads_once_ttl_elapses(clock: Arc<ManualClock>) {
    let source = source_loading(2);
    let cache = TaxRateSyncCache::new(HOUR, Arc::clone(&clock));

    let first = cache.snapshot(&source).await.expect("initial load");
    clock.advance(ChronoDuration::hours(1));
    assert!(cache.is_stale().await);

    let second = cache.snapshot(&source).await.expect("reload");
    assert!(second.refreshed_at() > first.refreshed_at());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn zero_ttl_always_reloads(clock: Arc<ManualClock>) {
    let source = source_loading(3);
    let cache = TaxRateSyncCache::new(Duration::ZERO, Arc::clone(&clock));
    for _ in 0..3 {
        cache.snapshot(&source).await.expect("load");
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clock_moving_backwards_counts_as_fresh(clock: Arc<ManualClock>) {
    let source = source_loading(1);
    let cache = TaxRateSyncCache::new(HOUR, Arc::clone(&clock));

    cache.snapshot(&source).await.expect("initial load");
    clock.advance(ChronoDuration::hours(-3));
    assert!(!cache.is_stale().await);
    cache.snapshot(&source).await.expect("cached");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_refresh_keeps_previous_snapshot(clock: Arc<ManualClock>) {
    let mut source = MockSource::new();
    let mut sequence = Sequence::new();
    source
        .expect_load_tax_rates()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|| Ok(california()));
    source
        .expect_load_tax_rates()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|| Err(MomError::access(std::io::Error::other("replica offline"))));
    let cache = TaxRateSyncCache::new(HOUR, Arc::clone(&clock));

    let loaded = cache.snapshot(&source).await.expect("initial load");
    clock.advance(ChronoDuration::hours(2));

    let failed = cache.snapshot(&source).await;
    assert!(matches!(failed, Err(MomError::Access(_))));
    assert_eq!(cache.refreshed_at().await, Some(loaded.refreshed_at()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_stale_readers_share_one_refresh(clock: Arc<ManualClock>) {
    let source = Arc::new(source_loading(1));
    let cache = Arc::new(TaxRateSyncCache::new(HOUR, Arc::clone(&clock)));

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let reader_cache = Arc::clone(&cache);
            let reader_source = Arc::clone(&source);
            tokio::spawn(async move { reader_cache.snapshot(&*reader_source).await })
        })
        .collect();
    for reader in readers {
        let snapshot = reader.await.expect("reader task").expect("snapshot");
        assert_eq!(snapshot.len(), 2);
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalidate_forces_a_reload(clock: Arc<ManualClock>) {
    let source = source_loading(2);
    let cache = TaxRateSyncCache::new(HOUR, Arc::clone(&clock));

    cache.snapshot(&source).await.expect("initial load");
    cache.invalidate().await;
    assert!(cache.refreshed_at().await.is_none());
    cache.snapshot(&source).await.expect("reload");
}

#[rstest]
#[case("90001", dec!(9.5))]
#[case("94105", dec!(7.25))]
#[case("", dec!(7.25))]
#[tokio::test(flavor = "multi_thread")]
async fn rate_lookup_falls_back_to_region_wide_rate(
    clock: Arc<ManualClock>,
    #[case] postcode: &str,
    #[case] expected: rust_decimal::Decimal,
) {
    let source = source_loading(1);
    let cache = TaxRateSyncCache::new(HOUR, clock);

    let rate = cache
        .rate_for(&source, "us", "ca", postcode)
        .await
        .expect("lookup")
        .expect("rate present");
    assert_eq!(rate.rate(), expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rate_lookup_rejects_malformed_destination(clock: Arc<ManualClock>) {
    let source = source_loading(0);
    let cache = TaxRateSyncCache::new(HOUR, clock);
    assert!(matches!(
        cache.rate_for(&source, "USA", "CA", "").await,
        Err(MomError::InvalidData(_))
    ));
}
