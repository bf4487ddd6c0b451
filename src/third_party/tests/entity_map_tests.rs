//! Fingerprinting and entity-map repository tests.

use crate::clock::ManualClock;
use crate::third_party::{
    adapters::memory::InMemoryEntityMapRepository,
    domain::{Authority, EntityFingerprint, EntityMapScope, ThirdPartyEntityMap, ThirdPartySystem},
    ports::{EntityMapCommands, EntityMapQueries},
};
use crate::whippet::domain::TenantId;
use chrono::{Duration, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};
use serde::Serialize;
use serde_json::json;

#[fixture]
fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2026, 4, 2, 9, 30, 0).single().expect("valid instant"))
}

#[fixture]
fn scope() -> EntityMapScope {
    EntityMapScope::new(TenantId::new(), ThirdPartySystem::Magento, "tax_rate")
}

#[derive(Serialize)]
struct Forward {
    code: &'static str,
    rate: &'static str,
}

#[derive(Serialize)]
struct Backward {
    rate: &'static str,
    code: &'static str,
}

#[rstest]
fn fingerprint_ignores_field_order() {
    let forward = EntityFingerprint::of(&Forward { code: "US-CA-*", rate: "7.2500" })
        .expect("serializable");
    let backward = EntityFingerprint::of(&Backward { rate: "7.2500", code: "US-CA-*" })
        .expect("serializable");
    assert_eq!(forward, backward);
    assert_eq!(forward.as_str().len(), 64);
}

#[rstest]
fn fingerprint_changes_with_payload() {
    let before = EntityFingerprint::of(&json!({"rate": "7.2500"})).expect("serializable");
    let after = EntityFingerprint::of(&json!({"rate": "7.5000"})).expect("serializable");
    assert_ne!(before, after);
}

#[rstest]
fn record_sync_refreshes_fingerprint_and_timestamp(clock: ManualClock, scope: EntityMapScope) {
    let original = EntityFingerprint::of(&json!({"rate": 1})).expect("serializable");
    let mut map = ThirdPartyEntityMap::new(
        scope,
        "US-CA-*",
        "11",
        Authority::Internal,
        original.clone(),
        &clock,
    );
    assert!(map.is_unchanged(&original));

    clock.advance(Duration::hours(1));
    let updated = EntityFingerprint::of(&json!({"rate": 2})).expect("serializable");
    map.record_sync("12", updated.clone(), &clock);

    assert!(!map.is_unchanged(&original));
    assert!(map.is_unchanged(&updated));
    assert_eq!(map.external_id(), "12");
    assert_eq!(map.synced_at(), clock.utc());
}

#[rstest]
#[case("magento", ThirdPartySystem::Magento)]
#[case("MOM", ThirdPartySystem::Mom)]
#[case("salesforce", ThirdPartySystem::Salesforce)]
fn third_party_system_parses_storage_strings(
    #[case] raw: &str,
    #[case] expected: ThirdPartySystem,
) {
    assert_eq!(ThirdPartySystem::try_from(raw), Ok(expected));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn upsert_replaces_mapping_for_same_internal_key(clock: ManualClock, scope: EntityMapScope) {
    let repository = InMemoryEntityMapRepository::new();
    let fingerprint = EntityFingerprint::from_hex("00");
    let first = ThirdPartyEntityMap::new(
        scope.clone(),
        "US-NY-*",
        "40",
        Authority::Internal,
        fingerprint.clone(),
        &clock,
    );
    let replacement = ThirdPartyEntityMap::new(
        scope.clone(),
        "US-NY-*",
        "41",
        Authority::Internal,
        fingerprint,
        &clock,
    );

    repository.upsert(&first).await.expect("insert");
    repository.upsert(&replacement).await.expect("replace");

    let listed = repository.list(&scope).await.expect("list");
    assert_eq!(listed, vec![replacement.clone()]);
    let by_external = repository
        .find_by_external_id(&scope, "41")
        .await
        .expect("lookup");
    assert_eq!(by_external, Some(replacement));
    assert!(repository.find_by_external_id(&scope, "40").await.expect("lookup").is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mappings_are_isolated_per_scope(clock: ManualClock, scope: EntityMapScope) {
    let repository = InMemoryEntityMapRepository::new();
    let other_tenant = EntityMapScope::new(TenantId::new(), ThirdPartySystem::Magento, "tax_rate");
    let map = ThirdPartyEntityMap::new(
        scope.clone(),
        "US-TX-*",
        "7",
        Authority::External,
        EntityFingerprint::from_hex("ab"),
        &clock,
    );
    repository.upsert(&map).await.expect("insert");

    assert!(repository.find(&other_tenant, "US-TX-*").await.expect("lookup").is_none());
    assert_eq!(
        repository.find(&scope, "US-TX-*").await.expect("lookup").map(|m| m.authority()),
        Some(Authority::External)
    );
    assert!(repository.remove(&scope, "US-TX-*").await.expect("remove"));
    assert!(!repository.remove(&scope, "US-TX-*").await.expect("remove again"));
}
