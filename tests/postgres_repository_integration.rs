//! `PostgreSQL` adapter integration tests.
//!
//! These run against the database named by `WHIPPET_TEST_DATABASE_URL` and
//! are skipped when it is unset. The schema is recreated from the bundled
//! migration, so point the variable at a disposable database.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use chrono::{TimeZone, Utc};
use diesel::connection::SimpleConnection;
use rust_decimal_macros::dec;
use whippet_integrations::{
    clock::ManualClock,
    mom::{adapters::postgres::PostgresMomTaxRates, ports::MomTaxRateSource},
    postgres::{PgPool, build_pool},
    third_party::{
        adapters::postgres::PostgresEntityMapRepository,
        domain::{
            Authority, EntityFingerprint, EntityMapScope, ThirdPartyEntityMap, ThirdPartySystem,
        },
        ports::{EntityMapCommands, EntityMapQueries},
    },
    whippet::{
        adapters::postgres::{
            PostgresApplicationRepository, PostgresJobRepository, PostgresSettingRepository,
            PostgresTenantRepository,
        },
        domain::{
            Application, ApplicationKind, Job, JobKind, JobStatus, Setting, SettingKey, Tenant,
            TenantCode,
        },
        ports::{
            ApplicationCommands, ApplicationQueries, JobCommands, JobQueries, SettingCommands,
            SettingQueries, TenantCommands, TenantQueries, WhippetRepositoryError,
        },
    },
};

const DOWN_SQL: &str = include_str!("../migrations/2026-01-05-000000_whippet_core/down.sql");
const UP_SQL: &str = include_str!("../migrations/2026-01-05-000000_whippet_core/up.sql");

const MOM_FIXTURE_SQL: &str = "
    INSERT INTO mom_tax_rates
        (country_code, state_code, postcode, county, state_rate, county_rate, city_rate, is_active)
    VALUES
        ('US', 'CA', NULL, NULL, 6.0000, 1.2500, NULL, TRUE),
        ('US', 'ny', '10001', 'New York', 4.0000, 4.5000, 0.3750, TRUE),
        ('US', 'OR', NULL, NULL, 0.0000, NULL, NULL, FALSE),
        ('US', 'CA', '90210', 'Ventura', 6.0000, 3.0000, NULL, TRUE),
        ('US', 'CA', '90210', 'Los Angeles', 6.0000, 3.5000, NULL, TRUE),
        ('US', 'CA', '90210', 'Los Angeles', 6.0000, 3.7500, NULL, TRUE);
";

/// Recreates the schema, or returns `None` when no test database is set.
async fn fresh_pool() -> Option<PgPool> {
    let url = std::env::var("WHIPPET_TEST_DATABASE_URL").ok()?;
    let pool = build_pool(&url, 2).expect("test database reachable");
    let setup = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = setup.get().expect("pooled connection");
        connection
            .batch_execute(&format!("{DOWN_SQL}\n{UP_SQL}\n{MOM_FIXTURE_SQL}"))
            .expect("schema setup");
    })
    .await
    .expect("setup task");
    Some(pool)
}

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2026, 4, 1, 9, 30, 0).single().expect("valid instant"))
}

/// All scenarios share one schema, so they run sequentially in one test.
#[tokio::test(flavor = "multi_thread")]
async fn postgres_adapters_honour_repository_contracts() {
    let Some(pool) = fresh_pool().await else {
        return;
    };
    let clock = clock();

    let tenant = tenants_round_trip(&pool, &clock).await;
    let application = applications_resolve_by_kind(&pool, &tenant, &clock).await;
    settings_fall_back_to_tenant_scope(&pool, &tenant, &application, &clock).await;
    jobs_track_external_references(&pool, &tenant, &clock).await;
    entity_maps_upsert_by_scope_and_key(&pool, &tenant, &clock).await;
    mom_rates_are_summed_and_filtered(&pool).await;
}

async fn tenants_round_trip(pool: &PgPool, clock: &ManualClock) -> Tenant {
    let repository = PostgresTenantRepository::new(pool.clone());
    let tenant =
        Tenant::new(TenantCode::new("acme").expect("code"), "Acme", clock).expect("tenant");
    repository.insert(&tenant).await.expect("insert tenant");

    let duplicate =
        Tenant::new(TenantCode::new("ACME").expect("code"), "Again", clock).expect("tenant");
    assert!(matches!(
        repository.insert(&duplicate).await,
        Err(WhippetRepositoryError::Duplicate { .. })
    ));

    let found = repository
        .find_by_code(tenant.code())
        .await
        .expect("lookup")
        .expect("tenant present");
    assert_eq!(found, tenant);
    tenant
}

async fn applications_resolve_by_kind(
    pool: &PgPool,
    tenant: &Tenant,
    clock: &ManualClock,
) -> Application {
    let repository = PostgresApplicationRepository::new(pool.clone());
    let mut storefront = Application::new(
        tenant.id(),
        ApplicationKind::Magento,
        "Storefront",
        Some("https://shop.acme.example".to_owned()),
        clock,
    )
    .expect("application");
    repository.insert(&storefront).await.expect("insert application");

    let found = repository
        .find_enabled_by_kind(tenant.id(), ApplicationKind::Magento)
        .await
        .expect("lookup");
    assert_eq!(found.as_ref(), Some(&storefront));

    storefront.disable(clock);
    repository.update(&storefront).await.expect("disable");
    assert!(repository
        .find_enabled_by_kind(tenant.id(), ApplicationKind::Magento)
        .await
        .expect("lookup")
        .is_none());
    storefront
}

async fn settings_fall_back_to_tenant_scope(
    pool: &PgPool,
    tenant: &Tenant,
    application: &Application,
    clock: &ManualClock,
) {
    let repository = PostgresSettingRepository::new(pool.clone());
    let key = SettingKey::new("tax.cache_ttl_minutes").expect("key");
    let tenant_wide = repository
        .upsert(&Setting::new(tenant.id(), None, key.clone(), "30", clock))
        .await
        .expect("tenant-wide upsert");
    let replaced = repository
        .upsert(&Setting::new(tenant.id(), None, key.clone(), "45", clock))
        .await
        .expect("replace");
    assert_eq!(replaced.id(), tenant_wide.id());

    let resolved = repository
        .find(tenant.id(), Some(application.id()), &key)
        .await
        .expect("lookup")
        .expect("falls back");
    assert_eq!(resolved.value(), "45");

    repository
        .upsert(&Setting::new(tenant.id(), Some(application.id()), key.clone(), "5", clock))
        .await
        .expect("scoped upsert");
    let scoped = repository
        .find(tenant.id(), Some(application.id()), &key)
        .await
        .expect("lookup")
        .expect("scoped");
    assert_eq!(scoped.value(), "5");
    assert_eq!(repository.list_for_tenant(tenant.id()).await.expect("list").len(), 2);
}

async fn jobs_track_external_references(pool: &PgPool, tenant: &Tenant, clock: &ManualClock) {
    let repository = PostgresJobRepository::new(pool.clone());
    let mut job = Job::new(tenant.id(), JobKind::MagentoBulk, clock);
    repository.insert(&job).await.expect("insert job");
    job.start(Some("bulk-1".to_owned()), clock).expect("start");
    job.succeed(Some("2 operations".to_owned()), clock).expect("succeed");
    repository.update(&job).await.expect("update job");

    let found = repository
        .find_by_external_ref("bulk-1")
        .await
        .expect("lookup")
        .expect("job present");
    assert_eq!(found.status(), JobStatus::Succeeded);
    assert_eq!(found, job);

    let pending = repository
        .list_for_tenant(tenant.id(), Some(JobStatus::Pending))
        .await
        .expect("list");
    assert!(pending.is_empty());
}

async fn entity_maps_upsert_by_scope_and_key(pool: &PgPool, tenant: &Tenant, clock: &ManualClock) {
    let repository = PostgresEntityMapRepository::new(pool.clone());
    let scope = EntityMapScope::new(tenant.id(), ThirdPartySystem::Magento, "tax_rate");
    let mut map = ThirdPartyEntityMap::new(
        scope.clone(),
        "US-CA-*",
        "41",
        Authority::Internal,
        EntityFingerprint::from_hex("aa"),
        clock,
    );
    repository.upsert(&map).await.expect("insert map");
    map.record_sync("42", EntityFingerprint::from_hex("bb"), clock);
    repository.upsert(&map).await.expect("update map");

    let listed = repository.list(&scope).await.expect("list");
    assert_eq!(listed, vec![map.clone()]);
    let by_external = repository
        .find_by_external_id(&scope, "42")
        .await
        .expect("lookup");
    assert_eq!(by_external, Some(map));

    let other_scope = EntityMapScope::new(tenant.id(), ThirdPartySystem::Salesforce, "tax_rate");
    assert!(repository.list(&other_scope).await.expect("list").is_empty());
    assert!(repository.remove(&scope, "US-CA-*").await.expect("remove"));
    assert!(!repository.remove(&scope, "US-CA-*").await.expect("remove again"));
}

async fn mom_rates_are_summed_and_filtered(pool: &PgPool) {
    let source = PostgresMomTaxRates::new(pool.clone());
    let rates = source.load_tax_rates().await.expect("load");

    let summary: Vec<(String, Option<&str>, rust_decimal::Decimal)> = rates
        .iter()
        .map(|rate| (rate.key().to_string(), rate.county(), rate.rate()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("US-CA-90210".to_owned(), Some("Los Angeles"), dec!(9.5)),
            ("US-CA-90210".to_owned(), Some("Los Angeles"), dec!(9.75)),
            ("US-CA-90210".to_owned(), Some("Ventura"), dec!(9)),
            ("US-CA-*".to_owned(), None, dec!(7.25)),
            ("US-NY-10001".to_owned(), Some("New York"), dec!(8.875)),
        ],
        "rows sharing a destination come back in county then insertion order"
    );

    let reloaded = source.load_tax_rates().await.expect("reload");
    assert_eq!(reloaded, rates);
}
