//! End-to-end tax-rate synchronization over the in-memory adapters.
//!
//! A tenant is provisioned with a Magento application and scoped settings,
//! then MOM rates are pushed to Magento and kept in step across runs.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use rstest::{fixture, rstest};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use whippet_integrations::{
    clock::ManualClock,
    magento::{
        adapters::memory::{BulkBehavior, InMemoryMagento},
        services::BulkCommandOptions,
    },
    mom::{adapters::memory::InMemoryMomTaxRates, domain::MomTaxRate},
    taxes::{
        domain::TaxSyncSettings,
        services::{TAX_RATE_ENTITY, TaxRateSyncService},
    },
    third_party::{
        adapters::memory::InMemoryEntityMapRepository,
        domain::{EntityMapScope, SkipReason, ThirdPartySystem},
        ports::EntityMapQueries,
    },
    whippet::{
        adapters::memory::{
            InMemoryApplicationRepository, InMemoryJobRepository, InMemorySettingRepository,
            InMemoryTenantRepository,
        },
        domain::{Application, ApplicationKind, JobKind, JobStatus, Tenant},
        ports::JobQueries,
        services::{
            RegisterApplicationRequest, RegisterTenantRequest, SetSettingRequest,
            TenantProvisioningService,
        },
    },
};

type Provisioning = TenantProvisioningService<
    InMemoryTenantRepository,
    InMemoryApplicationRepository,
    InMemorySettingRepository,
    ManualClock,
>;

type SyncService = TaxRateSyncService<
    InMemoryMomTaxRates,
    InMemoryMagento,
    InMemoryEntityMapRepository,
    InMemoryJobRepository,
    ManualClock,
>;

struct World {
    clock: ManualClock,
    settings: Arc<InMemorySettingRepository>,
    provisioning: Provisioning,
    mom: InMemoryMomTaxRates,
    magento: InMemoryMagento,
    maps: Arc<InMemoryEntityMapRepository>,
    jobs: Arc<InMemoryJobRepository>,
    sync: SyncService,
}

fn mom_rate(
    country: &str,
    region: &str,
    postcode: &str,
    rate: rust_decimal::Decimal,
) -> MomTaxRate {
    MomTaxRate::new(country, region, postcode, None, rate).expect("valid MOM rate")
}

#[fixture]
fn world() -> World {
    let clock = ManualClock::new(
        chrono::DateTime::parse_from_rfc3339("2026-03-02T08:00:00Z")
            .expect("valid instant")
            .with_timezone(&chrono::Utc),
    );
    let settings = Arc::new(InMemorySettingRepository::new());
    let provisioning = TenantProvisioningService::new(
        Arc::new(InMemoryTenantRepository::new()),
        Arc::new(InMemoryApplicationRepository::new()),
        Arc::clone(&settings),
        Arc::new(clock.clone()),
    );
    let mom = InMemoryMomTaxRates::new(vec![
        mom_rate("US", "CA", "", dec!(7.25)),
        mom_rate("US", "NY", "10001", dec!(8.875)),
        mom_rate("CA", "ON", "", dec!(13)),
    ]);
    let magento = InMemoryMagento::new();
    magento.set_bulk_behavior(BulkBehavior::SettleAfterPolls(1));
    let maps = Arc::new(InMemoryEntityMapRepository::new());
    let jobs = Arc::new(InMemoryJobRepository::new());
    let sync = TaxRateSyncService::new(
        Arc::new(mom.clone()),
        Arc::new(magento.clone()),
        Arc::clone(&maps),
        Arc::clone(&jobs),
        Arc::new(clock.clone()),
        BulkCommandOptions::new(100, Duration::ZERO, 5).expect("valid options"),
    );
    World {
        clock,
        settings,
        provisioning,
        mom,
        magento,
        maps,
        jobs,
        sync,
    }
}

async fn provision(world: &World) -> (Tenant, Application) {
    let tenant = world
        .provisioning
        .register_tenant(RegisterTenantRequest::new("acme", "Acme Outdoor"))
        .await
        .expect("tenant registration");
    let storefront = world
        .provisioning
        .register_application(
            RegisterApplicationRequest::new(tenant.id(), ApplicationKind::Magento, "Storefront")
                .with_base_url("https://shop.acme.example"),
        )
        .await
        .expect("application registration");
    (tenant, storefront)
}

async fn settings_for(
    world: &World,
    tenant: &Tenant,
    application: &Application,
) -> TaxSyncSettings {
    TaxSyncSettings::resolve(
        &*world.settings,
        tenant.id(),
        Some(application.id()),
        TaxSyncSettings::default(),
    )
    .await
    .expect("settings resolution")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn provisioned_tenant_syncs_with_scoped_settings(world: World) {
    let (tenant, storefront) = provision(&world).await;
    world
        .provisioning
        .set_setting(
            SetSettingRequest::tenant_wide(tenant.id(), "tax.bulk_batch_size", "2")
                .for_application(storefront.id()),
        )
        .await
        .expect("batch size override");
    world
        .provisioning
        .set_setting(SetSettingRequest::tenant_wide(
            tenant.id(),
            "tax.managed_code_prefix",
            "ACME-",
        ))
        .await
        .expect("prefix override");

    let settings = settings_for(&world, &tenant, &storefront).await;
    assert_eq!(settings.bulk_batch_size.get(), 2);

    let report = world.sync.sync(tenant.id(), &settings).await.expect("sync");
    assert_eq!(report.created, 3);
    assert!(report.is_success());

    let mut codes: Vec<String> = world.magento.rates().into_iter().map(|rate| rate.code).collect();
    codes.sort();
    assert_eq!(codes, vec!["ACME-CA-ON-*", "ACME-US-CA-*", "ACME-US-NY-10001"]);

    let bulk_jobs: Vec<_> = world
        .jobs
        .list_for_tenant(tenant.id(), Some(JobStatus::Succeeded))
        .await
        .expect("jobs")
        .into_iter()
        .filter(|job| job.kind() == JobKind::MagentoBulk)
        .collect();
    assert_eq!(bulk_jobs.len(), 2, "three creates in batches of two");
    assert!(bulk_jobs.iter().all(|job| job.external_ref().is_some()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn runs_converge_as_mom_changes(world: World) {
    let (tenant, storefront) = provision(&world).await;
    let settings = settings_for(&world, &tenant, &storefront).await;
    world.sync.sync(tenant.id(), &settings).await.expect("initial sync");

    world
        .mom
        .replace(vec![
            mom_rate("US", "CA", "", dec!(7.5)),
            mom_rate("US", "NY", "10001", dec!(8.875)),
            mom_rate("US", "TX", "", dec!(6.25)),
        ])
        .expect("MOM update");
    world.clock.advance(chrono::Duration::hours(2));

    let report = world.sync.sync(tenant.id(), &settings).await.expect("second sync");
    assert_eq!(
        (report.created, report.updated, report.deleted),
        (1, 1, 1),
        "TX created, CA updated, ON deleted"
    );
    assert_eq!(report.skipped_for(SkipReason::Unchanged), 1);

    let scope = EntityMapScope::new(tenant.id(), ThirdPartySystem::Magento, TAX_RATE_ENTITY);
    let keys: Vec<String> = world
        .maps
        .list(&scope)
        .await
        .expect("maps")
        .iter()
        .map(|map| map.internal_key().to_owned())
        .collect();
    assert_eq!(keys, vec!["US-CA-*", "US-NY-10001", "US-TX-*"]);

    let settled = world.sync.sync(tenant.id(), &settings).await.expect("third sync");
    assert_eq!(settled.skipped_for(SkipReason::Unchanged), 3);
    assert_eq!(settled.created + settled.updated + settled.deleted, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lookups_share_the_sync_cache(world: World) {
    let (tenant, storefront) = provision(&world).await;
    let settings = settings_for(&world, &tenant, &storefront).await;
    world.sync.sync(tenant.id(), &settings).await.expect("sync");
    let refreshed = world.sync.cache().refreshed_at().await;

    let new_york = world
        .sync
        .tax_rate_for("us", "ny", "10001")
        .await
        .expect("lookup")
        .expect("postcode rate");
    assert_eq!(new_york.rate(), dec!(8.875));
    assert!(world
        .sync
        .tax_rate_for("US", "NY", "10002")
        .await
        .expect("lookup")
        .is_none());
    assert_eq!(world.sync.cache().refreshed_at().await, refreshed);
}
