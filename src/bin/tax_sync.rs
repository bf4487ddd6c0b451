//! Runs one MOM-to-Magento tax-rate synchronization for a tenant.
//!
//! Usage:
//!
//! ```text
//! tax_sync --tenant <code> [--log-filter <directive>]
//! ```
//!
//! Connection settings come from the environment (see
//! [`whippet_integrations::config`]). Per-tenant settings stored in Whippet
//! override the `TAX_*` defaults. The process exits non-zero when the sync
//! fails or any write is rejected by Magento.

use clap::Parser;
use eyre::{Result, WrapErr, bail, eyre};
use mockable::DefaultClock;
use std::sync::Arc;
use tracing::info;
use whippet_integrations::{
    config::{self, IntegrationConfig},
    magento::adapters::http::MagentoHttpClient,
    mom::adapters::postgres::PostgresMomTaxRates,
    postgres::build_pool,
    taxes::{domain::TaxSyncSettings, services::TaxRateSyncService},
    telemetry,
    third_party::adapters::postgres::PostgresEntityMapRepository,
    whippet::{
        adapters::postgres::{
            PostgresApplicationRepository, PostgresJobRepository, PostgresSettingRepository,
            PostgresTenantRepository,
        },
        domain::{ApplicationKind, TenantCode},
        ports::{ApplicationQueries, TenantQueries},
    },
};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "tax_sync", about = "Synchronize MOM tax rates into Magento")]
struct Args {
    /// Code of the tenant to synchronize.
    #[arg(long)]
    tenant: String,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long)]
    log_filter: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    config::load_dotenv().wrap_err("failed to load .env")?;
    telemetry::init(args.log_filter.as_deref())?;
    let config = IntegrationConfig::from_env().wrap_err("failed to load configuration")?;

    let pool = build_pool(&config.database_url, config.max_connections)
        .wrap_err("failed to connect to the Whippet database")?;
    let tenants = PostgresTenantRepository::new(pool.clone());
    let applications = PostgresApplicationRepository::new(pool.clone());
    let settings = PostgresSettingRepository::new(pool.clone());

    let code = TenantCode::new(&args.tenant)?;
    let tenant = tenants
        .find_by_code(&code)
        .await?
        .ok_or_else(|| eyre!("unknown tenant {code}"))?;
    if !tenant.is_active() {
        bail!("tenant {code} is inactive");
    }
    let application = applications
        .find_enabled_by_kind(tenant.id(), ApplicationKind::Magento)
        .await?
        .ok_or_else(|| eyre!("tenant {code} has no enabled Magento application"))?;

    let mut magento_config = config.magento.clone();
    if let Some(base_url) = application.base_url() {
        base_url.clone_into(&mut magento_config.base_url);
    }
    let magento = MagentoHttpClient::new(&magento_config)?;

    let tax_settings = TaxSyncSettings::resolve(
        &settings,
        tenant.id(),
        Some(application.id()),
        config.tax_defaults.clone(),
    )
    .await?;
    info!(
        tenant = %code,
        application = %application.name(),
        batch_size = tax_settings.bulk_batch_size.get(),
        delete_orphans = tax_settings.delete_orphans,
        "starting tax rate sync"
    );

    let service = TaxRateSyncService::new(
        Arc::new(PostgresMomTaxRates::new(pool.clone())),
        Arc::new(magento),
        Arc::new(PostgresEntityMapRepository::new(pool.clone())),
        Arc::new(PostgresJobRepository::new(pool)),
        Arc::new(DefaultClock),
        config.bulk,
    );
    let report = service.sync(tenant.id(), &tax_settings).await?;
    info!(tenant = %code, job_id = %report.job_id, summary = %report, "tax rate sync complete");

    if !report.is_success() {
        bail!("tax rate sync for {code} finished with failures: {report}");
    }
    Ok(())
}
