//! Environment-driven configuration for the integration binaries.
//!
//! Values come from the process environment, after a `.env` file in the
//! working directory (if any) has been loaded with `dotenvy`.
//!
//! | Variable                  | Default   |
//! |---------------------------|-----------|
//! | `DATABASE_URL`            | required  |
//! | `DATABASE_MAX_CONNECTIONS`| `4`       |
//! | `MAGENTO_BASE_URL`        | required  |
//! | `MAGENTO_ACCESS_TOKEN`    | required  |
//! | `MAGENTO_STORE_CODE`      | `all`     |
//! | `MAGENTO_TIMEOUT_SECS`    | `30`      |
//! | `TAX_CACHE_TTL_MINUTES`   | `60`      |
//! | `TAX_BULK_BATCH_SIZE`     | `100`     |
//! | `TAX_MANAGED_CODE_PREFIX` | `WHP-`    |
//! | `TAX_DELETE_ORPHANS`      | `true`    |
//! | `BULK_POLL_INTERVAL_MS`   | `2000`    |
//! | `BULK_MAX_POLLS`          | `30`      |
//!
//! The `TAX_*` values are only fallbacks: per-tenant settings stored in
//! Whippet take precedence.

use crate::magento::{adapters::http::MagentoClientConfig, services::BulkCommandOptions};
use crate::taxes::domain::TaxSyncSettings;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_STORE_CODE: &str = "all";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_MINUTES: u64 = 60;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_MAX_POLLS: u32 = 30;

/// Configuration loading failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but its value is unusable.
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The `.env` file exists but could not be read.
    #[error("failed to load .env file: {0}")]
    DotEnv(String),
}

/// Everything the tax sync binary needs to run.
#[derive(Clone)]
pub struct IntegrationConfig {
    /// `PostgreSQL` connection URL of the Whippet database.
    pub database_url: String,
    /// Maximum pooled database connections.
    pub max_connections: u32,
    /// Magento REST client settings.
    pub magento: MagentoClientConfig,
    /// Tax sync settings used when a tenant has no override.
    pub tax_defaults: TaxSyncSettings,
    /// Bulk submission and polling limits.
    pub bulk: BulkCommandOptions,
}

impl fmt::Debug for IntegrationConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("IntegrationConfig")
            .field("database_url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("magento", &self.magento)
            .field("tax_defaults", &self.tax_defaults)
            .field("bulk", &self.bulk)
            .finish()
    }
}

/// Loads `.env` from the working directory into the process environment.
///
/// Variables that are already set keep their values and a missing file is
/// not an error, so calling this more than once is harmless. Binaries call
/// it before logging is set up so `RUST_LOG` can come from the file.
///
/// # Errors
///
/// Returns [`ConfigError::DotEnv`] when the file exists but cannot be read
/// or parsed.
pub fn load_dotenv() -> Result<(), ConfigError> {
    tolerate_missing(dotenvy::dotenv())
}

/// Like [`load_dotenv`], for a file at an explicit path.
///
/// # Errors
///
/// Returns [`ConfigError::DotEnv`] when the file exists but cannot be read
/// or parsed.
pub fn load_dotenv_from(path: &Path) -> Result<(), ConfigError> {
    tolerate_missing(dotenvy::from_path(path))
}

fn tolerate_missing<T>(result: Result<T, dotenvy::Error>) -> Result<(), ConfigError> {
    result.map(drop).or_else(|err| {
        if err.not_found() {
            Ok(())
        } else {
            Err(ConfigError::DotEnv(err.to_string()))
        }
    })
}

impl IntegrationConfig {
    /// Loads `.env` (when present) and reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `.env` is unreadable, a required variable
    /// is missing, or a value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv()?;
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a value
    /// does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let source = Source { lookup: &lookup };

        let base_url = source.required("MAGENTO_BASE_URL")?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "MAGENTO_BASE_URL",
                value: base_url,
                reason: "expected an http or https URL".to_owned(),
            });
        }
        let magento = MagentoClientConfig {
            base_url,
            access_token: source.required("MAGENTO_ACCESS_TOKEN")?,
            store_code: source
                .optional("MAGENTO_STORE_CODE")
                .unwrap_or_else(|| DEFAULT_STORE_CODE.to_owned()),
            timeout: Duration::from_secs(
                source.parsed("MAGENTO_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            ),
        };

        let defaults = TaxSyncSettings::default();
        let ttl_minutes: u64 = source.parsed("TAX_CACHE_TTL_MINUTES", DEFAULT_CACHE_TTL_MINUTES)?;
        let prefix = source
            .optional("TAX_MANAGED_CODE_PREFIX")
            .unwrap_or(defaults.managed_code_prefix);
        let tax_defaults = TaxSyncSettings {
            cache_ttl: Duration::from_secs(ttl_minutes.saturating_mul(60)),
            bulk_batch_size: source
                .parsed::<NonZeroUsize>("TAX_BULK_BATCH_SIZE", defaults.bulk_batch_size)?,
            managed_code_prefix: prefix,
            delete_orphans: source.flag("TAX_DELETE_ORPHANS", defaults.delete_orphans)?,
        };

        let poll_interval = Duration::from_millis(
            source.parsed("BULK_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
        );
        let max_polls: u32 = source.parsed("BULK_MAX_POLLS", DEFAULT_MAX_POLLS)?;
        let bulk = BulkCommandOptions::new(
            tax_defaults.bulk_batch_size.get(),
            poll_interval,
            max_polls,
        )
        .map_err(|err| ConfigError::Invalid {
            name: "BULK_MAX_POLLS",
            value: max_polls.to_string(),
            reason: err.to_string(),
        })?;

        Ok(Self {
            database_url: source.required("DATABASE_URL")?,
            max_connections: source.parsed("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            magento,
            tax_defaults,
            bulk,
        })
    }
}

struct Source<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> Source<'_, F> {
    /// Blank values count as unset.
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn parsed<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional(name).map_or(Ok(default), |value| {
            value.parse().map_err(|err: T::Err| ConfigError::Invalid {
                name,
                reason: err.to_string(),
                value,
            })
        })
    }

    fn flag(&self, name: &'static str, default: bool) -> Result<bool, ConfigError> {
        self.optional(name).map_or(Ok(default), |value| {
            match value.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::Invalid {
                    name,
                    value,
                    reason: "expected true or false".to_owned(),
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, IntegrationConfig, load_dotenv_from};
    use rstest::rstest;
    use std::collections::HashMap;
    use std::path::Path;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://whippet@localhost/whippet"),
        ("MAGENTO_BASE_URL", "https://shop.example"),
        ("MAGENTO_ACCESS_TOKEN", "secret-token"),
    ];

    #[test]
    fn defaults_apply_when_only_required_values_are_set() {
        let config = IntegrationConfig::from_lookup(lookup(&REQUIRED)).expect("valid config");

        assert_eq!(config.magento.store_code, "all");
        assert_eq!(config.magento.timeout, Duration::from_secs(30));
        assert_eq!(config.tax_defaults.cache_ttl, Duration::from_secs(3_600));
        assert_eq!(config.tax_defaults.bulk_batch_size.get(), 100);
        assert_eq!(config.tax_defaults.managed_code_prefix, "WHP-");
        assert!(config.tax_defaults.delete_orphans);
        assert_eq!(config.bulk.poll_interval, Duration::from_secs(2));
        assert_eq!(config.bulk.max_polls.get(), 30);
        assert_eq!(config.max_connections, 4);
    }

    #[test]
    fn overrides_are_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("MAGENTO_STORE_CODE", "default"),
            ("TAX_CACHE_TTL_MINUTES", "5"),
            ("TAX_BULK_BATCH_SIZE", "25"),
            ("TAX_DELETE_ORPHANS", "no"),
            ("BULK_POLL_INTERVAL_MS", "250"),
        ]);
        let config = IntegrationConfig::from_lookup(lookup(&pairs)).expect("valid config");

        assert_eq!(config.magento.store_code, "default");
        assert_eq!(config.tax_defaults.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.bulk.batch_size.get(), 25);
        assert!(!config.tax_defaults.delete_orphans);
        assert_eq!(config.bulk.poll_interval, Duration::from_millis(250));
    }

    #[rstest]
    #[case("DATABASE_URL")]
    #[case("MAGENTO_BASE_URL")]
    #[case("MAGENTO_ACCESS_TOKEN")]
    fn missing_required_variable_is_reported(#[case] name: &'static str) {
        let pairs: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(candidate, _)| *candidate != name)
            .collect();
        let result = IntegrationConfig::from_lookup(lookup(&pairs));
        assert_eq!(result.err(), Some(ConfigError::Missing(name)));
    }

    #[rstest]
    #[case("TAX_BULK_BATCH_SIZE", "0")]
    #[case("TAX_DELETE_ORPHANS", "maybe")]
    #[case("MAGENTO_TIMEOUT_SECS", "soon")]
    #[case("BULK_MAX_POLLS", "0")]
    #[case("MAGENTO_BASE_URL", "shop.example")]
    fn malformed_values_are_rejected(#[case] name: &'static str, #[case] value: &str) {
        let mut pairs = REQUIRED.to_vec();
        pairs.retain(|(candidate, _)| *candidate != name);
        pairs.push((name, value));
        let result = IntegrationConfig::from_lookup(lookup(&pairs));
        assert!(
            matches!(result, Err(ConfigError::Invalid { name: reported, .. }) if reported == name),
            "unexpected result: {result:?}"
        );
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = IntegrationConfig::from_lookup(lookup(&REQUIRED)).expect("valid config");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(!rendered.contains("postgres://"));
    }

    #[test]
    fn missing_dotenv_file_is_not_an_error() {
        assert_eq!(
            load_dotenv_from(Path::new("/nonexistent/whippet-integrations/.env")),
            Ok(())
        );
    }

    #[test]
    fn dotenv_file_values_reach_the_process_environment() {
        let path =
            std::env::temp_dir().join(format!("whippet-dotenv-{}.env", std::process::id()));
        std::fs::write(&path, "WHIPPET_DOTENV_TEST_FILTER=\"whippet_integrations=debug\"\n")
            .expect("write .env");

        let loaded = load_dotenv_from(&path);
        std::fs::remove_file(&path).expect("remove .env");

        assert_eq!(loaded, Ok(()));
        assert_eq!(
            std::env::var("WHIPPET_DOTENV_TEST_FILTER").as_deref(),
            Ok("whippet_integrations=debug")
        );
    }
}
