//! Diesel reader over the MOM tax-rate replica.
//!
//! MOM stores state, county and city components separately. The effective
//! rate is their sum, computed in SQL and read back as text so it can be
//! parsed losslessly into a [`Decimal`].

use crate::mom::{
    domain::MomTaxRate,
    ports::{MomError, MomResult, MomTaxRateSource},
};
use crate::postgres::{PgAccessError, PgPool, run_with_connection};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{Nullable, Text};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

const ACTIVE_RATES_SQL: &str = concat!(
    "SELECT country_code, state_code, postcode, county, ",
    "CAST(COALESCE(state_rate, 0) + COALESCE(county_rate, 0) + COALESCE(city_rate, 0) AS TEXT) ",
    "AS combined_rate ",
    "FROM mom_tax_rates ",
    "WHERE is_active ",
    "ORDER BY country_code, state_code, postcode, county, id",
);

#[derive(Debug, QueryableByName)]
struct MomTaxRateRow {
    #[diesel(sql_type = Text)]
    country_code: String,
    #[diesel(sql_type = Text)]
    state_code: String,
    #[diesel(sql_type = Nullable<Text>)]
    postcode: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    county: Option<String>,
    #[diesel(sql_type = Text)]
    combined_rate: String,
}

impl TryFrom<MomTaxRateRow> for MomTaxRate {
    type Error = MomError;

    fn try_from(row: MomTaxRateRow) -> Result<Self, Self::Error> {
        let rate = Decimal::from_str(&row.combined_rate).map_err(MomError::access)?;
        Ok(Self::new(
            &row.country_code,
            &row.state_code,
            row.postcode.as_deref().unwrap_or_default(),
            row.county,
            rate,
        )?)
    }
}

fn access_error(err: PgAccessError) -> MomError {
    MomError::access(err)
}

/// Tax-rate source reading the `mom_tax_rates` replica table.
#[derive(Debug, Clone)]
pub struct PostgresMomTaxRates {
    pool: PgPool,
}

impl PostgresMomTaxRates {
    /// Creates a source over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MomTaxRateSource for PostgresMomTaxRates {
    async fn load_tax_rates(&self) -> MomResult<Vec<MomTaxRate>> {
        let rates = run_with_connection(&self.pool, access_error, |connection| {
            diesel::sql_query(ACTIVE_RATES_SQL)
                .load::<MomTaxRateRow>(connection)
                .map_err(MomError::access)?
                .into_iter()
                .map(MomTaxRate::try_from)
                .collect::<MomResult<Vec<_>>>()
        })
        .await?;
        debug!(count = rates.len(), "loaded MOM tax rates");
        Ok(rates)
    }
}
