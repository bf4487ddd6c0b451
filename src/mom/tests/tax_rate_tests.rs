//! Validation and source tests for MOM tax rates.

use crate::mom::{
    adapters::memory::InMemoryMomTaxRates,
    domain::{MomDataError, MomTaxRate, TaxRateKey},
    ports::MomTaxRateSource,
};
use rstest::rstest;
use rust_decimal_macros::dec;

#[rstest]
#[case("us", " ca ", "", "US-CA-*")]
#[case("US", "NY", " 10001 ", "US-NY-10001")]
#[case("gb", "eng", "sw1a 1aa", "GB-ENG-SW1A 1AA")]
fn key_normalizes_destination(
    #[case] country: &str,
    #[case] region: &str,
    #[case] postcode: &str,
    #[case] expected: &str,
) {
    let key = TaxRateKey::new(country, region, postcode).expect("valid key");
    assert_eq!(key.to_string(), expected);
}

#[rstest]
#[case("USA", "CA", MomDataError::InvalidCountry("USA".to_owned()))]
#[case("U1", "CA", MomDataError::InvalidCountry("U1".to_owned()))]
#[case("US", " ", MomDataError::InvalidRegion(" ".to_owned()))]
#[case("US", "C-A", MomDataError::InvalidRegion("C-A".to_owned()))]
fn key_rejects_bad_destinations(
    #[case] country: &str,
    #[case] region: &str,
    #[case] expected: MomDataError,
) {
    assert_eq!(TaxRateKey::new(country, region, "*"), Err(expected));
}

#[rstest]
#[case("US-CA-*")]
#[case("US-CA-90001-1234")]
fn key_parses_its_display_form(#[case] raw: &str) {
    let key: TaxRateKey = raw.parse().expect("parsable key");
    assert_eq!(key.to_string(), raw);
}

#[rstest]
#[case("")]
#[case("US-CA")]
#[case("US-CA-")]
#[case("Shipping rate")]
fn key_rejects_foreign_codes(#[case] raw: &str) {
    assert_eq!(
        raw.parse::<TaxRateKey>(),
        Err(MomDataError::MalformedKey(raw.to_owned()))
    );
}

#[rstest]
fn rate_is_rounded_to_four_places() {
    let rate = MomTaxRate::new("US", "CA", "", Some(" Los Angeles ".to_owned()), dec!(9.500049))
        .expect("valid rate");
    assert_eq!(rate.rate(), dec!(9.5000));
    assert_eq!(rate.county(), Some("Los Angeles"));
}

#[rstest]
#[case(dec!(-0.01))]
#[case(dec!(100.0001))]
fn rate_must_be_a_percentage(#[case] raw: rust_decimal::Decimal) {
    assert_eq!(
        MomTaxRate::new("US", "CA", "", None, raw),
        Err(MomDataError::RateOutOfRange(raw))
    );
}

#[rstest]
fn blank_county_is_dropped() {
    let rate = MomTaxRate::new("US", "OR", "", Some("  ".to_owned()), dec!(0)).expect("valid rate");
    assert!(rate.county().is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn in_memory_source_serves_replaced_rates() {
    let first = MomTaxRate::new("US", "CA", "", None, dec!(7.25)).expect("valid rate");
    let second = MomTaxRate::new("US", "NV", "", None, dec!(6.85)).expect("valid rate");
    let source = InMemoryMomTaxRates::new(vec![first.clone()]);
    assert_eq!(source.load_tax_rates().await.expect("load"), vec![first]);

    source.replace(vec![second.clone()]).expect("replace");
    assert_eq!(source.load_tax_rates().await.expect("load"), vec![second]);
}
