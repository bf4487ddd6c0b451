//! Validation tests for tenants, applications and settings.

use crate::whippet::domain::{
    Application, ApplicationKind, Setting, SettingKey, Tenant, TenantCode, TenantId,
    WhippetDomainError,
};
use mockable::DefaultClock;
use rstest::rstest;
use std::time::Duration;

#[rstest]
#[case("acme", "acme")]
#[case("  Acme-Outdoor ", "acme-outdoor")]
#[case("store42", "store42")]
fn tenant_code_normalizes_valid_values(#[case] raw: &str, #[case] expected: &str) {
    let code = TenantCode::new(raw).expect("valid tenant code");
    assert_eq!(code.as_str(), expected);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("-acme")]
#[case("acme-")]
#[case("acme outdoor")]
#[case("acme_outdoor")]
fn tenant_code_rejects_invalid_values(#[case] raw: &str) {
    assert_eq!(
        TenantCode::new(raw),
        Err(WhippetDomainError::InvalidTenantCode(raw.to_owned()))
    );
}

#[rstest]
fn tenant_code_rejects_overlong_values() {
    let raw = "a".repeat(65);
    assert!(TenantCode::new(raw).is_err());
}

#[rstest]
fn tenant_rejects_blank_name() {
    let code = TenantCode::new("acme").expect("valid tenant code");
    assert_eq!(
        Tenant::new(code, "  ", &DefaultClock),
        Err(WhippetDomainError::EmptyName("tenant"))
    );
}

#[rstest]
fn tenant_deactivation_is_not_repeatable() {
    let code = TenantCode::new("acme").expect("valid tenant code");
    let mut tenant = Tenant::new(code, "Acme", &DefaultClock).expect("valid tenant");

    tenant.deactivate(&DefaultClock).expect("first deactivation");
    assert!(!tenant.is_active());
    assert_eq!(
        tenant.deactivate(&DefaultClock),
        Err(WhippetDomainError::AlreadyInactive)
    );

    tenant.activate(&DefaultClock).expect("reactivation");
    assert!(tenant.is_active());
}

#[rstest]
fn magento_application_requires_http_base_url() {
    let tenant_id = TenantId::new();
    let missing = Application::new(
        tenant_id,
        ApplicationKind::Magento,
        "Storefront",
        None,
        &DefaultClock,
    );
    assert!(matches!(missing, Err(WhippetDomainError::InvalidBaseUrl(_))));

    let bad_scheme = Application::new(
        tenant_id,
        ApplicationKind::Magento,
        "Storefront",
        Some("ftp://shop.example".to_owned()),
        &DefaultClock,
    );
    assert!(matches!(bad_scheme, Err(WhippetDomainError::InvalidBaseUrl(_))));
}

#[rstest]
fn application_base_url_drops_trailing_slash() {
    let application = Application::new(
        TenantId::new(),
        ApplicationKind::Magento,
        "Storefront",
        Some("https://shop.example/".to_owned()),
        &DefaultClock,
    )
    .expect("valid application");
    assert_eq!(application.base_url(), Some("https://shop.example"));
}

#[rstest]
fn mom_application_needs_no_base_url() {
    let application = Application::new(
        TenantId::new(),
        ApplicationKind::Mom,
        "Order manager",
        None,
        &DefaultClock,
    )
    .expect("valid application");
    assert!(application.base_url().is_none());
    assert!(application.is_enabled());
}

#[rstest]
#[case("MAGENTO", ApplicationKind::Magento)]
#[case("mom", ApplicationKind::Mom)]
#[case(" Salesforce ", ApplicationKind::Salesforce)]
fn application_kind_parses_case_insensitively(
    #[case] raw: &str,
    #[case] expected: ApplicationKind,
) {
    assert_eq!(ApplicationKind::try_from(raw), Ok(expected));
}

#[rstest]
#[case("tax.cache_ttl_minutes")]
#[case("Magento.Store_Code")]
fn setting_key_accepts_dotted_segments(#[case] raw: &str) {
    assert!(SettingKey::new(raw).is_ok());
}

#[rstest]
#[case("")]
#[case("tax.")]
#[case(".tax")]
#[case("tax..ttl")]
#[case("tax-ttl")]
fn setting_key_rejects_malformed_keys(#[case] raw: &str) {
    assert!(matches!(
        SettingKey::new(raw),
        Err(WhippetDomainError::InvalidSettingKey(_))
    ));
}

fn setting_with(value: &str) -> Setting {
    let key = SettingKey::new("tax.sample").expect("valid key");
    Setting::new(TenantId::new(), None, key, value, &DefaultClock)
}

#[rstest]
#[case("true", true)]
#[case("YES", true)]
#[case("1", true)]
#[case("false", false)]
#[case("no", false)]
#[case("0", false)]
fn setting_parses_booleans(#[case] raw: &str, #[case] expected: bool) {
    assert_eq!(setting_with(raw).as_bool(), Ok(expected));
}

#[rstest]
fn setting_reports_invalid_typed_values() {
    let setting = setting_with("soon");
    assert!(matches!(
        setting.as_bool(),
        Err(WhippetDomainError::InvalidSettingValue { expected: "a boolean", .. })
    ));
    assert!(setting.as_u64().is_err());
    assert!(setting.as_minutes().is_err());
}

#[rstest]
fn setting_converts_minutes_to_duration() {
    assert_eq!(
        setting_with(" 90 ").as_minutes(),
        Ok(Duration::from_secs(90 * 60))
    );
}
