//! Magento REST client behaviour against a stubbed HTTP server.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use rust_decimal_macros::dec;
use serde_json::json;
use std::time::Duration;
use whippet_integrations::magento::{
    adapters::http::{MagentoClientConfig, MagentoHttpClient},
    domain::{BulkMethod, BulkRequest, BulkState, MagentoTaxRate, TAX_RATE_TOPIC},
    ports::{MagentoBulkSupport, MagentoError, MagentoTaxRateGateway},
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "integration-token";

fn client(server: &MockServer) -> MagentoHttpClient {
    MagentoHttpClient::new(&MagentoClientConfig {
        base_url: format!("{}/", server.uri()),
        access_token: TOKEN.to_owned(),
        store_code: "all".to_owned(),
        timeout: Duration::from_secs(5),
    })
    .expect("valid client configuration")
}

fn stored_rate(id: u64, region: &str) -> serde_json::Value {
    json!({
        "id": id,
        "tax_country_id": "US",
        "tax_region_id": 0,
        "tax_postcode": "*",
        "code": format!("WHP-US-{region}-*"),
        "rate": "6.5"
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn tax_rates_are_collected_across_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/all/V1/taxRates/search"))
        .and(query_param("searchCriteria[currentPage]", "1"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [stored_rate(1, "CA"), stored_rate(2, "NV")],
            "total_count": 3
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/all/V1/taxRates/search"))
        .and(query_param("searchCriteria[currentPage]", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [stored_rate(3, "OR")],
            "total_count": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rates = client(&server).list_tax_rates().await.expect("listing");

    let codes: Vec<&str> = rates.iter().map(|rate| rate.code.as_str()).collect();
    assert_eq!(codes, vec!["WHP-US-CA-*", "WHP-US-NV-*", "WHP-US-OR-*"]);
    assert!(rates.iter().all(|rate| rate.rate == dec!(6.5)));
}

#[tokio::test(flavor = "multi_thread")]
async fn unauthorized_and_missing_resources_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/all/V1/taxRates/search"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "The consumer isn't authorized to access %resources.",
            "parameters": {"resources": "Magento_Tax::manage_tax"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/all/V1/taxRates/99"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let magento = client(&server);
    assert_eq!(
        magento.list_tax_rates().await.err(),
        Some(MagentoError::Unauthorized)
    );
    assert_eq!(
        magento.delete_tax_rate(99).await.err(),
        Some(MagentoError::NotFound("taxRates/99".to_owned()))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn error_messages_substitute_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/all/V1/taxRates"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Code \"%1\" already exists.",
            "parameters": ["WHP-US-CA-*"]
        })))
        .mount(&server)
        .await;

    let rate = MagentoTaxRate {
        id: None,
        tax_country_id: "US".to_owned(),
        tax_region_id: None,
        region_code: None,
        tax_postcode: "*".to_owned(),
        code: "WHP-US-CA-*".to_owned(),
        rate: dec!(7.25),
    };
    let result = client(&server).create_tax_rate(&rate).await;

    assert_eq!(
        result.err(),
        Some(MagentoError::Http {
            status: 400,
            message: "Code \"WHP-US-CA-*\" already exists.".to_owned(),
        })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn region_identifiers_are_parsed_from_strings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/all/V1/directory/countries/US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "US",
            "available_regions": [
                {"id": "12", "code": "CA", "name": "California"},
                {"id": "39", "code": "NV", "name": "Nevada"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/all/V1/directory/countries/GB"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "GB"})))
        .mount(&server)
        .await;

    let magento = client(&server);
    let regions = magento.list_regions("US").await.expect("regions");
    let ids: Vec<(u64, &str)> = regions
        .iter()
        .map(|region| (region.id, region.code.as_str()))
        .collect();
    assert_eq!(ids, vec![(12, "CA"), (39, "NV")]);

    assert!(magento.list_regions("GB").await.expect("regions").is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn bulk_submission_and_status_round_trip() {
    let server = MockServer::start().await;
    let payloads = vec![json!({"taxRate": {"code": "WHP-US-CA-*"}})];
    Mock::given(method("POST"))
        .and(path("/rest/all/async/bulk/V1/taxRates"))
        .and(body_json(&payloads))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "bulk_uuid": "0b5a8c1e-3f55-4a1e-9c55-2f9c2a7b8d10",
            "request_items": [{"id": 0, "data_hash": "abc", "status": "accepted"}],
            "errors": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/rest/all/V1/bulk/0b5a8c1e-3f55-4a1e-9c55-2f9c2a7b8d10/detailed-status",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bulk_id": "0b5a8c1e-3f55-4a1e-9c55-2f9c2a7b8d10",
            "operations_list": [
                {"id": 0, "status": 3, "result_message": "Rate refused", "error_code": 0}
            ]
        })))
        .mount(&server)
        .await;

    let magento = client(&server);
    let accepted = magento
        .submit_bulk(&BulkRequest {
            topic: TAX_RATE_TOPIC.to_owned(),
            method: BulkMethod::Post,
            payloads,
        })
        .await
        .expect("submission");
    assert_eq!(accepted.request_items.len(), 1);
    assert!(!accepted.errors);

    let summary = magento
        .bulk_status(&accepted.bulk_uuid)
        .await
        .expect("status");
    assert_eq!(summary.state(), BulkState::Failed);
    assert_eq!(summary.failure_messages(), vec!["operation 0: Rate refused".to_owned()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_bodies_are_decode_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/all/V1/bulk/missing-fields/detailed-status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"unexpected\": true}"))
        .mount(&server)
        .await;

    let result = client(&server).bulk_status("missing-fields").await;
    assert!(matches!(result, Err(MagentoError::Decode(_))));
}

#[test]
fn blank_token_is_a_configuration_error() {
    let result = MagentoHttpClient::new(&MagentoClientConfig {
        base_url: "https://shop.example".to_owned(),
        access_token: "  ".to_owned(),
        store_code: "all".to_owned(),
        timeout: Duration::from_secs(5),
    });
    assert!(matches!(result, Err(MagentoError::Configuration(_))));
}
