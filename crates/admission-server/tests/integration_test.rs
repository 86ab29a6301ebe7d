mod common;

use axum::{
    body::Body,
    http::{self, Request, header},
};
use http_body_util::BodyExt;
use rstest::rstest;
use serde_json::{Value, json};
use stack_validator::{
    FieldErrorKind, Operation,
    admission_response::StatusReason,
    resources::{Beat, EnterpriseSearch, Kibana, StackResource},
};
use tower::ServiceExt;

use common::{
    ValidationWebhookTestCase, admission_review, app, default_test_config, failed, failed_without,
    post_review, run_validation_webhook_tests, succeeded, succeeded_with_warnings,
};

const LAST_APPLIED: &str = "kubectl.kubernetes.io/last-applied-configuration";
const DISABLE_DOWNGRADE: &str = "eck.k8s.elastic.co/disable-downgrade-validation";

fn enterprise_search(version: &str) -> Value {
    json!({
        "apiVersion": "enterprisesearch.k8s.elastic.co/v1beta1",
        "kind": "EnterpriseSearch",
        "metadata": {"name": "webhook-test", "uid": "e7a18cfb-b017-475c-8da2-1ec941b1f285"},
        "spec": {"version": version}
    })
}

fn kibana(version: &str) -> Value {
    json!({
        "apiVersion": "kibana.k8s.elastic.co/v1beta1",
        "kind": "Kibana",
        "metadata": {"name": "webhook-test"},
        "spec": {"version": version, "count": 1, "elasticsearchRef": {"name": "es"}}
    })
}

fn beat(spec: Value) -> Value {
    json!({
        "apiVersion": "beat.k8s.elastic.co/v1beta1",
        "kind": "Beat",
        "metadata": {"name": "webhook-test"},
        "spec": spec
    })
}

fn with_annotation(mut object: Value, key: &str, value: &str) -> Value {
    object["metadata"]["annotations"] = json!({ key: value });
    object
}

fn with_name(mut object: Value, name: &str) -> Value {
    object["metadata"]["name"] = json!(name);
    object
}

#[tokio::test]
async fn test_readiness() {
    let app = app(default_test_config());

    let request = Request::builder()
        .uri("/readiness")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_enterprise_search_webhook() {
    let test_cases = vec![
        ValidationWebhookTestCase::create("create-valid", enterprise_search("8.1.0"), succeeded()),
        ValidationWebhookTestCase::create(
            "unknown-field",
            with_annotation(
                enterprise_search("8.1.0"),
                LAST_APPLIED,
                r#"{"metadata":{"name": "ekesn", "namespace": "default", "uid": "e7a18cfb-b017-475c-8da2-1ec941b1f285", "creationTimestamp":"2020-03-24T13:43:20Z" },"spec":{"version":"7.6.1", "unknown": "UNKNOWN"}}"#,
            ),
            failed(&[
                r#""unknown": unknown field found in the kubectl.kubernetes.io/last-applied-configuration annotation is unknown"#,
            ]),
        ),
        ValidationWebhookTestCase::create(
            "long-name",
            with_name(enterprise_search("8.1.0"), &"x".repeat(100)),
            failed(&["metadata.name: Too long: may not be more than 36 bytes"]),
        ),
        ValidationWebhookTestCase::create(
            "invalid-version",
            enterprise_search("7.x"),
            failed(&[
                r#"spec.version: Invalid value: "7.x": Invalid version: No Major.Minor.Patch elements found"#,
            ]),
        ),
        ValidationWebhookTestCase::create(
            "unsupported-version-lower",
            enterprise_search("3.1.2"),
            failed(&["Unsupported version: version 3.1.2 is lower than the lowest supported version"]),
        ),
        ValidationWebhookTestCase::create(
            "unsupported-version-higher",
            enterprise_search("300.1.2"),
            failed(&[
                "Unsupported version: version 300.1.2 is higher than the highest supported version",
            ]),
        ),
        ValidationWebhookTestCase::create(
            "deprecated-version",
            enterprise_search("7.10.0"),
            succeeded_with_warnings(&[
                "Version 7.10.0 is EOL and support for it will be removed in a future release of the operator",
            ]),
        ),
        ValidationWebhookTestCase::update(
            "update-valid",
            enterprise_search("7.7.0"),
            enterprise_search("7.7.1"),
            succeeded(),
        ),
        ValidationWebhookTestCase::update(
            "version-downgrade",
            enterprise_search("7.7.1"),
            enterprise_search("7.7.0"),
            failed(&["spec.version: Forbidden: Version downgrades are not supported"]),
        ),
        ValidationWebhookTestCase::update(
            "version-downgrade-with-override",
            enterprise_search("7.7.1"),
            with_annotation(enterprise_search("7.7.0"), DISABLE_DOWNGRADE, "true"),
            succeeded(),
        ),
        ValidationWebhookTestCase::update(
            "override-still-runs-the-version-checks",
            enterprise_search("7.7.1"),
            with_annotation(enterprise_search("5.0.0"), DISABLE_DOWNGRADE, "true"),
            failed_without(
                &["Unsupported version: version 5.0.0 is lower than the lowest supported version"],
                &["Version downgrades are not supported"],
            ),
        ),
    ];

    run_validation_webhook_tests::<EnterpriseSearch>(test_cases).await;
}

#[tokio::test]
async fn test_kibana_webhook() {
    let monitored = |version: &str, metrics_refs: Value| {
        let mut kb = kibana(version);
        kb["spec"]["monitoring"] = json!({"metrics": {"elasticsearchRefs": metrics_refs}});
        kb
    };

    let test_cases = vec![
        ValidationWebhookTestCase::create("create-valid", kibana("8.1.0"), succeeded()),
        ValidationWebhookTestCase::create(
            "create-6.x-is-deprecated",
            kibana("6.8.23"),
            succeeded_with_warnings(&[
                "Version 6.8.23 is EOL and support for it will be removed in a future release of the operator",
            ]),
        ),
        ValidationWebhookTestCase::create(
            "unknown-nested-field",
            with_annotation(
                kibana("8.1.0"),
                LAST_APPLIED,
                r#"{"metadata":{"name":"webhook-test"},"spec":{"version":"8.1.0","elasticsearchRef":{"name":"es","nmespace":"default"}}}"#,
            ),
            failed(&[
                r#"spec.elasticsearchRef.nmespace: Invalid value: "nmespace": unknown field found"#,
            ]),
        ),
        ValidationWebhookTestCase::create(
            "free-form-config-is-not-checked",
            with_annotation(
                kibana("8.1.0"),
                LAST_APPLIED,
                r#"{"metadata":{"name":"webhook-test"},"spec":{"version":"8.1.0","config":{"server.publicBaseUrl":"https://kb.example.com"}}}"#,
            ),
            succeeded(),
        ),
        ValidationWebhookTestCase::create(
            "every-defect-is-reported",
            with_name(kibana("300.1.2"), &"x".repeat(37)),
            failed(&[
                "metadata.name: Too long: may not be more than 36 bytes",
                "version 300.1.2 is higher than the highest supported version",
            ]),
        ),
        ValidationWebhookTestCase::update(
            "downgrade-hides-other-errors",
            kibana("8.1.0"),
            with_name(kibana("8.0.0"), &"x".repeat(37)),
            failed(&[
                r#"Kibana.kibana.k8s.elastic.co "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx" is invalid: spec.version: Forbidden: Version downgrades are not supported"#,
            ]),
        ),
        ValidationWebhookTestCase::update(
            "downgrade-hides-unknown-fields",
            kibana("8.1.0"),
            with_annotation(
                kibana("8.0.0"),
                LAST_APPLIED,
                r#"{"metadata":{"name":"webhook-test"},"spec":{"version":"8.0.0","unknown":"UNKNOWN"}}"#,
            ),
            failed(&[
                r#"Kibana.kibana.k8s.elastic.co "webhook-test" is invalid: spec.version: Forbidden: Version downgrades are not supported"#,
            ]),
        ),
        ValidationWebhookTestCase::update(
            "override-must-be-true",
            kibana("8.1.0"),
            with_annotation(kibana("8.0.0"), DISABLE_DOWNGRADE, "True"),
            failed(&["Version downgrades are not supported"]),
        ),
        ValidationWebhookTestCase::create(
            "stack-monitoring",
            monitored("8.1.0", json!([{"name": "monitoring"}])),
            succeeded(),
        ),
        ValidationWebhookTestCase::create(
            "stack-monitoring-too-old",
            monitored("7.13.0", json!([{"name": "monitoring"}])),
            failed(&[
                r#"spec.version: Invalid value: "7.13.0": Unsupported version for Stack Monitoring. Required >= 7.14.0."#,
            ]),
        ),
        ValidationWebhookTestCase::create(
            "stack-monitoring-two-clusters",
            monitored("8.1.0", json!([{"name": "a"}, {"name": "b"}])),
            failed(&[
                "Only one Elasticsearch reference is supported for Metrics Stack Monitoring",
            ]),
        ),
    ];

    run_validation_webhook_tests::<Kibana>(test_cases).await;
}

#[tokio::test]
async fn test_beat_webhook() {
    let test_cases = vec![
        ValidationWebhookTestCase::create(
            "create-valid",
            beat(json!({"type": "filebeat", "version": "8.1.0", "daemonSet": {}})),
            succeeded(),
        ),
        ValidationWebhookTestCase::create(
            "missing-type",
            beat(json!({"version": "8.1.0", "deployment": {}})),
            failed(&["spec.type: Required value: Beat type is required"]),
        ),
        ValidationWebhookTestCase::create(
            "both-deployment-methods",
            beat(json!({"type": "metricbeat", "version": "8.1.0", "daemonSet": {}, "deployment": {}})),
            failed(&["spec: Forbidden: Specify either daemonSet or deployment, not both"]),
        ),
        ValidationWebhookTestCase::create(
            "config-and-config-ref",
            beat(json!({
                "type": "heartbeat",
                "version": "8.1.0",
                "deployment": {},
                "config": {"heartbeat.monitors": []},
                "configRef": {"secretName": "heartbeat-config"}
            })),
            failed(&["spec: Forbidden: Specify at most one of config and configRef"]),
        ),
        ValidationWebhookTestCase::update(
            "upgrade",
            beat(json!({"type": "filebeat", "version": "7.17.0", "daemonSet": {}})),
            beat(json!({"type": "filebeat", "version": "8.1.0", "daemonSet": {}})),
            succeeded(),
        ),
    ];

    run_validation_webhook_tests::<Beat>(test_cases).await;
}

#[tokio::test]
async fn test_causes_survive_the_wire() {
    let object = with_name(enterprise_search("3.1.2"), &"x".repeat(40));
    let review = admission_review::<EnterpriseSearch>("uid", Operation::Create, &object, None);

    let review_response = post_review(
        app(default_test_config()),
        &EnterpriseSearch::gvk().webhook_path(),
        review.to_string(),
    )
    .await;

    let errors = review_response.response.field_errors();
    let kinds: Vec<(&str, FieldErrorKind)> = errors
        .iter()
        .map(|e| (e.field.as_str(), e.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("metadata.name", FieldErrorKind::TooLong),
            ("spec.version", FieldErrorKind::NotSupported),
        ]
    );

    // decoding the response again yields the same errors
    let reencoded: stack_validator::AdmissionResponse =
        serde_json::from_value(serde_json::to_value(&review_response.response).unwrap()).unwrap();
    assert_eq!(reencoded.field_errors(), errors);
}

#[tokio::test]
async fn test_v1beta1_review_is_answered_with_v1beta1() {
    let review_response = post_review(
        app(default_test_config()),
        &Kibana::gvk().webhook_path(),
        include_str!("data/kibana_create_v1beta1.json").to_owned(),
    )
    .await;

    assert_eq!(
        review_response.api_version.as_deref(),
        Some("admission.k8s.io/v1beta1")
    );
    assert_eq!(review_response.kind.as_deref(), Some("AdmissionReview"));
    assert_eq!(
        review_response.response.uid,
        "1299d386-525b-4032-98ae-1949f69f9cfc"
    );
    assert!(review_response.response.allowed);
}

#[tokio::test]
async fn test_old_object_of_another_kind() {
    let review_response = post_review(
        app(default_test_config()),
        &Beat::gvk().webhook_path(),
        include_str!("data/beat_update_old_object_of_another_kind.json").to_owned(),
    )
    .await;

    let response = review_response.response;
    assert!(!response.allowed);
    let status = response.status.unwrap();
    assert_eq!(status.reason, Some(StatusReason::Forbidden));
    assert_eq!(status.code, Some(403));
    assert_eq!(
        status.message.as_deref(),
        Some("cannot cast old object to Beat type")
    );
}

#[tokio::test]
async fn test_undecodable_object_is_a_bad_request() {
    let object = json!({"metadata": {"name": "kb"}, "spec": {"version": ["8.1.0"]}});
    let review = admission_review::<Kibana>("uid", Operation::Create, &object, None);

    let review_response = post_review(
        app(default_test_config()),
        &Kibana::gvk().webhook_path(),
        review.to_string(),
    )
    .await;

    let status = review_response.response.status.unwrap();
    assert_eq!(status.reason, Some(StatusReason::BadRequest));
    assert_eq!(status.code, Some(400));
}

#[tokio::test]
async fn test_delete_is_always_admitted() {
    let review = json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": "uid",
            "kind": {"group": Kibana::GROUP, "version": Kibana::VERSION, "kind": Kibana::KIND},
            "name": "webhook-test",
            "operation": "DELETE",
            "object": null,
            "oldObject": kibana("1.0.0")
        }
    });

    let review_response = post_review(
        app(default_test_config()),
        &Kibana::gvk().webhook_path(),
        review.to_string(),
    )
    .await;

    assert!(review_response.response.allowed);
    assert!(review_response.response.warnings.is_none());
}

#[rstest]
#[case::not_json("{", 400)]
#[case::not_a_review(r#"{"hello": "world"}"#, 422)]
#[case::unsupported_api_version(
    r#"{"apiVersion": "admission.k8s.io/v2", "kind": "AdmissionReview", "request": {"uid": "uid", "kind": {"group": "", "version": "v1", "kind": "Pod"}, "operation": "CREATE"}}"#,
    400
)]
#[tokio::test]
async fn test_invalid_envelopes(#[case] body: &str, #[case] expected_status: u16) {
    let app = app(default_test_config());

    let request = Request::builder()
        .method(http::Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .uri(Kibana::gvk().webhook_path())
        .body(Body::from(body.to_owned()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status().as_u16(), expected_status);

    let payload: Value =
        serde_json::from_slice(&response.into_body().collect().await.unwrap().to_bytes()).unwrap();
    assert_eq!(payload["status"], expected_status);
    assert!(payload["message"].is_string());
}

#[tokio::test]
async fn test_unknown_webhook_path() {
    let app = app(default_test_config());
    let review = admission_review::<Kibana>("uid", Operation::Create, &kibana("8.1.0"), None);

    let request = Request::builder()
        .method(http::Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .uri("/validate-elasticsearch-k8s-elastic-co-v1-elasticsearch")
        .body(Body::from(review.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 404);
}
