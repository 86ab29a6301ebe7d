use admission_server::{
    AdmissionServer,
    api::admission_review::AdmissionReviewResponse,
    config::Config,
};
use axum::{
    Router,
    body::Body,
    http::{self, Request, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use stack_validator::{Operation, ValidationSettings, resources::StackResource};
use std::net::SocketAddr;
use tower::ServiceExt;

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 9443)),
        tls_config: None,
        validation_settings: ValidationSettings::default(),
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) fn app(config: Config) -> Router {
    AdmissionServer::new_from_config(config).unwrap().router()
}

/// POST `body` to `path` and decode the AdmissionReview sent back
pub(crate) async fn post_review(app: Router, path: &str, body: String) -> AdmissionReviewResponse {
    let request = Request::builder()
        .method(http::Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .uri(path)
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200);

    serde_json::from_slice(&response.into_body().collect().await.unwrap().to_bytes()).unwrap()
}

/// Expected outcome of a test case
pub(crate) enum ValidationCheck {
    Succeeded,
    SucceededWithWarnings(Vec<String>),
    /// Each cause must be part of the status message, none of the excluded
    /// ones may be
    Failed {
        causes: Vec<String>,
        excluded: Vec<String>,
    },
}

pub(crate) fn succeeded() -> ValidationCheck {
    ValidationCheck::Succeeded
}

pub(crate) fn succeeded_with_warnings(warnings: &[&str]) -> ValidationCheck {
    ValidationCheck::SucceededWithWarnings(warnings.iter().map(|w| w.to_string()).collect())
}

pub(crate) fn failed(causes: &[&str]) -> ValidationCheck {
    failed_without(causes, &[])
}

pub(crate) fn failed_without(causes: &[&str], excluded: &[&str]) -> ValidationCheck {
    ValidationCheck::Failed {
        causes: causes.iter().map(|c| c.to_string()).collect(),
        excluded: excluded.iter().map(|c| c.to_string()).collect(),
    }
}

pub(crate) struct ValidationWebhookTestCase {
    pub(crate) name: &'static str,
    pub(crate) operation: Operation,
    pub(crate) object: Value,
    pub(crate) old_object: Option<Value>,
    pub(crate) check: ValidationCheck,
}

impl ValidationWebhookTestCase {
    pub(crate) fn create(name: &'static str, object: Value, check: ValidationCheck) -> Self {
        ValidationWebhookTestCase {
            name,
            operation: Operation::Create,
            object,
            old_object: None,
            check,
        }
    }

    pub(crate) fn update(
        name: &'static str,
        old_object: Value,
        object: Value,
        check: ValidationCheck,
    ) -> Self {
        ValidationWebhookTestCase {
            name,
            operation: Operation::Update,
            object,
            old_object: Some(old_object),
            check,
        }
    }
}

/// AdmissionReview the API server would send for `object`
pub(crate) fn admission_review<K: StackResource>(
    uid: &str,
    operation: Operation,
    object: &Value,
    old_object: Option<&Value>,
) -> Value {
    let mut request = json!({
        "uid": uid,
        "kind": {"group": K::GROUP, "version": K::VERSION, "kind": K::KIND},
        "resource": {"group": K::GROUP, "version": K::VERSION, "resource": K::PLURAL},
        "name": object.pointer("/metadata/name").cloned().unwrap_or(Value::Null),
        "namespace": "default",
        "operation": operation,
        "userInfo": {"username": "kubernetes-admin", "groups": ["system:masters"]},
        "object": object,
    });
    if let Some(old_object) = old_object {
        request["oldObject"] = old_object.clone();
    }

    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": request,
    })
}

/// Send every test case to the webhook of `K` and check the response.
pub(crate) async fn run_validation_webhook_tests<K: StackResource>(
    test_cases: Vec<ValidationWebhookTestCase>,
) {
    let app = app(default_test_config());
    let path = K::gvk().webhook_path();

    for (idx, tc) in test_cases.into_iter().enumerate() {
        let uid = format!("{}-{idx}", tc.name);
        let review =
            admission_review::<K>(&uid, tc.operation, &tc.object, tc.old_object.as_ref());

        let review_response = post_review(app.clone(), &path, review.to_string()).await;
        let response = review_response.response;
        assert_eq!(response.uid, uid, "{}", tc.name);

        match tc.check {
            ValidationCheck::Succeeded => {
                assert!(
                    response.allowed,
                    "{}: unexpected denial {:?}",
                    tc.name, response.status
                );
            }
            ValidationCheck::SucceededWithWarnings(expected) => {
                assert!(
                    response.allowed,
                    "{}: unexpected denial {:?}",
                    tc.name, response.status
                );
                let warnings = response.warnings.unwrap_or_default();
                for warning in expected {
                    assert!(
                        warnings.contains(&warning),
                        "{}: warning {warning:?} not in {warnings:?}",
                        tc.name
                    );
                }
            }
            ValidationCheck::Failed { causes, excluded } => {
                assert!(!response.allowed, "{}: unexpected admission", tc.name);
                let message = response
                    .status
                    .and_then(|status| status.message)
                    .unwrap_or_default();
                for cause in causes {
                    assert!(
                        message.contains(&cause),
                        "{}: {cause:?} not in {message:?}",
                        tc.name
                    );
                }
                for cause in excluded {
                    assert!(
                        !message.contains(&cause),
                        "{}: unexpected {cause:?} in {message:?}",
                        tc.name
                    );
                }
            }
        }
    }
}
