//! Call orchestration: loading flag, captured errors, overlap guard.

mod support;

use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;

use canvas_admin_core::{ApiError, CallOrchestrator, CallState, TemplateParams, TrackedApi};
use serde_json::json;
use support::Harness;
use tokio::sync::oneshot;

#[tokio::test]
async fn success_returns_value_and_resets_loading() {
    let calls: CallOrchestrator<serde_json::Value> = CallOrchestrator::new();

    let value = calls
        .execute(|| async {
            assert!(calls.is_loading(), "loading while the call is in flight");
            Ok(json!({"id": 1, "name": "foo"}))
        })
        .await;

    assert_eq!(value, Some(json!({"id": 1, "name": "foo"})));
    assert_eq!(calls.snapshot(), CallState { loading: false, error: None });
}

#[tokio::test]
async fn failure_is_captured_not_propagated() {
    let calls: CallOrchestrator<String> = CallOrchestrator::new();

    let value = calls
        .execute(|| async { Err::<serde_json::Value, _>(json!({"message": "bad"}).to_string()) })
        .await;

    assert_eq!(value, None);
    assert!(!calls.is_loading());
    assert_eq!(calls.error(), Some(json!({"message": "bad"}).to_string()));
}

#[tokio::test]
async fn overlapping_call_is_refused() {
    let calls: CallOrchestrator<String> = CallOrchestrator::new();
    let (release, wait) = oneshot::channel::<()>();

    let second_ran = Cell::new(false);

    let first = calls.execute(|| async move {
        let _ = wait.await;
        Ok::<_, String>("first")
    });
    let second = async {
        let refused = calls
            .execute(|| async {
                second_ran.set(true);
                Ok::<_, String>("second")
            })
            .await;
        assert!(!second_ran.get(), "a refused call must not run");
        assert!(calls.is_loading(), "in-flight state is left alone");
        let _ = release.send(());
        refused
    };

    let (first, second) = tokio::join!(first, second);
    assert_eq!(first, Some("first"));
    assert_eq!(second, None);
    assert_eq!(calls.snapshot(), CallState { loading: false, error: None });
}

#[tokio::test]
async fn abandoned_call_releases_the_guard() {
    let calls: CallOrchestrator<String> = CallOrchestrator::new();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(10),
        calls.execute(|| std::future::pending::<Result<u32, String>>()),
    )
    .await;
    assert!(abandoned.is_err(), "the pending call never completes");
    assert!(!calls.is_loading(), "dropping the call ends it");

    let next = calls.execute(|| async { Ok::<_, String>(2) }).await;
    assert_eq!(next, Some(2));
    assert_eq!(calls.snapshot(), CallState { loading: false, error: None });
}

#[tokio::test]
async fn tracked_api_captures_server_payload() {
    let harness = Harness::logged_in("t");
    harness.transport().respond(404, json!({"message": "bad"}));
    let api = TrackedApi::new(Arc::clone(&harness.client));

    let template = api.get_template(TemplateParams { id: 1 }).await;

    assert!(template.is_none());
    assert!(!api.loading());
    let error = api.error().expect("failure is captured");
    assert_eq!(error, ApiError::Rejected { status: 404, payload: Some(json!({"message": "bad"})) });
}

#[tokio::test]
async fn tracked_api_reports_session_expiry_and_navigates() {
    let harness = Harness::logged_in("stale");
    harness.transport().respond(401, json!({"message": "Unauthenticated."}));
    let api = TrackedApi::new(Arc::clone(&harness.client));

    assert!(api.get_template_tags().await.is_none());

    assert!(api.error().is_some_and(|e| e.is_unauthorized()));
    assert_eq!(harness.token(), None);
    assert_eq!(harness.navigator.routes().len(), 1);
}

#[tokio::test]
async fn tracked_api_success_clears_previous_error() {
    let harness = Harness::logged_in("t");
    harness
        .transport()
        .respond(500, json!({"message": "boom"}))
        .respond(200, json!({"id": 1, "name": "foo", "width": 10, "height": 10}));
    let api = TrackedApi::new(Arc::clone(&harness.client));

    assert!(api.get_template(TemplateParams { id: 1 }).await.is_none());
    assert!(api.error().is_some());

    let template = api.get_template(TemplateParams { id: 1 }).await;
    assert_eq!(template.map(|t| t.name), Some("foo".to_string()));
    assert!(api.error().is_none());
}
