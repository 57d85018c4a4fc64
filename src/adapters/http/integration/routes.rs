//! Axum router configuration for the integration endpoints.

use axum::routing::{get, post, put};
use axum::Router;

use super::handlers::{
    approve_estimate, approve_payout, callback, create_phase, find_account, get_user,
    handle_webhook, request_payout, request_token, select_expense_account,
    select_income_account, update_phase, IntegrationAppState,
};

/// OAuth connect routes, mounted at `/integration`.
///
/// - `GET /requestToken/:user_id` - Redirect to the provider consent page
/// - `GET /callback` - Exchange the authorization code
pub fn oauth_routes() -> Router<IntegrationAppState> {
    Router::new()
        .route("/requestToken/:user_id", get(request_token))
        .route("/callback", get(callback))
}

/// Workflow routes, mounted at `/functional/:user_id`.
pub fn functional_routes() -> Router<IntegrationAppState> {
    Router::new()
        .route("/user", get(get_user))
        .route("/select-income-account/:account_id", post(select_income_account))
        .route("/select-expense-account/:account_id", post(select_expense_account))
        .route("/find-account", get(find_account))
        .route("/approve-estimate", post(approve_estimate))
        .route("/phases", post(create_phase))
        .route("/phases/:phase", put(update_phase))
        .route("/phases/:phase/request-payout", post(request_payout))
        .route("/phases/:phase/approve-payout", post(approve_payout))
}

/// Complete router for the service.
///
/// # Example
///
/// ```ignore
/// let app = integration_router().with_state(IntegrationAppState::new(orchestrator, webhooks));
/// ```
pub fn integration_router() -> Router<IntegrationAppState> {
    Router::new()
        .nest("/integration", oauth_routes())
        .nest("/functional/:user_id", functional_routes())
        .route("/webhook", post(handle_webhook))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::adapters::quickbooks::MockAccountingApi;
    use crate::adapters::storage::InMemoryUserRepository;
    use crate::application::workflow::test_support::{harness, harness_with, Harness, REALM};
    use crate::application::{Dispatcher, WebhookService};
    use crate::domain::accounting::EntityKind;
    use crate::domain::foundation::UserId;
    use crate::domain::project::PhaseStatus;
    use crate::domain::webhook::{sign_for_test, WebhookVerifier, SIGNATURE_HEADER};
    use crate::ports::UserRepository;

    const SECRET: &str = "verifier";

    struct TestApp {
        router: Router,
        api: Arc<MockAccountingApi>,
        repository: Arc<InMemoryUserRepository>,
    }

    impl TestApp {
        async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn post(&self, uri: &str, body: Value) -> Response {
            self.send(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
        }

        async fn get(&self, uri: &str) -> Response {
            self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
        }
    }

    fn app(h: Harness) -> TestApp {
        let orchestrator = Arc::new(h.orchestrator);
        let webhooks = Arc::new(WebhookService::new(
            WebhookVerifier::new(SECRET),
            Dispatcher::for_orchestrator(orchestrator.clone()),
        ));
        TestApp {
            router: integration_router()
                .with_state(IntegrationAppState::new(orchestrator, webhooks)),
            api: h.api,
            repository: h.repository,
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn request_token_redirects_with_state() {
        let app = app(harness().await);

        let response = app.get("/integration/requestToken/pro").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()["location"].to_str().unwrap();
        assert!(location.ends_with("state=pro"));
    }

    #[tokio::test]
    async fn callback_stores_credential() {
        let app = app(harness().await);

        let response = app
            .get("/integration/callback?code=abc&state=newbie&realmId=4620")
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"status": "OK"}));
        assert_eq!(app.repository.write_count(), 1);
    }

    #[tokio::test]
    async fn callback_without_state_is_bad_request() {
        let app = app(harness().await);

        let response = app.get("/integration/callback?code=abc").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = app(harness().await);

        let response = app.get("/functional/nobody/user").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn find_account_returns_matches() {
        let app = app(harness().await);

        let response = app.get("/functional/pro/find-account?name=Lab").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"][0]["Name"], "Labor");
    }

    #[tokio::test]
    async fn select_income_account_rejects_expense_type() {
        let h = harness().await;
        let expense_id = h.stored_user().await.accounts.expense.unwrap().id;
        let app = app(h);

        let response = app
            .post(
                &format!("/functional/pro/select-income-account/{}", expense_id),
                json!({}),
            )
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn approve_estimate_route_itemizes_every_phase() {
        let app = app(harness().await);

        let response = app.post("/functional/pro/approve-estimate", json!({})).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["Customer"]["DisplayName"], "Olive Owner");
        let phases = body["CurrentProject"]["Estimate"]["phases"].as_array().unwrap();
        assert!(phases.iter().all(|phase| phase["Item"]["Id"].is_string()));
        assert_eq!(app.api.count(EntityKind::Item), 2);
        let stored = app
            .repository
            .get(&UserId::new("pro").unwrap())
            .await
            .unwrap()
            .unwrap();
        let project = stored.current_project.unwrap();
        assert_eq!(project.phase("floor").unwrap().status(), PhaseStatus::Itemized);
    }

    #[tokio::test]
    async fn phase_lifecycle_over_http() {
        let app = app(harness().await);

        let response = app.post("/functional/pro/approve-estimate", json!({})).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .post("/functional/pro/phases/paint/request-payout", json!({}))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["Invoice"]["TotalAmt"], 150.0);

        let response = app
            .post("/functional/pro/phases/paint/approve-payout", json!({}))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["UpdatedInvoice"]["Balance"], 0.0);
        assert_eq!(app.api.count(EntityKind::Payment), 1);
    }

    #[tokio::test]
    async fn create_and_update_phase() {
        let app = app(harness().await);

        let response = app
            .post(
                "/functional/pro/phases",
                json!({"name": "roof", "tasks": [{"name": "shingles", "cost": 900.0}]}),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .send(
                Request::builder()
                    .method("PUT")
                    .uri("/functional/pro/phases/roof")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"tasks": [{"name": "shingles", "cost": 900.0}]}).to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["updated"], false);
    }

    #[tokio::test]
    async fn batch_failure_reports_failed_phases() {
        let h = harness().await;
        h.api.fail_writes_containing(
            EntityKind::Item,
            "floor -",
            crate::ports::AccountingApiError::Status {
                status: 500,
                body: "boom".to_string(),
            },
        );
        let app = app(h);

        let response = app.post("/functional/pro/approve-estimate", json!({})).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["code"], "BATCH_INCOMPLETE");
        assert_eq!(body["details"]["failures"][0]["phase"], "floor");
    }

    #[tokio::test]
    async fn missing_income_account_is_bad_request() {
        let app = app(harness_with(|user| user.accounts.income = None).await);

        let response = app.post("/functional/pro/approve-estimate", json!({})).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhook_rejects_missing_signature() {
        let app = app(harness().await);

        let response = app.post("/webhook", json!({"eventNotifications": []})).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "INVALID_SIGNATURE");
    }

    #[tokio::test]
    async fn webhook_acknowledges_even_when_handler_fails() {
        let h = harness().await;
        let user = h.orchestrator.approve_estimate(&h.user_id).await.unwrap();
        let customer_id = user.customer.unwrap().id;
        let app = app(h);
        app.api.fail_next(crate::ports::AccountingApiError::Status {
            status: 503,
            body: "unavailable".to_string(),
        });
        let body = json!({"eventNotifications": [{
            "realmId": REALM,
            "dataChangeEvent": {"entities": [
                {"name": "Customer", "id": customer_id, "operation": "Update"}
            ]}
        }]})
        .to_string();

        let response = app
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header(SIGNATURE_HEADER, sign_for_test(body.as_bytes(), SECRET))
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"SUCCESS");
    }
}
