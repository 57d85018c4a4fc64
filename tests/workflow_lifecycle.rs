//! End-to-end tests for the phase lifecycle.
//!
//! These tests drive the public router against the in-process accounting
//! and OAuth doubles, with users persisted through the JSON document store
//! in a temporary directory:
//! 1. Connect a user through the OAuth callback
//! 2. Select accounts and approve the estimate
//! 3. Request and approve a payout
//! 4. Reopen the document and check every snapshot survived
//! 5. Deliver a signed webhook and check the stored invoice follows the remote

use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use ledgerlink::adapters::http::{integration_router, IntegrationAppState};
use ledgerlink::adapters::quickbooks::{MockAccountingApi, MockOAuthProvider};
use ledgerlink::adapters::storage::JsonDocumentStore;
use ledgerlink::application::{Dispatcher, WebhookService, WorkflowOrchestrator, WorkflowSettings};
use ledgerlink::domain::accounting::EntityKind;
use ledgerlink::domain::foundation::UserId;
use ledgerlink::domain::project::{Estimate, Owner, Phase, PhaseStatus, Project, Task};
use ledgerlink::domain::webhook::{compute_signature, WebhookVerifier, SIGNATURE_HEADER};
use ledgerlink::ports::UserRepository;

const REALM: &str = "4620";
const VERIFIER_TOKEN: &str = "lifecycle-verifier";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestEnv {
    router: Router,
    api: Arc<MockAccountingApi>,
    store: Arc<JsonDocumentStore>,
    _dir: TempDir,
}

impl TestEnv {
    async fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            JsonDocumentStore::open(dir.path().join("local_db.json"))
                .await
                .unwrap(),
        );
        let api = Arc::new(MockAccountingApi::new());
        api.seed(
            EntityKind::Account,
            json!({"Name": "Services", "AccountType": "Income", "Active": true}),
        );
        api.seed(
            EntityKind::Account,
            json!({"Name": "Subcontractors", "AccountType": "Cost of Goods Sold", "Active": true}),
        );

        let orchestrator = Arc::new(WorkflowOrchestrator::new(
            store.clone(),
            Arc::new(MockOAuthProvider::new()),
            api.clone(),
            WorkflowSettings {
                default_realm_id: REALM.to_string(),
                ..WorkflowSettings::default()
            },
        ));
        let webhooks = Arc::new(WebhookService::new(
            WebhookVerifier::new(VERIFIER_TOKEN),
            Dispatcher::for_orchestrator(orchestrator.clone()),
        ));

        Self {
            router: integration_router().with_state(IntegrationAppState::new(orchestrator, webhooks)),
            api,
            store,
            _dir: dir,
        }
    }

    fn document_path(&self) -> &Path {
        self.store.path()
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post(&self, uri: &str) -> Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn webhook(&self, body: &Value) -> Response {
        let body = body.to_string();
        let signature = compute_signature(body.as_bytes(), VERIFIER_TOKEN.as_bytes()).unwrap();
        self.send(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header(SIGNATURE_HEADER, STANDARD.encode(signature))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Attaches a two-phase project to an already connected user.
    async fn assign_project(&self, user_id: &UserId) {
        let mut user = self.store.get(user_id).await.unwrap().unwrap();
        user.current_project = Some(Project {
            name: "88 Harbor Rd, Santa Cruz, CA 95060/Deck".to_string(),
            owner: Owner {
                email: "dana@example.com".to_string(),
                name: "Dana Owner".to_string(),
                phone: Some("555-0100".to_string()),
                address: None,
                extra: Default::default(),
            },
            estimate: Estimate {
                phases: vec![
                    Phase::new(
                        "framing",
                        vec![Task::new("joists", 1200.0), Task::new("posts", 300.0)],
                    ),
                    Phase::new("decking", vec![Task::new("boards", 2200.0)]),
                ],
                extra: Default::default(),
            },
            extra: Default::default(),
        });
        self.store.put(user_id, &user).await.unwrap();
    }

    fn account_id(&self, name: &str) -> String {
        (1..=self.api.count(EntityKind::Account))
            .map(|n| n.to_string())
            .find(|id| {
                self.api
                    .get(EntityKind::Account, id)
                    .is_some_and(|account| account["Name"] == name)
            })
            .unwrap()
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn connect(env: &TestEnv, user: &str) -> UserId {
    let response = env
        .get(&format!(
            "/integration/callback?code=auth-code&state={}&realmId={}",
            user, REALM
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    UserId::new(user).unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn phase_moves_from_estimate_to_reconciled_and_persists() {
    let env = TestEnv::start().await;
    let user_id = connect(&env, "builder").await;
    env.assign_project(&user_id).await;

    let income = env.account_id("Services");
    let response = env
        .post(&format!("/functional/builder/select-income-account/{}", income))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["redirectTo"], "/functional/builder/user");

    let expense = env.account_id("Subcontractors");
    let response = env
        .post(&format!("/functional/builder/select-expense-account/{}", expense))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = env.post("/functional/builder/approve-estimate").await;
    assert_eq!(response.status(), StatusCode::OK);
    let user = json_body(response).await;
    assert_eq!(user["Customer"]["DisplayName"], "Dana Owner");
    assert_eq!(env.api.count(EntityKind::Item), 2);

    let response = env
        .post("/functional/builder/phases/framing/request-payout")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["Invoice"]["TotalAmt"], 1500.0);

    let response = env
        .post("/functional/builder/phases/framing/approve-payout")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let phase = json_body(response).await;
    assert_eq!(phase["Payment"]["TotalAmt"], 1500.0);
    assert_eq!(phase["UpdatedInvoice"]["Balance"], 0.0);

    let reopened = JsonDocumentStore::open(env.document_path()).await.unwrap();
    let stored = reopened.get(&user_id).await.unwrap().unwrap();
    let project = stored.current_project.unwrap();
    assert_eq!(
        project.phase("framing").unwrap().status(),
        PhaseStatus::Reconciled
    );
    assert_eq!(
        project.phase("decking").unwrap().status(),
        PhaseStatus::Itemized
    );
    assert_eq!(stored.accounts.expense.unwrap().id, expense);
}

#[tokio::test]
async fn payout_before_estimate_approval_is_rejected() {
    let env = TestEnv::start().await;
    let user_id = connect(&env, "builder").await;
    env.assign_project(&user_id).await;

    let response = env
        .post("/functional/builder/phases/framing/request-payout")
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(env.api.count(EntityKind::Invoice), 0);
}

#[tokio::test]
async fn signed_webhook_refreshes_stored_invoice() {
    let env = TestEnv::start().await;
    let user_id = connect(&env, "builder").await;
    env.assign_project(&user_id).await;
    let income = env.account_id("Services");
    env.post(&format!("/functional/builder/select-income-account/{}", income))
        .await;
    env.post("/functional/builder/approve-estimate").await;
    let response = env
        .post("/functional/builder/phases/decking/request-payout")
        .await;
    let invoice_id = json_body(response).await["Invoice"]["Id"]
        .as_str()
        .unwrap()
        .to_string();

    assert!(env
        .api
        .edit(EntityKind::Invoice, &invoice_id, json!({"DueDate": "2026-12-01"})));
    let response = env
        .webhook(&json!({"eventNotifications": [{
            "realmId": REALM,
            "dataChangeEvent": {"entities": [
                {"name": "Invoice", "id": invoice_id, "operation": "Update"},
                {"name": "Vendor", "id": "7", "operation": "Create"}
            ]}
        }]}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored = env.store.get(&user_id).await.unwrap().unwrap();
    let phase = stored
        .current_project
        .unwrap()
        .phase("decking")
        .cloned()
        .unwrap();
    let invoice = serde_json::to_value(phase.invoice.unwrap()).unwrap();
    assert_eq!(invoice["DueDate"], "2026-12-01");
    assert_eq!(invoice["SyncToken"], "1");
}

#[tokio::test]
async fn webhook_with_forged_signature_is_unauthorized() {
    let env = TestEnv::start().await;
    let body = json!({"eventNotifications": []}).to_string();

    let response = env
        .send(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header(SIGNATURE_HEADER, STANDARD.encode(b"forged"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
