//! HTTP handlers for the OAuth, workflow and webhook endpoints.
//!
//! These handlers translate requests into `WorkflowOrchestrator` and
//! `WebhookService` calls and map `IntegrationError` onto status codes.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;

use crate::application::{UpdatePhaseResult, WebhookService, WorkflowOrchestrator};
use crate::domain::foundation::{IntegrationError, UserId};
use crate::domain::project::AccountRole;
use crate::domain::webhook::SIGNATURE_HEADER;

use super::dto::{
    CallbackParams, CreatePhaseRequest, ErrorResponse, FindAccountParams, FindAccountResponse,
    SelectAccountResponse, StatusResponse, UpdatePhaseRequest, UpdatePhaseResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state cloned into every request.
#[derive(Clone)]
pub struct IntegrationAppState {
    pub orchestrator: Arc<WorkflowOrchestrator>,
    pub webhooks: Arc<WebhookService>,
}

impl IntegrationAppState {
    pub fn new(orchestrator: Arc<WorkflowOrchestrator>, webhooks: Arc<WebhookService>) -> Self {
        Self {
            orchestrator,
            webhooks,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// OAuth connect
// ════════════════════════════════════════════════════════════════════════════════

/// GET /integration/requestToken/:user_id - redirect to the consent page
pub async fn request_token(
    State(state): State<IntegrationAppState>,
    Path(user_id): Path<String>,
) -> Result<Redirect, ApiError> {
    let user_id = UserId::new(user_id)?;
    let url = state.orchestrator.authorize_url(&user_id);
    tracing::info!(user_id = %user_id, "Redirecting to authorization page");
    Ok(Redirect::to(&url))
}

/// GET /integration/callback?code&state&realmId
pub async fn callback(
    State(state): State<IntegrationAppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<StatusResponse>, ApiError> {
    state
        .orchestrator
        .complete_authorization(&params.code, &params.state, params.realm_id)
        .await?;
    Ok(Json(StatusResponse::ok()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Workflow
// ════════════════════════════════════════════════════════════════════════════════

/// GET /functional/:user_id/user
pub async fn get_user(
    State(state): State<IntegrationAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.orchestrator.user(&UserId::new(user_id)?).await?;
    Ok(Json(user))
}

/// POST /functional/:user_id/select-income-account/:account_id
pub async fn select_income_account(
    state: State<IntegrationAppState>,
    path: Path<(String, String)>,
) -> Result<Json<SelectAccountResponse>, ApiError> {
    select_account(state, path, AccountRole::Income).await
}

/// POST /functional/:user_id/select-expense-account/:account_id
pub async fn select_expense_account(
    state: State<IntegrationAppState>,
    path: Path<(String, String)>,
) -> Result<Json<SelectAccountResponse>, ApiError> {
    select_account(state, path, AccountRole::Expense).await
}

async fn select_account(
    State(state): State<IntegrationAppState>,
    Path((user_id, account_id)): Path<(String, String)>,
    role: AccountRole,
) -> Result<Json<SelectAccountResponse>, ApiError> {
    let user_id = UserId::new(user_id)?;
    let account = state
        .orchestrator
        .select_account(&user_id, &account_id, role)
        .await?;
    Ok(Json(SelectAccountResponse {
        account,
        redirect_to: format!("/functional/{}/user", user_id),
    }))
}

/// GET /functional/:user_id/find-account?name=
pub async fn find_account(
    State(state): State<IntegrationAppState>,
    Path(user_id): Path<String>,
    Query(params): Query<FindAccountParams>,
) -> Result<Json<FindAccountResponse>, ApiError> {
    let data = state
        .orchestrator
        .find_accounts(&UserId::new(user_id)?, &params.name)
        .await?;
    Ok(Json(FindAccountResponse { data }))
}

/// POST /functional/:user_id/approve-estimate
pub async fn approve_estimate(
    State(state): State<IntegrationAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .orchestrator
        .approve_estimate(&UserId::new(user_id)?)
        .await?;
    Ok(Json(user))
}

/// POST /functional/:user_id/phases
pub async fn create_phase(
    State(state): State<IntegrationAppState>,
    Path(user_id): Path<String>,
    Json(request): Json<CreatePhaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let phase = state
        .orchestrator
        .create_phase(&UserId::new(user_id)?, &request.name, request.tasks)
        .await?;
    Ok((StatusCode::CREATED, Json(phase)))
}

/// PUT /functional/:user_id/phases/:phase
pub async fn update_phase(
    State(state): State<IntegrationAppState>,
    Path((user_id, phase)): Path<(String, String)>,
    Json(request): Json<UpdatePhaseRequest>,
) -> Result<Json<UpdatePhaseResponse>, ApiError> {
    let result = state
        .orchestrator
        .update_phase(&UserId::new(user_id)?, &phase, request.tasks)
        .await?;
    let response = match result {
        UpdatePhaseResult::Unchanged(phase) => UpdatePhaseResponse {
            updated: false,
            phase,
        },
        UpdatePhaseResult::Updated(phase) => UpdatePhaseResponse {
            updated: true,
            phase,
        },
    };
    Ok(Json(response))
}

/// POST /functional/:user_id/phases/:phase/request-payout
pub async fn request_payout(
    State(state): State<IntegrationAppState>,
    Path((user_id, phase)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let phase = state
        .orchestrator
        .request_payout(&UserId::new(user_id)?, &phase)
        .await?;
    Ok(Json(phase))
}

/// POST /functional/:user_id/phases/:phase/approve-payout
pub async fn approve_payout(
    State(state): State<IntegrationAppState>,
    Path((user_id, phase)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let phase = state
        .orchestrator
        .approve_payout(&UserId::new(user_id)?, &phase)
        .await?;
    Ok(Json(phase))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhook - acknowledged with `SUCCESS` once the signature checks out
pub async fn handle_webhook(
    State(state): State<IntegrationAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    state.webhooks.receive(&body, signature).await?;

    Ok((StatusCode::OK, "SUCCESS"))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts integration errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(IntegrationError);

impl From<IntegrationError> for ApiError {
    fn from(err: IntegrationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            IntegrationError::Validation { .. } => StatusCode::BAD_REQUEST,
            IntegrationError::NotFound { .. } => StatusCode::NOT_FOUND,
            IntegrationError::Signature(_) => StatusCode::UNAUTHORIZED,
            IntegrationError::ExternalApi { .. }
            | IntegrationError::Auth(_)
            | IntegrationError::Storage(_)
            | IntegrationError::BatchIncomplete { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, "Request rejected");
        }

        let code = self.0.code().to_string();
        let message = self.0.to_string();
        let body = match &self.0 {
            IntegrationError::BatchIncomplete {
                attempted,
                failures,
            } => ErrorResponse::with_details(
                code,
                message,
                json!({
                    "attempted": attempted,
                    "failures": failures
                        .iter()
                        .map(|f| json!({"phase": f.phase, "reason": f.reason}))
                        .collect::<Vec<_>>(),
                }),
            ),
            _ => ErrorResponse::new(code, message),
        };
        (status, Json(body)).into_response()
    }
}
