// HTTP handlers for the settlement endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::settlement::{
    CallbackRequest, CallbackResponse, CreateSettlementRequest, SettlementError,
    SettlementResponse, Transaction,
};

/// Handler for POST /api/reserve
/// Reserves capacity, prices the attempt and opens the payment leg
#[utoipa::path(
    post,
    path = "/api/reserve",
    request_body = CreateSettlementRequest,
    responses(
        (status = 201, description = "Settlement created", body = SettlementResponse),
        (status = 200, description = "Idempotent replay of an earlier request", body = SettlementResponse),
        (status = 400, description = "Unit inactive, insufficient coins or invalid input"),
        (status = 404, description = "Unit not found"),
        (status = 409, description = "Capacity exceeded"),
        (status = 502, description = "Payment intent creation failed")
    ),
    tag = "settlements"
)]
pub async fn create_settlement_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateSettlementRequest>,
) -> Result<(StatusCode, Json<SettlementResponse>), SettlementError> {
    request
        .validate()
        .map_err(|e| SettlementError::ValidationError(e.to_string()))?;

    let (transaction, replayed) = state.settlement.settle(request).await?;

    let status = if replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(transaction.into())))
}

/// Handler for POST /api/payment-callback
/// Verifies the provider's signature and commits the settlement
///
/// The provider retries on any non-2xx response, which is exactly what the
/// commit-failure path relies on.
#[utoipa::path(
    post,
    path = "/api/payment-callback",
    request_body = CallbackRequest,
    responses(
        (status = 200, description = "Settlement committed (or already settled)", body = CallbackResponse),
        (status = 400, description = "Signature verification failed"),
        (status = 409, description = "Transaction already in a terminal failure state"),
        (status = 500, description = "Commit could not land; provider should redeliver")
    ),
    tag = "settlements"
)]
pub async fn payment_callback_handler(
    State(state): State<crate::AppState>,
    Json(payload): Json<CallbackRequest>,
) -> Result<Json<CallbackResponse>, SettlementError> {
    payload
        .validate()
        .map_err(|_| SettlementError::VerificationFailed)?;

    let transaction = state.settlement.handle_callback(payload).await?;

    Ok(Json(CallbackResponse {
        transaction_id: transaction.id,
        status: transaction.status,
    }))
}

/// Handler for GET /api/transactions/:id
/// Returns the current transaction state for polling clients
#[utoipa::path(
    get,
    path = "/api/transactions/{id}",
    params(
        ("id" = Uuid, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Current transaction state", body = Transaction),
        (status = 404, description = "Transaction not found")
    ),
    tag = "settlements"
)]
pub async fn get_transaction_handler(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, SettlementError> {
    let transaction = state.settlement.get_transaction(id).await?;
    Ok(Json(transaction))
}
