// HTTP handler for the read-only wallet endpoint
//
// Balances are never written through HTTP; they change only as a side effect
// of settlement commits.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::wallet::{WalletError, WalletResponse};

/// Handler for GET /api/wallets/:user_id
/// Returns the user's current coin balance (zero if no wallet exists yet)
#[utoipa::path(
    get,
    path = "/api/wallets/{user_id}",
    params(
        ("user_id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Current coin balance", body = WalletResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "wallets"
)]
pub async fn get_wallet_handler(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<WalletResponse>, WalletError> {
    let balance = state
        .wallets
        .find(user_id)
        .await?
        .map(|w| w.balance)
        .unwrap_or(0);

    Ok(Json(WalletResponse { user_id, balance }))
}
