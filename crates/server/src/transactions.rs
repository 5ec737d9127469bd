//! Transaction listing endpoint.

use api_types::transaction::{TransactionList, TransactionListResponse, TransactionView};
use axum::{Extension, Json, extract::State};
use chrono::FixedOffset;
use engine::{TransactionListFilter, users};

use crate::{ServerError, server::ServerState};

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let wallet = state.engine.wallet(&user.username).await?;
    let limit = payload.limit.unwrap_or(50);

    let filter = TransactionListFilter {
        type_codes: payload.type_codes,
        state_codes: payload.state_codes,
        from: None,
        to: None,
    };

    let (txs, next_cursor) = state
        .engine
        .list_transactions(
            wallet.id,
            &user.username,
            limit,
            payload.cursor.as_deref(),
            &filter,
        )
        .await?;

    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    let transactions = txs
        .into_iter()
        .map(|tx| TransactionView {
            id: tx.id,
            type_code: tx.type_code,
            state_code: tx.state_code,
            balance: tx.balance.as_str().to_string(),
            direction: tx.direction.as_str().to_string(),
            amount_minor: tx.amount.minor(),
            related_wallet_id: tx.related_wallet_id,
            order_id: tx.order_id,
            note: tx.note,
            created_at: tx.created_at.with_timezone(&utc),
        })
        .collect();

    Ok(Json(TransactionListResponse {
        transactions,
        next_cursor,
    }))
}
