//! Administrative becoin supply endpoint.
//!
//! The finance capability is resolved here, before the engine is
//! reached: only users with the admin role may mint or destroy supply.

use api_types::admin::{BecoinSupplyOp, BecoinSupplyResponse};
use axum::{Extension, Json, extract::State};
use engine::{AdminMintCmd, AdminOperation, EngineError, Money, users};

use crate::{ServerError, server::ServerState};

pub async fn becoin_supply(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BecoinSupplyOp>,
) -> Result<Json<BecoinSupplyResponse>, ServerError> {
    if user.role_name != users::ROLE_ADMIN {
        return Err(EngineError::Forbidden(
            "finance permission required".to_string(),
        )
        .into());
    }
    if payload.amount_minor <= 0 {
        return Err(ServerError::Generic(
            "amount_minor must be > 0".to_string(),
        ));
    }

    let operation = AdminOperation::try_from(payload.operation.as_str())?;
    let mut cmd = AdminMintCmd::new(
        operation,
        Money::new(payload.amount_minor),
        user.username.clone(),
    );
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }

    let (wallet, record) = state.engine.admin_mint(cmd).await?;
    Ok(Json(BecoinSupplyResponse {
        transaction_id: record.transaction_id,
        system_becoin_minor: wallet.becoin.minor(),
    }))
}
