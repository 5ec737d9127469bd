//! Wallet API endpoints.

use api_types::wallet::{RechargeNew, TransferNew, WalletView, WithdrawNew};
use axum::{Extension, Json, extract::State};
use engine::{CreditCmd, DebitCmd, Money, TransferCmd, Wallet, users};

use crate::{ServerError, server::ServerState};

fn view(wallet: &Wallet) -> WalletView {
    WalletView {
        id: wallet.id,
        becoin_minor: wallet.becoin.minor(),
        becoin_green_minor: wallet.becoin_green.minor(),
    }
}

fn positive_amount(amount_minor: i64) -> Result<Money, ServerError> {
    if amount_minor <= 0 {
        return Err(ServerError::Generic(
            "amount_minor must be > 0".to_string(),
        ));
    }
    Ok(Money::new(amount_minor))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<WalletView>, ServerError> {
    let wallet = state.engine.wallet(&user.username).await?;
    Ok(Json(view(&wallet)))
}

pub async fn recharge(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<RechargeNew>,
) -> Result<Json<WalletView>, ServerError> {
    let amount = positive_amount(payload.amount_minor)?;
    let wallet = state.engine.wallet(&user.username).await?;

    let mut cmd = CreditCmd::new(wallet.id, amount, user.username.clone());
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }
    let (wallet, _) = state.engine.credit(cmd).await?;
    Ok(Json(view(&wallet)))
}

pub async fn withdraw(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<WithdrawNew>,
) -> Result<Json<WalletView>, ServerError> {
    let amount = positive_amount(payload.amount_minor)?;
    let wallet = state.engine.wallet(&user.username).await?;

    let mut cmd = DebitCmd::new(wallet.id, amount, user.username.clone());
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }
    let (wallet, _) = state.engine.debit(cmd).await?;
    Ok(Json(view(&wallet)))
}

pub async fn transfer(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<Json<WalletView>, ServerError> {
    let amount = positive_amount(payload.amount_minor)?;
    let wallet = state.engine.wallet(&user.username).await?;

    let mut cmd = TransferCmd::new(
        wallet.id,
        payload.to_wallet_id,
        amount,
        user.username.clone(),
    );
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }
    let (from_wallet, _) = state.engine.transfer(cmd).await?;
    Ok(Json(view(&from_wallet)))
}
