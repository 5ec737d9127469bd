//! Coupon endpoints.

use api_types::coupon::{CouponRedeem, CouponValidate, CouponValidateResponse};
use axum::{Extension, Json, extract::State};
use engine::{Money, users};

use crate::{
    ServerError, server::ServerState,
    types::wallet::WalletView,
};

pub async fn validate(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CouponValidate>,
) -> Result<Json<CouponValidateResponse>, ServerError> {
    let discount = state
        .engine
        .validate_coupon(
            &payload.code,
            &user.username,
            Money::new(payload.purchase_total_minor),
        )
        .await?;
    Ok(Json(CouponValidateResponse {
        discount_minor: discount.minor(),
    }))
}

pub async fn redeem(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CouponRedeem>,
) -> Result<Json<WalletView>, ServerError> {
    let wallet = state
        .engine
        .redeem_bonus_coupon(&payload.code, &user.username)
        .await?;
    Ok(Json(WalletView {
        id: wallet.id,
        becoin_minor: wallet.becoin.minor(),
        becoin_green_minor: wallet.becoin_green.minor(),
    }))
}
