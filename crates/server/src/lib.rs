use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod admin;
mod carts;
mod coupons;
mod orders;
mod server;
mod transactions;
mod wallets;

pub mod types {
    pub mod wallet {
        pub use api_types::wallet::{RechargeNew, TransferNew, WalletView, WithdrawNew};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            TransactionList, TransactionListResponse, TransactionView,
        };
    }

    pub mod cart {
        pub use api_types::cart::{CartItemNew, CartItemUpdate, CartItemView, CartView};
    }

    pub mod order {
        pub use api_types::order::{
            CheckoutNew, OrderItemView, OrderListResponse, OrderView, PaymentResult,
        };
    }

    pub mod coupon {
        pub use api_types::coupon::{CouponRedeem, CouponValidate, CouponValidateResponse};
    }

    pub mod admin {
        pub use api_types::admin::{BecoinSupplyOp, BecoinSupplyResponse};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::WalletNotFound(_) | EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::ConcurrentModificationRetryExhausted(_) => {
            StatusCode::CONFLICT
        }
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InsufficientFunds(_)
        | EngineError::CouponExpired(_)
        | EngineError::CouponInactive(_)
        | EngineError::MinSpendNotMet(_)
        | EngineError::UsageLimitExceeded(_)
        | EngineError::CartEmpty
        | EngineError::InvalidPaymentType(_)
        | EngineError::TransactionTypeUnknown(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_forbidden_maps_to_403() {
        let res =
            ServerError::from(EngineError::Forbidden("forbidden".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn wallet_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::WalletNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn retry_exhausted_maps_to_409() {
        let res = ServerError::from(EngineError::ConcurrentModificationRetryExhausted(
            "debit".to_string(),
        ))
        .into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn insufficient_funds_maps_to_422() {
        let res =
            ServerError::from(EngineError::InsufficientFunds("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn cart_empty_maps_to_422() {
        let res = ServerError::from(EngineError::CartEmpty).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
