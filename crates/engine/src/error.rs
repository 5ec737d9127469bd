//! The module contains the error the engine can throw.
//!
//! Validation failures (insufficient funds, coupon checks, empty carts)
//! are recoverable and carry a specific reason for the caller; only
//! [`Database`] wraps infrastructure failures.
//!
//! [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),
    #[error("Concurrent modification, retries exhausted: {0}")]
    ConcurrentModificationRetryExhausted(String),
    #[error("Coupon expired: {0}")]
    CouponExpired(String),
    #[error("Coupon inactive: {0}")]
    CouponInactive(String),
    #[error("Minimum spend not met: {0}")]
    MinSpendNotMet(String),
    #[error("Coupon usage limit exceeded: {0}")]
    UsageLimitExceeded(String),
    #[error("Cart is empty")]
    CartEmpty,
    #[error("Invalid payment type: {0}")]
    InvalidPaymentType(String),
    #[error("Unknown transaction type: {0}")]
    TransactionTypeUnknown(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::WalletNotFound(a), Self::WalletNotFound(b)) => a == b,
            (
                Self::ConcurrentModificationRetryExhausted(a),
                Self::ConcurrentModificationRetryExhausted(b),
            ) => a == b,
            (Self::CouponExpired(a), Self::CouponExpired(b)) => a == b,
            (Self::CouponInactive(a), Self::CouponInactive(b)) => a == b,
            (Self::MinSpendNotMet(a), Self::MinSpendNotMet(b)) => a == b,
            (Self::UsageLimitExceeded(a), Self::UsageLimitExceeded(b)) => a == b,
            (Self::CartEmpty, Self::CartEmpty) => true,
            (Self::InvalidPaymentType(a), Self::InvalidPaymentType(b)) => a == b,
            (Self::TransactionTypeUnknown(a), Self::TransactionTypeUnknown(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
