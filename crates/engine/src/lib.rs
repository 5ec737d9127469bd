//! Ledger core: wallets, transactions, settlement, coupons and the
//! balance-change notification contract.
//!
//! The [`Engine`] is the only writer of wallet balances. Every mutation
//! runs inside one DB transaction, serialized per wallet by an
//! optimistic compare-and-swap on the wallet row, and pairs the balance
//! write with an immutable transaction record.

pub use admin_becoins::{AdminBecoin, AdminOperation};
pub use carts::{Cart, CartTotals};
pub use cart_items::CartItem;
pub use commands::{
    AddCartItemCmd, AdminMintCmd, CheckoutCmd, CreditCmd, DebitCmd, TransferCmd,
};
pub use coupon_usages::CouponUsage;
pub use coupons::{Coupon, CouponKind, CouponValueKind};
pub use error::EngineError;
pub use money::{Grams, Money};
pub use notify::{BalanceChange, BalanceNotifier, BroadcastNotifier, NoopNotifier};
pub use ops::{Engine, EngineBuilder, RetryPolicy, TransactionListFilter};
pub use orders::Order;
pub use order_items::OrderItem;
pub use registry::{Registry, codes, states};
pub use transactions::{Direction, Transaction};
pub use wallets::{BalanceKind, Wallet};

pub mod admin_becoins;
pub mod cart_items;
pub mod carts;
mod commands;
pub mod coupon_usages;
pub mod coupons;
pub mod delivery_statuses;
mod error;
mod money;
mod notify;
mod ops;
pub mod order_items;
pub mod orders;
pub mod payment_types;
mod registry;
pub mod transaction_states;
pub mod transaction_types;
pub mod transactions;
pub mod users;
pub mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
