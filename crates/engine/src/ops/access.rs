use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, carts, orders, payment_types, users, wallets};

use super::Engine;

impl Engine {
    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    pub(super) async fn require_wallet(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
    ) -> ResultEngine<wallets::Model> {
        wallets::Entity::find_by_id(wallet_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::WalletNotFound(wallet_id.to_string()))
    }

    /// The wallet owned by `user_id` (exactly one per user).
    pub(super) async fn require_wallet_of_user(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<wallets::Model> {
        wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::WalletNotFound(user_id.to_string()))
    }

    pub(super) async fn require_payment_type(
        &self,
        db: &DatabaseTransaction,
        code: &str,
    ) -> ResultEngine<payment_types::Model> {
        payment_types::Entity::find_by_id(code.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::InvalidPaymentType(code.to_string()))
    }

    pub(super) async fn require_cart_of_user(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Option<carts::Model>> {
        carts::Entity::find()
            .filter(carts::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn require_order(
        &self,
        db: &DatabaseTransaction,
        order_id: Uuid,
    ) -> ResultEngine<orders::Model> {
        orders::Entity::find_by_id(order_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("order not exists".to_string()))
    }
}
