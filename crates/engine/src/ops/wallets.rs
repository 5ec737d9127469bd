use chrono::Utc;
use sea_orm::{ActiveModelTrait, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Wallet, wallets};

use super::{Engine, with_tx};

impl Engine {
    /// Return the wallet owned by `user_id`.
    pub async fn wallet(&self, user_id: &str) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let model = self.require_wallet_of_user(&db_tx, user_id).await?;
            Wallet::try_from(model)
        })
    }

    /// Return a wallet by id.
    ///
    /// Only the owner may read someone's wallet through this entry
    /// point; administrative callers go through [`Engine::wallet`] with
    /// the owner's id.
    pub async fn wallet_by_id(&self, wallet_id: Uuid, user_id: &str) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let model = self.require_wallet(&db_tx, wallet_id).await?;
            if model.user_id != user_id {
                return Err(EngineError::Forbidden(
                    "wallet belongs to another user".to_string(),
                ));
            }
            Wallet::try_from(model)
        })
    }

    /// Create the wallet for `user_id` at registration time.
    ///
    /// Fails with [`EngineError::ExistingKey`] when the user already has
    /// one; wallets live for the account lifetime.
    pub async fn new_wallet(&self, user_id: &str) -> ResultEngine<Wallet> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            if self.require_wallet_of_user(&db_tx, user_id).await.is_ok() {
                return Err(EngineError::ExistingKey(user_id.to_string()));
            }

            let wallet = Wallet::new(user_id.to_string(), now);
            wallets::ActiveModel::from(&wallet).insert(&db_tx).await?;
            Ok(wallet)
        })
    }

    /// Return the user's wallet, creating it if absent. Used at startup
    /// to bootstrap the system wallet.
    pub async fn ensure_wallet(&self, user_id: &str) -> ResultEngine<Wallet> {
        match self.wallet(user_id).await {
            Ok(wallet) => Ok(wallet),
            Err(EngineError::WalletNotFound(_)) => self.new_wallet(user_id).await,
            Err(err) => Err(err),
        }
    }
}
