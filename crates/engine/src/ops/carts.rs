//! Cart operations.
//!
//! Every item mutation reloads the full item set and recomputes all
//! cart totals through [`CartTotals::from_items`] before persisting
//! them, inside the same DB transaction as the item write. The stored
//! totals are therefore always the aggregate of the current items; no
//! incremental patching, no schema-level triggers.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, DatabaseTransaction, ModelTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    AddCartItemCmd, Cart, CartItem, CartTotals, EngineError, ResultEngine, cart_items, carts,
};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    pub(super) async fn load_cart_items(
        &self,
        db_tx: &DatabaseTransaction,
        cart_id: Uuid,
    ) -> ResultEngine<Vec<CartItem>> {
        let models = cart_items::Entity::find()
            .filter(cart_items::Column::CartId.eq(cart_id.to_string()))
            .order_by_asc(cart_items::Column::Id)
            .all(db_tx)
            .await?;

        let mut items = Vec::with_capacity(models.len());
        for model in models {
            items.push(CartItem::try_from(model)?);
        }
        Ok(items)
    }

    pub(super) async fn fetch_or_create_cart(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Cart> {
        if let Some(model) = self.require_cart_of_user(db_tx, user_id).await? {
            return Cart::try_from(model);
        }

        self.require_user(db_tx, user_id).await?;
        let cart = Cart::new(user_id.to_string(), now);
        carts::ActiveModel::from(&cart).insert(db_tx).await?;
        Ok(cart)
    }

    /// Recomputes and persists the cart aggregates from `items`.
    pub(super) async fn persist_cart_totals(
        &self,
        db_tx: &DatabaseTransaction,
        cart_id: Uuid,
        items: &[CartItem],
        now: DateTime<Utc>,
    ) -> ResultEngine<CartTotals> {
        let totals = CartTotals::from_items(items)?;
        let model = carts::ActiveModel {
            id: ActiveValue::Set(cart_id.to_string()),
            total_amount: ActiveValue::Set(totals.amount.minor()),
            total_items: ActiveValue::Set(totals.items),
            total_becoin: ActiveValue::Set(totals.becoin.minor()),
            total_weight: ActiveValue::Set(totals.weight.grams()),
            total_weight_recycled: ActiveValue::Set(totals.weight_recycled.grams()),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        model.update(db_tx).await?;
        Ok(totals)
    }

    /// Return the user's active cart, creating an empty one on first
    /// access.
    pub async fn cart(&self, user_id: &str) -> ResultEngine<(Cart, Vec<CartItem>)> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let cart = self.fetch_or_create_cart(&db_tx, user_id, now).await?;
            let items = self.load_cart_items(&db_tx, cart.id).await?;
            Ok((cart, items))
        })
    }

    /// Add a line item to the user's cart and recompute its totals.
    pub async fn add_cart_item(&self, cmd: AddCartItemCmd) -> ResultEngine<(Cart, CartItem)> {
        let now = Utc::now();
        let name = normalize_required_name(&cmd.name, "item")?;

        with_tx!(self, |db_tx| {
            let mut cart = self.fetch_or_create_cart(&db_tx, &cmd.user_id, now).await?;

            let item = CartItem::new(
                cart.id,
                name.clone(),
                cmd.quantity,
                cmd.unit_price,
                cmd.unit_becoin,
                cmd.unit_weight,
                cmd.recycled,
            )?;
            cart_items::ActiveModel::from(&item).insert(&db_tx).await?;

            let items = self.load_cart_items(&db_tx, cart.id).await?;
            cart.totals = self
                .persist_cart_totals(&db_tx, cart.id, &items, now)
                .await?;
            cart.updated_at = now;
            Ok((cart, item))
        })
    }

    /// Change a line item's quantity and recompute the cart totals.
    pub async fn update_cart_item_quantity(
        &self,
        user_id: &str,
        item_id: Uuid,
        quantity: i64,
    ) -> ResultEngine<Cart> {
        if quantity <= 0 {
            return Err(EngineError::InvalidAmount(
                "quantity must be > 0".to_string(),
            ));
        }
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let mut cart = self.fetch_or_create_cart(&db_tx, user_id, now).await?;
            let item = self.require_cart_item(&db_tx, cart.id, item_id).await?;

            let active = cart_items::ActiveModel {
                id: ActiveValue::Set(item.id.clone()),
                quantity: ActiveValue::Set(quantity),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            let items = self.load_cart_items(&db_tx, cart.id).await?;
            cart.totals = self
                .persist_cart_totals(&db_tx, cart.id, &items, now)
                .await?;
            cart.updated_at = now;
            Ok(cart)
        })
    }

    /// Remove a line item and recompute the cart totals.
    pub async fn remove_cart_item(&self, user_id: &str, item_id: Uuid) -> ResultEngine<Cart> {
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let mut cart = self.fetch_or_create_cart(&db_tx, user_id, now).await?;
            let item = self.require_cart_item(&db_tx, cart.id, item_id).await?;

            item.delete(&db_tx).await?;

            let items = self.load_cart_items(&db_tx, cart.id).await?;
            cart.totals = self
                .persist_cart_totals(&db_tx, cart.id, &items, now)
                .await?;
            cart.updated_at = now;
            Ok(cart)
        })
    }

    /// Empty the cart: delete its items and reset the totals to zero.
    ///
    /// The cart row itself survives (carts are cleared, never deleted).
    pub async fn clear_cart(&self, user_id: &str) -> ResultEngine<Cart> {
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let mut cart = self.fetch_or_create_cart(&db_tx, user_id, now).await?;
            self.clear_cart_in_tx(&db_tx, cart.id, now).await?;
            cart.totals = CartTotals::default();
            cart.updated_at = now;
            Ok(cart)
        })
    }

    pub(super) async fn clear_cart_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        cart_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        cart_items::Entity::delete_many()
            .filter(cart_items::Column::CartId.eq(cart_id.to_string()))
            .exec(db_tx)
            .await?;
        self.persist_cart_totals(db_tx, cart_id, &[], now).await?;
        Ok(())
    }

    async fn require_cart_item(
        &self,
        db_tx: &DatabaseTransaction,
        cart_id: Uuid,
        item_id: Uuid,
    ) -> ResultEngine<cart_items::Model> {
        cart_items::Entity::find_by_id(item_id.to_string())
            .filter(cart_items::Column::CartId.eq(cart_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("cart item not exists".to_string()))
    }
}
