//! Order/cart settlement.
//!
//! `checkout` converts the user's cart into an immutable order and
//! drives the ledger mutation, all inside one unit of work: item
//! snapshot, order insert, wallet debit (for becoin payment types),
//! coupon usage and cart clear either all commit together or none do.
//! A failed debit leaves the cart intact and persists no order.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    BalanceChange, BalanceKind, CartTotals, CheckoutCmd, CouponKind, CouponUsage, Direction,
    EngineError, Money, Order, OrderItem, ResultEngine, Transaction, coupon_usages,
    delivery_statuses, order_items, orders, registry::codes, registry::states, transactions,
};

use super::{Attempt, Engine, normalize_coupon_code, with_tx};

impl Engine {
    /// Settle the user's cart into an order.
    ///
    /// Becoin payment types debit the wallet immediately and record a
    /// `COMPLETED` `PURCHASE` transaction; external payment types record
    /// a `PENDING` one (no balance movement) and park the order in
    /// `AWAITING_PAYMENT` until [`Engine::record_payment_result`].
    pub async fn checkout(&self, cmd: CheckoutCmd) -> ResultEngine<Order> {
        self.registry().require_type(codes::PURCHASE)?;
        let now = Utc::now();
        let coupon_code = cmd
            .coupon_code
            .as_deref()
            .map(normalize_coupon_code)
            .transpose()?;

        let (order, notification) = self
            .retry_on_conflict("checkout", |db_tx| {
                let cmd = &cmd;
                let coupon_code = &coupon_code;
                Box::pin(async move {
                    let wallet_model = self.require_wallet_of_user(db_tx, &cmd.user_id).await?;
                    let wallet_id = Uuid::parse_str(&wallet_model.id)
                        .map_err(|_| EngineError::WalletNotFound(wallet_model.id.clone()))?;

                    let cart_model = self
                        .require_cart_of_user(db_tx, &cmd.user_id)
                        .await?
                        .ok_or(EngineError::CartEmpty)?;
                    let cart_id = Uuid::parse_str(&cart_model.id)
                        .map_err(|_| EngineError::KeyNotFound("cart not exists".to_string()))?;
                    let items = self.load_cart_items(db_tx, cart_id).await?;
                    if items.is_empty() {
                        return Err(EngineError::CartEmpty);
                    }

                    // Totals are recomputed from the items, never read
                    // back from the cart row.
                    let totals = CartTotals::from_items(&items)?;
                    let payment = self
                        .require_payment_type(db_tx, &cmd.payment_type_code)
                        .await?;
                    let charged_base = if payment.is_becoin {
                        totals.becoin
                    } else {
                        totals.amount
                    };

                    let (coupon, discount) = match coupon_code {
                        Some(code) => {
                            let coupon = self.coupon_by_code(db_tx, code).await?;
                            if coupon.kind != CouponKind::Discount {
                                return Err(EngineError::InvalidState(
                                    "coupon does not discount purchases".to_string(),
                                ));
                            }
                            self.check_coupon(db_tx, &coupon, &cmd.user_id, charged_base, now)
                                .await?;
                            let discount = coupon.discount_for(charged_base);
                            (Some(coupon), discount)
                        }
                        None => (None, Money::ZERO),
                    };
                    let charged = charged_base - discount;

                    let sequence = orders::Entity::find().count(db_tx).await? as i64 + 1;
                    let status_code = if payment.is_becoin {
                        delivery_statuses::PREPARING
                    } else {
                        delivery_statuses::AWAITING_PAYMENT
                    };
                    let order = Order {
                        id: Uuid::new_v4(),
                        code: Order::format_code(sequence),
                        user_id: cmd.user_id.clone(),
                        wallet_id,
                        payment_type_code: payment.code.clone(),
                        status_code: status_code.to_string(),
                        coupon_id: coupon.as_ref().map(|c| c.id),
                        totals,
                        discount,
                        observation: cmd.observation.clone(),
                        created_at: now,
                    };

                    if let Err(err) = orders::ActiveModel::from(&order).insert(db_tx).await {
                        // A concurrent checkout may have taken our
                        // sequential code; the unique index turns that
                        // into an insert failure we retry like any
                        // stale-wallet write.
                        let taken = orders::Entity::find()
                            .filter(orders::Column::Code.eq(order.code.clone()))
                            .one(db_tx)
                            .await?
                            .is_some();
                        if taken {
                            return Ok(Attempt::Conflict);
                        }
                        return Err(err.into());
                    }

                    for item in &items {
                        let frozen = OrderItem::freeze(order.id, item);
                        order_items::ActiveModel::from(&frozen).insert(db_tx).await?;
                    }

                    let mut notification = None;
                    if payment.is_becoin {
                        if charged.is_positive() {
                            let (new_becoin, new_green) = match self
                                .apply_delta_in_tx(
                                    db_tx,
                                    &wallet_model,
                                    BalanceKind::Becoin,
                                    Direction::Debit,
                                    charged,
                                )
                                .await?
                            {
                                Attempt::Done(balances) => balances,
                                Attempt::Conflict => return Ok(Attempt::Conflict),
                            };

                            let mut tx = Transaction::new(
                                wallet_id,
                                codes::PURCHASE.to_string(),
                                states::COMPLETED.to_string(),
                                BalanceKind::Becoin,
                                Direction::Debit,
                                charged,
                                cmd.user_id.clone(),
                                now,
                            )?;
                            tx.order_id = Some(order.id);
                            tx.note = Some(format!("order {}", order.code));
                            self.insert_transaction(db_tx, &tx).await?;

                            notification = Some((
                                wallet_model.user_id.clone(),
                                BalanceChange {
                                    wallet_id,
                                    becoin_minor: new_becoin.minor(),
                                    becoin_green_minor: new_green.minor(),
                                    message: format!("PURCHASE: -{charged} becoin ({})", order.code),
                                    success: true,
                                    cleared_transaction_id: None,
                                },
                            ));
                        }
                    } else if charged.is_positive() {
                        // Audit row for the awaited external payment.
                        let mut tx = Transaction::new(
                            wallet_id,
                            codes::PURCHASE.to_string(),
                            states::PENDING.to_string(),
                            BalanceKind::Becoin,
                            Direction::Debit,
                            charged,
                            cmd.user_id.clone(),
                            now,
                        )?;
                        tx.order_id = Some(order.id);
                        tx.note = Some(format!("awaiting {} payment for order {}", payment.code, order.code));
                        self.insert_transaction(db_tx, &tx).await?;
                    }

                    if let Some(coupon) = &coupon {
                        let mut usage = CouponUsage::new(
                            coupon.id,
                            cmd.user_id.clone(),
                            charged_base,
                            discount,
                            now,
                        );
                        usage.order_id = Some(order.id);
                        coupon_usages::ActiveModel::from(&usage).insert(db_tx).await?;
                    }

                    self.clear_cart_in_tx(db_tx, cart_id, now).await?;

                    Ok::<_, EngineError>(Attempt::Done((order, notification)))
                })
            })
            .await?;

        if let Some((user_id, change)) = notification {
            self.notify(&user_id, change);
        }
        Ok(order)
    }

    /// Finalize the pending payment of an order based on the external
    /// gateway's result.
    ///
    /// The pending `PURCHASE` transaction transitions to `COMPLETED` or
    /// `FAILED` (terminal states never transition again) and the order
    /// moves to `PREPARING` or `CANCELLED` accordingly.
    pub async fn record_payment_result(
        &self,
        order_id: Uuid,
        succeeded: bool,
        external_reference: Option<&str>,
    ) -> ResultEngine<Order> {
        let (order, user_id, change) = with_tx!(self, |db_tx| {
            let order_model = self.require_order(&db_tx, order_id).await?;

            let pending = transactions::Entity::find()
                .filter(transactions::Column::OrderId.eq(order_id.to_string()))
                .filter(transactions::Column::StateCode.eq(states::PENDING))
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::InvalidState("order has no pending payment".to_string())
                })?;

            let new_state = if succeeded {
                states::COMPLETED
            } else {
                states::FAILED
            };
            self.registry().require_state(new_state)?;

            let tx_active = transactions::ActiveModel {
                id: ActiveValue::Set(pending.id.clone()),
                state_code: ActiveValue::Set(new_state.to_string()),
                ..Default::default()
            };
            tx_active.update(&db_tx).await?;

            let new_status = if succeeded {
                delivery_statuses::PREPARING
            } else {
                delivery_statuses::CANCELLED
            };
            let observation = match (order_model.observation.clone(), external_reference) {
                (Some(obs), Some(reference)) => Some(format!("{obs}; payment ref {reference}")),
                (None, Some(reference)) => Some(format!("payment ref {reference}")),
                (obs, None) => obs,
            };
            let order_active = orders::ActiveModel {
                id: ActiveValue::Set(order_model.id.clone()),
                status_code: ActiveValue::Set(new_status.to_string()),
                observation: ActiveValue::Set(observation.clone()),
                ..Default::default()
            };
            order_active.update(&db_tx).await?;

            let wallet_model = self
                .require_wallet(
                    &db_tx,
                    Uuid::parse_str(&order_model.wallet_id)
                        .map_err(|_| EngineError::WalletNotFound(order_model.wallet_id.clone()))?,
                )
                .await?;

            let mut order = Order::try_from(order_model)?;
            order.status_code = new_status.to_string();
            order.observation = observation;

            let change = BalanceChange {
                wallet_id: order.wallet_id,
                becoin_minor: wallet_model.becoin,
                becoin_green_minor: wallet_model.becoin_green,
                message: if succeeded {
                    format!("payment confirmed for order {}", order.code)
                } else {
                    format!("payment failed for order {}", order.code)
                },
                success: succeeded,
                cleared_transaction_id: Uuid::parse_str(&pending.id).ok(),
            };
            Ok::<_, EngineError>((order, wallet_model.user_id, change))
        })?;

        self.notify(&user_id, change);
        Ok(order)
    }

    /// Return an order with its frozen items. Owner only.
    pub async fn order(
        &self,
        order_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<(Order, Vec<OrderItem>)> {
        with_tx!(self, |db_tx| {
            let model = self.require_order(&db_tx, order_id).await?;
            if model.user_id != user_id {
                return Err(EngineError::KeyNotFound("order not exists".to_string()));
            }

            let item_models = order_items::Entity::find()
                .filter(order_items::Column::OrderId.eq(order_id.to_string()))
                .all(&db_tx)
                .await?;
            let mut items = Vec::with_capacity(item_models.len());
            for item_model in item_models {
                items.push(OrderItem::try_from(item_model)?);
            }

            Ok((Order::try_from(model)?, items))
        })
    }

    /// Return the user's orders, newest first.
    pub async fn list_orders(&self, user_id: &str) -> ResultEngine<Vec<Order>> {
        with_tx!(self, |db_tx| {
            let models = orders::Entity::find()
                .filter(orders::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(orders::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(Order::try_from(model)?);
            }
            Ok(out)
        })
    }

}
