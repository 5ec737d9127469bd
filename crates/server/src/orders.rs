//! Checkout, order and payment-result endpoints.

use api_types::order::{
    CheckoutNew, OrderItemView, OrderListResponse, OrderView, PaymentResult,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::FixedOffset;
use engine::{CheckoutCmd, Order, OrderItem, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn view(order: &Order, items: Option<&[OrderItem]>) -> Result<OrderView, ServerError> {
    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;

    Ok(OrderView {
        id: order.id,
        code: order.code.clone(),
        payment_type_code: order.payment_type_code.clone(),
        status_code: order.status_code.clone(),
        total_amount_minor: order.totals.amount.minor(),
        total_items: order.totals.items,
        total_becoin_minor: order.totals.becoin.minor(),
        total_weight_grams: order.totals.weight.grams(),
        total_weight_recycled_grams: order.totals.weight_recycled.grams(),
        discount_minor: order.discount.minor(),
        observation: order.observation.clone(),
        created_at: order.created_at.with_timezone(&utc),
        items: items.map(|items| {
            items
                .iter()
                .map(|item| OrderItemView {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price_minor: item.unit_price.minor(),
                    unit_becoin_minor: item.unit_becoin.minor(),
                    unit_weight_grams: item.unit_weight.grams(),
                    recycled: item.recycled,
                })
                .collect()
        }),
    })
}

pub async fn checkout(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CheckoutNew>,
) -> Result<Json<OrderView>, ServerError> {
    let mut cmd = CheckoutCmd::new(user.username.clone(), payload.payment_type_code);
    if let Some(code) = payload.coupon_code {
        cmd = cmd.coupon_code(code);
    }
    if let Some(observation) = payload.observation {
        cmd = cmd.observation(observation);
    }

    let order = state.engine.checkout(cmd).await?;
    Ok(Json(view(&order, None)?))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderView>, ServerError> {
    let (order, items) = state.engine.order(order_id, &user.username).await?;
    Ok(Json(view(&order, Some(&items))?))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<OrderListResponse>, ServerError> {
    let orders = state.engine.list_orders(&user.username).await?;
    let mut out = Vec::with_capacity(orders.len());
    for order in &orders {
        out.push(view(order, None)?);
    }
    Ok(Json(OrderListResponse { orders: out }))
}

/// Payment-gateway callback. The gateway collaborator is authenticated
/// like any other caller; the ledger core trusts the result it reports.
pub async fn payment_result(
    Extension(_user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<PaymentResult>,
) -> Result<Json<OrderView>, ServerError> {
    let order = state
        .engine
        .record_payment_result(
            payload.order_id,
            payload.succeeded,
            payload.external_reference.as_deref(),
        )
        .await?;
    Ok(Json(view(&order, None)?))
}
