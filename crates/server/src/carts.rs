//! Cart API endpoints.

use api_types::cart::{CartItemNew, CartItemUpdate, CartItemView, CartView};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::{AddCartItemCmd, Cart, CartItem, Grams, Money, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn view(cart: &Cart, items: &[CartItem]) -> CartView {
    CartView {
        id: cart.id,
        total_amount_minor: cart.totals.amount.minor(),
        total_items: cart.totals.items,
        total_becoin_minor: cart.totals.becoin.minor(),
        total_weight_grams: cart.totals.weight.grams(),
        total_weight_recycled_grams: cart.totals.weight_recycled.grams(),
        items: items
            .iter()
            .map(|item| CartItemView {
                id: item.id,
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price_minor: item.unit_price.minor(),
                unit_becoin_minor: item.unit_becoin.minor(),
                unit_weight_grams: item.unit_weight.grams(),
                recycled: item.recycled,
            })
            .collect(),
    }
}

async fn full_view(state: &ServerState, user_id: &str) -> Result<CartView, ServerError> {
    let (cart, items) = state.engine.cart(user_id).await?;
    Ok(view(&cart, &items))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<CartView>, ServerError> {
    Ok(Json(full_view(&state, &user.username).await?))
}

pub async fn add_item(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CartItemNew>,
) -> Result<Json<CartView>, ServerError> {
    let cmd = AddCartItemCmd::new(user.username.clone(), payload.name, payload.quantity)
        .unit_price(Money::new(payload.unit_price_minor))
        .unit_becoin(Money::new(payload.unit_becoin_minor))
        .unit_weight(Grams::new(payload.unit_weight_grams))
        .recycled(payload.recycled.unwrap_or(false));

    state.engine.add_cart_item(cmd).await?;
    Ok(Json(full_view(&state, &user.username).await?))
}

pub async fn update_item(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<CartItemUpdate>,
) -> Result<Json<CartView>, ServerError> {
    state
        .engine
        .update_cart_item_quantity(&user.username, item_id, payload.quantity)
        .await?;
    Ok(Json(full_view(&state, &user.username).await?))
}

pub async fn remove_item(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<CartView>, ServerError> {
    state.engine.remove_cart_item(&user.username, item_id).await?;
    Ok(Json(full_view(&state, &user.username).await?))
}

pub async fn clear(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<CartView>, ServerError> {
    state.engine.clear_cart(&user.username).await?;
    Ok(Json(full_view(&state, &user.username).await?))
}
