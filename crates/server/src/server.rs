use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{admin, carts, coupons, orders, transactions, wallets};
use engine::{Engine, users};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(auth_header) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<users::Model> = users::Entity::find()
        .filter(users::Column::Username.eq(auth_header.username()))
        .filter(users::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/wallet", get(wallets::get))
        .route("/recharge", post(wallets::recharge))
        .route("/withdraw", post(wallets::withdraw))
        .route("/transfer", post(wallets::transfer))
        .route("/transactions", get(transactions::list))
        .route("/cart", get(carts::get))
        .route("/cart/clear", post(carts::clear))
        .route("/cart/items", post(carts::add_item))
        .route(
            "/cart/items/{id}",
            axum::routing::patch(carts::update_item).delete(carts::remove_item),
        )
        .route("/checkout", post(orders::checkout))
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::get))
        .route("/payments/result", post(orders::payment_result))
        .route("/coupons/validate", post(coupons::validate))
        .route("/coupons/redeem", post(coupons::redeem))
        .route("/admin/becoin", post(admin::becoin_supply))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ActiveValue, Database};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();

        for (username, role) in [("alice", "member"), ("root", "admin")] {
            let user = users::ActiveModel {
                username: ActiveValue::Set(username.to_string()),
                password: ActiveValue::Set("password".to_string()),
                role_name: ActiveValue::Set(role.to_string()),
            };
            users::Entity::insert(user).exec(&db).await.unwrap();
        }

        let bootstrap = Engine::builder().database(db.clone()).build().await.unwrap();
        bootstrap.new_wallet("alice").await.unwrap();
        let system_wallet = bootstrap.ensure_wallet("root").await.unwrap();

        let engine = Engine::builder()
            .database(db.clone())
            .system_wallet(system_wallet.id)
            .build()
            .await
            .unwrap();

        router(ServerState {
            engine: Arc::new(engine),
            db,
        })
    }

    fn basic_auth(username: &str) -> String {
        format!("Basic {}", BASE64.encode(format!("{username}:password")))
    }

    fn request(method: &str, uri: &str, username: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, basic_auth(username))
            .header(header::CONTENT_TYPE, "application/json");
        match body {
            Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_credentials_are_unauthorized() {
        let router = test_router().await;

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/wallet")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn recharge_and_withdraw_round_trip() {
        let router = test_router().await;

        let response = router
            .clone()
            .oneshot(request(
                "POST",
                "/recharge",
                "alice",
                Some(r#"{"amount_minor": 1000, "note": null}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["becoin_minor"], 1000);

        let response = router
            .clone()
            .oneshot(request(
                "POST",
                "/withdraw",
                "alice",
                Some(r#"{"amount_minor": 400, "note": null}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["becoin_minor"], 600);
    }

    #[tokio::test]
    async fn overdraft_is_unprocessable() {
        let router = test_router().await;

        let response = router
            .oneshot(request(
                "POST",
                "/withdraw",
                "alice",
                Some(r#"{"amount_minor": 1, "note": null}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn supply_operations_require_admin_role() {
        let router = test_router().await;
        let body = r#"{"operation": "CREATE", "amount_minor": 1000, "note": null}"#;

        let response = router
            .clone()
            .oneshot(request("POST", "/admin/becoin", "alice", Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = router
            .oneshot(request("POST", "/admin/becoin", "root", Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["system_becoin_minor"], 1000);
    }

    #[tokio::test]
    async fn cart_flow_over_http() {
        let router = test_router().await;

        let response = router
            .clone()
            .oneshot(request(
                "POST",
                "/cart/items",
                "alice",
                Some(
                    r#"{"name": "Crate", "quantity": 2, "unit_price_minor": 500,
                        "unit_becoin_minor": 250, "unit_weight_grams": 100, "recycled": true}"#,
                ),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["total_amount_minor"], 1000);
        assert_eq!(body["total_becoin_minor"], 500);
        assert_eq!(body["total_weight_recycled_grams"], 200);

        // Checkout on an unfunded wallet is rejected and the cart kept.
        let response = router
            .clone()
            .oneshot(request(
                "POST",
                "/checkout",
                "alice",
                Some(r#"{"payment_type_code": "BECOIN", "coupon_code": null, "observation": null}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = router
            .oneshot(request("GET", "/cart", "alice", None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["total_items"], 2);
    }
}
