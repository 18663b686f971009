use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use crate::{Ledger, ServerError, statistics, transactions};

#[derive(Clone)]
pub struct ServerState {
    pub ledger: Arc<Ledger>,
    /// Bearer token -> user id.
    tokens: Arc<HashMap<String, String>>,
}

impl ServerState {
    pub fn new<I, T, U>(ledger: Ledger, tokens: I) -> Self
    where
        I: IntoIterator<Item = (T, U)>,
        T: Into<String>,
        U: Into<String>,
    {
        Self {
            ledger: Arc::new(ledger),
            tokens: Arc::new(
                tokens
                    .into_iter()
                    .map(|(token, user)| (token.into(), user.into()))
                    .collect(),
            ),
        }
    }
}

/// The user a request was authenticated as.
#[derive(Clone, Debug)]
pub struct AuthUser(pub String);

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(Authorization(bearer))) = auth_header else {
        return Err(ServerError::Unauthorized);
    };
    let Some(user) = state.tokens.get(bearer.token()) else {
        tracing::debug!("rejected unknown bearer token");
        return Err(ServerError::Unauthorized);
    };

    request.extensions_mut().insert(AuthUser(user.clone()));
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let api = Router::new()
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/transactions/statistics", get(statistics::get_stats))
        .route(
            "/transactions/{id}",
            patch(transactions::update).delete(transactions::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state);

    Router::new().nest("/api", api)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        router(ServerState::new(
            Ledger::new(),
            [("alice-token", "alice"), ("bob-token", "bob")],
        ))
    }

    fn request(
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn expense(amount: f64, description: &str) -> Value {
        json!({
            "type": "EXPENSE",
            "category": "FOOD",
            "amount": amount,
            "date": "2024-03-01T12:00:00.000Z",
            "description": description,
            "paymentMode": "CASH",
        })
    }

    #[tokio::test]
    async fn missing_or_unknown_token_is_401() {
        let app = app();
        let (status, body) = send(&app, request(Method::GET, "/api/transactions", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = send(
            &app,
            request(Method::GET, "/api/transactions", Some("nope"), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_then_list_filtered_by_type() {
        let app = app();
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/transactions",
                Some("alice-token"),
                Some(expense(12.5, "Lunch")),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["amount"], 12.5);

        let (status, body) = send(
            &app,
            request(
                Method::GET,
                "/api/transactions?type=EXPENSE&page=1&limit=10",
                Some("alice-token"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["pagination"]["total"], 1);
        assert_eq!(body["data"]["pagination"]["totalPages"], 1);
        assert_eq!(body["data"]["transactions"][0]["description"], "Lunch");

        let (_, body) = send(
            &app,
            request(
                Method::GET,
                "/api/transactions?type=INCOME",
                Some("alice-token"),
                None,
            ),
        )
        .await;
        assert_eq!(body["data"]["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn invalid_body_is_422_with_message() {
        let app = app();
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/transactions",
                Some("alice-token"),
                Some(expense(0.0, "Lunch")),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Amount must be positive");
    }

    #[tokio::test]
    async fn unknown_id_is_404() {
        let app = app();
        let (status, body) = send(
            &app,
            request(
                Method::DELETE,
                "/api/transactions/abc123",
                Some("alice-token"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Transaction not found");
    }

    #[tokio::test]
    async fn update_and_delete_round_trip() {
        let app = app();
        let (_, created) = send(
            &app,
            request(
                Method::POST,
                "/api/transactions",
                Some("alice-token"),
                Some(expense(3.0, "Coffee")),
            ),
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/transactions/{id}");

        // bob cannot touch alice's data
        let (status, _) = send(&app, request(Method::DELETE, &uri, Some("bob-token"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            request(
                Method::PATCH,
                &uri,
                Some("alice-token"),
                Some(json!({ "description": "Espresso" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["description"], "Espresso");
        assert_eq!(body["data"]["amount"], 3.0);

        let (status, _) = send(&app, request(Method::DELETE, &uri, Some("alice-token"), None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn statistics_cover_all_transactions() {
        let app = app();
        for (kind, amount) in [("INCOME", 1000.0), ("EXPENSE", 250.0)] {
            let mut body = expense(amount, "entry");
            body["type"] = json!(kind);
            send(
                &app,
                request(Method::POST, "/api/transactions", Some("alice-token"), Some(body)),
            )
            .await;
        }

        let (status, body) = send(
            &app,
            request(
                Method::GET,
                "/api/transactions/statistics",
                Some("alice-token"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalIncome"], 1000.0);
        assert_eq!(body["data"]["totalExpense"], 250.0);
        assert_eq!(body["data"]["netBalance"], 750.0);
    }
}
