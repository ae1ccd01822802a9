use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub login: String,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub login: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

pub type Db = Arc<RwLock<HashMap<String, User>>>;

pub fn app() -> Router {
    let mut users = HashMap::new();
    users.insert(
        "sawyer".to_string(),
        User {
            id: 1,
            login: "sawyer".to_string(),
        },
    );
    let db: Db = Arc::new(RwLock::new(users));
    Router::new()
        .route("/user", get(current_user))
        .route("/users", post(create_user))
        .route("/users/{login}", get(get_user).delete(delete_user))
        .route("/404", get(not_found))
        .route("/booya", get(booya))
        .route("/q", get(echo_query))
        .route("/echo", any(echo_body))
        .route("/large", get(large))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn missing() -> (StatusCode, Json<ApiMessage>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiMessage {
            message: "not found".to_string(),
        }),
    )
}

async fn current_user(State(db): State<Db>) -> Result<Json<User>, (StatusCode, Json<ApiMessage>)> {
    let users = db.read().await;
    users.get("sawyer").cloned().map(Json).ok_or_else(missing)
}

async fn create_user(
    State(db): State<Db>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), (StatusCode, Json<ApiMessage>)> {
    let mut users = db.write().await;
    if users.contains_key(&input.login) {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiMessage {
                message: format!("login {} already taken", input.login),
            }),
        ));
    }
    let user = User {
        id: users.len() as i64 + 1,
        login: input.login,
    };
    users.insert(user.login.clone(), user.clone());
    log::debug!("created user {}", user.login);
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(db): State<Db>,
    Path(login): Path<String>,
) -> Result<Json<User>, (StatusCode, Json<ApiMessage>)> {
    let users = db.read().await;
    users.get(&login).cloned().map(Json).ok_or_else(missing)
}

async fn delete_user(
    State(db): State<Db>,
    Path(login): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiMessage>)> {
    let mut users = db.write().await;
    users
        .remove(&login)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(missing)
}

async fn not_found() -> (StatusCode, Json<ApiMessage>) {
    missing()
}

/// Serves a body in a format no client registers by default.
async fn booya() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/booya+booya")],
        r#"{"id": 1, "login": "sawyer"}"#,
    )
}

/// Echoes the query pairs back in request order.
async fn echo_query(Query(pairs): Query<Vec<(String, String)>>) -> Json<Vec<(String, String)>> {
    Json(pairs)
}

/// Sends the request body back under the request's Content-Type, for any
/// method.
async fn echo_body(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    ([(header::CONTENT_TYPE, content_type)], body)
}

/// Number of entries in the `/large` array; the JSON comes to roughly 13 MB.
pub const LARGE_LEN: u64 = 1_500_000;

async fn large() -> Json<Vec<u64>> {
    Json((0..LARGE_LEN).map(|i| 10_000_000 + i).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serializes_to_json() {
        let user = User {
            id: 1,
            login: "sawyer".to_string(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["login"], "sawyer");
    }

    #[test]
    fn create_user_requires_login() {
        let result: Result<CreateUser, _> = serde_json::from_str(r#"{"id":3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn api_message_shape() {
        let msg: ApiMessage = serde_json::from_str(r#"{"message":"not found"}"#).unwrap();
        assert_eq!(msg.message, "not found");
    }
}
