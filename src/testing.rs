//! In-process fake of the simulation backend for tests.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::types::UserId;
use crate::api::ApiClient;
use crate::config::{AppConfig, DatabaseConfig};

#[derive(Debug)]
struct Inner {
    hits: HashMap<&'static str, usize>,
    total_users: u64,
    friends: Vec<UserId>,
    fail_fof: bool,
    fail_simulate: bool,
    fail_refresh: bool,
    slow_profile: Option<(UserId, Duration)>,
    slow_simulate: Option<Duration>,
}

type Shared = Arc<Mutex<Inner>>;

fn hit(state: &Shared, endpoint: &'static str) {
    *state.lock().unwrap().hits.entry(endpoint).or_default() += 1;
}

pub struct FakeBackend {
    addr: SocketAddr,
    state: Shared,
}

#[derive(Deserialize)]
struct IdQuery {
    id: UserId,
}

#[derive(Deserialize)]
struct BatchBody {
    ids: Vec<UserId>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(Inner {
            hits: HashMap::new(),
            total_users: 500,
            friends: vec![12, 45],
            fail_fof: false,
            fail_simulate: false,
            fail_refresh: false,
            slow_profile: None,
            slow_simulate: None,
        }));

        let api = Router::new()
            .route("/refresh_db", post(refresh_db))
            .route("/get_total_count", get(total_count))
            .route("/simulate_day", post(simulate_day))
            .route("/random_user_id", get(random_user_id))
            .route("/get_user_profile", get(user_profile))
            .route("/get_user_friends", get(user_friends))
            .route("/batch_get_simple_profiles", post(batch_profiles))
            .route("/recommend_fof", get(recommend_fof))
            .route("/recommend_strangers", get(recommend_strangers))
            .route("/ping", get(ping))
            .route("/set_db_connection", post(set_db_connection))
            .with_state(state.clone());
        let app = Router::new().nest("/api", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn config(&self) -> AppConfig {
        AppConfig {
            base_url: format!("http://{}/api", self.addr),
            ..Default::default()
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config()).unwrap()
    }

    pub fn hits(&self, endpoint: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .hits
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.state.lock().unwrap().hits.values().sum()
    }

    pub fn set_friends(&self, friends: Vec<UserId>) {
        self.state.lock().unwrap().friends = friends;
    }

    pub fn fail_fof(&self) {
        self.state.lock().unwrap().fail_fof = true;
    }

    pub fn fail_simulate(&self) {
        self.state.lock().unwrap().fail_simulate = true;
    }

    pub fn fail_refresh(&self) {
        self.state.lock().unwrap().fail_refresh = true;
    }

    pub fn slow_profile(&self, id: UserId, delay: Duration) {
        self.state.lock().unwrap().slow_profile = Some((id, delay));
    }

    pub fn slow_simulate(&self, delay: Duration) {
        self.state.lock().unwrap().slow_simulate = Some(delay);
    }
}

async fn refresh_db(State(state): State<Shared>) -> Result<&'static str, StatusCode> {
    hit(&state, "/refresh_db");
    let mut inner = state.lock().unwrap();
    if inner.fail_refresh {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    inner.total_users = 500;
    // Empty body on purpose
    Ok("")
}

async fn total_count(State(state): State<Shared>) -> Json<Value> {
    hit(&state, "/get_total_count");
    let total = state.lock().unwrap().total_users;
    Json(json!({ "total_users": total }))
}

async fn simulate_day(
    State(state): State<Shared>,
    Json(_body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    hit(&state, "/simulate_day");
    let slow = state.lock().unwrap().slow_simulate;
    if let Some(delay) = slow {
        tokio::time::sleep(delay).await;
    }
    let mut inner = state.lock().unwrap();
    if inner.fail_simulate {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    inner.total_users += 10;
    Ok(Json(json!({
        "new_users": 10,
        "total_users": inner.total_users,
        "new_friendships": 22,
        "total_interactions": 140,
    })))
}

async fn random_user_id(State(state): State<Shared>) -> Json<Value> {
    hit(&state, "/random_user_id");
    Json(json!({ "user_id": 317 }))
}

async fn user_profile(
    State(state): State<Shared>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Value>, StatusCode> {
    hit(&state, "/get_user_profile");
    let (total, slow) = {
        let inner = state.lock().unwrap();
        (inner.total_users, inner.slow_profile)
    };
    if let Some((id, delay)) = slow {
        if id == query.id {
            tokio::time::sleep(delay).await;
        }
    }
    if query.id == 0 || query.id > total {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({
        "user_id": query.id,
        "first_name": "A.",
        "surname": "B.",
        "gender": "M",
        "avatar_url": "iVBORw0KGgo=",
        "interests": [{ "name": "music", "score": 9 }],
        "tags": ["night-owl"],
    })))
}

async fn user_friends(State(state): State<Shared>, Query(_query): Query<IdQuery>) -> Json<Value> {
    hit(&state, "/get_user_friends");
    let friends = state.lock().unwrap().friends.clone();
    Json(json!({ "friends": friends }))
}

async fn batch_profiles(State(state): State<Shared>, Json(body): Json<BatchBody>) -> Json<Value> {
    hit(&state, "/batch_get_simple_profiles");
    let profiles: Vec<Value> = body
        .ids
        .iter()
        .map(|id| json!({ "user_id": id, "first_name": format!("User{id}"), "surname": "Test" }))
        .collect();
    Json(json!({ "profiles": profiles }))
}

async fn recommend_fof(
    State(state): State<Shared>,
    Query(_query): Query<IdQuery>,
) -> Result<Json<Value>, StatusCode> {
    hit(&state, "/recommend_fof");
    if state.lock().unwrap().fail_fof {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(json!({ "recommendations": [7, 8] })))
}

async fn recommend_strangers(
    State(state): State<Shared>,
    Query(_query): Query<IdQuery>,
) -> Json<Value> {
    hit(&state, "/recommend_strangers");
    Json(json!({ "recommendations": [99] }))
}

async fn ping(State(state): State<Shared>) -> Json<Value> {
    hit(&state, "/ping");
    Json(json!({ "status": "ok" }))
}

async fn set_db_connection(
    State(state): State<Shared>,
    Json(_database): Json<DatabaseConfig>,
) -> Json<Value> {
    hit(&state, "/set_db_connection");
    Json(json!({ "status": "connected" }))
}
