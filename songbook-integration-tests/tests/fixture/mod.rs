//! In-memory stand-in for the Songbook API, just enough to exercise the client and sampler.
#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use songbook_client::{Client, ClientConfig};
use songbook_common::{ErrorResponse, Resource};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tokio::time::timeout;

const SERVER_READY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureOptions {
    /// Answer every n-th list request with a 503.
    pub fail_list_every: Option<u64>,
}

#[derive(Default)]
struct FixtureState {
    collections: HashMap<Resource, BTreeMap<u64, Map<String, Value>>>,
    next_id: u64,
    list_calls: u64,
    options: FixtureOptions,
}

type Db = Arc<RwLock<FixtureState>>;

pub struct Fixture {
    pub addr: SocketAddr,
}

impl Fixture {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> Client {
        Client::new(ClientConfig { base_url: self.base_url() })
    }
}

pub async fn start_fixture(options: FixtureOptions) -> Fixture {
    let db: Db = Arc::new(RwLock::new(FixtureState { options, ..Default::default() }));
    let app = Router::new()
        .route("/:resource", get(handle_list).post(handle_create))
        .route("/:resource/:id", get(handle_get).patch(handle_update).delete(handle_delete))
        .with_state(db);

    let (ready_tx, ready_rx) = oneshot::channel();
    tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
        ready_tx.send(listener.local_addr().expect("no local addr")).ok();
        axum::serve(listener, app).await.expect("fixture server failed");
    });

    let addr = timeout(SERVER_READY_TIMEOUT, ready_rx)
        .await
        .expect("fixture did not start in time")
        .expect("fixture ready signal dropped");
    Fixture { addr }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

fn parse_resource(name: &str) -> Result<Resource, Response> {
    name.parse()
        .map_err(|_| error_response(StatusCode::NOT_FOUND, format!("no collection {name}")))
}

fn parse_id(raw: &str) -> Result<u64, Response> {
    raw.parse()
        .map_err(|_| error_response(StatusCode::NOT_FOUND, format!("no entity {raw}")))
}

fn with_id(id: u64, fields: &Map<String, Value>) -> Value {
    let mut entity = fields.clone();
    entity.insert("id".to_string(), json!(id));
    Value::Object(entity)
}

async fn handle_list(State(db): State<Db>, Path(resource): Path<String>) -> Response {
    let resource = match parse_resource(&resource) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let mut state = db.write().await;
    state.list_calls += 1;
    if let Some(n) = state.options.fail_list_every {
        if state.list_calls % n == 0 {
            return error_response(StatusCode::SERVICE_UNAVAILABLE, "injected failure");
        }
    }
    let items: Vec<Value> = state
        .collections
        .get(&resource)
        .map(|c| c.iter().map(|(id, fields)| with_id(*id, fields)).collect())
        .unwrap_or_default();
    Json(items).into_response()
}

async fn handle_create(
    State(db): State<Db>,
    Path(resource): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let resource = match parse_resource(&resource) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let Value::Object(fields) = body else {
        return error_response(StatusCode::BAD_REQUEST, "body must be a JSON object");
    };
    let mut state = db.write().await;
    state.next_id += 1;
    let id = state.next_id;
    let entity = with_id(id, &fields);
    state.collections.entry(resource).or_default().insert(id, fields);
    (StatusCode::CREATED, Json(entity)).into_response()
}

async fn handle_get(State(db): State<Db>, Path((resource, id)): Path<(String, String)>) -> Response {
    let (resource, id) = match parse_resource(&resource).and_then(|r| Ok((r, parse_id(&id)?))) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let state = db.read().await;
    match state.collections.get(&resource).and_then(|c| c.get(&id)) {
        Some(fields) => Json(with_id(id, fields)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("{resource} {id} not found")),
    }
}

async fn handle_update(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
    Json(patch): Json<Value>,
) -> Response {
    let (resource, id) = match parse_resource(&resource).and_then(|r| Ok((r, parse_id(&id)?))) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Value::Object(patch) = patch else {
        return error_response(StatusCode::BAD_REQUEST, "body must be a JSON object");
    };
    let mut state = db.write().await;
    match state.collections.get_mut(&resource).and_then(|c| c.get_mut(&id)) {
        Some(fields) => {
            for (k, v) in patch {
                if k != "id" {
                    fields.insert(k, v);
                }
            }
            Json(with_id(id, fields)).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, format!("{resource} {id} not found")),
    }
}

async fn handle_delete(State(db): State<Db>, Path((resource, id)): Path<(String, String)>) -> Response {
    let (resource, id) = match parse_resource(&resource).and_then(|r| Ok((r, parse_id(&id)?))) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut state = db.write().await;
    match state.collections.get_mut(&resource).and_then(|c| c.remove(&id)) {
        Some(_) => Json(json!({"id": id, "deleted": true})).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("{resource} {id} not found")),
    }
}
