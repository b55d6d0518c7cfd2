//! In-memory stand-in for the Logo Objects REST API.
//!
//! Serves every entity path generically: records are JSON objects keyed by
//! an auto-assigned `INTERNAL_REFERENCE`. List requests honour `limit`,
//! `offset`, `fields` and `count`, and echo the decoded query pairs back
//! under `"query"` so clients can check what actually reached the server.
//! Action endpoints echo their action name, positional args and body.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, RawQuery, State},
    http::{StatusCode, Uri},
    routing::get,
    Json, Router,
};
use percent_encoding::percent_decode_str;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::debug;
use url::form_urlencoded;

pub const ID_FIELD: &str = "INTERNAL_REFERENCE";

pub type Record = Map<String, Value>;

#[derive(Debug, Default)]
pub struct Store {
    next_id: i64,
    entities: HashMap<String, BTreeMap<i64, Record>>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/{entity}", get(list_records).post(create_record))
        .route(
            "/{entity}/{key}",
            get(get_record)
                .put(replace_record)
                .patch(patch_record)
                .delete(delete_record)
                .post(post_action),
        )
        .route("/{entity}/{key}/{*rest}", get(get_action).post(post_action_with_args))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| {
        form_urlencoded::parse(q.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    })
    .unwrap_or_default()
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn echo(pairs: &[(String, String)]) -> Value {
    Value::Object(
        pairs
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

fn project(record: &Record, fields: Option<&str>) -> Record {
    match fields {
        Some(fields) => {
            let wanted: Vec<&str> = fields.split(',').collect();
            record
                .iter()
                .filter(|(k, _)| k.as_str() == ID_FIELD || wanted.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        }
        None => record.clone(),
    }
}

fn parse_id(key: &str) -> Result<i64, StatusCode> {
    key.parse().map_err(|_| StatusCode::NOT_FOUND)
}

/// Action name and positional args from the raw request path, after the
/// first `skip` segments. Segments are split before decoding so an encoded
/// `/` stays inside its argument.
fn action_segments(path: &str, skip: usize) -> (String, Vec<String>) {
    let mut parts = path
        .split('/')
        .filter(|p| !p.is_empty())
        .skip(skip)
        .map(|p| percent_decode_str(p).decode_utf8_lossy().into_owned());
    let action = parts.next().unwrap_or_default();
    (action, parts.collect())
}

async fn list_records(
    State(db): State<Db>,
    Path(entity): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, StatusCode> {
    let pairs = query_pairs(raw.as_deref());
    let number = |key: &str| {
        lookup(&pairs, key)
            .map(|v| v.parse::<usize>().map_err(|_| StatusCode::BAD_REQUEST))
            .transpose()
    };
    let limit = number("limit")?;
    let offset = number("offset")?.unwrap_or(0);
    let fields = lookup(&pairs, "fields");

    let store = db.read().await;
    let records = store.entities.get(&entity);
    let total = records.map_or(0, BTreeMap::len);
    let items: Vec<Value> = records
        .into_iter()
        .flat_map(BTreeMap::values)
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .map(|r| Value::Object(project(r, fields)))
        .collect();

    let mut body = json!({ "items": items, "query": echo(&pairs) });
    if lookup(&pairs, "count") == Some("true") {
        body["count"] = json!(total);
    }
    Ok(Json(body))
}

async fn create_record(
    State(db): State<Db>,
    Path(entity): Path<String>,
    Json(mut record): Json<Record>,
) -> (StatusCode, Json<Record>) {
    let mut store = db.write().await;
    store.next_id += 1;
    let id = store.next_id;
    record.insert(ID_FIELD.to_string(), json!(id));
    store.entities.entry(entity.clone()).or_default().insert(id, record.clone());
    debug!(%entity, id, "created record");
    (StatusCode::CREATED, Json(record))
}

async fn get_record(
    State(db): State<Db>,
    Path((entity, key)): Path<(String, String)>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Record>, StatusCode> {
    let id = parse_id(&key)?;
    let pairs = query_pairs(raw.as_deref());
    let store = db.read().await;
    store
        .entities
        .get(&entity)
        .and_then(|records| records.get(&id))
        .map(|r| Json(project(r, lookup(&pairs, "fields"))))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn replace_record(
    State(db): State<Db>,
    Path((entity, key)): Path<(String, String)>,
    Json(mut input): Json<Record>,
) -> Result<Json<Record>, StatusCode> {
    let id = parse_id(&key)?;
    let mut store = db.write().await;
    let record = store
        .entities
        .get_mut(&entity)
        .and_then(|records| records.get_mut(&id))
        .ok_or(StatusCode::NOT_FOUND)?;
    input.insert(ID_FIELD.to_string(), json!(id));
    *record = input;
    Ok(Json(record.clone()))
}

async fn patch_record(
    State(db): State<Db>,
    Path((entity, key)): Path<(String, String)>,
    Json(input): Json<Record>,
) -> Result<Json<Record>, StatusCode> {
    let id = parse_id(&key)?;
    let mut store = db.write().await;
    let record = store
        .entities
        .get_mut(&entity)
        .and_then(|records| records.get_mut(&id))
        .ok_or(StatusCode::NOT_FOUND)?;
    for (k, v) in input {
        if k != ID_FIELD {
            record.insert(k, v);
        }
    }
    Ok(Json(record.clone()))
}

async fn delete_record(
    State(db): State<Db>,
    Path((entity, key)): Path<(String, String)>,
) -> Result<StatusCode, StatusCode> {
    let id = parse_id(&key)?;
    let mut store = db.write().await;
    let removed = store.entities.get_mut(&entity).and_then(|records| records.remove(&id));
    debug!(%entity, id, found = removed.is_some(), "delete record");
    removed.map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn get_action(
    State(db): State<Db>,
    Path((entity, key, _rest)): Path<(String, String, String)>,
    uri: Uri,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, StatusCode> {
    let id = parse_id(&key)?;
    let store = db.read().await;
    let exists = store.entities.get(&entity).is_some_and(|records| records.contains_key(&id));
    if !exists {
        return Err(StatusCode::NOT_FOUND);
    }
    let (action, args) = action_segments(uri.path(), 2);
    Ok(Json(json!({
        "action": action,
        "id": id,
        "args": args,
        "query": echo(&query_pairs(raw.as_deref())),
    })))
}

async fn post_action(
    Path((_entity, action)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    Json(json!({ "action": action, "args": Vec::<String>::new(), "body": body }))
}

async fn post_action_with_args(uri: Uri, Json(body): Json<Value>) -> Json<Value> {
    let (action, args) = action_segments(uri.path(), 1);
    Json(json!({ "action": action, "args": args, "body": body }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn query_pairs_decode_form_encoding() {
        let pairs = query_pairs(Some("q=CODE+eq+%27A%27&limit=5"));
        assert_eq!(lookup(&pairs, "q"), Some("CODE eq 'A'"));
        assert_eq!(lookup(&pairs, "limit"), Some("5"));
        assert!(query_pairs(None).is_empty());
    }

    #[test]
    fn projection_keeps_id_and_requested_fields() {
        let r = record(json!({"INTERNAL_REFERENCE": 1, "FICHENO": "1", "DATE_": "d", "NOTES1": "n"}));
        let projected = project(&r, Some("FICHENO,DATE_"));
        assert_eq!(projected.len(), 3);
        assert!(projected.contains_key(ID_FIELD));
        assert!(!projected.contains_key("NOTES1"));
        assert_eq!(project(&r, None), r);
    }

    #[test]
    fn path_splits_into_action_and_args() {
        assert_eq!(
            action_segments("/exportMovementSlips/3/ApplyCampaign", 2),
            ("ApplyCampaign".to_string(), vec![])
        );
        assert_eq!(
            action_segments("/exportMovementSlips/3/GetLines/1/x%20y", 2),
            ("GetLines".to_string(), vec!["1".to_string(), "x y".to_string()])
        );
    }

    #[test]
    fn encoded_slash_stays_inside_its_arg() {
        assert_eq!(
            action_segments("/exportMovementSlips/ReCalculate/a%2Fb/c", 1),
            ("ReCalculate".to_string(), vec!["a/b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn non_numeric_ids_are_not_found() {
        assert_eq!(parse_id("12"), Ok(12));
        assert_eq!(parse_id("abc"), Err(StatusCode::NOT_FOUND));
    }
}
