//! Stateless HTTP request builder and response parser for entity endpoints.
//!
//! # Design
//! Every Logo Objects entity exposes the same REST surface under its own
//! path. `Resource` captures that surface once: implementors only provide
//! their `Endpoint`, and the provided `build_*` / `parse_*` methods do the
//! rest. Nothing here carries mutable state between calls. The caller
//! executes the actual HTTP round-trip between `build_*` and `parse_*`.

use std::fmt::Display;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::criteria::{and_all, build_search_query, like_prefix, SearchCriteria};
use crate::entities::{ExportMovementSlips, Shifts};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::{with_query, QueryOptions};

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Empty positional argument list for action endpoints.
pub const NO_ARGS: [&str; 0] = [];

/// Base URL plus entity path, e.g. `http://host/api/v1` + `shifts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: String,
    entity: String,
}

impl Endpoint {
    pub fn new(base_url: &str, entity: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            entity: entity.trim_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// `{base}/{entity}`
    pub fn collection(&self) -> String {
        format!("{}/{}", self.base_url, self.entity)
    }

    /// `{base}/{entity}/{id}`
    pub fn member(&self, id: impl Display) -> String {
        format!("{}/{}", self.collection(), segment(id))
    }
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// The REST surface shared by every entity.
pub trait Resource {
    fn endpoint(&self) -> &Endpoint;

    /// `GET /{entity}[?qs]`
    fn build_get_all(&self, options: &QueryOptions) -> HttpRequest {
        bodiless(HttpMethod::Get, with_query(self.endpoint().collection(), options))
    }

    /// `GET /{entity}/{id}[?qs]`
    fn build_get_by_id(&self, id: impl Display, options: &QueryOptions) -> HttpRequest {
        bodiless(HttpMethod::Get, with_query(self.endpoint().member(id), options))
    }

    fn build_create<B: Serialize + ?Sized>(&self, body: &B) -> Result<HttpRequest, ApiError> {
        with_json(HttpMethod::Post, self.endpoint().collection(), body)
    }

    fn build_update<B: Serialize + ?Sized>(&self, id: impl Display, body: &B) -> Result<HttpRequest, ApiError> {
        with_json(HttpMethod::Put, self.endpoint().member(id), body)
    }

    fn build_patch<B: Serialize + ?Sized>(&self, id: impl Display, body: &B) -> Result<HttpRequest, ApiError> {
        with_json(HttpMethod::Patch, self.endpoint().member(id), body)
    }

    fn build_delete(&self, id: impl Display) -> HttpRequest {
        bodiless(HttpMethod::Delete, self.endpoint().member(id))
    }

    /// `getAll({ q })` where `q` comes from the criteria. Empty criteria send
    /// no filter at all.
    fn build_search(&self, criteria: &SearchCriteria) -> HttpRequest {
        self.build_search_page(criteria, QueryOptions::default())
    }

    /// Like [`Resource::build_search`] with paging, sorting and projection.
    /// A `q` already present in `options` is parenthesized and ANDed in front
    /// of the criteria, so an `or` inside it keeps its meaning.
    fn build_search_page(&self, criteria: &SearchCriteria, options: QueryOptions) -> HttpRequest {
        let existing = options.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
        let q = match (existing, build_search_query(criteria)) {
            (Some(existing), Some(built)) => Some(format!("({existing}) and {built}")),
            (Some(existing), None) => Some(existing.to_string()),
            (None, built) => built,
        };
        self.build_get_all(&QueryOptions { q, ..options })
    }

    /// `getAll({ q: clauses.join(" and ") })`
    fn build_query<I, S>(&self, clauses: I) -> HttpRequest
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.build_get_all(&QueryOptions {
            q: and_all(clauses),
            ..QueryOptions::default()
        })
    }

    /// `getAll({ q: "COLUMN like 'prefix*'" })`
    fn build_search_like(&self, column: &str, prefix: &str) -> HttpRequest {
        self.build_get_all(&QueryOptions::new().q(like_prefix(column, prefix)))
    }

    /// Asks for the number of matching records without fetching any.
    fn build_count(&self, criteria: &SearchCriteria) -> HttpRequest {
        self.build_get_all(&QueryOptions {
            q: build_search_query(criteria),
            count: Some(true),
            limit: Some(0),
            ..QueryOptions::default()
        })
    }

    /// `GET /{entity}/{id}/{action}[/args..][?qs]`
    fn build_action_get<I, S>(&self, id: impl Display, action: &str, args: I, options: &QueryOptions) -> HttpRequest
    where
        I: IntoIterator<Item = S>,
        S: Display,
    {
        let path = action_path(self.endpoint().member(id), action, args);
        bodiless(HttpMethod::Get, with_query(path, options))
    }

    /// `POST /{entity}/{action}[/args..]` with a JSON body.
    fn build_action_post<I, S, B>(&self, action: &str, args: I, body: &B) -> Result<HttpRequest, ApiError>
    where
        I: IntoIterator<Item = S>,
        S: Display,
        B: Serialize + ?Sized,
    {
        let path = action_path(self.endpoint().collection(), action, args);
        with_json(HttpMethod::Post, path, body)
    }

    fn parse_get_all<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<Page<T>, ApiError> {
        parse_json(response)
    }

    fn parse_get_by_id<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        parse_json(response)
    }

    fn parse_create<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        parse_json(response)
    }

    fn parse_update<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        parse_json(response)
    }

    fn parse_patch<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        parse_json(response)
    }

    fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    /// Total from a `build_count` response; falls back to the item count when
    /// the server omits `count`.
    fn parse_count(&self, response: HttpResponse) -> Result<u64, ApiError> {
        let page: Page<serde_json::Value> = parse_json(response)?;
        Ok(page.count.unwrap_or(page.items.len() as u64))
    }

    /// Action endpoints return free-form payloads; `serde_json::Value` is a
    /// reasonable `T` when the shape is not modelled.
    fn parse_action<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        parse_json(response)
    }
}

/// Client for any entity path, typed or not.
#[derive(Debug, Clone)]
pub struct EntityClient {
    endpoint: Endpoint,
}

impl EntityClient {
    pub fn new(base_url: &str, entity: &str) -> Self {
        Self {
            endpoint: Endpoint::new(base_url, entity),
        }
    }
}

impl Resource for EntityClient {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

/// Entry point holding the API base URL, e.g. `http://erp:32001/api/v1`.
#[derive(Debug, Clone)]
pub struct LogoClient {
    base_url: String,
}

impl LogoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn entity(&self, entity: &str) -> EntityClient {
        EntityClient::new(&self.base_url, entity)
    }

    pub fn export_movement_slips(&self) -> ExportMovementSlips {
        ExportMovementSlips::new(&self.base_url)
    }

    pub fn shifts(&self) -> Shifts {
        Shifts::new(&self.base_url)
    }
}

fn segment(value: impl Display) -> String {
    utf8_percent_encode(&value.to_string(), SEGMENT).to_string()
}

fn action_path<I, S>(prefix: String, action: &str, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Display,
{
    let mut path = format!("{prefix}/{}", segment(action));
    for arg in args {
        path.push('/');
        path.push_str(&segment(arg));
    }
    path
}

fn bodiless(method: HttpMethod, path: String) -> HttpRequest {
    trace!(%method, %path, "built request");
    HttpRequest {
        method,
        path,
        headers: Vec::new(),
        body: None,
    }
}

fn with_json<B: Serialize + ?Sized>(method: HttpMethod, path: String, body: &B) -> Result<HttpRequest, ApiError> {
    let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
    trace!(%method, %path, bytes = body.len(), "built request");
    Ok(HttpRequest {
        method,
        path,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Some(body),
    })
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
