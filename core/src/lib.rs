//! Synchronous client core for the Logo Objects REST API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round-trip, making the core fully deterministic and testable.
//!
//! # Design
//! - `criteria` turns ordered search criteria into the vendor's OData-like
//!   filter expression (`q`).
//! - `query` serializes paging, projection, sorting and filter options into
//!   a query string.
//! - `client::Resource` is the CRUD / search / action surface every entity
//!   shares; `entities` adds typed clients on top of it.
//! - Clients hold only a base URL and an entity path.

pub mod client;
pub mod criteria;
pub mod entities;
pub mod error;
pub mod http;
pub mod query;

pub use client::{Endpoint, EntityClient, LogoClient, Page, Resource, NO_ARGS};
pub use criteria::{
    and_all, build_search_query, column_name, field_clause, like_prefix, try_build_search_query, FieldValue,
    Operand, Operator, Operators, Scalar, SearchCriteria,
};
pub use entities::{ExportMovementSlip, ExportMovementSlipField, ExportMovementSlips, Shift, ShiftField, Shifts};
pub use error::{ApiError, QueryError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use query::{build_query_string, parse_query_string, QueryOptions, Sort, SortDirection};
