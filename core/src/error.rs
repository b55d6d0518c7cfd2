//! Error types for the Logo Objects client core.
//!
//! # Design
//! `ApiError` covers the build/parse boundary of the entity clients. `NotFound`
//! gets a dedicated variant because callers frequently distinguish "the record
//! does not exist" from "the server returned an unexpected status." All other
//! non-2xx responses land in `HttpError` with the raw status code and body.
//!
//! `QueryError` is only produced by the strict filter builders. The default
//! builders never fail; they drop the offending clause instead.

use thiserror::Error;

/// Errors returned by entity client build and parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404: the requested record does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Inputs the strict filter builder refuses to turn into clauses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("field `{field}`: empty value list")]
    EmptyList { field: String },

    #[error("field `{field}`: number is not finite")]
    NonFiniteNumber { field: String },

    #[error("field `{field}`: empty operator object")]
    EmptyOperators { field: String },

    #[error("field `{field}`: unknown operator `{operator}`")]
    UnknownOperator { field: String, operator: String },

    #[error("field `{field}`: operator `{operator}` does not accept a list")]
    ListOperand { field: String, operator: String },

    #[error("field `{field}`: unsupported value")]
    UnsupportedValue { field: String },
}
