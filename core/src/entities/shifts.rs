//! Shift definitions (`/shifts`).

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::client::{Endpoint, Resource};
use crate::criteria::SearchCriteria;
use crate::http::HttpRequest;

const PATH: &str = "shifts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftField {
    InternalReference,
    Code,
    Name,
    StartTime,
    EndTime,
    Active,
}

impl ShiftField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::InternalReference => "INTERNAL_REFERENCE",
            Self::Code => "CODE",
            Self::Name => "NAME",
            Self::StartTime => "START_TIME",
            Self::EndTime => "END_TIME",
            Self::Active => "ACTIVE",
        }
    }
}

impl AsRef<str> for ShiftField {
    fn as_ref(&self) -> &str {
        self.column()
    }
}

impl Display for ShiftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Shift {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_reference: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Client for `/shifts`.
#[derive(Debug, Clone)]
pub struct Shifts {
    endpoint: Endpoint,
}

impl Shifts {
    pub fn new(base_url: &str) -> Self {
        Self {
            endpoint: Endpoint::new(base_url, PATH),
        }
    }

    pub fn build_search_by_code(&self, code: &str) -> HttpRequest {
        self.build_search_like(ShiftField::Code.column(), code)
    }

    pub fn build_search_by_name(&self, name: &str) -> HttpRequest {
        self.build_search_like(ShiftField::Name.column(), name)
    }

    pub fn build_active_shifts(&self) -> HttpRequest {
        self.build_search(&SearchCriteria::new().field(ShiftField::Active.column(), true))
    }
}

impl Resource for Shifts {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}
