//! Export movement slips (`/exportMovementSlips`).

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::client::{Endpoint, Resource, NO_ARGS};
use crate::criteria::{Operators, SearchCriteria};
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::query::QueryOptions;

const PATH: &str = "exportMovementSlips";

/// Vendor columns of an export movement slip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMovementSlipField {
    InternalReference,
    Type,
    FicheNo,
    Date,
    Time,
    DocNumber,
    AuxilCode,
    TrCode,
    Branch,
    Department,
    ArpCode,
    Cancelled,
    TotalNet,
    Notes1,
}

impl ExportMovementSlipField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::InternalReference => "INTERNAL_REFERENCE",
            Self::Type => "TYPE",
            Self::FicheNo => "FICHENO",
            Self::Date => "DATE_",
            Self::Time => "TIME_",
            Self::DocNumber => "DOC_NUMBER",
            Self::AuxilCode => "AUXIL_CODE",
            Self::TrCode => "TRCODE",
            Self::Branch => "BRANCH",
            Self::Department => "DEPARTMENT",
            Self::ArpCode => "ARP_CODE",
            Self::Cancelled => "CANCELLED",
            Self::TotalNet => "TOTAL_NET",
            Self::Notes1 => "NOTES1",
        }
    }
}

impl AsRef<str> for ExportMovementSlipField {
    fn as_ref(&self) -> &str {
        self.column()
    }
}

impl Display for ExportMovementSlipField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// An export movement slip record as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ExportMovementSlip {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_reference: Option<i64>,
    #[serde(rename = "TYPE", skip_serializing_if = "Option::is_none")]
    pub slip_type: Option<i32>,
    #[serde(rename = "FICHENO", skip_serializing_if = "Option::is_none")]
    pub fiche_no: Option<String>,
    #[serde(rename = "DATE_", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Packed vendor time value.
    #[serde(rename = "TIME_", skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auxil_code: Option<String>,
    #[serde(rename = "TRCODE", skip_serializing_if = "Option::is_none")]
    pub tr_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arp_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_net: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes1: Option<String>,
}

/// Client for `/exportMovementSlips`.
#[derive(Debug, Clone)]
pub struct ExportMovementSlips {
    endpoint: Endpoint,
}

impl ExportMovementSlips {
    pub fn new(base_url: &str) -> Self {
        Self {
            endpoint: Endpoint::new(base_url, PATH),
        }
    }

    /// Slips whose auxiliary code starts with `code`.
    pub fn build_search_by_auxil_code(&self, code: &str) -> HttpRequest {
        self.build_search_like(ExportMovementSlipField::AuxilCode.column(), code)
    }

    pub fn build_search_by_fiche_no(&self, fiche_no: &str) -> HttpRequest {
        self.build_search(&SearchCriteria::new().field(ExportMovementSlipField::FicheNo.column(), fiche_no))
    }

    /// Slips dated within `[from, to]`, both inclusive, in the vendor date format.
    pub fn build_search_by_date_range(&self, from: &str, to: &str) -> HttpRequest {
        let range = Operators::new().gte(from).lte(to);
        self.build_search(&SearchCriteria::new().field(ExportMovementSlipField::Date.column(), range))
    }

    /// `POST /exportMovementSlips/ReCalculate`
    pub fn build_re_calculate(&self, slip: &ExportMovementSlip) -> Result<HttpRequest, ApiError> {
        self.build_action_post("ReCalculate", NO_ARGS, slip)
    }

    /// `GET /exportMovementSlips/{id}/ApplyCampaign`
    pub fn build_apply_campaign(&self, id: i64) -> HttpRequest {
        self.build_action_get(id, "ApplyCampaign", NO_ARGS, &QueryOptions::default())
    }
}

impl Resource for ExportMovementSlips {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}
