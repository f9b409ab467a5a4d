//! Month-end invoice status models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ParseError;

/// Lifecycle tag of a property's month-end invoice.
///
/// `draft -> ready -> complete` is the expected progression, but any status may
/// be set directly from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "invoice_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Ready,
    Complete,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 3] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Ready,
        InvoiceStatus::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Ready => "ready",
            InvoiceStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "ready" => Ok(InvoiceStatus::Ready),
            "complete" => Ok(InvoiceStatus::Complete),
            other => Err(ParseError::InvalidStatus(other.to_string())),
        }
    }
}

/// Month-end summary of one property for one period
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MonthEndRecord {
    pub property_id: String,
    pub year: i32,
    pub month: i32,
    pub status: InvoiceStatus,
    pub revenue: Decimal,
    pub booking_count: i32,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub property_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Number of properties in each status for a period.
///
/// `none` counts properties that have no month-end record yet.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub draft: i64,
    pub ready: i64,
    pub complete: i64,
    pub none: i64,
}

impl StatusCounts {
    pub fn tally<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = InvoiceStatus>,
    {
        let mut counts = StatusCounts::default();
        for status in statuses {
            counts.add(status, 1);
        }
        counts
    }

    pub fn add(&mut self, status: InvoiceStatus, n: i64) {
        match status {
            InvoiceStatus::Draft => self.draft += n,
            InvoiceStatus::Ready => self.ready += n,
            InvoiceStatus::Complete => self.complete += n,
        }
    }

    /// Properties with a month-end record
    pub fn recorded(&self) -> i64 {
        self.draft + self.ready + self.complete
    }
}
