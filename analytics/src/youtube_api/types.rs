//! Shared types for the YouTube API client.

use std::fmt;

/// A single displayed value from an API response.
///
/// The API omits members it considers private or not applicable (a hidden subscriber count,
/// disabled likes, ...). Those come back as [`Field::NotAvailable`], which displays as `N/A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Value(String),
    NotAvailable,
}

impl From<Option<&String>> for Field {
    fn from(value: Option<&String>) -> Self {
        match value {
            Some(v) => Field::Value(v.clone()),
            None => Field::NotAvailable,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Value(v) => f.write_str(v),
            Field::NotAvailable => f.write_str("N/A"),
        }
    }
}
