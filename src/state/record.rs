/// URL record definitions for tracking crawl progress
///
/// This module defines the per-address entry stored in the registry and the
/// error classification a finished fetch can end with.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome classification of a finished fetch
///
/// The integer codes are part of the checkpoint file format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ErrorCode {
    /// Page was fetched and its links extracted
    #[default]
    None,

    /// Transport failure (DNS, connect, timeout, body read)
    NetworkError,

    /// Server answered with a status other than 200
    NonHttpOkStatus,

    /// Response Content-Type is not HTML
    NonHtmlContentType,

    /// Body could not be decoded as an HTML document
    ParseError,
}

impl ErrorCode {
    /// Returns the integer code used in checkpoint files
    pub fn code(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::NetworkError => 1,
            Self::NonHttpOkStatus => 2,
            Self::NonHtmlContentType => 3,
            Self::ParseError => 4,
        }
    }

    /// Parses an error code from its checkpoint integer
    ///
    /// Returns None if the integer doesn't match any known code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::NetworkError),
            2 => Some(Self::NonHttpOkStatus),
            3 => Some(Self::NonHtmlContentType),
            4 => Some(Self::ParseError),
            _ => None,
        }
    }

    /// Returns true if this represents a failed fetch
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns all error codes in integer order
    pub fn all() -> [Self; 5] {
        [
            Self::None,
            Self::NetworkError,
            Self::NonHttpOkStatus,
            Self::NonHtmlContentType,
            Self::ParseError,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::NetworkError => "network",
            Self::NonHttpOkStatus => "bad-status",
            Self::NonHtmlContentType => "bad-content-type",
            Self::ParseError => "parse-error",
        }
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u8> for ErrorCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_code(value).ok_or_else(|| format!("unknown error code {}", value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single discovered address and its crawl state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// The address exactly as it was discovered
    #[serde(rename = "url")]
    pub address: String,

    /// Set once the owning fetch task has finished, never cleared
    pub completed: bool,

    #[serde(rename = "error")]
    pub error_code: ErrorCode,

    /// Every href seen on this page, in scope or not
    #[serde(rename = "links", default, deserialize_with = "null_as_empty")]
    pub discovered_links: Vec<String>,
}

impl UrlRecord {
    /// Creates a fresh, incomplete record for an address
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            completed: false,
            error_code: ErrorCode::None,
            discovered_links: Vec::new(),
        }
    }
}

// Older working files store pages without links as `null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
