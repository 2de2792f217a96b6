//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client from configuration
//! - Issuing the GET request for a record
//! - Classifying the response into a fetch outcome

use crate::config::CrawlerConfig;
use crate::config::UserAgentConfig;
use crate::state::ErrorCode;
use encoding_rs::{Encoding, UTF_8};
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, Response, StatusCode};
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Got a 200 response with an HTML body
    Success {
        /// Final URL after redirects
        final_url: String,
        /// Page body decoded with its declared charset
        body: String,
    },

    /// HTML body that is malformed under its declared charset
    Undecodable {
        /// Name of the encoding the body was decoded with
        encoding: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Server answered with something other than 200
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (DNS, connection refused, timeout, body read)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Returns the error code a failed fetch is recorded with
    ///
    /// `None` for a successful fetch; its final code depends on parsing.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Success { .. } => None,
            Self::ContentMismatch { .. } => Some(ErrorCode::NonHtmlContentType),
            Self::Undecodable { .. } => Some(ErrorCode::ParseError),
            Self::HttpError { .. } => Some(ErrorCode::NonHttpOkStatus),
            Self::NetworkError { .. } => Some(ErrorCode::NetworkError),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `crawler` - Timeouts
/// * `user_agent` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// # Classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | Transport failure | `NetworkError` |
/// | Status other than 200 | `HttpError` |
/// | Content-Type not `text/html…` | `ContentMismatch` |
/// | Body read failure, or body over `max_body_bytes` | `NetworkError` |
/// | Body malformed under its charset | `Undecodable` |
/// | Otherwise | `Success` |
///
/// The charset comes from the Content-Type header and defaults to UTF-8.
/// There are no retries; every outcome is final for the record.
pub async fn fetch_url(client: &Client, url: &str, max_body_bytes: usize) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else {
                e.to_string()
            };
            return FetchResult::NetworkError { error };
        }
    };

    let status = response.status();
    if status != StatusCode::OK {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html_content_type(&content_type) {
        return FetchResult::ContentMismatch { content_type };
    }

    let final_url = response.url().to_string();

    let body = match read_body(response, max_body_bytes).await {
        Ok(body) => body,
        Err(error) => return FetchResult::NetworkError { error },
    };

    match decode_body(&body, &content_type) {
        Ok(body) => FetchResult::Success { final_url, body },
        Err(encoding) => FetchResult::Undecodable {
            encoding: encoding.name().to_string(),
        },
    }
}

/// Reads the response body, giving up once it exceeds `limit` bytes
async fn read_body(mut response: Response, limit: usize) -> Result<Vec<u8>, String> {
    if let Some(length) = response.content_length() {
        if length > limit as u64 {
            return Err(format!("Content too large: {} bytes (limit {})", length, limit));
        }
    }

    let mut body = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                if body.len() + chunk.len() > limit {
                    return Err(format!(
                        "Content too large: exceeded {} bytes while reading",
                        limit
                    ));
                }
                body.extend_from_slice(&chunk);
            }
            Ok(None) => return Ok(body),
            Err(e) => return Err(format!("Failed to read body: {}", e)),
        }
    }
}

/// Decodes a body with the charset named in its Content-Type
///
/// Unknown or missing charsets fall back to UTF-8, and a byte order mark
/// overrides the header. Returns the encoding used if the body is malformed
/// under it.
pub fn decode_body(body: &[u8], content_type: &str) -> Result<String, &'static Encoding> {
    let declared = charset_of(content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (text, used, had_errors) = declared.decode(body);
    if had_errors {
        return Err(used);
    }
    Ok(text.into_owned())
}

fn charset_of(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"'))
        } else {
            None
        }
    })
}

/// Returns true if a Content-Type header value denotes an HTML document
pub fn is_html_content_type(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("text/html")
}
