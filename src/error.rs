// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes surfaced by the library. Front ends map them to status
/// codes with [`Error::status_code`].
#[derive(Debug, Error)]
pub enum Error {
    /// A required table id or endpoint is not configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// The record belongs to another user.
    #[error("forbidden: {0}")]
    Authorization(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The record store failed or returned something we could not use.
    #[error("record store error: {0}")]
    Upstream(String),

    #[error("request cancelled")]
    Cancelled,
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Error::Upstream(msg.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Error::Configuration(_) => 500,
            Error::Validation(_) => 400,
            Error::Authorization(_) => 403,
            Error::NotFound(_) => 404,
            Error::Upstream(_) => 502,
            Error::Cancelled => 499,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Error::Upstream(format!("HTTP {}: {}", status, err)),
            None => Error::Upstream(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Upstream(format!("local store: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Upstream(format!("malformed record: {}", err))
    }
}
