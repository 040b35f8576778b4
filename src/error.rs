//! Unified error type for permit signing
//!
//! Every failure is fatal to the invocation; the code tells the operator
//! which input to fix.

use crate::eip712::Eip712Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all crate operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermitError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl PermitError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn config_missing(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(ErrorCode::ConfigMissing, format!("missing required setting {}", key))
    }

    pub fn chain_query_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ChainQueryFailed, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }
}

impl fmt::Display for PermitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for PermitError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Required environment value absent
    ConfigMissing,
    /// Malformed private key
    KeyError,
    /// Message value does not match its schema type tag
    InvalidFieldType,
    /// Bad recovery id, out-of-range scalar or wrong length
    MalformedSignature,
    /// External nonce lookup failed
    ChainQueryFailed,

    InvalidInput,
    JsonError,
}

pub type PermitResult<T> = Result<T, PermitError>;

impl From<Eip712Error> for PermitError {
    fn from(e: Eip712Error) -> Self {
        let code = match e {
            Eip712Error::KeyError(_) => ErrorCode::KeyError,
            Eip712Error::MalformedSignature(_) => ErrorCode::MalformedSignature,
            Eip712Error::InvalidJson(_) => ErrorCode::JsonError,
            Eip712Error::InvalidFieldType { .. }
            | Eip712Error::InvalidType(_)
            | Eip712Error::InvalidPrimaryType(_)
            | Eip712Error::MissingField(_) => ErrorCode::InvalidFieldType,
        };
        PermitError::new(code, e.to_string())
    }
}

impl From<reqwest::Error> for PermitError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PermitError::chain_query_failed("request timed out")
        } else if e.is_connect() {
            PermitError::chain_query_failed("connection failed")
        } else {
            PermitError::chain_query_failed(e.to_string())
        }
    }
}
