// Net Connection - Error Types
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Shared error types for the connection API.
//!
//! Every [`Error`] maps onto exactly one public [`ErrorCode`], which is also
//! the payload delivered to asynchronous completion callbacks.

use thiserror::Error;

/// Result type alias for connection API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Public result codes returned by every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Success.
    None,
    /// Null or unregistered handle, out-of-range argument.
    InvalidParameter,
    /// Allocation failure.
    OutOfMemory,
    /// The daemon call failed.
    OperationFailed,
    /// The profile iterator has no more entries.
    IteratorEnd,
    /// There is no active connection.
    NoConnection,
    /// The object already exists.
    AlreadyExists,
    /// The operation is not supported for this kind of object.
    NotSupported,
    /// The daemon refused the caller.
    PermissionDenied,
    /// A request of the same kind is still pending.
    NowInProgress,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::InvalidParameter => "invalid_parameter",
            Self::OutOfMemory => "out_of_memory",
            Self::OperationFailed => "operation_failed",
            Self::IteratorEnd => "iterator_end",
            Self::NoConnection => "no_connection",
            Self::AlreadyExists => "already_exists",
            Self::NotSupported => "not_supported",
            Self::PermissionDenied => "permission_denied",
            Self::NowInProgress => "now_in_progress",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for connection API operations.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================
    // Caller Contract Errors
    // ========================================
    #[error("Invalid connection handle")]
    InvalidHandle,

    #[error("Invalid profile handle")]
    InvalidProfile,

    #[error("Invalid profile iterator")]
    InvalidIterator,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid hostname: {0}")]
    InvalidHostname(String),

    // ========================================
    // Resource Errors
    // ========================================
    #[error("Out of memory")]
    OutOfMemory,

    // ========================================
    // Daemon / D-Bus Errors
    // ========================================
    #[error("Daemon session could not be established: {0}")]
    SessionFailed(String),

    #[error("Daemon session is not active")]
    NoSession,

    #[error("Daemon operation failed: {action} - {reason}")]
    OperationFailed { action: String, reason: String },

    #[error("D-Bus error: {0}")]
    Dbus(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // ========================================
    // Iteration
    // ========================================
    #[error("Iterator end")]
    IteratorEnd,

    // ========================================
    // Absence / State Errors
    // ========================================
    #[error("No active connection")]
    NoConnection,

    #[error("No service registered")]
    NoService,

    #[error("Profile already exists: {0}")]
    AlreadyExists(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Request already in progress: {0}")]
    NowInProgress(String),

    // ========================================
    // Storage Errors
    // ========================================
    #[error("Failed to read configuration: {0}")]
    ConfigReadFailed(String),

    #[error("Failed to write configuration: {0}")]
    ConfigWriteFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParseFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================
    // Generic Errors
    // ========================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new operation failed error.
    pub fn operation_failed(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OperationFailed {
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid parameter error.
    pub fn invalid_parameter(reason: impl Into<String>) -> Self {
        Self::InvalidParameter(reason.into())
    }

    /// The public result code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidHandle
            | Self::InvalidProfile
            | Self::InvalidIterator
            | Self::InvalidParameter(_)
            | Self::InvalidIpAddress(_)
            | Self::InvalidHostname(_) => ErrorCode::InvalidParameter,
            Self::OutOfMemory => ErrorCode::OutOfMemory,
            Self::SessionFailed(_)
            | Self::NoSession
            | Self::OperationFailed { .. }
            | Self::Dbus(_)
            | Self::ConfigReadFailed(_)
            | Self::ConfigWriteFailed(_)
            | Self::ConfigParseFailed(_)
            | Self::Io(_)
            | Self::Internal(_) => ErrorCode::OperationFailed,
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::IteratorEnd => ErrorCode::IteratorEnd,
            Self::NoConnection | Self::NoService => ErrorCode::NoConnection,
            Self::AlreadyExists(_) => ErrorCode::AlreadyExists,
            Self::NotSupported(_) => ErrorCode::NotSupported,
            Self::NowInProgress(_) => ErrorCode::NowInProgress,
        }
    }

    /// Check if this error is a caller-contract violation.
    pub fn is_invalid_parameter(&self) -> bool {
        self.code() == ErrorCode::InvalidParameter
    }

    /// Check if this error marks the normal end of iteration.
    pub fn is_iterator_end(&self) -> bool {
        matches!(self, Self::IteratorEnd)
    }

    /// Check if this error came from the daemon or its transport.
    pub fn is_daemon_failure(&self) -> bool {
        matches!(
            self,
            Self::SessionFailed(_) | Self::NoSession | Self::OperationFailed { .. } | Self::Dbus(_)
        )
    }
}

/// Collapse an operation result into the code a completion callback receives.
pub fn result_code(result: &Result<()>) -> ErrorCode {
    match result {
        Ok(()) => ErrorCode::None,
        Err(e) => e.code(),
    }
}

// Convert from zbus errors
impl From<zbus::Error> for Error {
    fn from(err: zbus::Error) -> Self {
        Error::Dbus(err.to_string())
    }
}

// Convert from zvariant errors (reply decoding)
impl From<zbus::zvariant::Error> for Error {
    fn from(err: zbus::zvariant::Error) -> Self {
        Error::Dbus(err.to_string())
    }
}

// Convert from toml parse errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParseFailed(err.to_string())
    }
}

// Convert from toml serialize errors
impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::ConfigWriteFailed(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigParseFailed(err.to_string())
    }
}
