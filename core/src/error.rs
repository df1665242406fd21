//! Custom Error and Result types for this library

use std::any::Any;
use std::collections::HashMap;
use std::sync::mpsc::{RecvError, SendError};
use std::sync::PoisonError;

use thiserror::Error;

/// Error parsing an address-range expression, see [`crate::ip_parser`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// A single fragment of a comma-separated expression failed to parse
    #[error("invalid address fragment '{fragment}': {reason}")]
    InvalidFragment {
        /// The offending fragment
        fragment: String,
        /// Human readable reason it failed
        reason: String,
    },

    /// The cumulative address count would exceed the configured cap
    #[error("subnet expression '{expression}' exceeds the limit of {cap} IP addresses")]
    SubnetTooLarge {
        /// The full expression that was being parsed
        expression: String,
        /// The configured cap
        cap: usize,
    },

    /// The input was empty
    #[error("address expression was empty")]
    Empty,

    /// An unknown named port list was requested
    #[error("unknown port list '{0}'")]
    UnknownPortList(String),

    /// A config field failed validation
    #[error("invalid config field '{field}': {reason}")]
    InvalidConfig {
        /// Field name
        field: String,
        /// Reason it's invalid
        reason: String,
    },
}

/// Raised when [`crate::scanner::Scanner::terminate`] fails to drain running
/// jobs within its grace window
#[derive(Error, Debug, Clone)]
#[error("termination did not complete within the grace window, still running: {running:?}")]
pub struct TerminationFailure {
    /// Snapshot of [`crate::job_stats::JobStats`] running counts at the time
    /// termination was abandoned
    pub running: HashMap<String, i64>,
}

/// Top level error type for this crate. Per-host and per-probe failures are
/// recorded as structured data on `Device`/`ScanResults` and never
/// constructed as this type; this type is reserved for failures that must
/// surface to the caller.
#[derive(Error, Debug)]
pub enum LanscapeError {
    /// Malformed or oversize scan input
    #[error(transparent)]
    Input(#[from] InputError),

    /// `Scanner::terminate` timed out waiting for jobs to drain
    #[error(transparent)]
    Termination(#[from] TerminationFailure),

    /// Error obtaining a lock on shared scan state
    #[error("failed to acquire lock: {0}")]
    Lock(String),

    /// Error sending a message across an internal channel
    #[error("failed to send internal message: {0}")]
    ChannelSend(String),

    /// Error receiving a message from an internal channel
    #[error("failed to receive internal message: {0}")]
    ChannelReceive(#[from] RecvError),

    /// A worker thread panicked
    #[error("thread panicked: {0}")]
    ThreadPanic(String),

    /// Wrapped IO error, used for process invocation (ping/arp) plumbing
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl<T> From<SendError<T>> for LanscapeError {
    fn from(value: SendError<T>) -> Self {
        Self::ChannelSend(value.to_string())
    }
}

impl<T> From<PoisonError<T>> for LanscapeError {
    fn from(value: PoisonError<T>) -> Self {
        Self::Lock(value.to_string())
    }
}

impl From<Box<dyn Any + Send>> for LanscapeError {
    fn from(value: Box<dyn Any + Send>) -> Self {
        if let Some(s) = value.downcast_ref::<&'static str>() {
            Self::ThreadPanic((*s).to_string())
        } else if let Some(s) = value.downcast_ref::<String>() {
            Self::ThreadPanic(s.clone())
        } else {
            Self::ThreadPanic("unknown panic payload".into())
        }
    }
}

/// Custom Result type for this crate
pub type Result<T> = std::result::Result<T, LanscapeError>;
