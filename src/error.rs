//! # Error Types
//!
//! Every failure the codec, framing layer and connection helper can report.
//!
//! Codec errors are schema or data violations. None of them are transient:
//! a message that fails to encode or decode should be dropped, and the peer
//! that sent it may be disconnected. Transport errors (`Io`, `Timeout`,
//! `ConnectionClosed`) come from the socket side.
//!
//! ## Example
//! ```rust
//! use matchmaker_protocol::core::schema::wire_record;
//! use matchmaker_protocol::{deserialize, ProtocolError};
//!
//! wire_record! {
//!     #[derive(Debug)]
//!     pub struct Ping {
//!         pub sequence: u32,
//!     }
//! }
//!
//! match deserialize::<Ping>(&[0u8; 3]) {
//!     Err(ProtocolError::SizeMismatch { expected, actual, .. }) => {
//!         assert_eq!((expected, actual), (4, 3));
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Dispatcher-related error messages
    pub const ERR_DISPATCHER_WRITE_LOCK: &str = "Failed to acquire write lock on dispatcher";
    pub const ERR_DISPATCHER_READ_LOCK: &str = "Failed to acquire read lock on dispatcher";

    /// Size cache error messages
    pub const ERR_SIZE_CACHE_LOCK: &str = "Size cache lock poisoned";

    /// Schema errors
    pub const ERR_FIELD_ORDER: &str = "Record fields out of step with its descriptor";
    pub const ERR_SIZE_OVERFLOW: &str = "Serialized size overflows usize";
}

// ProtocolError is the primary error type for all protocol operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Not a scalar, not an annotated text/sequence field, not a well-formed record.
    #[error("The type ({type_name}) is not serializable: {reason}")]
    UnsupportedType {
        type_name: &'static str,
        reason: &'static str,
    },

    /// Text or sequence requested as a top-level target.
    #[error("The type ({type_name}) is serializable only when it is declared as a field")]
    TopLevelFieldOnly { type_name: &'static str },

    #[error("Field `{record}.{field}` has no length annotation")]
    MissingAnnotation {
        record: &'static str,
        field: &'static str,
    },

    /// Text longer than its slot allows, or a sequence whose count differs from its annotation.
    #[error("Length of field `{field}` ({actual}) violates its annotation ({limit})")]
    LengthViolation {
        field: &'static str,
        actual: usize,
        limit: usize,
    },

    #[error("Buffer size ({actual}) does not match the serialized size of {type_name} ({expected})")]
    SizeMismatch {
        type_name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Buffer overrun: need {needed} bytes at offset {offset}, buffer holds {available}")]
    BufferOverrun {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Text slot content that is not UTF-8, or text holding a NUL byte.
    #[error("Text field `{field}` is not valid wire text")]
    MalformedText { field: &'static str },

    #[error("Frame too large: {0} bytes")]
    OversizedFrame(usize),

    #[error("Unknown message type: {0}")]
    UnknownMessageType(u8),

    #[error("Unexpected message type")]
    UnexpectedMessage,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout occurred")]
    Timeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl ProtocolError {
    /// Whether the error came from the schema or the bytes rather than the socket.
    ///
    /// Transports drop the offending message on codec errors; the connection
    /// itself is usually no longer trustworthy either.
    pub fn is_codec_error(&self) -> bool {
        matches!(
            self,
            ProtocolError::UnsupportedType { .. }
                | ProtocolError::TopLevelFieldOnly { .. }
                | ProtocolError::MissingAnnotation { .. }
                | ProtocolError::LengthViolation { .. }
                | ProtocolError::SizeMismatch { .. }
                | ProtocolError::BufferOverrun { .. }
                | ProtocolError::MalformedText { .. }
                | ProtocolError::OversizedFrame(_)
                | ProtocolError::UnknownMessageType(_)
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
