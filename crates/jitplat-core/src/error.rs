//! Error types shared by the device and platform model.

use std::fmt;

/// Coarse classification of an error, used by callers to pick a fallback
/// policy without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Unimplemented,
    FailedPrecondition,
    ResourceExhausted,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Unimplemented => "UNIMPLEMENTED",
            ErrorKind::FailedPrecondition => "FAILED_PRECONDITION",
            ErrorKind::ResourceExhausted => "RESOURCE_EXHAUSTED",
            ErrorKind::Internal => "INTERNAL",
        };
        f.write_str(s)
    }
}

/// Errors raised by the core device, allocator, and client model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// An allow-list token was not a valid integer.
    #[error("Could not parse entry in 'visible_device_list': '{entry}'. visible_device_list = {list}")]
    InvalidVisibleDeviceEntry {
        /// The offending token.
        entry: String,
        /// The full allow-list string as given.
        list: String,
    },

    /// A device ordinal does not exist on the platform.
    #[error("device ordinal {ordinal} is out of range for platform {platform} ({device_count} devices)")]
    DeviceOrdinalOutOfRange {
        ordinal: i32,
        platform: String,
        device_count: usize,
    },

    /// A platform offers no device a client could use.
    #[error("platform {platform} has no visible devices")]
    NoVisibleDevices { platform: String },

    /// An allocation could not be satisfied.
    #[error("out of memory while trying to allocate {bytes} bytes on device {ordinal} of platform {platform}")]
    ResourceExhausted {
        bytes: u64,
        ordinal: i32,
        platform: String,
    },

    /// A buffer was released to an allocator that does not own it.
    #[error("buffer {handle} is not owned by this allocator")]
    UnknownBuffer { handle: u64 },

    /// An allocator was asked for a stream it is not bound to.
    #[error("allocator for platform {platform} is not bound to a stream")]
    NoStream { platform: String },
}

impl CoreError {
    /// The classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidVisibleDeviceEntry { .. }
            | CoreError::DeviceOrdinalOutOfRange { .. }
            | CoreError::UnknownBuffer { .. } => ErrorKind::InvalidArgument,
            CoreError::ResourceExhausted { .. } => ErrorKind::ResourceExhausted,
            CoreError::NoStream { .. } | CoreError::NoVisibleDevices { .. } => {
                ErrorKind::FailedPrecondition
            }
        }
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
