//! Error types for platform operations.

use std::net::IpAddr;

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during platform operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller passed an argument the operation cannot accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An object was handed to the cache without a valid identity.
    #[error("invalid object: {0}")]
    InvalidObject(String),

    /// A link with this ifindex does not exist.
    #[error("link not found: ifindex {ifindex}")]
    LinkNotFound {
        /// The ifindex that was looked up.
        ifindex: i32,
    },

    /// Interface not found by name.
    #[error("interface not found: {name}")]
    InterfaceNotFound {
        /// The interface name that was not found.
        name: String,
    },

    /// Some other object (address, route, sysctl key) does not exist.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing object.
        what: String,
    },

    /// The object already exists and the operation does not replace.
    #[error("already exists: {what}")]
    AlreadyExists {
        /// Description of the conflicting object.
        what: String,
    },

    /// No route covers the gateway of a route being added.
    #[error("network unreachable: no route to gateway {gateway}")]
    NetworkUnreachable {
        /// The unreachable gateway.
        gateway: IpAddr,
    },

    /// Operation not supported by this backend or link.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// A kernel-backed platform rejected the request.
    ///
    /// [`FakePlatform`](super::FakePlatform) never returns this; it is the
    /// contract for backends that talk to a real kernel and report errno
    /// values through [`Error::from_errno`].
    #[error("{operation}: {message} (errno {errno})")]
    Backend {
        /// The operation that failed.
        operation: String,
        /// The errno value reported by the backend.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Create a backend error from a (negative) kernel errno value.
    ///
    /// For kernel-backed [`Platform`](super::Platform) implementations.
    pub fn from_errno(errno: i32, operation: impl Into<String>) -> Self {
        let message = std::io::Error::from_raw_os_error(-errno).to_string();
        Self::Backend {
            operation: operation.into(),
            errno: -errno,
            message,
        }
    }

    /// Add context to this error.
    ///
    /// Backend errors get their operation replaced; other errors are
    /// returned unchanged. Kernel-backed implementations use it to name the
    /// [`Platform`](super::Platform) method that failed.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Backend { errno, message, .. } => Self::Backend {
                operation: operation.into(),
                errno,
                message,
            },
            other => other,
        }
    }

    /// Check if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::LinkNotFound { .. } | Self::InterfaceNotFound { .. } | Self::NotFound { .. } => {
                true
            }
            Self::Backend { errno, .. } => matches!(*errno, libc::ENOENT | libc::ENODEV),
            _ => false,
        }
    }

    /// Check if this is an "already exists" error.
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::AlreadyExists { .. } => true,
            Self::Backend { errno, .. } => *errno == libc::EEXIST,
            _ => false,
        }
    }

    /// Check if this error reports an unreachable gateway.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::NetworkUnreachable { .. } => true,
            Self::Backend { errno, .. } => *errno == libc::ENETUNREACH,
            _ => false,
        }
    }

    /// Get the errno value equivalent to this error, if there is one.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Backend { errno, .. } => Some(*errno),
            Self::LinkNotFound { .. } | Self::InterfaceNotFound { .. } => Some(libc::ENODEV),
            Self::NotFound { .. } => Some(libc::ENOENT),
            Self::AlreadyExists { .. } => Some(libc::EEXIST),
            Self::NetworkUnreachable { .. } => Some(libc::ENETUNREACH),
            Self::NotSupported(_) => Some(libc::EOPNOTSUPP),
            Self::InvalidArgument(_) | Self::InvalidObject(_) => Some(libc::EINVAL),
        }
    }
}
