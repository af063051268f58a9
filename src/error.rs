//! Canonical error and result types for the crate.
//!
//! Each module reports its own error enum; [`Error`] collects them for
//! callers such as the binary that drive several modules at once.

use thiserror::Error;

use crate::{
    client::ClientError,
    geometry::GeometryError,
    server::ServerError,
    session::SessionError,
};

/// Top-level error type exposed by `framerelay`.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid frame geometry; fatal at startup.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// The server could not be set up.
    #[error(transparent)]
    Server(#[from] ServerError),
    /// A connection session failed.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Sending to a relay failed.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the crate [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_error_is_transparent() {
        let inner = crate::geometry::frame_size(0, 1, 4).expect_err("zero width");
        let err = Error::from(inner);
        assert_eq!(err.to_string(), inner.to_string());
    }
}
