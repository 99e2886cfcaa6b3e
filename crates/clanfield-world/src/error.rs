//! Error types for the `clanfield-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

/// Errors that can occur in the random source or the resource field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// A caller broke a local contract: inverted range, negative standard
    /// deviation, negative consumption amount, empty choice input.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: String,
    },

    /// A grid was requested with a zero-sized axis.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// A field or distribution parameter is out of range.
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// What was wrong with the parameter.
        reason: String,
    },
}

impl WorldError {
    /// Shorthand for [`WorldError::InvalidArgument`].
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`WorldError::InvalidParameter`].
    pub fn invalid_parameter(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }
}
