//! Error taxonomy shared by the whole crate.
//!
//! Three failure classes, all fatal for the current frame:
//! - [`Error::Construction`]: a GPU resource failed to come up at startup.
//! - [`Error::InvariantViolation`]: a caller broke a precondition (missing
//!   parent, malformed percentage, negative flex weight, stride mismatch).
//! - [`Error::UnsupportedFormat`]: a color string or theme variable could
//!   not be resolved.
//!
//! Nothing is retried internally; a failed frame is abandoned.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("construction error: {0}")]
    Construction(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::Construction(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            Error::construction("x")
                .to_string()
                .contains("construction error:")
        );
        assert!(
            Error::invariant("x")
                .to_string()
                .contains("invariant violation:")
        );
        assert!(
            Error::unsupported_format("x")
                .to_string()
                .contains("unsupported format:")
        );
    }
}
