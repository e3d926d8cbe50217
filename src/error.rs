use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Invalid or contradictory construction options.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A vector length does not match the layer it is fed to.
    #[error("dimension mismatch: {what} has length {actual}, expected {expected}")]
    Dimension {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Returns a dimension error unless `actual == expected`.
#[inline]
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if actual != expected {
        return Err(Error::Dimension {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
