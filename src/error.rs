use thiserror::Error;

/// Marker raised by storage code that observed a cancelled token.
#[derive(Debug, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller input was structurally invalid.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("operation cancelled")]
    Cancelled,

    /// The uploaded stream could not be read.
    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),

    /// The storage collaborator failed; the whole operation is aborted.
    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        if err.is::<Cancelled>() {
            Self::Cancelled
        } else {
            Self::Storage(err)
        }
    }
}

impl From<Cancelled> for ServiceError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
