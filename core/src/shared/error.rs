use thiserror::Error;

/// The four error kinds bubbled from the store layer up to the job boundary.
#[derive(Error, Debug)]
pub enum AppError {
    /// Transient store error (connection loss, timeout). Retried at the
    /// batch boundary by the caller; this variant is what survives after
    /// retries are exhausted.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unparseable row, bad date, unknown BIN format. Counted and logged
    /// with a row number by the ingestor; never fatal on its own.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// Unique-key conflict that survived the UPDATE-retry path (e.g. an
    /// attempt to delete a protected opportunity).
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A logic invariant was violated (e.g. a trigger enabled with zero
    /// keywords, or a NULL pharmacy_id on a prescription). Fatal to the
    /// scan of that trigger/pharmacy; other triggers continue.
    #[error("invariant breach: {0}")]
    InvariantBreach(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Database,
    Malformed,
    Constraint,
    InvariantBreach,
    Validation,
    Configuration,
    Internal,
}

impl From<&AppError> for ErrorKind {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::Database(_) => ErrorKind::Database,
            AppError::Malformed(_) => ErrorKind::Malformed,
            AppError::Constraint(_) => ErrorKind::Constraint,
            AppError::InvariantBreach(_) => ErrorKind::InvariantBreach,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Configuration(_) => ErrorKind::Configuration,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}
