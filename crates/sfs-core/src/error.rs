use thiserror::Error;

pub type SfsResult<T> = Result<T, SfsError>;

/// Every failure a client operation can report.
///
/// The first six variants are the protocol taxonomy; callers match on them.
/// The rest are ambient failures from storage backends, configuration, or
/// primitive crypto helpers.
#[derive(Debug, Error)]
pub enum SfsError {
    /// Directory or store miss.
    #[error("not found: {0}")]
    NotFound(String),

    /// Wrong password, or no account record at the derived identifier.
    ///
    /// Carries no detail so the two cases look the same to the caller.
    #[error("authentication failed")]
    AuthenticationFailure,

    /// Signature/MAC mismatch, id-embedding mismatch, malformed padding or length.
    #[error("integrity check failed: {0}")]
    IntegrityFailure(String),

    /// The caller has no entry in a map that should contain them.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Duplicate account or duplicate local filename.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A non-owner attempted an owner-only action.
    #[error("not authorized: {0}")]
    AuthorizationFailure(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SfsError {
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::IntegrityFailure(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn access_denied(msg: impl Into<String>) -> Self {
        Self::AccessDenied(msg.into())
    }

    /// True for failures that indicate tampering or a broken verification chain.
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::IntegrityFailure(_))
    }
}
