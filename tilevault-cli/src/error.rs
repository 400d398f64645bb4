//! CLI error types.

use std::fmt;

use tilevault::catalog::CatalogError;
use tilevault::resolver::DeleteError;
use tilevault::session::SessionError;
use tilevault::transfer::TransferError;

/// Errors surfaced to the CLI user.
#[derive(Debug)]
pub enum CliError {
    /// Failed to read an input file.
    Io(std::io::Error),

    /// Catalog backend failure.
    Catalog(CatalogError),

    /// Session-level failure (e.g. the initial load).
    Session(SessionError),

    /// Batch transfer failure.
    Transfer(TransferError),

    /// Delete resolution failure.
    Delete(DeleteError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::Catalog(e) => write!(f, "Catalog error: {}", e),
            CliError::Session(e) => write!(f, "{}", e),
            CliError::Transfer(e) => write!(f, "Transfer error: {}", e),
            CliError::Delete(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            CliError::Catalog(e) => Some(e),
            CliError::Session(e) => Some(e),
            CliError::Transfer(e) => Some(e),
            CliError::Delete(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        CliError::Catalog(e)
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Session(e)
    }
}

impl From<TransferError> for CliError {
    fn from(e: TransferError) -> Self {
        CliError::Transfer(e)
    }
}

impl From<DeleteError> for CliError {
    fn from(e: DeleteError) -> Self {
        CliError::Delete(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_display() {
        let err: CliError = std::io::Error::other("disk gone").into();
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn test_cli_error_from_delete_error() {
        let err: CliError = DeleteError::NothingToDelete.into();
        assert!(err.to_string().contains("nothing valid to delete"));
    }
}
