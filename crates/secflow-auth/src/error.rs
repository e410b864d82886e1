use secflow_cache::StoreError;
use secflow_core::{AppError, errors::codes};
use thiserror::Error;

use crate::claims::TokenKind;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, malformed token or unexpected claims.
    #[error("Invalid token")]
    Invalid,

    #[error("Token has expired")]
    Expired,

    /// Refresh token whose id is no longer in the store.
    #[error("Refresh token has been revoked")]
    Revoked,

    #[error("Expected {expected} token, got {found} token")]
    WrongKind {
        expected: TokenKind,
        found: TokenKind,
    },

    #[error("Invalid signing configuration: {0}")]
    Misconfigured(String),

    #[error("Failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("Token store error: {0}")]
    Store(#[from] StoreError),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid | TokenError::WrongKind { .. } => AppError::unauthorized(err),
            TokenError::Expired => AppError::unauthorized(err).with_code(codes::TOKEN_EXPIRED),
            TokenError::Revoked => AppError::revoked_token(),
            TokenError::Misconfigured(_) | TokenError::Signing(_) | TokenError::Store(_) => {
                AppError::internal(err)
            }
        }
    }
}
