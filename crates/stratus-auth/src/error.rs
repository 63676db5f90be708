//! Authentication error types.

use stratus_core::error::StratusError;
use thiserror::Error;

use crate::secret::DecryptionError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong tenant, unknown user, inactive account, or bad password.
    /// Deliberately does not say which.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Unknown key, inactive tenant, disabled module, or prefix
    /// mismatch. Deliberately does not say which.
    #[error("invalid API key")]
    InvalidApiKey,

    #[error("token has expired")]
    TokenExpired,

    #[error("token has been revoked")]
    RevokedToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for StratusError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::InvalidApiKey
            | AuthError::TokenExpired
            | AuthError::RevokedToken
            | AuthError::InvalidToken(_) => StratusError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => StratusError::Crypto(msg),
        }
    }
}

impl From<DecryptionError> for AuthError {
    fn from(err: DecryptionError) -> Self {
        AuthError::Crypto(err.to_string())
    }
}
