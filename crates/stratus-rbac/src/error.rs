//! RBAC error types.

use stratus_core::error::StratusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RbacError {
    /// Infrastructure fault while resolving permissions. A permission
    /// the user simply does not hold is `Ok(false)`, never an error.
    #[error("permission resolution failed: {0}")]
    Resolution(String),
}

impl From<RbacError> for StratusError {
    fn from(err: RbacError) -> Self {
        match err {
            RbacError::Resolution(msg) => StratusError::Internal(msg),
        }
    }
}
