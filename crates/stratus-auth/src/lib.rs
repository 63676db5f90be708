//! Stratus Auth — secret codec, API-key credential store, password
//! verification, and JWT issuance/validation.

pub mod apikey;
pub mod config;
pub mod error;
pub mod password;
pub mod platform;
pub mod secret;
pub mod service;
pub mod token;

pub use apikey::CredentialStore;
pub use config::AuthConfig;
pub use error::AuthError;
pub use platform::PlatformAuthService;
pub use secret::{DecryptionError, SecretCodec};
pub use service::{AuthService, LoginOutput};
pub use token::AccessTokenClaims;
