//! Authentication configuration.

/// Configuration for the authentication services.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 private key for JWT signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for JWT verification.
    pub jwt_public_key_pem: String,
    /// Session token lifetime in seconds (default: 28_800 = 8 hours).
    pub token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id
    /// verification.
    pub pepper: Option<String>,
    /// Application secret the at-rest secret codec derives its key
    /// from. Operational configuration; changing it orphans every
    /// stored envelope.
    pub app_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            token_lifetime_secs: 28_800,
            jwt_issuer: "stratus".into(),
            pepper: None,
            app_secret: String::new(),
        }
    }
}
