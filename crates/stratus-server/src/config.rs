//! Environment-driven server configuration.

use stratus_auth::AuthConfig;
use stratus_db::DbConfig;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address, e.g. `0.0.0.0:8080`.
    pub bind: String,
    pub db: DbConfig,
    pub auth: AuthConfig,
    /// Catalog poll interval in seconds.
    pub catalog_poll_secs: u64,
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// JWT keys are read from PEM files so the key material never sits
    /// in the environment itself.
    pub fn from_env() -> Result<Self, std::io::Error> {
        let private_pem = std::fs::read_to_string(env_or(
            "STRATUS_JWT_PRIVATE_KEY_FILE",
            "keys/jwt-ed25519.pem",
        ))?;
        let public_pem = std::fs::read_to_string(env_or(
            "STRATUS_JWT_PUBLIC_KEY_FILE",
            "keys/jwt-ed25519.pub.pem",
        ))?;

        Ok(Self {
            bind: env_or("STRATUS_BIND", "0.0.0.0:8080"),
            db: DbConfig {
                url: env_or("STRATUS_DB_URL", "127.0.0.1:8000"),
                namespace: env_or("STRATUS_DB_NAMESPACE", "stratus"),
                database: env_or("STRATUS_DB_DATABASE", "main"),
                username: env_or("STRATUS_DB_USERNAME", "root"),
                password: env_or("STRATUS_DB_PASSWORD", "root"),
            },
            auth: AuthConfig {
                jwt_private_key_pem: private_pem,
                jwt_public_key_pem: public_pem,
                token_lifetime_secs: env_or("STRATUS_TOKEN_LIFETIME_SECS", "28800")
                    .parse()
                    .unwrap_or(28_800),
                jwt_issuer: env_or("STRATUS_JWT_ISSUER", "stratus"),
                pepper: std::env::var("STRATUS_PASSWORD_PEPPER").ok(),
                app_secret: env_or("STRATUS_APP_SECRET", ""),
            },
            catalog_poll_secs: env_or("STRATUS_CATALOG_POLL_SECS", "30")
                .parse()
                .unwrap_or(stratus_rbac::watcher::DEFAULT_POLL_INTERVAL.as_secs()),
        })
    }
}
