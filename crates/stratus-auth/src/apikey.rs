//! Per-module API-key issuance and the tenant credential store.
//!
//! Raw keys look like `auth_dGhpcnR5LXR3by1yYW5kb20tYnl0ZXM...`: a
//! module prefix followed by 32 random bytes, base64url-encoded. The
//! raw key is only ever held by the caller; at rest a key is the
//! (SHA-256 lookup hash, `enc:v1:` envelope) pair on the tenant row.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use stratus_core::error::{StratusError, StratusResult};
use stratus_core::models::tenant::{ApiKeyRecord, Module, Tenant, TenantStatus};
use stratus_core::repository::TenantRepository;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AuthError;
use crate::secret::SecretCodec;

/// Minimum length of the opaque part of a raw key. Shorter values are
/// rejected before any store round-trip.
const MIN_OPAQUE_LEN: usize = 20;

/// Generate a raw API key for a module: prefix + 32 random bytes,
/// base64url without padding.
pub fn generate_key(module: Module) -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    format!("{}{}", module.key_prefix(), URL_SAFE_NO_PAD.encode(bytes))
}

/// SHA-256 hash of a raw key, hex-encoded. This is the value stored in
/// the tenant row's `key_hash` column and used for lookup.
pub fn key_lookup_hash(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a raw key and its at-rest record for one module.
pub fn issue_key(codec: &SecretCodec, module: Module) -> StratusResult<(String, ApiKeyRecord)> {
    let raw = generate_key(module);
    let record = ApiKeyRecord {
        key_hash: key_lookup_hash(&raw),
        key_cipher: codec.encrypt(&raw).map_err(StratusError::from)?,
    };
    Ok((raw, record))
}

/// Compare two byte strings without short-circuiting on the first
/// mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (left, right) in a.iter().zip(b.iter()) {
        diff |= left ^ right;
    }
    diff == 0
}

/// Authenticates SDK requests by per-module API key and issues/rotates
/// keys.
///
/// Generic over the tenant repository so the credential layer has no
/// dependency on the database crate.
pub struct CredentialStore<T: TenantRepository> {
    tenants: T,
    codec: SecretCodec,
}

impl<T: TenantRepository> CredentialStore<T> {
    pub fn new(tenants: T, codec: SecretCodec) -> Self {
        Self { tenants, codec }
    }

    /// Resolve the tenant owning `raw_key`.
    ///
    /// The key's module prefix is parsed and validated against the
    /// resolved tenant's enabled-module set rather than trusted. A key
    /// whose tenant is not `active`, or whose module is disabled, fails
    /// exactly like an unknown key.
    pub async fn authenticate(&self, raw_key: &str) -> StratusResult<Tenant> {
        let Some(module) = Module::from_key_prefix(raw_key) else {
            return Err(AuthError::InvalidApiKey.into());
        };
        if raw_key.len() < module.key_prefix().len() + MIN_OPAQUE_LEN {
            return Err(AuthError::InvalidApiKey.into());
        }

        let hash = key_lookup_hash(raw_key);
        let tenant = match self.tenants.get_by_api_key_hash(&hash).await {
            Ok(t) => t,
            Err(StratusError::NotFound { .. }) => {
                debug!(module = module.as_str(), "API key not found");
                return Err(AuthError::InvalidApiKey.into());
            }
            Err(e) => return Err(e),
        };

        // The hash must have matched the column for the module the
        // prefix claims, not some other module's key.
        let Some(record) = tenant.api_keys.get(&module) else {
            return Err(AuthError::InvalidApiKey.into());
        };
        if record.key_hash != hash {
            return Err(AuthError::InvalidApiKey.into());
        }

        // Decryption failure is a server fault, not a bad credential.
        let stored = self.codec.decrypt(&record.key_cipher).map_err(StratusError::from)?;
        if !constant_time_eq(stored.as_bytes(), raw_key.as_bytes()) {
            return Err(AuthError::InvalidApiKey.into());
        }

        if tenant.status != TenantStatus::Active {
            info!(tenant_id = %tenant.id, "API key for non-active tenant rejected");
            return Err(AuthError::InvalidApiKey.into());
        }
        if !tenant.module_enabled(module) {
            info!(
                tenant_id = %tenant.id,
                module = module.as_str(),
                "API key for disabled module rejected"
            );
            return Err(AuthError::InvalidApiKey.into());
        }

        Ok(tenant)
    }

    /// Generate a fresh key for a module. Returns the raw key (shown to
    /// the caller exactly once) and the at-rest record.
    pub fn issue(&self, module: Module) -> StratusResult<(String, ApiKeyRecord)> {
        issue_key(&self.codec, module)
    }

    /// Replace a tenant's key for one module. The previous raw key
    /// stops resolving at the next lookup; last write wins.
    pub async fn rotate(&self, tenant_id: Uuid, module: Module) -> StratusResult<String> {
        let tenant = self.tenants.get_by_id(tenant_id).await?;
        if !tenant.module_enabled(module) {
            return Err(StratusError::Validation {
                message: format!("module {} is not enabled", module.as_str()),
            });
        }

        let (raw, record) = self.issue(module)?;
        self.tenants.set_module_key(tenant_id, module, record).await?;
        info!(tenant_id = %tenant_id, module = module.as_str(), "API key rotated");
        Ok(raw)
    }
}
