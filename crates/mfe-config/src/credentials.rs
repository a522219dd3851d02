//! Secure storage for profile secrets (passwords, tokens)
//!
//! Properties listed under a profile's `secure` array never appear in the
//! plaintext layer files. Their values are kept in a credential store, keyed
//! by `<layer path>#<profile json path>.properties.<name>` (see
//! [`ArgSource::secure_key`](crate::ArgSource::secure_key)).
//!
//! # Stores
//!
//! - [`SecretsFile`]: TOML file with `0o600` permissions (plaintext at rest)
//! - [`KeyringStore`]: OS credential vault (feature `keyring`)
//! - [`AutoStore`]: keyring first, falls back to the file
//! - [`MemoryStore`]: process-local map, for embedding and tests
//!
//! # Secrets File Format
//!
//! ```toml
//! # ~/.mfe/secrets.toml (0o600)
//! [secrets]
//! "/home/u/.mfe/mfe.config.json#profiles.lpar1.properties.password" = "\"hunter2\""
//! ```
//!
//! Values are stored JSON-encoded so that non-string secrets round-trip.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Top-level structure of secrets.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SecretsFileContent {
    /// Secret values keyed by secure property key
    #[serde(default)]
    pub secrets: HashMap<String, String>,
}

/// Errors from credential store operations
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// IO error reading/writing credential store
    #[error("credential store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("credential store serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// TOML parse error
    #[error("credential store parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The OS credential vault rejected the request
    #[error("credential vault error: {0}")]
    Vault(String),
}

/// Result type for credential operations
pub type CredentialResult<T> = Result<T, CredentialError>;

/// Trait for credential storage backends
///
/// Methods take `&self` so a store can be shared behind an `Arc` by the
/// configuration source and its callers; implementations synchronise
/// internally.
pub trait CredentialStore: Send + Sync {
    /// Get the secret stored under `key`
    fn get(&self, key: &str) -> CredentialResult<Option<String>>;

    /// Store a secret under `key`
    fn set(&self, key: &str, secret: &str) -> CredentialResult<()>;

    /// Remove a secret. Returns true if it existed.
    fn remove(&self, key: &str) -> CredentialResult<bool>;

    /// List all stored key → secret pairs
    fn list(&self) -> CredentialResult<HashMap<String, String>>;

    /// Whether secrets are kept in an OS credential vault rather than plaintext
    fn is_vault(&self) -> bool;
}

/// TOML-based credential store
///
/// Reads/writes `secrets.toml` in the home directory. File permissions are
/// set to `0o600` (owner read/write only).
pub struct SecretsFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SecretsFile {
    /// Create a SecretsFile inside the given home directory
    pub fn in_home(home_dir: &Path) -> Self {
        Self::with_path(home_dir.join("secrets.toml"))
    }

    /// Create a SecretsFile with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Get the path to the secrets file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the secrets file from disk
    fn read(&self) -> CredentialResult<SecretsFileContent> {
        if !self.path.exists() {
            return Ok(SecretsFileContent::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(SecretsFileContent::default());
        }

        match toml::from_str(&content) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                warn!(
                    "Failed to parse secrets file at {}: {}. Treating as empty.",
                    self.path.display(),
                    e
                );
                Ok(SecretsFileContent::default())
            }
        }
    }

    /// Write the secrets file to disk with restricted permissions
    fn write(&self, content: &SecretsFileContent) -> CredentialResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(content)?;
        std::fs::write(&self.path, toml_str)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        debug!("Wrote {} secrets to {}", content.secrets.len(), self.path.display());
        Ok(())
    }
}

impl CredentialStore for SecretsFile {
    fn get(&self, key: &str) -> CredentialResult<Option<String>> {
        Ok(self.read()?.secrets.get(key).cloned())
    }

    fn set(&self, key: &str, secret: &str) -> CredentialResult<()> {
        let _guard = self.write_lock.lock();
        let mut content = self.read()?;
        content.secrets.insert(key.to_string(), secret.to_string());
        self.write(&content)
    }

    fn remove(&self, key: &str) -> CredentialResult<bool> {
        let _guard = self.write_lock.lock();
        let mut content = self.read()?;
        let existed = content.secrets.remove(key).is_some();
        if existed {
            self.write(&content)?;
        }
        Ok(existed)
    }

    fn list(&self) -> CredentialResult<HashMap<String, String>> {
        Ok(self.read()?.secrets)
    }

    fn is_vault(&self) -> bool {
        false
    }
}

/// In-memory credential store
#[derive(Debug, Default)]
pub struct MemoryStore {
    secrets: Mutex<HashMap<String, String>>,
    vault: bool,
}

impl MemoryStore {
    /// Create an empty store that reports itself as plaintext
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that reports itself as vault-backed
    pub fn vault() -> Self {
        Self {
            secrets: Mutex::new(HashMap::new()),
            vault: true,
        }
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> CredentialResult<Option<String>> {
        Ok(self.secrets.lock().get(key).cloned())
    }

    fn set(&self, key: &str, secret: &str) -> CredentialResult<()> {
        self.secrets.lock().insert(key.to_string(), secret.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CredentialResult<bool> {
        Ok(self.secrets.lock().remove(key).is_some())
    }

    fn list(&self) -> CredentialResult<HashMap<String, String>> {
        Ok(self.secrets.lock().clone())
    }

    fn is_vault(&self) -> bool {
        self.vault
    }
}

/// Keyring-backed credential store (OS-native secret storage)
///
/// Uses the system keyring (macOS Keychain, Windows Credential Vault,
/// Linux Secret Service / libsecret) via the `keyring` crate. Every secure
/// key is a separate entry under the service name `mfe`. The vault cannot
/// enumerate entries, so the store remembers the keys it has touched.
#[cfg(feature = "keyring")]
pub struct KeyringStore {
    service: String,
    touched: Mutex<Vec<String>>,
}

#[cfg(feature = "keyring")]
impl KeyringStore {
    /// Create a store using the `mfe` service name
    pub fn new() -> Self {
        Self {
            service: "mfe".to_string(),
            touched: Mutex::new(Vec::new()),
        }
    }

    fn entry(&self, key: &str) -> CredentialResult<keyring::Entry> {
        keyring::Entry::new(&self.service, key).map_err(|e| CredentialError::Vault(e.to_string()))
    }

    fn remember(&self, key: &str) {
        let mut touched = self.touched.lock();
        if !touched.iter().any(|k| k == key) {
            touched.push(key.to_string());
        }
    }
}

#[cfg(feature = "keyring")]
impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "keyring")]
impl CredentialStore for KeyringStore {
    fn get(&self, key: &str) -> CredentialResult<Option<String>> {
        let entry = self.entry(key)?;
        match entry.get_password() {
            Ok(secret) => {
                self.remember(key);
                Ok(Some(secret))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CredentialError::Vault(e.to_string())),
        }
    }

    fn set(&self, key: &str, secret: &str) -> CredentialResult<()> {
        self.entry(key)?
            .set_password(secret)
            .map_err(|e| CredentialError::Vault(e.to_string()))?;
        self.remember(key);
        Ok(())
    }

    fn remove(&self, key: &str) -> CredentialResult<bool> {
        let entry = self.entry(key)?;
        self.touched.lock().retain(|k| k != key);
        match entry.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(CredentialError::Vault(e.to_string())),
        }
    }

    fn list(&self) -> CredentialResult<HashMap<String, String>> {
        let keys = self.touched.lock().clone();
        let mut result = HashMap::new();
        for key in keys {
            if let Some(secret) = self.get(&key)? {
                result.insert(key, secret);
            }
        }
        Ok(result)
    }

    fn is_vault(&self) -> bool {
        true
    }
}

/// Auto-selecting credential store that tries keyring first, falls back to file
///
/// When the `keyring` feature is enabled, attempts to use the OS keyring.
/// If keyring operations fail, transparently falls back to the TOML file store.
/// Without the `keyring` feature, this is equivalent to `SecretsFile`.
pub struct AutoStore {
    file: SecretsFile,
    #[cfg(feature = "keyring")]
    keyring: KeyringStore,
}

impl AutoStore {
    /// Create a store whose file fallback lives in `home_dir`
    pub fn in_home(home_dir: &Path) -> Self {
        Self {
            file: SecretsFile::in_home(home_dir),
            #[cfg(feature = "keyring")]
            keyring: KeyringStore::new(),
        }
    }
}

impl CredentialStore for AutoStore {
    fn get(&self, key: &str) -> CredentialResult<Option<String>> {
        #[cfg(feature = "keyring")]
        {
            match self.keyring.get(key) {
                Ok(Some(secret)) => return Ok(Some(secret)),
                Ok(None) => {}
                Err(e) => {
                    debug!("Keyring get failed for {}, falling back to file: {}", key, e);
                }
            }
        }
        self.file.get(key)
    }

    fn set(&self, key: &str, secret: &str) -> CredentialResult<()> {
        #[cfg(feature = "keyring")]
        {
            match self.keyring.set(key, secret) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!("Keyring set failed for {}, falling back to file: {}", key, e);
                }
            }
        }
        self.file.set(key, secret)
    }

    fn remove(&self, key: &str) -> CredentialResult<bool> {
        #[cfg(feature = "keyring")]
        {
            match self.keyring.remove(key) {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => {
                    debug!("Keyring remove failed for {}, falling back to file: {}", key, e);
                }
            }
        }
        self.file.remove(key)
    }

    fn list(&self) -> CredentialResult<HashMap<String, String>> {
        #[cfg(feature = "keyring")]
        {
            let mut combined = match self.keyring.list() {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("Keyring list failed, using file only: {}", e);
                    HashMap::new()
                }
            };
            if let Ok(file_entries) = self.file.list() {
                for (k, v) in file_entries {
                    combined.entry(k).or_insert(v);
                }
            }
            return Ok(combined);
        }
        #[cfg(not(feature = "keyring"))]
        self.file.list()
    }

    fn is_vault(&self) -> bool {
        cfg!(feature = "keyring")
    }
}

/// Encode a secret value for storage.
pub fn encode_secret(value: &serde_json::Value) -> String {
    value.to_string()
}

/// Decode a stored secret; raw text that is not JSON is kept as a string.
pub fn decode_secret(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}
