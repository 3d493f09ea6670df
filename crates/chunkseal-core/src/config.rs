use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::types::{CipherKind, EncryptionEpoch, PasswordEncoding, TextEncoding};

/// Cipher block size in octets; the chunk counter is scaled by blocks per chunk.
pub const CIPHER_BLOCK_SIZE: u64 = 16;

/// Top-level configuration (loaded from chunkseal.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunksealConfig {
    pub log: LogConfig,
    pub crypto: CryptoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

/// Settings consumed read-only by every chunk encrypt/decrypt call.
///
/// The chunk size must match exactly between the encrypting and decrypting
/// side: it feeds the GCM chunk counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Bytes per plaintext chunk (default: 5 MiB)
    pub upload_chunk_size: u64,
    /// Chunk IV length in octets (must be 16)
    pub crypto_iv_len: usize,
    /// Cipher for configurations that predate AES-GCM (default: AES-CBC)
    pub crypto_crypt_name: CipherKind,
    /// Digest used by the digest-import epochs (default: SHA-256)
    pub crypto_hash_name: String,
    /// Ceiling on the plaintext size of a single AES-GCM file in bytes
    pub crypto_gcm_max_file_size: u64,
    /// Epoch for newly created transfers (default: 3, GCM + PBKDF2)
    pub encryption_key_version_new_files: EncryptionEpoch,
    /// Default PBKDF2 rounds for newly created transfers
    pub encryption_password_hash_iterations_new_files: u32,
    /// Octets of entropy and encoded length for text passwords
    pub encryption_generated_password_length: usize,
    /// Encoding for generated text passwords: "base64" or "ascii85"
    pub encryption_generated_password_encoding: TextEncoding,
    /// Password version for generated passwords (default: 2, full 256-bit)
    pub encryption_random_password_version_new_files: PasswordEncoding,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            upload_chunk_size: 5 * 1024 * 1024,
            crypto_iv_len: 16,
            crypto_crypt_name: CipherKind::AesCbc,
            crypto_hash_name: "SHA-256".into(),
            crypto_gcm_max_file_size: 32 * 1024 * 1024 * 1024,
            encryption_key_version_new_files: EncryptionEpoch::GcmImportDerive,
            encryption_password_hash_iterations_new_files: 150_000,
            encryption_generated_password_length: 30,
            encryption_generated_password_encoding: TextEncoding::Base64,
            encryption_random_password_version_new_files: PasswordEncoding::FullEntropy256,
        }
    }
}

impl ChunksealConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> CoreResult<Self> {
        let config: ChunksealConfig = toml::from_str(s)?;
        config.crypto.validate()?;
        Ok(config)
    }

    /// Load config from a file path, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        debug!(path = %path.display(), "loading config from file");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

impl CryptoConfig {
    /// Number of 16-octet cipher blocks spanned by one chunk, rounded up.
    pub fn blocks_per_chunk(&self) -> u64 {
        self.upload_chunk_size.div_ceil(CIPHER_BLOCK_SIZE)
    }

    /// Scaled GCM counter of the last chunk the size ceiling still permits.
    pub fn max_chunk_counter(&self) -> u64 {
        if self.upload_chunk_size == 0 {
            return 0;
        }
        let last_index = self.crypto_gcm_max_file_size.saturating_sub(1) / self.upload_chunk_size;
        last_index.saturating_mul(self.blocks_per_chunk())
    }

    /// Check the settings a transfer depends on.
    pub fn validate(&self) -> CoreResult<()> {
        if self.upload_chunk_size == 0 {
            return Err(CoreError::Config("upload_chunk_size must be positive".into()));
        }
        if self.crypto_iv_len != 16 {
            return Err(CoreError::Config(format!(
                "crypto_iv_len must be 16, got {}",
                self.crypto_iv_len
            )));
        }
        if self.crypto_hash_name != "SHA-256" {
            return Err(CoreError::Config(format!(
                "unsupported crypto_hash_name {:?} (only SHA-256 yields an AES-256 key)",
                self.crypto_hash_name
            )));
        }
        if self.encryption_password_hash_iterations_new_files == 0 {
            return Err(CoreError::Config(
                "encryption_password_hash_iterations_new_files must be positive".into(),
            ));
        }
        if self.encryption_generated_password_length == 0 {
            return Err(CoreError::Config(
                "encryption_generated_password_length must be positive".into(),
            ));
        }

        // The chunk counter travels as a signed 32-bit value.
        let max_counter = self.max_chunk_counter();
        if max_counter > i32::MAX as u64 {
            return Err(CoreError::Config(format!(
                "crypto_gcm_max_file_size {} lets the chunk counter reach {max_counter}, above {}",
                self.crypto_gcm_max_file_size,
                i32::MAX
            )));
        }

        if self.encryption_password_hash_iterations_new_files < 10_000 {
            warn!(
                iterations = self.encryption_password_hash_iterations_new_files,
                "PBKDF2 iteration count is low for user-entered passwords"
            );
        }

        Ok(())
    }
}
