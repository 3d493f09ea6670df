//! JSON envelope: one encrypted file plus the parameters needed to open it.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use chunkseal_crypto::entropy::decode_file_iv;
use chunkseal_crypto::{
    encoding::base64_encode, CryptoConfig, EncryptedChunk, EncryptionDetails, EncryptionEpoch,
    PasswordEncoding, TextEncoding,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub key_version: EncryptionEpoch,
    pub salt: String,
    pub password_version: PasswordEncoding,
    pub password_encoding: TextEncoding,
    pub password_hash_iterations: u32,
    /// Base64 file IV (GCM epochs only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fileiv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_entropy: Option<String>,
    /// Plaintext bytes per chunk at encryption time
    pub chunk_size: u64,
    /// Total plaintext size
    pub size: u64,
    /// Wire form of each chunk, in order
    pub chunks: Vec<String>,
}

impl Envelope {
    pub fn new(
        details: &EncryptionDetails,
        config: &CryptoConfig,
        size: u64,
        chunks: &[EncryptedChunk],
    ) -> Self {
        Self {
            key_version: details.epoch,
            salt: details.salt.clone(),
            password_version: details.password_version,
            password_encoding: details.password_encoding,
            password_hash_iterations: details.hash_iterations(config),
            fileiv: details.file_iv.as_deref().map(base64_encode),
            client_entropy: details.client_entropy.clone(),
            chunk_size: config.upload_chunk_size,
            size,
            chunks: chunks.iter().map(EncryptedChunk::to_wire).collect(),
        }
    }

    /// Rebuild the encryption details for `password`.
    pub fn details(&self, password: SecretString) -> Result<EncryptionDetails> {
        let mut details = EncryptionDetails::new(password, self.key_version, self.salt.clone())
            .with_password_version(self.password_version, self.password_encoding)
            .with_hash_iterations(self.password_hash_iterations);
        if let Some(fileiv) = &self.fileiv {
            let raw = decode_file_iv(fileiv, self.key_version).context("decoding fileiv")?;
            details = details.with_file_iv(raw);
        }
        if let Some(entropy) = &self.client_entropy {
            details = details.with_client_entropy(entropy.clone());
        }
        Ok(details)
    }

    pub fn encrypted_chunks(&self) -> Result<Vec<EncryptedChunk>> {
        self.chunks
            .iter()
            .enumerate()
            .map(|(i, wire)| {
                EncryptedChunk::from_wire(wire).with_context(|| format!("decoding chunk {i}"))
            })
            .collect()
    }

    /// Crypto settings with this envelope's chunk size, so counters line up.
    pub fn crypto_config(&self, base: &CryptoConfig) -> CryptoConfig {
        CryptoConfig {
            upload_chunk_size: self.chunk_size,
            ..base.clone()
        }
    }
}
