//! Per-transfer encryption parameters shared by every chunk of a file.

use secrecy::SecretString;

use chunkseal_core::{CryptoConfig, EncryptionEpoch, PasswordEncoding, TextEncoding};

use crate::entropy;
use crate::error::{CryptoError, CryptoResult};
use crate::GCM_FILE_IV_SIZE;

/// Everything key derivation and the chunk ciphers need for one file.
///
/// Read-only once built; chunk operations borrow it.
#[derive(Debug, Clone)]
pub struct EncryptionDetails {
    /// Password text exactly as stored/entered (encoded for generated passwords)
    pub password: SecretString,
    pub epoch: EncryptionEpoch,
    /// PBKDF2 salt; its UTF-8 bytes are used
    pub salt: String,
    pub password_version: PasswordEncoding,
    pub password_encoding: TextEncoding,
    /// Overrides `encryption_password_hash_iterations_new_files` when set
    pub password_hash_iterations: Option<u32>,
    /// Decoded per-file IV (12 octets for the GCM epochs)
    pub file_iv: Option<Vec<u8>>,
    /// Base64 client entropy carried alongside the transfer
    pub client_entropy: Option<String>,
}

impl EncryptionDetails {
    /// Details for a user-entered text password.
    pub fn new(password: SecretString, epoch: EncryptionEpoch, salt: impl Into<String>) -> Self {
        Self {
            password,
            epoch,
            salt: salt.into(),
            password_version: PasswordEncoding::TextPassword,
            password_encoding: TextEncoding::Base64,
            password_hash_iterations: None,
            file_iv: None,
            client_entropy: None,
        }
    }

    /// Fresh details for a new file: epoch and rounds from the config, random
    /// salt, and a random file IV for the GCM epochs.
    pub fn for_new_file(
        password: SecretString,
        password_version: PasswordEncoding,
        password_encoding: TextEncoding,
        config: &CryptoConfig,
    ) -> Self {
        let epoch = config.encryption_key_version_new_files;
        let file_iv = epoch
            .is_gcm()
            .then(|| entropy::random_octets(GCM_FILE_IV_SIZE));

        Self {
            password,
            epoch,
            salt: entropy::generate_base64_entropy(32),
            password_version,
            password_encoding,
            password_hash_iterations: Some(config.encryption_password_hash_iterations_new_files),
            file_iv,
            client_entropy: Some(entropy::generate_client_entropy()),
        }
    }

    pub fn with_password_version(
        mut self,
        version: PasswordEncoding,
        encoding: TextEncoding,
    ) -> Self {
        self.password_version = version;
        self.password_encoding = encoding;
        self
    }

    pub fn with_hash_iterations(mut self, iterations: u32) -> Self {
        self.password_hash_iterations = Some(iterations);
        self
    }

    pub fn with_file_iv(mut self, file_iv: impl Into<Vec<u8>>) -> Self {
        self.file_iv = Some(file_iv.into());
        self
    }

    pub fn with_client_entropy(mut self, client_entropy: impl Into<String>) -> Self {
        self.client_entropy = Some(client_entropy.into());
        self
    }

    /// PBKDF2 rounds for this file.
    pub fn hash_iterations(&self, config: &CryptoConfig) -> u32 {
        self.password_hash_iterations
            .unwrap_or(config.encryption_password_hash_iterations_new_files)
    }

    /// The 12-octet file IV, for GCM epochs.
    pub fn gcm_file_iv(&self) -> CryptoResult<&[u8]> {
        let file_iv = self.file_iv.as_deref().unwrap_or_default();
        if file_iv.len() != GCM_FILE_IV_SIZE {
            return Err(CryptoError::InvalidFileIvLength {
                expected: GCM_FILE_IV_SIZE,
                actual: file_iv.len(),
            });
        }
        Ok(file_iv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_new_file_gcm() {
        let config = CryptoConfig::default();
        let details = EncryptionDetails::for_new_file(
            SecretString::from("pw"),
            PasswordEncoding::TextPassword,
            TextEncoding::Base64,
            &config,
        );

        assert_eq!(details.epoch, EncryptionEpoch::GcmImportDerive);
        assert_eq!(details.gcm_file_iv().unwrap().len(), GCM_FILE_IV_SIZE);
        assert_eq!(details.hash_iterations(&config), 150_000);
        assert!(!details.salt.is_empty());
    }

    #[test]
    fn test_for_new_file_cbc_has_no_file_iv() {
        let config = CryptoConfig {
            encryption_key_version_new_files: EncryptionEpoch::CbcImportDerive,
            ..CryptoConfig::default()
        };
        let details = EncryptionDetails::for_new_file(
            SecretString::from("pw"),
            PasswordEncoding::TextPassword,
            TextEncoding::Base64,
            &config,
        );

        assert!(details.file_iv.is_none());
    }

    #[test]
    fn test_salts_are_unique() {
        let config = CryptoConfig::default();
        let a = EncryptionDetails::for_new_file(
            SecretString::from("pw"),
            PasswordEncoding::TextPassword,
            TextEncoding::Base64,
            &config,
        );
        let b = EncryptionDetails::for_new_file(
            SecretString::from("pw"),
            PasswordEncoding::TextPassword,
            TextEncoding::Base64,
            &config,
        );
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.file_iv, b.file_iv);
    }

    #[test]
    fn test_iteration_override() {
        let config = CryptoConfig::default();
        let details = EncryptionDetails::new(
            SecretString::from("pw"),
            EncryptionEpoch::CbcImportDerive,
            "salt",
        );
        assert_eq!(details.hash_iterations(&config), 150_000);
        assert_eq!(details.with_hash_iterations(1000).hash_iterations(&config), 1000);
    }

    #[test]
    fn test_gcm_file_iv_missing() {
        let details = EncryptionDetails::new(
            SecretString::from("pw"),
            EncryptionEpoch::GcmDigestImport,
            "salt",
        );
        assert!(matches!(
            details.gcm_file_iv(),
            Err(CryptoError::InvalidFileIvLength { actual: 0, .. })
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let details = EncryptionDetails::new(
            SecretString::from("hunter2"),
            EncryptionEpoch::CbcDigestImport,
            "salt",
        );
        assert!(!format!("{details:?}").contains("hunter2"));
    }
}
