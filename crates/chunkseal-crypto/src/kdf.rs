//! Key derivation: password → AES-256 chunk key, dispatched on the epoch.
//!
//! - digest-import epochs: `key = SHA-256(password octets)`
//! - import-derive epochs: `key = PBKDF2-HMAC-SHA256(password octets, salt, rounds)`

use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroize;

use chunkseal_core::{CipherKind, CryptoConfig, EncryptionEpoch};

use crate::details::EncryptionDetails;
use crate::error::{CryptoError, CryptoResult};
use crate::iv::{build_gcm_iv, random_iv};
use crate::password::decode_password;
use crate::{IV_SIZE, KEY_SIZE};

/// A 256-bit chunk key bound to the cipher of its epoch.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct ChunkKey {
    bytes: [u8; KEY_SIZE],
    cipher: CipherKind,
}

impl ChunkKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE], cipher: CipherKind) -> Self {
        Self { bytes, cipher }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    pub fn cipher(&self) -> CipherKind {
        self.cipher
    }
}

impl Drop for ChunkKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ChunkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkKey")
            .field("bytes", &"[REDACTED]")
            .field("cipher", &self.cipher)
            .finish()
    }
}

/// Derive the key and IV for chunk `chunk_index`.
///
/// For the GCM epochs the file IV is checked before any key material is
/// produced. For the CBC epochs every call gets a fresh random IV.
pub fn derive_key(
    chunk_index: u64,
    details: &EncryptionDetails,
    config: &CryptoConfig,
) -> CryptoResult<(ChunkKey, [u8; IV_SIZE])> {
    let iv = chunk_iv(chunk_index, details, config)?;
    let key = derive_cipher_key(details, config)?;
    Ok((key, iv))
}

/// The IV chunk `chunk_index` is encrypted under.
pub fn chunk_iv(
    chunk_index: u64,
    details: &EncryptionDetails,
    config: &CryptoConfig,
) -> CryptoResult<[u8; IV_SIZE]> {
    match details.epoch {
        EncryptionEpoch::CbcDigestImport | EncryptionEpoch::CbcImportDerive => Ok(random_iv()),
        EncryptionEpoch::GcmDigestImport | EncryptionEpoch::GcmImportDerive => build_gcm_iv(
            chunk_index,
            details.gcm_file_iv()?,
            config.upload_chunk_size,
        ),
    }
}

/// Derive the file's chunk key. The cipher comes from the epoch alone.
pub fn derive_cipher_key(
    details: &EncryptionDetails,
    config: &CryptoConfig,
) -> CryptoResult<ChunkKey> {
    if details.epoch.is_gcm() {
        details.gcm_file_iv()?;
    }

    let password = decode_password(
        &details.password,
        details.password_version,
        details.password_encoding,
    )?;

    let mut bytes = [0u8; KEY_SIZE];
    match details.epoch {
        EncryptionEpoch::CbcDigestImport | EncryptionEpoch::GcmDigestImport => {
            debug!(epoch = %details.epoch, "importing password digest as chunk key");
            let mut digest = Sha256::digest(password.as_slice());
            bytes.copy_from_slice(&digest);
            digest.as_mut_slice().zeroize();
        }
        EncryptionEpoch::CbcImportDerive | EncryptionEpoch::GcmImportDerive => {
            let rounds = details.hash_iterations(config);
            if rounds == 0 {
                return Err(CryptoError::KeyDerivation(
                    "PBKDF2 iteration count must be positive".into(),
                ));
            }
            debug!(epoch = %details.epoch, rounds, "deriving chunk key with PBKDF2");
            pbkdf2_hmac::<Sha256>(&password, details.salt.as_bytes(), rounds, &mut bytes);
        }
    }

    Ok(ChunkKey::from_bytes(bytes, details.epoch.cipher()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkseal_core::{PasswordEncoding, TextEncoding};
    use secrecy::SecretString;

    fn details(epoch: EncryptionEpoch) -> EncryptionDetails {
        EncryptionDetails::new(SecretString::from("test-password-123"), epoch, "salt")
            .with_hash_iterations(1000)
            .with_file_iv([9u8; 12])
    }

    #[test]
    fn test_digest_key_is_sha256_of_password() {
        let config = CryptoConfig::default();
        let key = derive_cipher_key(&details(EncryptionEpoch::CbcDigestImport), &config).unwrap();

        let expected = Sha256::digest(b"test-password-123");
        assert_eq!(key.as_bytes().as_slice(), expected.as_slice());
        assert_eq!(key.cipher(), CipherKind::AesCbc);
    }

    #[test]
    fn test_pbkdf2_known_answer() {
        // PBKDF2-HMAC-SHA256("password", "salt", 1, 32)
        let config = CryptoConfig::default();
        let details = EncryptionDetails::new(
            SecretString::from("password"),
            EncryptionEpoch::CbcImportDerive,
            "salt",
        )
        .with_hash_iterations(1);
        let key = derive_cipher_key(&details, &config).unwrap();

        let expected: [u8; 32] = [
            0x12, 0x0f, 0xb6, 0xcf, 0xfc, 0xf8, 0xb3, 0x2c, 0x43, 0xe7, 0x22, 0x52, 0x56, 0xc4,
            0xf8, 0x37, 0xa8, 0x65, 0x48, 0xc9, 0x2c, 0xcc, 0x35, 0x48, 0x08, 0x05, 0x98, 0x7c,
            0xb7, 0x0b, 0xe1, 0x7b,
        ];
        assert_eq!(key.as_bytes(), &expected);
    }

    #[test]
    fn test_pbkdf2_deterministic_and_salted() {
        let config = CryptoConfig::default();
        let a = derive_cipher_key(&details(EncryptionEpoch::GcmImportDerive), &config).unwrap();
        let b = derive_cipher_key(&details(EncryptionEpoch::GcmImportDerive), &config).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes(), "KDF must be deterministic");

        let mut other = details(EncryptionEpoch::GcmImportDerive);
        other.salt = "other-salt".into();
        let c = derive_cipher_key(&other, &config).unwrap();
        assert_ne!(a.as_bytes(), c.as_bytes(), "different salts must produce different keys");
    }

    #[test]
    fn test_iteration_count_matters() {
        let config = CryptoConfig::default();
        let a = derive_cipher_key(&details(EncryptionEpoch::CbcImportDerive), &config).unwrap();
        let b = derive_cipher_key(
            &details(EncryptionEpoch::CbcImportDerive).with_hash_iterations(1001),
            &config,
        )
        .unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let config = CryptoConfig::default();
        let result = derive_cipher_key(
            &details(EncryptionEpoch::CbcImportDerive).with_hash_iterations(0),
            &config,
        );
        assert!(matches!(result, Err(CryptoError::KeyDerivation(_))));
    }

    #[test]
    fn test_gcm_forces_aead_cipher() {
        let config = CryptoConfig {
            crypto_crypt_name: CipherKind::AesCbc,
            ..CryptoConfig::default()
        };
        let key = derive_cipher_key(&details(EncryptionEpoch::GcmDigestImport), &config).unwrap();
        assert_eq!(key.cipher(), CipherKind::AesGcm);
        assert_eq!(config.crypto_crypt_name, CipherKind::AesCbc);
    }

    #[test]
    fn test_gcm_iv_is_derived() {
        let config = CryptoConfig {
            upload_chunk_size: 4_194_304,
            ..CryptoConfig::default()
        };
        let (_, iv) = derive_key(1, &details(EncryptionEpoch::GcmImportDerive), &config).unwrap();
        assert_eq!(&iv[..12], &[9u8; 12]);
        assert_eq!(&iv[12..], &[0x00, 0x00, 0x04, 0x00]);
    }

    #[test]
    fn test_cbc_iv_is_random_per_call() {
        let config = CryptoConfig::default();
        let d = details(EncryptionEpoch::CbcDigestImport);
        let (_, iv1) = derive_key(0, &d, &config).unwrap();
        let (_, iv2) = derive_key(0, &d, &config).unwrap();
        assert_ne!(iv1, iv2);
    }

    #[test]
    fn test_gcm_bad_file_iv_fails_first() {
        let config = CryptoConfig::default();
        // The password is also undecodable; the file IV error must win.
        let details = EncryptionDetails::new(
            SecretString::from("%%%"),
            EncryptionEpoch::GcmImportDerive,
            "salt",
        )
        .with_password_version(PasswordEncoding::FullEntropy256, TextEncoding::Base64)
        .with_file_iv([0u8; 16]);

        let result = derive_key(0, &details, &config);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidFileIvLength { actual: 16, .. })
        ));
    }

    #[test]
    fn test_password_decode_failure_propagates() {
        let config = CryptoConfig::default();
        let details = EncryptionDetails::new(
            SecretString::from("%%%"),
            EncryptionEpoch::CbcDigestImport,
            "salt",
        )
        .with_password_version(PasswordEncoding::FullEntropy256, TextEncoding::Base64);

        assert!(matches!(
            derive_key(0, &details, &config),
            Err(CryptoError::WrongPassword)
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = ChunkKey::from_bytes([0x42; KEY_SIZE], CipherKind::AesGcm);
        assert!(format!("{key:?}").contains("REDACTED"));
    }
}
