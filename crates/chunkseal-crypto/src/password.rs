//! Password generation and decoding
//!
//! Two mutually exclusive password versions:
//! - `TextPassword`: the password text is used verbatim. Generated text
//!   passwords take N random octets, encode them, and keep the first N
//!   characters of the encoding. That truncation leaves less than N octets of
//!   entropy; existing transfers depend on it, so it stays.
//! - `FullEntropy256`: 32 random octets, base64-encoded in full.

use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use chunkseal_core::{CryptoConfig, PasswordEncoding, TextEncoding};

use crate::encoding::{base64_decode_lenient, encode_to_string};
use crate::entropy::random_octets;
use crate::error::{CryptoError, CryptoResult};
use crate::RANDOM_PASSWORD_OCTETS;

/// A freshly generated password, held by the caller for the whole transfer.
pub struct GeneratedPassword {
    pub version: PasswordEncoding,
    pub raw: Zeroizing<Vec<u8>>,
    pub encoding: TextEncoding,
    /// The encoded password handed to the user
    pub value: SecretString,
}

impl GeneratedPassword {
    pub fn raw_length(&self) -> usize {
        self.raw.len()
    }

    pub fn value_length(&self) -> usize {
        self.value.expose_secret().chars().count()
    }
}

impl std::fmt::Debug for GeneratedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedPassword")
            .field("version", &self.version)
            .field("raw", &"[REDACTED]")
            .field("raw_length", &self.raw_length())
            .field("encoding", &self.encoding)
            .field("value", &"[REDACTED]")
            .field("value_length", &self.value_length())
            .finish()
    }
}

/// Generate a password for a new transfer using the configured version and encoding.
pub fn generate_random_password(config: &CryptoConfig) -> CryptoResult<GeneratedPassword> {
    let version = config.encryption_random_password_version_new_files;
    match version {
        PasswordEncoding::TextPassword => {
            let len = config.encryption_generated_password_length;
            if len == 0 {
                return Err(CryptoError::BadPasswordEncodingConfigured(
                    "generated password length must be positive".into(),
                ));
            }
            let encoding = config.encryption_generated_password_encoding;
            let raw = Zeroizing::new(random_octets(len));
            let encoded = Zeroizing::new(encode_to_string(&raw, encoding));
            // Both codecs emit ASCII, so byte and char offsets agree.
            let value = SecretString::from(encoded[..len.min(encoded.len())].to_string());
            Ok(GeneratedPassword {
                version,
                raw,
                encoding,
                value,
            })
        }
        PasswordEncoding::FullEntropy256 => {
            let encoding = TextEncoding::Base64;
            let raw = Zeroizing::new(random_octets(RANDOM_PASSWORD_OCTETS));
            let value = SecretString::from(encode_to_string(&raw, encoding));
            Ok(GeneratedPassword {
                version,
                raw,
                encoding,
                value,
            })
        }
    }
}

/// Recover the raw octets that feed key derivation.
///
/// `FullEntropy256` passwords are decoded leniently: surrounding whitespace
/// and dropped `=` padding from copy and paste are tolerated.
/// A `FullEntropy256` password that does not decode to exactly 32 octets is
/// reported as [`CryptoError::WrongPassword`]: at this layer a mistyped
/// password and corrupted input look the same.
pub fn decode_password(
    value: &SecretString,
    version: PasswordEncoding,
    encoding: TextEncoding,
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    match version {
        PasswordEncoding::TextPassword => {
            Ok(Zeroizing::new(value.expose_secret().as_bytes().to_vec()))
        }
        PasswordEncoding::FullEntropy256 => {
            if encoding != TextEncoding::Base64 {
                return Err(CryptoError::BadPasswordEncodingConfigured(format!(
                    "full-entropy passwords must be base64, got {encoding}"
                )));
            }
            let raw = Zeroizing::new(
                base64_decode_lenient(value.expose_secret())
                    .map_err(|_| CryptoError::WrongPassword)?,
            );
            if raw.len() != RANDOM_PASSWORD_OCTETS {
                return Err(CryptoError::WrongPassword);
            }
            Ok(raw)
        }
    }
}
