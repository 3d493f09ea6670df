//! Wire-level tags shared by the crypto engine, the config schema, and the CLI.
//!
//! The integer tags are stable wire constants. They are stored next to every
//! encrypted transfer and must never be renumbered; new variants are appended.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A frozen combination of key derivation method and chunk cipher.
///
/// Every epoch stays decodable forever. Newer epochs carry higher tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EncryptionEpoch {
    /// SHA-256 digest of the password imported as the key, AES-CBC, random IV per chunk.
    CbcDigestImport,
    /// PBKDF2-derived key, AES-CBC, random IV per chunk.
    CbcImportDerive,
    /// SHA-256 digest of the password imported as the key, AES-GCM, derived chunk IV.
    GcmDigestImport,
    /// PBKDF2-derived key, AES-GCM, derived chunk IV.
    GcmImportDerive,
}

impl EncryptionEpoch {
    pub const ALL: [EncryptionEpoch; 4] = [
        EncryptionEpoch::CbcDigestImport,
        EncryptionEpoch::CbcImportDerive,
        EncryptionEpoch::GcmDigestImport,
        EncryptionEpoch::GcmImportDerive,
    ];

    pub fn tag(self) -> u8 {
        match self {
            EncryptionEpoch::CbcDigestImport => 0,
            EncryptionEpoch::CbcImportDerive => 1,
            EncryptionEpoch::GcmDigestImport => 2,
            EncryptionEpoch::GcmImportDerive => 3,
        }
    }

    /// True for the epochs whose chunk IV is derived from the file IV and chunk index.
    pub fn is_gcm(self) -> bool {
        self.cipher() == CipherKind::AesGcm
    }

    pub fn cipher(self) -> CipherKind {
        match self {
            EncryptionEpoch::CbcDigestImport | EncryptionEpoch::CbcImportDerive => {
                CipherKind::AesCbc
            }
            EncryptionEpoch::GcmDigestImport | EncryptionEpoch::GcmImportDerive => {
                CipherKind::AesGcm
            }
        }
    }
}

impl TryFrom<u8> for EncryptionEpoch {
    type Error = CoreError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(EncryptionEpoch::CbcDigestImport),
            1 => Ok(EncryptionEpoch::CbcImportDerive),
            2 => Ok(EncryptionEpoch::GcmDigestImport),
            3 => Ok(EncryptionEpoch::GcmImportDerive),
            other => Err(CoreError::UnknownEpoch(other)),
        }
    }
}

impl From<EncryptionEpoch> for u8 {
    fn from(epoch: EncryptionEpoch) -> u8 {
        epoch.tag()
    }
}

impl fmt::Display for EncryptionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncryptionEpoch::CbcDigestImport => "cbc-digest-import",
            EncryptionEpoch::CbcImportDerive => "cbc-import-derive",
            EncryptionEpoch::GcmDigestImport => "gcm-digest-import",
            EncryptionEpoch::GcmImportDerive => "gcm-import-derive",
        };
        write!(f, "{name} ({})", self.tag())
    }
}

/// How the password text maps to the raw octets fed into key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PasswordEncoding {
    /// The password bytes are used verbatim (user-entered passwords).
    TextPassword,
    /// Exactly 32 random octets, base64-encoded for transport.
    FullEntropy256,
}

impl PasswordEncoding {
    pub fn tag(self) -> u8 {
        match self {
            PasswordEncoding::TextPassword => 1,
            PasswordEncoding::FullEntropy256 => 2,
        }
    }
}

impl TryFrom<u8> for PasswordEncoding {
    type Error = CoreError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(PasswordEncoding::TextPassword),
            2 => Ok(PasswordEncoding::FullEntropy256),
            other => Err(CoreError::UnknownPasswordEncoding(other)),
        }
    }
}

impl From<PasswordEncoding> for u8 {
    fn from(version: PasswordEncoding) -> u8 {
        version.tag()
    }
}

/// Binary-to-text codecs used for passwords and entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    Base64,
    /// Z85 alphabet, 4 octets to 5 symbols.
    Ascii85,
}

impl TextEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            TextEncoding::Base64 => "base64",
            TextEncoding::Ascii85 => "ascii85",
        }
    }
}

impl FromStr for TextEncoding {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base64" => Ok(TextEncoding::Base64),
            "ascii85" => Ok(TextEncoding::Ascii85),
            other => Err(CoreError::UnknownTextEncoding(other.to_string())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chunk cipher family, named the way the configuration names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherKind {
    #[serde(rename = "AES-CBC")]
    AesCbc,
    #[serde(rename = "AES-GCM")]
    AesGcm,
}

impl CipherKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CipherKind::AesCbc => "AES-CBC",
            CipherKind::AesGcm => "AES-GCM",
        }
    }
}

impl FromStr for CipherKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AES-CBC" => Ok(CipherKind::AesCbc),
            "AES-GCM" => Ok(CipherKind::AesGcm),
            other => Err(CoreError::UnknownCipher(other.to_string())),
        }
    }
}

impl fmt::Display for CipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_tags_are_stable() {
        assert_eq!(EncryptionEpoch::CbcDigestImport.tag(), 0);
        assert_eq!(EncryptionEpoch::CbcImportDerive.tag(), 1);
        assert_eq!(EncryptionEpoch::GcmDigestImport.tag(), 2);
        assert_eq!(EncryptionEpoch::GcmImportDerive.tag(), 3);

        for epoch in EncryptionEpoch::ALL {
            assert_eq!(EncryptionEpoch::try_from(epoch.tag()).unwrap(), epoch);
        }
        assert!(EncryptionEpoch::try_from(4).is_err());
    }

    #[test]
    fn test_epoch_cipher_dispatch() {
        assert!(!EncryptionEpoch::CbcDigestImport.is_gcm());
        assert!(!EncryptionEpoch::CbcImportDerive.is_gcm());
        assert!(EncryptionEpoch::GcmDigestImport.is_gcm());
        assert!(EncryptionEpoch::GcmImportDerive.is_gcm());

        assert_eq!(EncryptionEpoch::CbcImportDerive.cipher(), CipherKind::AesCbc);
        assert_eq!(EncryptionEpoch::GcmDigestImport.cipher(), CipherKind::AesGcm);
    }

    #[test]
    fn test_password_encoding_tags() {
        assert_eq!(PasswordEncoding::TextPassword.tag(), 1);
        assert_eq!(PasswordEncoding::FullEntropy256.tag(), 2);
        assert!(PasswordEncoding::try_from(0).is_err());
        assert!(PasswordEncoding::try_from(3).is_err());
    }

    #[test]
    fn test_text_encoding_names() {
        assert_eq!("base64".parse::<TextEncoding>().unwrap(), TextEncoding::Base64);
        assert_eq!("ascii85".parse::<TextEncoding>().unwrap(), TextEncoding::Ascii85);
        assert!("hex".parse::<TextEncoding>().is_err());
        assert_eq!(TextEncoding::Ascii85.to_string(), "ascii85");
    }

    #[test]
    fn test_cipher_names() {
        assert_eq!("AES-GCM".parse::<CipherKind>().unwrap(), CipherKind::AesGcm);
        assert_eq!("AES-CBC".parse::<CipherKind>().unwrap(), CipherKind::AesCbc);
        assert!("aes-gcm".parse::<CipherKind>().is_err());
    }
}
