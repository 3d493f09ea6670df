//! chunkseal-crypto: client-side chunk encryption for chunked file transfer
//!
//! Every chunk of a file is encrypted independently under a password-derived
//! key. Four epochs stay decodable forever:
//! ```text
//! tag  key                         cipher   chunk IV (16 octets)
//!  0   SHA-256(password)           AES-CBC  random
//!  1   PBKDF2-SHA256(password)     AES-CBC  random
//!  2   SHA-256(password)           AES-GCM  fileiv (12) || LE32(index * ceil(chunk_size / 16))
//!  3   PBKDF2-SHA256(password)     AES-GCM  fileiv (12) || LE32(index * ceil(chunk_size / 16))
//! ```
//!
//! Wire form of a chunk: `base64(IV || ciphertext [|| GCM tag])`.
//!
//! For the GCM epochs the IV doubles as the chunk's identity: decryption
//! checks the file IV prefix and the embedded chunk index against the chunk's
//! position before any ciphertext is touched, so swapped or substituted
//! chunks are rejected.

pub mod chunk;
pub mod details;
pub mod encoding;
pub mod entropy;
pub mod error;
pub mod iv;
pub mod kdf;
pub mod password;

pub use chunk::{
    decrypt_chunks, encrypt_chunk, is_file_size_valid_for_encryption, ChunkProgress,
    EncryptedChunk, ProgressStage,
};
pub use details::EncryptionDetails;
pub use encoding::{decode_from_string, encode_to_string};
pub use error::{CryptoError, CryptoResult};
pub use iv::{
    build_gcm_iv, decode_chunk_counter, encode_chunk_counter, max_chunk_index, ChunkCounter,
};
pub use kdf::{derive_cipher_key, derive_key, ChunkKey};
pub use password::{decode_password, generate_random_password, GeneratedPassword};

pub use chunkseal_core::{CipherKind, CryptoConfig, EncryptionEpoch, PasswordEncoding, TextEncoding};

/// Size of a chunk IV in octets (128-bit)
pub const IV_SIZE: usize = 16;

/// Per-file entropy mixed into every GCM chunk IV (96-bit)
pub const GCM_FILE_IV_SIZE: usize = 12;

/// Per-file IV size for the CBC epochs (128-bit)
pub const CBC_FILE_IV_SIZE: usize = 16;

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Raw octets in a full-entropy generated password (256-bit)
pub const RANDOM_PASSWORD_OCTETS: usize = 32;

/// Raw octets of client-supplied entropy
pub const CLIENT_ENTROPY_OCTETS: usize = 32;
