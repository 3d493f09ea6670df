use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Every way a chunk operation can fail. None of these are retried here.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A GCM epoch was used with a file IV that is not 12 octets.
    #[error("invalid file IV length for AES-GCM: {actual} octets (expected {expected})")]
    InvalidFileIvLength { expected: usize, actual: usize },

    #[error("maximum encrypted file size exceeded: {size} bytes (limit {limit})")]
    MaxEncryptedFileSizeExceeded { size: u64, limit: u64 },

    /// The scaled chunk counter would not fit the signed 32-bit IV field,
    /// so the chunk cannot get a GCM IV distinct from every other chunk.
    #[error("chunk {index} is beyond the last GCM chunk counter (max index {max_index} at chunk size {chunk_size})")]
    ChunkCounterOutOfRange {
        index: u64,
        max_index: u64,
        chunk_size: u64,
    },

    /// The chunk IV does not start with this file's IV.
    #[error("decryption verification failed: invalid IV")]
    InvalidIv,

    /// No chunk counter could be read from the chunk IV.
    #[error("decryption verification failed: bad IV chunk id")]
    BadIvChunkId,

    /// The chunk IV names a different position than the one the chunk arrived at.
    #[error("decryption verification failed: unexpected IV chunk id at position {expected}")]
    UnexpectedIvChunkId { expected: u64 },

    /// Authentication or padding failure, or an undecodable generated password.
    #[error("wrong password or corrupted data")]
    WrongPassword,

    #[error("bad password encoding configured: {0}")]
    BadPasswordEncodingConfigured(String),

    #[error("chunk encryption failed: {0}")]
    Encryption(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encoding error: {0}")]
    Encoding(String),
}
