//! Per-chunk encryption and ordered decryption
//!
//! Encrypted chunk format (binary, base64 on the wire):
//! ```text
//! [16 bytes: IV][N bytes: ciphertext]                       AES-CBC, PKCS#7 padded
//! [16 bytes: IV][N bytes: ciphertext][16 bytes: GCM tag]    AES-GCM, full 16-byte IV as nonce
//! ```
//!
//! For the GCM epochs decryption verifies every chunk IV before decrypting it:
//! the first 12 octets must equal the file IV and the counter must name the
//! chunk's position in the sequence. A swapped, duplicated, or foreign chunk
//! fails verification without touching the cipher.

use aes::Aes256;
use aes_gcm::{
    aead::{consts::U16, Aead, KeyInit},
    AesGcm, Nonce,
};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use tracing::{debug, warn};

use chunkseal_core::{CipherKind, CryptoConfig, EncryptionEpoch};

use crate::details::EncryptionDetails;
use crate::encoding::{base64_decode, base64_encode};
use crate::error::{CryptoError, CryptoResult};
use crate::iv::{decode_chunk_counter, ChunkCounter};
use crate::kdf::{derive_cipher_key, derive_key, ChunkKey};
use crate::{GCM_FILE_IV_SIZE, IV_SIZE};

/// AES-256-GCM with a 128-bit nonce.
type Aes256GcmIv128 = AesGcm<Aes256, U16>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// One encrypted chunk: `IV || ciphertext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedChunk {
    bytes: Vec<u8>,
}

impl EncryptedChunk {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Parse the base64 wire form.
    pub fn from_wire(wire: &str) -> CryptoResult<Self> {
        Ok(Self::from_bytes(base64_decode(wire)?))
    }

    /// The base64 wire form.
    pub fn to_wire(&self) -> String {
        base64_encode(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Leading IV octets. Shorter than 16 only for malformed input.
    pub fn iv(&self) -> &[u8] {
        &self.bytes[..self.split_point()]
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.bytes[self.split_point()..]
    }

    fn split_point(&self) -> usize {
        self.bytes.len().min(IV_SIZE)
    }
}

/// Where `decrypt_chunks` is within the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    /// Chunk `index` is about to be verified.
    Verifying,
    /// Chunk `index` decrypted successfully.
    Decrypted,
    /// Chunk `index` failed verification or decryption; no later chunk is read.
    Failed,
}

/// Advisory progress report; never needed for correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    pub index: usize,
    pub total: usize,
    pub stage: ProgressStage,
}

/// Whether a file of `size` bytes may be encrypted under `epoch`.
pub fn is_file_size_valid_for_encryption(
    size: u64,
    epoch: EncryptionEpoch,
    config: &CryptoConfig,
) -> bool {
    !epoch.is_gcm() || size <= config.crypto_gcm_max_file_size
}

/// Encrypt chunk `chunk_index` of a file.
///
/// Chunks are independent: callers may encrypt them in any order or
/// concurrently, as long as each call passes its own index.
pub fn encrypt_chunk(
    plaintext: &[u8],
    chunk_index: u64,
    details: &EncryptionDetails,
    config: &CryptoConfig,
) -> CryptoResult<EncryptedChunk> {
    if details.epoch.is_gcm() {
        let size = (plaintext.len() as u64)
            .saturating_add(chunk_index.saturating_mul(config.upload_chunk_size));
        if size > config.crypto_gcm_max_file_size {
            return Err(CryptoError::MaxEncryptedFileSizeExceeded {
                size,
                limit: config.crypto_gcm_max_file_size,
            });
        }
    }

    let (key, iv) = derive_key(chunk_index, details, config)?;
    let ciphertext = seal(&key, &iv, plaintext)?;

    debug!(
        chunk_index,
        epoch = %details.epoch,
        plaintext_len = plaintext.len(),
        "encrypted chunk"
    );

    let mut bytes = Vec::with_capacity(IV_SIZE + ciphertext.len());
    bytes.extend_from_slice(&iv);
    bytes.extend_from_slice(&ciphertext);
    Ok(EncryptedChunk::from_bytes(bytes))
}

/// Decrypt the chunks of one file, strictly in order.
///
/// The key is derived once. Chunk `i + 1` is not looked at until chunk `i`
/// has been verified and decrypted; the first failure ends the sequence and
/// is the only error reported.
///
/// `progress` sees every chunk twice: `Verifying` when it starts, then
/// `Decrypted` or `Failed` once it settles.
pub fn decrypt_chunks<F>(
    chunks: &[EncryptedChunk],
    details: &EncryptionDetails,
    config: &CryptoConfig,
    mut progress: F,
) -> CryptoResult<Vec<Vec<u8>>>
where
    F: FnMut(ChunkProgress),
{
    let key = derive_cipher_key(details, config)?;
    let expected_file_iv = if details.epoch.is_gcm() {
        Some(details.gcm_file_iv()?)
    } else {
        None
    };

    let total = chunks.len();
    let mut plaintexts = Vec::with_capacity(total);

    for (index, chunk) in chunks.iter().enumerate() {
        progress(ChunkProgress {
            index,
            total,
            stage: ProgressStage::Verifying,
        });

        let settled = open_chunk(&key, chunk, expected_file_iv, index, config.upload_chunk_size);
        let stage = if settled.is_ok() {
            ProgressStage::Decrypted
        } else {
            ProgressStage::Failed
        };
        progress(ChunkProgress {
            index,
            total,
            stage,
        });
        plaintexts.push(settled?);
    }

    debug!(chunks = total, epoch = %details.epoch, "decrypted chunk sequence");
    Ok(plaintexts)
}

/// Verify (GCM epochs) and decrypt the chunk found at position `index`.
fn open_chunk(
    key: &ChunkKey,
    chunk: &EncryptedChunk,
    expected_file_iv: Option<&[u8]>,
    index: usize,
    chunk_size: u64,
) -> CryptoResult<Vec<u8>> {
    if let Some(file_iv) = expected_file_iv {
        verify_chunk_iv(chunk.iv(), file_iv, index as u64, chunk_size)?;
    }
    open(key, chunk.iv(), chunk.ciphertext()).inspect_err(|_| {
        warn!(chunk_index = index, "chunk failed to decrypt");
    })
}

/// Check a GCM chunk IV against the file IV and the chunk's position.
fn verify_chunk_iv(
    iv: &[u8],
    file_iv: &[u8],
    expected_index: u64,
    chunk_size: u64,
) -> CryptoResult<()> {
    if iv.get(..GCM_FILE_IV_SIZE) != Some(file_iv) {
        warn!(chunk_index = expected_index, "chunk IV does not carry the file IV");
        return Err(CryptoError::InvalidIv);
    }

    let counter = decode_chunk_counter(iv, chunk_size).ok_or(CryptoError::BadIvChunkId)?;
    match counter {
        ChunkCounter::Index(found) if found >= 0 && found as u64 == expected_index => Ok(()),
        other => {
            warn!(
                chunk_index = expected_index,
                decoded = ?other,
                "chunk IV names a different position"
            );
            Err(CryptoError::UnexpectedIvChunkId {
                expected: expected_index,
            })
        }
    }
}

fn seal(key: &ChunkKey, iv: &[u8; IV_SIZE], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    match key.cipher() {
        CipherKind::AesGcm => {
            let cipher = Aes256GcmIv128::new(key.as_bytes().into());
            cipher
                .encrypt(Nonce::<U16>::from_slice(iv), plaintext)
                .map_err(|e| CryptoError::Encryption(format!("AES-GCM: {e}")))
        }
        CipherKind::AesCbc => {
            let cipher = Aes256CbcEnc::new(key.as_bytes().into(), iv.into());
            Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
        }
    }
}

/// Decrypt one chunk. Every failure is indistinguishable `WrongPassword`.
fn open(key: &ChunkKey, iv: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    if iv.len() != IV_SIZE {
        return Err(CryptoError::WrongPassword);
    }
    match key.cipher() {
        CipherKind::AesGcm => {
            let cipher = Aes256GcmIv128::new(key.as_bytes().into());
            cipher
                .decrypt(Nonce::<U16>::from_slice(iv), ciphertext)
                .map_err(|_| CryptoError::WrongPassword)
        }
        CipherKind::AesCbc => {
            let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
                .map_err(|_| CryptoError::WrongPassword)?;
            cipher
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map_err(|_| CryptoError::WrongPassword)
        }
    }
}
