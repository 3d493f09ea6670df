//! Chunk IV construction
//!
//! GCM chunk IV layout (16 octets):
//! ```text
//! [12 octets: per-file random IV][4 octets: LE32(chunk_index * ceil(chunk_size / 16))]
//! ```
//!
//! Scaling the index by the number of cipher blocks in a chunk keeps every
//! block position of the logical file distinct under one file IV. The counter
//! is carried as a signed 32-bit value: once the scaled counter reaches 2^31
//! it reads back negative and no longer matches any chunk position. The GCM
//! size ceiling in the config keeps transfers below that point.

use rand::RngCore;

use chunkseal_core::config::CIPHER_BLOCK_SIZE;

use crate::error::{CryptoError, CryptoResult};
use crate::{GCM_FILE_IV_SIZE, IV_SIZE};

/// What the trailing four octets of a chunk IV decode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkCounter {
    /// The counter is an exact multiple of the chunk stride.
    Index(i64),
    /// The counter lies between two chunk boundaries.
    Misaligned(i32),
}

impl ChunkCounter {
    /// The chunk index, if the counter names one.
    pub fn index(self) -> Option<i64> {
        match self {
            ChunkCounter::Index(index) => Some(index),
            ChunkCounter::Misaligned(_) => None,
        }
    }
}

/// Scale `chunk_index` by the blocks per chunk and emit it as 4 little-endian octets.
pub fn encode_chunk_counter(chunk_index: u64, chunk_size: u64) -> [u8; 4] {
    let counter = chunk_index.wrapping_mul(chunk_size.div_ceil(CIPHER_BLOCK_SIZE));
    (counter as u32).to_le_bytes()
}

/// Read the chunk index back out of a 16-octet IV.
///
/// Returns `None` when `iv` is not exactly 16 octets.
pub fn decode_chunk_counter(iv: &[u8], chunk_size: u64) -> Option<ChunkCounter> {
    if iv.len() != IV_SIZE {
        return None;
    }
    let mut counter = [0u8; 4];
    counter.copy_from_slice(&iv[GCM_FILE_IV_SIZE..IV_SIZE]);
    let raw = i32::from_le_bytes(counter);

    let stride = i128::from(chunk_size.div_ceil(CIPHER_BLOCK_SIZE));
    if stride == 0 || i128::from(raw) % stride != 0 {
        return Some(ChunkCounter::Misaligned(raw));
    }
    Some(ChunkCounter::Index((i128::from(raw) / stride) as i64))
}

/// Highest chunk index whose scaled counter still reads back as itself.
///
/// A zero chunk size scales every index to counter 0, so only index 0 is
/// distinct.
pub fn max_chunk_index(chunk_size: u64) -> u64 {
    let stride = chunk_size.div_ceil(CIPHER_BLOCK_SIZE);
    if stride == 0 {
        return 0;
    }
    i32::MAX as u64 / stride
}

/// Build the IV for chunk `chunk_index` of a GCM-epoch file.
///
/// Refuses indices past [`max_chunk_index`]: their counter would wrap or
/// turn negative and repeat an earlier chunk's IV under the same key.
pub fn build_gcm_iv(chunk_index: u64, file_iv: &[u8], chunk_size: u64) -> CryptoResult<[u8; IV_SIZE]> {
    if file_iv.len() != GCM_FILE_IV_SIZE {
        return Err(CryptoError::InvalidFileIvLength {
            expected: GCM_FILE_IV_SIZE,
            actual: file_iv.len(),
        });
    }
    let max_index = max_chunk_index(chunk_size);
    if chunk_index > max_index {
        return Err(CryptoError::ChunkCounterOutOfRange {
            index: chunk_index,
            max_index,
            chunk_size,
        });
    }

    let mut iv = [0u8; IV_SIZE];
    iv[..GCM_FILE_IV_SIZE].copy_from_slice(file_iv);
    iv[GCM_FILE_IV_SIZE..].copy_from_slice(&encode_chunk_counter(chunk_index, chunk_size));
    Ok(iv)
}

/// Fresh random IV for the CBC epochs.
pub fn random_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}
