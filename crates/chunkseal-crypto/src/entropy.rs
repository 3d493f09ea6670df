//! Random entropy helpers: client entropy and per-file IVs, base64 for transport.

use rand::RngCore;

use chunkseal_core::EncryptionEpoch;

use crate::encoding::{base64_decode, base64_encode};
use crate::error::{CryptoError, CryptoResult};
use crate::{CBC_FILE_IV_SIZE, CLIENT_ENTROPY_OCTETS, GCM_FILE_IV_SIZE};

/// `n` octets from the thread-local CSPRNG.
pub fn random_octets(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

/// `n` random octets, base64-encoded for storage or transmission.
pub fn generate_base64_entropy(n: usize) -> String {
    base64_encode(&random_octets(n))
}

/// Decode base64 entropy that must hold exactly `n` octets.
pub fn decode_base64_entropy(encoded: &str, n: usize) -> CryptoResult<Vec<u8>> {
    let raw = base64_decode(encoded)?;
    if raw.len() != n {
        return Err(CryptoError::Encoding(format!(
            "expected {n} octets of entropy, decoded {}",
            raw.len()
        )));
    }
    Ok(raw)
}

pub fn generate_client_entropy() -> String {
    generate_base64_entropy(CLIENT_ENTROPY_OCTETS)
}

pub fn decode_client_entropy(encoded: &str) -> CryptoResult<Vec<u8>> {
    decode_base64_entropy(encoded, CLIENT_ENTROPY_OCTETS)
}

/// Per-file IV length for an epoch: 12 octets for GCM, 16 for CBC.
pub fn file_iv_len(epoch: EncryptionEpoch) -> usize {
    if epoch.is_gcm() {
        GCM_FILE_IV_SIZE
    } else {
        CBC_FILE_IV_SIZE
    }
}

pub fn generate_file_iv(epoch: EncryptionEpoch) -> String {
    generate_base64_entropy(file_iv_len(epoch))
}

pub fn decode_file_iv(encoded: &str, epoch: EncryptionEpoch) -> CryptoResult<Vec<u8>> {
    decode_base64_entropy(encoded, file_iv_len(epoch))
}
