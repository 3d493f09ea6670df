use chunkseal_crypto::{
    decrypt_chunks, derive_cipher_key, encrypt_chunk, CryptoConfig, EncryptionDetails,
    EncryptionEpoch,
};
use secrecy::SecretString;

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

fn config() -> CryptoConfig {
    CryptoConfig {
        upload_chunk_size: 1_048_576,
        ..CryptoConfig::default()
    }
}

// Digest-import epochs keep key derivation out of the cipher measurements.
fn details(epoch: EncryptionEpoch) -> EncryptionDetails {
    EncryptionDetails::new(SecretString::from("bench-password"), epoch, "bench-salt")
        .with_file_iv([0xABu8; 12])
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_encrypt_chunk_gcm(bencher: divan::Bencher, size: usize) {
    let config = config();
    let details = details(EncryptionEpoch::GcmDigestImport);
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            encrypt_chunk(divan::black_box(&data), 0, &details, &config).unwrap()
        });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_encrypt_chunk_cbc(bencher: divan::Bencher, size: usize) {
    let config = config();
    let details = details(EncryptionEpoch::CbcDigestImport);
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            encrypt_chunk(divan::black_box(&data), 0, &details, &config).unwrap()
        });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_decrypt_chunk_gcm(bencher: divan::Bencher, size: usize) {
    let config = config();
    let details = details(EncryptionEpoch::GcmDigestImport);
    let data = make_data(size);
    let encrypted = [encrypt_chunk(&data, 0, &details, &config).unwrap()];
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            decrypt_chunks(divan::black_box(&encrypted), &details, &config, |_| {}).unwrap()
        });
}

#[divan::bench(args = [1000, 150000])]
fn bench_pbkdf2_key(bencher: divan::Bencher, rounds: u32) {
    let config = config();
    let details = details(EncryptionEpoch::GcmImportDerive).with_hash_iterations(rounds);
    bencher.bench(|| derive_cipher_key(divan::black_box(&details), &config).unwrap());
}

fn main() {
    divan::main();
}
