//! Binary-to-text codecs: standard base64 and the 85-symbol Z85 alphabet.
//!
//! The Z85 codec packs 4 octets into 5 symbols. Input that is not a multiple
//! of 4 octets is zero-padded on the right before encoding, and the padding
//! length is not recorded: decoding returns the padded octets.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use zeroize::Zeroizing;

use chunkseal_core::TextEncoding;

use crate::error::{CryptoError, CryptoResult};

/// Standard alphabet, padding optional on decode.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const Z85_ALPHABET: &[u8; 85] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ.-:+=^!/*?&<>()[]{}@%$#";

/// Encode `data` with the named encoding.
pub fn encode_to_string(data: &[u8], encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Base64 => base64_encode(data),
        TextEncoding::Ascii85 => encode_ascii85(data),
    }
}

/// Decode a string produced by [`encode_to_string`].
pub fn decode_from_string(s: &str, encoding: TextEncoding) -> CryptoResult<Vec<u8>> {
    match encoding {
        TextEncoding::Base64 => base64_decode(s),
        TextEncoding::Ascii85 => decode_ascii85(s),
    }
}

pub fn base64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn base64_decode(s: &str) -> CryptoResult<Vec<u8>> {
    STANDARD
        .decode(s)
        .map_err(|e| CryptoError::Encoding(format!("base64 decode: {e}")))
}

/// Decode base64 typed or pasted by a person: ASCII whitespace is skipped
/// and trailing `=` padding may be missing.
pub fn base64_decode_lenient(s: &str) -> CryptoResult<Vec<u8>> {
    let compact: Zeroizing<Vec<u8>> = Zeroizing::new(
        s.bytes().filter(|b| !b.is_ascii_whitespace()).collect(),
    );
    STANDARD_LENIENT
        .decode(compact.as_slice())
        .map_err(|e| CryptoError::Encoding(format!("base64 decode: {e}")))
}

/// Z85-encode `data`, zero-padding it to a multiple of 4 octets.
pub fn encode_ascii85(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(4) * 5);
    for group in data.chunks(4) {
        let mut word = [0u8; 4];
        word[..group.len()].copy_from_slice(group);

        let mut value = u32::from_be_bytes(word);
        let mut symbols = [0u8; 5];
        for slot in symbols.iter_mut().rev() {
            *slot = Z85_ALPHABET[(value % 85) as usize];
            value /= 85;
        }
        out.extend(symbols.iter().map(|&b| char::from(b)));
    }
    out
}

/// Decode Z85 text back into octets (padding included).
pub fn decode_ascii85(s: &str) -> CryptoResult<Vec<u8>> {
    let symbols = s.as_bytes();
    if symbols.len() % 5 != 0 {
        return Err(CryptoError::Encoding(format!(
            "ascii85 input length {} is not a multiple of 5",
            symbols.len()
        )));
    }

    let mut out = Vec::with_capacity(symbols.len() / 5 * 4);
    for group in symbols.chunks(5) {
        let mut value: u64 = 0;
        for &symbol in group {
            let digit = Z85_ALPHABET
                .iter()
                .position(|&c| c == symbol)
                .ok_or_else(|| {
                    CryptoError::Encoding(format!("invalid ascii85 symbol {:?}", char::from(symbol)))
                })?;
            value = value * 85 + digit as u64;
        }
        let word = u32::try_from(value)
            .map_err(|_| CryptoError::Encoding("ascii85 group overflows 32 bits".into()))?;
        out.extend_from_slice(&word.to_be_bytes());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii85_known_vector() {
        let data = [0x86, 0x4F, 0xD2, 0x6F, 0xB5, 0x59, 0xF7, 0x5B];
        assert_eq!(encode_ascii85(&data), "HelloWorld");
        assert_eq!(decode_ascii85("HelloWorld").unwrap(), data);
    }

    #[test]
    fn test_ascii85_zero_pads_input() {
        // 5 octets pad to 8, producing 10 symbols
        let encoded = encode_ascii85(&[1, 2, 3, 4, 5]);
        assert_eq!(encoded.len(), 10);

        let decoded = decode_ascii85(&encoded).unwrap();
        assert_eq!(decoded, vec![1, 2, 3, 4, 5, 0, 0, 0]);
    }

    #[test]
    fn test_ascii85_empty() {
        assert_eq!(encode_ascii85(&[]), "");
        assert!(decode_ascii85("").unwrap().is_empty());
    }

    #[test]
    fn test_ascii85_rejects_bad_input() {
        assert!(decode_ascii85("Hell").is_err(), "length not a multiple of 5");
        assert!(decode_ascii85("Hell~").is_err(), "symbol outside the alphabet");
        assert!(decode_ascii85("#####").is_err(), "group above u32::MAX");
    }

    #[test]
    fn test_ascii85_max_word() {
        let encoded = encode_ascii85(&[0xFF; 4]);
        assert_eq!(decode_ascii85(&encoded).unwrap(), vec![0xFF; 4]);
    }

    #[test]
    fn test_dispatch() {
        let data = b"chunk";
        assert_eq!(encode_to_string(data, TextEncoding::Base64), "Y2h1bms=");
        assert_eq!(
            decode_from_string("Y2h1bms=", TextEncoding::Base64).unwrap(),
            data
        );

        let z85 = encode_to_string(&[0x86, 0x4F, 0xD2, 0x6F], TextEncoding::Ascii85);
        assert_eq!(z85, "Hello");
    }

    #[test]
    fn test_base64_rejects_garbage() {
        assert!(base64_decode("not base64!").is_err());
        assert!(base64_decode_lenient("not base64!").is_err());
    }

    #[test]
    fn test_base64_lenient_accepts_missing_padding_and_whitespace() {
        assert!(base64_decode("Y2h1bms").is_err());
        assert_eq!(base64_decode_lenient("Y2h1bms").unwrap(), b"chunk");
        assert_eq!(base64_decode_lenient("Y2h1bms=").unwrap(), b"chunk");
        assert_eq!(base64_decode_lenient(" Y2h1\nbms=\n").unwrap(), b"chunk");
    }
}
