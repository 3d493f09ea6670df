pub mod config;
pub mod error;
pub mod types;

pub use config::{ChunksealConfig, CryptoConfig, LogConfig};
pub use error::{CoreError, CoreResult};
pub use types::{CipherKind, EncryptionEpoch, PasswordEncoding, TextEncoding};
