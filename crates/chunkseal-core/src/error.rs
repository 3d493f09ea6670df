use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config error: {0}")]
    Config(String),

    #[error("unknown encryption key version: {0}")]
    UnknownEpoch(u8),

    #[error("unknown password version: {0}")]
    UnknownPasswordEncoding(u8),

    #[error("unknown text encoding: {0:?}")]
    UnknownTextEncoding(String),

    #[error("unknown cipher: {0:?}")]
    UnknownCipher(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
