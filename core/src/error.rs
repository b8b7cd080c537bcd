use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the text and configuration layers. Trip and dive operations
/// never fail: lookups return `Option` and broken invariants panic.
#[derive(Error, Debug, uniffi::Error)]
#[uniffi(flat_error)]
pub enum Error {
    #[error("empty gas description")]
    EmptyGas,

    #[error("gas parse error at position {position}: {message}")]
    GasParse { position: usize, message: String },

    #[error("invalid gas mix: {o2_permille}‰ O2 + {he_permille}‰ He")]
    InvalidGasMix { o2_permille: i32, he_permille: i32 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
