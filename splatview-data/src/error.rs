//! Error types for asset loading.

use thiserror::Error;

/// Errors produced while fetching or decoding an asset.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PLY decode error: {0}")]
    Decode(String),

    #[error("asset contains no points")]
    EmptyAsset,

    #[error("a load session is already in flight")]
    LoadInProgress,
}
