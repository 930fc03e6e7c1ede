// src/compression/mod.rs
//! Decompression of repository metadata
//!
//! Yum `primary` metadata is published gzip, xz or zstd compressed (or,
//! rarely, plain). The format is taken from the data's magic bytes; the
//! `location href` extension is only a hint.

use std::io::{self, Read};
use thiserror::Error;

/// Compression-related errors
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Failed to create {format} decoder: {source}")]
    DecoderCreation {
        format: &'static str,
        source: io::Error,
    },

    #[error("Failed to decompress {format} data: {source}")]
    Decompression {
        format: &'static str,
        source: io::Error,
    },
}

/// Compression formats seen in yum repodata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    None,
    Gzip,
    Xz,
    Zstd,
}

impl CompressionFormat {
    /// Guess the format from a metadata file name
    pub fn from_extension(path: &str) -> Self {
        if path.ends_with(".gz") {
            Self::Gzip
        } else if path.ends_with(".xz") {
            Self::Xz
        } else if path.ends_with(".zst") || path.ends_with(".zstd") {
            Self::Zstd
        } else {
            Self::None
        }
    }

    /// Identify the format from leading magic bytes
    ///
    /// Gzip `1f 8b`, XZ `fd 37 7a 58 5a 00`, Zstd `28 b5 2f fd`.
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        match data {
            [0x1f, 0x8b, ..] => Self::Gzip,
            [0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00, ..] => Self::Xz,
            [0x28, 0xb5, 0x2f, 0xfd, ..] => Self::Zstd,
            _ => Self::None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }
}

impl std::fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Decompress `data` with an explicit format
pub fn decompress(data: &[u8], format: CompressionFormat) -> Result<Vec<u8>, CompressionError> {
    let mut decoder: Box<dyn Read + '_> = match format {
        CompressionFormat::None => return Ok(data.to_vec()),
        CompressionFormat::Gzip => Box::new(flate2::read::GzDecoder::new(data)),
        CompressionFormat::Xz => Box::new(xz2::read::XzDecoder::new(data)),
        CompressionFormat::Zstd => Box::new(zstd::Decoder::new(data).map_err(|e| {
            CompressionError::DecoderCreation {
                format: "zstd",
                source: e,
            }
        })?),
    };

    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(|e| CompressionError::Decompression {
            format: format.name(),
            source: e,
        })?;
    Ok(output)
}
