//! Compression codecs for stored records.
//!
//! Each tier is assigned one codec at construction time and uses it for both
//! writes and reads for the lifetime of the store.

use crate::error::{Error, Result};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

/// zstd level used for archival data.
const ZSTD_ARCHIVE_LEVEL: i32 = 19;

/// Compression codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Compression {
    /// No compression
    None,
    /// zlib stream (general purpose)
    Zlib,
    /// zstd at a high level (slower, better ratio)
    Zstd,
}

impl Compression {
    pub fn name(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Zlib => "zlib",
            Compression::Zstd => "zstd",
        }
    }

    /// Compress a byte payload.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                encoder
                    .write_all(data)
                    .map_err(|e| Error::compression(self.name(), e.to_string()))?;
                encoder
                    .finish()
                    .map_err(|e| Error::compression(self.name(), e.to_string()))
            }
            Compression::Zstd => zstd::encode_all(data, ZSTD_ARCHIVE_LEVEL)
                .map_err(|e| Error::compression(self.name(), e.to_string())),
        }
    }

    /// Decompress a payload produced by [`Compression::compress`].
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Zlib => {
                let mut decoder = ZlibDecoder::new(data);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| Error::compression(self.name(), e.to_string()))?;
                Ok(out)
            }
            Compression::Zstd => zstd::decode_all(data)
                .map_err(|e| Error::compression(self.name(), e.to_string())),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Compression::None),
            "zlib" => Ok(Compression::Zlib),
            "zstd" => Ok(Compression::Zstd),
            other => Err(Error::Config(format!(
                "unknown compression algorithm: {}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Compression {
    type Error = Error;

    fn try_from(name: String) -> Result<Self> {
        name.parse()
    }
}
