// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Body Compression
//!
//! Gzip compression for publish request bodies.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Compresses request bodies.
///
/// Never fails: an implementation that cannot compress returns an empty
/// vector and the request goes out with an empty body.
pub trait Compressor: Send + Sync {
    fn compress(&self, data: &[u8]) -> Vec<u8>;
}

/// Gzip compressor backed by `flate2`.
#[derive(Debug, Clone, Copy)]
pub struct GzipCompressor {
    level: Compression,
}

impl GzipCompressor {
    /// Creates a compressor with the given level (0-9).
    pub fn with_level(level: u32) -> Self {
        GzipCompressor {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        GzipCompressor {
            level: Compression::default(),
        }
    }
}

impl Compressor for GzipCompressor {
    fn compress(&self, data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), self.level);
        let written = encoder.write_all(data);
        match written.and_then(|()| encoder.finish()) {
            Ok(compressed) => compressed,
            Err(e) => {
                tracing::warn!(error = %e, "gzip compression failed, sending empty body");
                Vec::new()
            }
        }
    }
}

/// Decompresses a gzip body.
pub fn decompress(compressed: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(compressed);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}
