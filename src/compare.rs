// Compression-ratio harness.
//
// Compares the Huffman codec against general-purpose compressors on the same
// messages. Baselines are pluggable through the `Baseline` trait; built-in
// implementations:
//   - Gzip (via flate2, feature-gated `gzip-compare`)
//   - LZMA (via lzma-rs, feature-gated `lzma-compare`)
//   - Zstandard (via zstd, feature-gated `zstd-compare`)
//
// A ratio is the fraction of bits saved: (original - compressed) / original.
// Negative ratios mean the output grew. The Huffman size is the unpadded
// stream length including its header.

use std::io;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::huffman::{self, EncodeOptions};
use crate::io::IoError;

// ---------------------------------------------------------------------------
// Baseline trait
// ---------------------------------------------------------------------------

/// A reference compressor to measure the codec against.
pub trait Baseline: Send + Sync {
    /// Short name used in reports.
    fn name(&self) -> &'static str;

    /// Compress `data` and return the output size in bytes.
    fn compressed_len(&self, data: &[u8]) -> io::Result<usize>;
}

/// Gzip at the default level.
#[cfg(feature = "gzip-compare")]
#[derive(Debug, Clone, Copy)]
pub struct GzipBaseline {
    level: flate2::Compression,
}

#[cfg(feature = "gzip-compare")]
impl GzipBaseline {
    /// Gzip baseline with the given compression level (0-9).
    pub fn new(level: u32) -> Self {
        Self {
            level: flate2::Compression::new(level),
        }
    }
}

#[cfg(feature = "gzip-compare")]
impl Default for GzipBaseline {
    fn default() -> Self {
        Self {
            level: flate2::Compression::default(),
        }
    }
}

#[cfg(feature = "gzip-compare")]
impl Baseline for GzipBaseline {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn compressed_len(&self, data: &[u8]) -> io::Result<usize> {
        use std::io::Write;
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        Ok(encoder.finish()?.len())
    }
}

/// LZMA with lzma-rs defaults.
#[cfg(feature = "lzma-compare")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LzmaBaseline;

#[cfg(feature = "lzma-compare")]
impl Baseline for LzmaBaseline {
    fn name(&self) -> &'static str {
        "lzma"
    }

    fn compressed_len(&self, data: &[u8]) -> io::Result<usize> {
        let mut input = io::Cursor::new(data);
        let mut output = Vec::new();
        lzma_rs::lzma_compress(&mut input, &mut output)?;
        Ok(output.len())
    }
}

/// Zstandard at a fixed level.
#[cfg(feature = "zstd-compare")]
#[derive(Debug, Clone, Copy)]
pub struct ZstdBaseline {
    level: i32,
}

#[cfg(feature = "zstd-compare")]
impl ZstdBaseline {
    pub const DEFAULT_LEVEL: i32 = 3;

    /// Zstd baseline with the given compression level (1-22).
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

#[cfg(feature = "zstd-compare")]
impl Default for ZstdBaseline {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LEVEL)
    }
}

#[cfg(feature = "zstd-compare")]
impl Baseline for ZstdBaseline {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compressed_len(&self, data: &[u8]) -> io::Result<usize> {
        use std::io::Write;
        let mut encoder = zstd::Encoder::new(Vec::new(), self.level)?;
        encoder.write_all(data)?;
        Ok(encoder.finish()?.len())
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Ratios for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioReport {
    /// Message size in bits (8 per byte).
    pub original_bits: usize,
    /// Huffman stream size in bits, header included, unpadded.
    pub huffman_bits: usize,
    pub huffman_ratio: f64,
    /// `None` when the `gzip-compare` feature is disabled.
    pub gzip_ratio: Option<f64>,
    /// `None` when the `lzma-compare` feature is disabled.
    pub lzma_ratio: Option<f64>,
    /// `None` when the `zstd-compare` feature is disabled.
    pub zstd_ratio: Option<f64>,
}

/// Mean ratios over a set of reports.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub messages: usize,
    pub original_bits: usize,
    pub mean_huffman_ratio: f64,
    pub mean_gzip_ratio: Option<f64>,
    pub mean_lzma_ratio: Option<f64>,
    pub mean_zstd_ratio: Option<f64>,
}

/// Fraction of `original` bits saved by a `compressed`-bit encoding.
pub fn ratio(original_bits: usize, compressed_bits: usize) -> f64 {
    if original_bits == 0 {
        return 0.0;
    }
    (original_bits as f64 - compressed_bits as f64) / original_bits as f64
}

fn baseline_ratio(baseline: &dyn Baseline, message: &[u8]) -> io::Result<f64> {
    let len = baseline.compressed_len(message)?;
    Ok(ratio(message.len() * 8, len * 8))
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Measure one non-empty message.
pub fn compare_message(message: &[u8]) -> Result<RatioReport, IoError> {
    let original_bits = message.len() * 8;
    let stream = huffman::encode(message, &EncodeOptions::default())?;

    #[cfg(feature = "gzip-compare")]
    let gzip_ratio = Some(baseline_ratio(&GzipBaseline::default(), message)?);
    #[cfg(not(feature = "gzip-compare"))]
    let gzip_ratio = None;

    #[cfg(feature = "lzma-compare")]
    let lzma_ratio = Some(baseline_ratio(&LzmaBaseline, message)?);
    #[cfg(not(feature = "lzma-compare"))]
    let lzma_ratio = None;

    #[cfg(feature = "zstd-compare")]
    let zstd_ratio = Some(baseline_ratio(&ZstdBaseline::default(), message)?);
    #[cfg(not(feature = "zstd-compare"))]
    let zstd_ratio = None;

    Ok(RatioReport {
        original_bits,
        huffman_bits: stream.bit_len(),
        huffman_ratio: ratio(original_bits, stream.bit_len()),
        gzip_ratio,
        lzma_ratio,
        zstd_ratio,
    })
}

/// Measure a message against a caller-supplied baseline only.
pub fn compare_with(message: &[u8], baseline: &dyn Baseline) -> Result<(f64, f64), IoError> {
    let stream = huffman::encode(message, &EncodeOptions::default())?;
    let huffman = ratio(message.len() * 8, stream.bit_len());
    Ok((huffman, baseline_ratio(baseline, message)?))
}

/// Keep only the ASCII characters of a line.
pub fn strip_non_ascii(line: &str) -> String {
    line.chars().filter(char::is_ascii).collect()
}

/// One report per line of `text`, after stripping non-ASCII characters.
/// Lines left empty are skipped.
pub fn compare_lines(text: &str) -> Result<Vec<RatioReport>, IoError> {
    let lines: Vec<String> = text
        .lines()
        .map(strip_non_ascii)
        .filter(|line| !line.is_empty())
        .collect();
    log::debug!("comparing {} lines", lines.len());

    #[cfg(feature = "parallel")]
    let reports = lines
        .par_iter()
        .map(|line| compare_message(line.as_bytes()))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let reports = lines
        .iter()
        .map(|line| compare_message(line.as_bytes()))
        .collect();

    reports
}

/// Average the ratios in `reports`. Returns `None` for an empty slice.
pub fn summarize(reports: &[RatioReport]) -> Option<Summary> {
    if reports.is_empty() {
        return None;
    }
    let n = reports.len() as f64;
    let mean = |values: Vec<Option<f64>>| -> Option<f64> {
        let values: Option<Vec<f64>> = values.into_iter().collect();
        values.map(|v| v.iter().sum::<f64>() / n)
    };
    Some(Summary {
        messages: reports.len(),
        original_bits: reports.iter().map(|r| r.original_bits).sum(),
        mean_huffman_ratio: reports.iter().map(|r| r.huffman_ratio).sum::<f64>() / n,
        mean_gzip_ratio: mean(reports.iter().map(|r| r.gzip_ratio).collect()),
        mean_lzma_ratio: mean(reports.iter().map(|r| r.lzma_ratio).collect()),
        mean_zstd_ratio: mean(reports.iter().map(|r| r.zstd_ratio).collect()),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
