// File-level helpers: `.smc` compression and decompression.
//
// `compress_file()` encodes a whole file as one message and writes the
// byte-framed stream next to it with `.smc` appended. `decompress_file()`
// reverses that, stripping the extension. Optionally computes SHA-256
// checksums (feature-gated behind `file-io`).

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::huffman::{self, DecodeError, EncodeError, EncodeOptions};

/// Extension appended to compressed files.
pub const SMC_EXTENSION: &str = "smc";

/// Extension used for decompressed output when stripping `.smc` is not
/// possible.
pub const UNCOMPRESSED_EXTENSION: &str = "uncompressed";

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// Options and stats
// ---------------------------------------------------------------------------

/// Options shared by `compress_file()` and `decompress_file()`.
#[derive(Debug, Clone)]
pub struct FileOptions {
    /// Encoder settings. `header` must match between compress and decompress.
    pub encode: EncodeOptions,
    /// Overwrite existing outputs and accept inputs without `.smc`.
    pub force: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            encode: EncodeOptions::byte_framed(),
            force: false,
        }
    }
}

/// Statistics returned by `compress_file()`.
#[derive(Debug, Clone)]
pub struct CompressStats {
    /// Where the compressed stream was written.
    pub output_path: PathBuf,
    /// Input file size in bytes.
    pub input_size: u64,
    /// Compressed file size in bytes.
    pub output_size: u64,
    /// Distinct symbols in the code table.
    pub symbols: usize,
    /// Header size in bits.
    pub header_bits: usize,
    /// Payload size in bits, before byte padding.
    pub payload_bits: usize,
    /// SHA-256 of the input file (if `file-io` feature is enabled).
    pub input_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `decompress_file()`.
#[derive(Debug, Clone)]
pub struct DecompressStats {
    /// Where the decoded message was written.
    pub output_path: PathBuf,
    /// Compressed file size in bytes.
    pub input_size: u64,
    /// Decoded file size in bytes.
    pub output_size: u64,
    /// SHA-256 of the decoded output (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file and network operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("{} does not have the .{SMC_EXTENSION} extension", path.display())]
    WrongExtension { path: PathBuf },
    #[error("{} already exists", path.display())]
    OutputExists { path: PathBuf },
    #[error("message of {len} bytes exceeds the {max}-byte limit")]
    MessageTooLarge { len: usize, max: usize },
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `notes.txt` -> `notes.txt.smc`.
pub fn compressed_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".");
    name.push(SMC_EXTENSION);
    PathBuf::from(name)
}

/// `notes.txt.smc` -> `notes.txt`; anything else -> `<name>.uncompressed`.
pub fn decompressed_path(input: &Path) -> PathBuf {
    if has_smc_extension(input) {
        let stripped = input.with_extension("");
        if stripped.file_name().is_some() && stripped != input {
            return stripped;
        }
    }
    let mut name = OsString::from(input.as_os_str());
    name.push(".");
    name.push(UNCOMPRESSED_EXTENSION);
    PathBuf::from(name)
}

pub fn has_smc_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SMC_EXTENSION)
}

fn check_output(path: &Path, force: bool) -> Result<(), IoError> {
    if !force && path.exists() {
        return Err(IoError::OutputExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn write_all(path: &Path, data: &[u8]) -> Result<u64, IoError> {
    let mut writer = BufWriter::with_capacity(BUF_SIZE, File::create(path)?);
    writer.write_all(data)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(file.metadata()?.len())
}

#[cfg(feature = "file-io")]
fn sha256(data: &[u8]) -> Option<[u8; 32]> {
    Some(sha2::Sha256::digest(data).into())
}

#[cfg(not(feature = "file-io"))]
fn sha256(_data: &[u8]) -> Option<[u8; 32]> {
    None
}

// ---------------------------------------------------------------------------
// compress_file / decompress_file
// ---------------------------------------------------------------------------

/// Compress `input` into `output` (default: `<input>.smc`).
///
/// The file is read fully into memory and encoded as a single message.
pub fn compress_file(
    input: &Path,
    output: Option<&Path>,
    opts: &FileOptions,
) -> Result<CompressStats, IoError> {
    let output_path = output.map_or_else(|| compressed_path(input), Path::to_path_buf);
    check_output(&output_path, opts.force)?;

    let message = fs::read(input)?;
    let stream = huffman::encode(&message, &opts.encode)?;
    let output_size = write_all(&output_path, &stream.to_bytes())?;

    log::info!(
        "compressed {} ({} bytes) -> {} ({} bytes)",
        input.display(),
        message.len(),
        output_path.display(),
        output_size
    );

    Ok(CompressStats {
        output_path,
        input_size: message.len() as u64,
        output_size,
        symbols: stream.table().len(),
        header_bits: stream.header_bit_len(),
        payload_bits: stream.payload_bit_len(),
        input_sha256: sha256(&message),
    })
}

/// Decompress `input` into `output` (default: see `decompressed_path`).
///
/// Inputs without the `.smc` extension are refused unless `opts.force`.
pub fn decompress_file(
    input: &Path,
    output: Option<&Path>,
    opts: &FileOptions,
) -> Result<DecompressStats, IoError> {
    if !opts.force && !has_smc_extension(input) {
        return Err(IoError::WrongExtension {
            path: input.to_path_buf(),
        });
    }
    let output_path = output.map_or_else(|| decompressed_path(input), Path::to_path_buf);
    check_output(&output_path, opts.force)?;

    let data = fs::read(input)?;
    let message = huffman::decode_bytes_with(&data, opts.encode.header)?;
    let output_size = write_all(&output_path, &message)?;

    log::info!(
        "decompressed {} ({} bytes) -> {} ({} bytes)",
        input.display(),
        data.len(),
        output_path.display(),
        output_size
    );

    Ok(DecompressStats {
        output_path,
        input_size: data.len() as u64,
        output_size,
        output_sha256: sha256(&message),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
