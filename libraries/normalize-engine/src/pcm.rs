//! Raw PCM file access
//!
//! The decoder writes a canonical 44-byte WAV header followed by nothing but
//! interleaved 16-bit little-endian samples. [`PcmFile`] opens such a file for
//! reading and writing and walks the sample region in fixed-size chunks, so a
//! chunk can be modified and written back to the offset it was read from.

use crate::error::{NormalizeError, Result};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Size of the canonical WAV header preceding the sample data
pub const HEADER_LEN: u64 = 44;

/// Chunk size used for both passes (2048 samples)
pub const CHUNK_BYTES: usize = 4096;

/// Bytes per sample (signed 16-bit)
pub const BYTES_PER_SAMPLE: usize = 2;

/// Read/write cursor over the sample region of a raw PCM file
pub struct PcmFile {
    file: File,
    path: PathBuf,
    sample_bytes: u64,
    buffer: Vec<u8>,
    filled: usize,
}

impl PcmFile {
    /// Open a raw PCM file for in-place rewriting
    ///
    /// The header is validated and the sample region must hold a whole number
    /// of samples. Nothing is written by this call, so a file rejected here is
    /// left untouched. The cursor is positioned at the first sample.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();

        if len < HEADER_LEN {
            return Err(NormalizeError::Format(format!(
                "truncated header: {} bytes, expected at least {}",
                len, HEADER_LEN
            )));
        }

        let mut header = [0u8; HEADER_LEN as usize];
        file.read_exact(&mut header)?;
        validate_header(&header)?;

        let sample_bytes = len - HEADER_LEN;
        if sample_bytes % BYTES_PER_SAMPLE as u64 != 0 {
            return Err(NormalizeError::odd_sample_bytes(sample_bytes));
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
            sample_bytes,
            buffer: vec![0; CHUNK_BYTES],
            filled: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of samples (not frames) in the file
    pub fn sample_count(&self) -> u64 {
        self.sample_bytes / BYTES_PER_SAMPLE as u64
    }

    /// Seek back to the first sample
    pub fn rewind(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(HEADER_LEN))?;
        self.filled = 0;
        Ok(())
    }

    /// Read the next chunk of sample bytes
    ///
    /// Returns `None` at end of stream. Short reads from the OS are retried
    /// until the buffer is full, so only the final chunk can be shorter than
    /// [`CHUNK_BYTES`].
    pub fn next_chunk(&mut self) -> Result<Option<&mut [u8]>> {
        let mut filled = 0;
        while filled < self.buffer.len() {
            match self.file.read(&mut self.buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        // The file may have changed size since open
        if filled % BYTES_PER_SAMPLE != 0 {
            return Err(NormalizeError::odd_sample_bytes(filled as u64));
        }

        self.filled = filled;
        if filled == 0 {
            Ok(None)
        } else {
            Ok(Some(&mut self.buffer[..filled]))
        }
    }

    /// Overwrite the bytes of the last chunk at the offset they were read from
    ///
    /// Leaves the cursor where [`next_chunk`](Self::next_chunk) left it, so
    /// the pass continues with the following chunk.
    pub fn write_back(&mut self) -> Result<()> {
        if self.filled == 0 {
            return Ok(());
        }
        self.file.seek(SeekFrom::Current(-(self.filled as i64)))?;
        self.file.write_all(&self.buffer[..self.filled])?;
        Ok(())
    }

    /// Flush written samples to storage
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }
}

/// Decode one little-endian sample
#[inline]
pub fn read_sample(bytes: &[u8]) -> i16 {
    i16::from_le_bytes([bytes[0], bytes[1]])
}

/// Encode one little-endian sample in place
#[inline]
pub fn write_sample(bytes: &mut [u8], sample: i16) {
    bytes[..2].copy_from_slice(&sample.to_le_bytes());
}

fn validate_header(header: &[u8; HEADER_LEN as usize]) -> Result<()> {
    if &header[0..4] != b"RIFF" || &header[8..12] != b"WAVE" {
        return Err(NormalizeError::Format("missing RIFF/WAVE header".to_string()));
    }

    let format_tag = u16::from_le_bytes([header[20], header[21]]);
    let bits_per_sample = u16::from_le_bytes([header[34], header[35]]);
    if format_tag != 1 || bits_per_sample != 16 {
        return Err(NormalizeError::Format(format!(
            "expected 16-bit linear PCM, found format {} with {} bits per sample",
            format_tag, bits_per_sample
        )));
    }

    // Anything between fmt and data (LIST, fact, ...) would shift the samples
    if &header[36..40] != b"data" {
        return Err(NormalizeError::Format(
            "data chunk does not start at byte 36".to_string(),
        ));
    }

    Ok(())
}
