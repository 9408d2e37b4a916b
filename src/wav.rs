//! WAV file writer
//!
//! Writes mono 16-bit little-endian PCM with the canonical 44-byte header.

use crate::error::Result;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const HEADER_LEN: u32 = 44;
const BYTES_PER_SAMPLE: u16 = 2;

/// Convert a sample in [-1.0, 1.0] to i16, clamping out-of-range values
///
/// -1.0 maps to i16::MIN and 1.0 to i16::MAX.
pub fn to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped >= 0.0 {
        (clamped * i16::MAX as f32) as i16
    } else {
        (clamped * -(i16::MIN as f32)) as i16
    }
}

/// Encode samples as a complete WAV stream
pub fn encode_wav_16bit<W: Write>(writer: &mut W, samples: &[f32], sample_rate: u32) -> io::Result<()> {
    let block_align = BYTES_PER_SAMPLE; // mono
    let byte_rate = sample_rate * block_align as u32;
    let data_size = samples.len() as u32 * BYTES_PER_SAMPLE as u32;

    writer.write_all(b"RIFF")?;
    writer.write_all(&(HEADER_LEN - 8 + data_size).to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?;
    writer.write_all(&1u16.to_le_bytes())?; // PCM
    writer.write_all(&1u16.to_le_bytes())?; // mono
    writer.write_all(&sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&block_align.to_le_bytes())?;
    writer.write_all(&(BYTES_PER_SAMPLE * 8).to_le_bytes())?;

    writer.write_all(b"data")?;
    writer.write_all(&data_size.to_le_bytes())?;
    for &sample in samples {
        writer.write_all(&to_i16(sample).to_le_bytes())?;
    }

    Ok(())
}

/// Write a 16-bit PCM WAV file, returning its size in bytes
///
/// # Example
/// ```no_run
/// use keypiano::wav::write_wav_16bit;
///
/// let samples = vec![0.0f32; 44100]; // 1 second of silence
/// let bytes = write_wav_16bit("silence.wav", &samples, 44100).unwrap();
/// assert_eq!(bytes, 44 + 2 * 44100);
/// ```
pub fn write_wav_16bit<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<u64> {
    let mut writer = BufWriter::new(File::create(path)?);
    encode_wav_16bit(&mut writer, samples, sample_rate)?;
    writer.flush()?;
    Ok(HEADER_LEN as u64 + samples.len() as u64 * BYTES_PER_SAMPLE as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn encode(samples: &[f32], sample_rate: u32) -> Vec<u8> {
        let mut data = Vec::new();
        encode_wav_16bit(&mut data, samples, sample_rate).unwrap();
        data
    }

    fn u32_at(data: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
    }

    fn u16_at(data: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([data[offset], data[offset + 1]])
    }

    #[test]
    fn test_header_fields() {
        let data = encode(&[0.0; 10], 44100);

        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WAVE");
        assert_eq!(&data[12..16], b"fmt ");
        assert_eq!(u16_at(&data, 20), 1); // PCM
        assert_eq!(u16_at(&data, 22), 1); // mono
        assert_eq!(u32_at(&data, 24), 44100);
        assert_eq!(u32_at(&data, 28), 88200); // byte rate
        assert_eq!(u16_at(&data, 32), 2); // block align
        assert_eq!(u16_at(&data, 34), 16); // bits per sample
        assert_eq!(&data[36..40], b"data");
    }

    #[test]
    fn test_chunk_sizes() {
        let data = encode(&[0.0; 1000], 16000);
        assert_eq!(data.len(), 44 + 2000);
        assert_eq!(u32_at(&data, 40), 2000);
        assert_eq!(u32_at(&data, 4), 36 + 2000);
    }

    #[test]
    fn test_sample_conversion_and_clamping() {
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(1.0), i16::MAX);
        assert_eq!(to_i16(-1.0), i16::MIN);
        assert_eq!(to_i16(2.0), i16::MAX);
        assert_eq!(to_i16(-2.0), i16::MIN);

        let data = encode(&[1.5, -1.5], 8000);
        assert_eq!(i16::from_le_bytes([data[44], data[45]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([data[46], data[47]]), i16::MIN);
    }

    #[test]
    fn test_write_file() {
        let path = std::env::temp_dir().join("keypiano_test_write_file.wav");
        let bytes = write_wav_16bit(&path, &[0.25; 100], 16000).unwrap();

        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.len(), bytes);
        assert_eq!(bytes, 44 + 200);

        fs::remove_file(&path).unwrap();
    }
}
