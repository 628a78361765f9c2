// WAV PCM extraction
//
// Minimal RIFF/WAVE reader: just enough container parsing to pull a
// flat PCM sample array out of a file. After the 12-byte RIFF/WAVE
// header, chunks are scanned by ID; the `fmt ` chunk supplies the
// sample rate and layout, the `data` chunk supplies 16-bit
// little-endian signed PCM. Interleaved channels are averaged to mono.
//
// Sample conversion convention, applied everywhere in this crate:
// decode divides by 32768.0, encode rounds and clamps to
// [-32768, 32767]. See `pcm_i16_to_f32` / `pcm_f32_to_i16`.

use std::fs;
use std::path::Path;

use crate::error::{log_wav_error, WavError};

/// Minimum byte length of a PCM WAV: 12-byte RIFF/WAVE header,
/// 24-byte fmt chunk, 8-byte data chunk header
const MIN_WAV_LEN: usize = 44;

/// Decoded PCM payload, downmixed to mono
#[derive(Debug)]
pub struct WavAudio {
    /// Normalized samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate from the fmt chunk, in Hz
    pub sample_rate: u32,
    /// Channel count before downmixing
    pub channels: u16,
}

/// Decode one 16-bit signed PCM sample to a normalized float
///
/// Divides by 32768.0, so i16::MIN maps exactly to -1.0 and i16::MAX
/// to just under 1.0.
#[inline]
pub fn pcm_i16_to_f32(sample: i16) -> f32 {
    sample as f32 / 32768.0
}

/// Encode a normalized float as a 16-bit signed PCM sample
///
/// Rounds `sample * 32768` and clamps to [-32768, 32767]; the inverse
/// of `pcm_i16_to_f32` up to clipping at +1.0.
#[inline]
pub fn pcm_f32_to_i16(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16
}

struct FmtChunk {
    audio_format: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

/// Extract the PCM payload from WAV file bytes
///
/// # Returns
/// The decoded mono samples and sample rate, or a `WavError` for
/// malformed input. Malformed headers are hard failures; no partial
/// sample array is ever returned.
pub fn decode_wav(bytes: &[u8]) -> Result<WavAudio, WavError> {
    if bytes.len() < MIN_WAV_LEN {
        return Err(WavError::FileTooShort { len: bytes.len() });
    }
    if &bytes[0..4] != b"RIFF" {
        return Err(WavError::MissingRiff);
    }
    if &bytes[8..12] != b"WAVE" {
        return Err(WavError::MissingWave);
    }

    let mut fmt: Option<FmtChunk> = None;

    // Scan chunk IDs after the 12-byte header
    let mut offset = 12;
    while offset + 8 <= bytes.len() {
        let id = &bytes[offset..offset + 4];
        let size = read_u32_le(bytes, offset + 4) as usize;
        let body = offset + 8;

        if id == b"fmt " {
            if size < 16 || body + 16 > bytes.len() {
                return Err(WavError::UnsupportedFormat {
                    detail: format!("fmt chunk too small ({} bytes)", size),
                });
            }
            fmt = Some(FmtChunk {
                audio_format: read_u16_le(bytes, body),
                channels: read_u16_le(bytes, body + 2),
                sample_rate: read_u32_le(bytes, body + 4),
                bits_per_sample: read_u16_le(bytes, body + 14),
            });
        } else if id == b"data" {
            let fmt = fmt.ok_or_else(|| WavError::UnsupportedFormat {
                detail: "data chunk precedes fmt chunk".to_string(),
            })?;
            if fmt.audio_format != 1 || fmt.bits_per_sample != 16 {
                return Err(WavError::UnsupportedFormat {
                    detail: format!(
                        "only 16-bit integer PCM is supported (format {}, {} bits)",
                        fmt.audio_format, fmt.bits_per_sample
                    ),
                });
            }
            if fmt.channels == 0 || fmt.sample_rate == 0 {
                return Err(WavError::UnsupportedFormat {
                    detail: format!(
                        "invalid fmt fields: {} channels, {} Hz",
                        fmt.channels, fmt.sample_rate
                    ),
                });
            }
            if body + size > bytes.len() {
                return Err(WavError::TruncatedData {
                    expected: size,
                    available: bytes.len() - body,
                });
            }
            return Ok(decode_data(&bytes[body..body + size], fmt));
        }

        // Chunk bodies are word-aligned; odd sizes carry a pad byte
        offset = body + size + (size & 1);
    }

    Err(WavError::MissingDataChunk)
}

/// Read a WAV file from disk and extract its PCM payload
pub fn read_wav_file<P: AsRef<Path>>(path: P) -> Result<WavAudio, WavError> {
    let bytes = fs::read(path)?;
    decode_wav(&bytes).map_err(|err| {
        log_wav_error(&err, "read_wav_file");
        err
    })
}

fn decode_data(data: &[u8], fmt: FmtChunk) -> WavAudio {
    let channels = fmt.channels as usize;
    let frame_bytes = 2 * channels;
    let frame_count = data.len() / frame_bytes;

    let mut samples = Vec::with_capacity(frame_count);
    for frame in 0..frame_count {
        let base = frame * frame_bytes;
        let mut sum = 0.0_f32;
        for channel in 0..channels {
            let raw = i16::from_le_bytes([
                data[base + 2 * channel],
                data[base + 2 * channel + 1],
            ]);
            sum += pcm_i16_to_f32(raw);
        }
        samples.push(sum / channels as f32);
    }

    WavAudio {
        samples,
        sample_rate: fmt.sample_rate,
        channels: fmt.channels,
    }
}

#[inline]
fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

#[inline]
fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
