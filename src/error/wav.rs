// WAV input error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// WAV error code constants
///
/// Error code range: 2001-2007
pub struct WavErrorCodes {}

impl WavErrorCodes {
    /// File is shorter than the minimal RIFF/WAVE header
    pub const FILE_TOO_SHORT: i32 = 2001;

    /// Missing `RIFF` marker at offset 0
    pub const MISSING_RIFF: i32 = 2002;

    /// Missing `WAVE` marker at offset 8
    pub const MISSING_WAVE: i32 = 2003;

    /// No `data` subchunk found while scanning chunk IDs
    pub const MISSING_DATA_CHUNK: i32 = 2004;

    /// Format chunk describes something other than 16-bit integer PCM
    pub const UNSUPPORTED_FORMAT: i32 = 2005;

    /// A chunk size points past the end of the file
    pub const TRUNCATED_DATA: i32 = 2006;

    /// Underlying file read failed
    pub const READ_FAILED: i32 = 2007;
}

/// Log a WAV error with structured context
pub fn log_wav_error(err: &WavError, context: &str) {
    error!(
        "WAV error in {}: code={}, component=WavDecoder, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// WAV input validation errors
///
/// All of these are hard failures surfaced to the caller before any
/// samples are produced; a malformed file never yields a partial
/// sample array.
///
/// Error code range: 2001-2007
#[derive(Debug)]
pub enum WavError {
    /// File is below the 44-byte minimum for a PCM WAV
    FileTooShort { len: usize },

    /// Bytes 0..4 are not `RIFF`
    MissingRiff,

    /// Bytes 8..12 are not `WAVE`
    MissingWave,

    /// Chunk scan reached end of file without finding `data`
    MissingDataChunk,

    /// Only 16-bit integer PCM is supported
    UnsupportedFormat { detail: String },

    /// Declared chunk size exceeds the remaining bytes
    TruncatedData { expected: usize, available: usize },

    /// I/O failure while reading the file
    ReadFailed { details: String },
}

impl ErrorCode for WavError {
    fn code(&self) -> i32 {
        match self {
            WavError::FileTooShort { .. } => WavErrorCodes::FILE_TOO_SHORT,
            WavError::MissingRiff => WavErrorCodes::MISSING_RIFF,
            WavError::MissingWave => WavErrorCodes::MISSING_WAVE,
            WavError::MissingDataChunk => WavErrorCodes::MISSING_DATA_CHUNK,
            WavError::UnsupportedFormat { .. } => WavErrorCodes::UNSUPPORTED_FORMAT,
            WavError::TruncatedData { .. } => WavErrorCodes::TRUNCATED_DATA,
            WavError::ReadFailed { .. } => WavErrorCodes::READ_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            WavError::FileTooShort { len } => {
                format!("File too short for a WAV header: {} bytes (need 44)", len)
            }
            WavError::MissingRiff => "Missing RIFF marker at start of file".to_string(),
            WavError::MissingWave => "Missing WAVE marker at offset 8".to_string(),
            WavError::MissingDataChunk => {
                "No data subchunk found in RIFF chunk scan".to_string()
            }
            WavError::UnsupportedFormat { detail } => {
                format!("Unsupported WAV format: {}", detail)
            }
            WavError::TruncatedData {
                expected,
                available,
            } => {
                format!(
                    "Chunk declares {} bytes but only {} remain",
                    expected, available
                )
            }
            WavError::ReadFailed { details } => {
                format!("Failed to read WAV file: {}", details)
            }
        }
    }
}

impl fmt::Display for WavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WavError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for WavError {}

impl From<std::io::Error> for WavError {
    fn from(err: std::io::Error) -> Self {
        WavError::ReadFailed {
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_error_codes() {
        assert_eq!(
            WavError::FileTooShort { len: 10 }.code(),
            WavErrorCodes::FILE_TOO_SHORT
        );
        assert_eq!(WavError::MissingRiff.code(), WavErrorCodes::MISSING_RIFF);
        assert_eq!(WavError::MissingWave.code(), WavErrorCodes::MISSING_WAVE);
        assert_eq!(
            WavError::MissingDataChunk.code(),
            WavErrorCodes::MISSING_DATA_CHUNK
        );
        assert_eq!(
            WavError::UnsupportedFormat {
                detail: "8-bit".to_string()
            }
            .code(),
            WavErrorCodes::UNSUPPORTED_FORMAT
        );
        assert_eq!(
            WavError::TruncatedData {
                expected: 100,
                available: 10
            }
            .code(),
            WavErrorCodes::TRUNCATED_DATA
        );
        assert_eq!(
            WavError::ReadFailed {
                details: "test".to_string()
            }
            .code(),
            WavErrorCodes::READ_FAILED
        );
    }

    #[test]
    fn test_wav_error_messages() {
        let err = WavError::FileTooShort { len: 12 };
        assert!(err.message().contains("12"));
        assert!(err.message().contains("44"));

        let err = WavError::TruncatedData {
            expected: 4096,
            available: 512,
        };
        assert!(err.message().contains("4096"));
        assert!(err.message().contains("512"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::other("test io error");
        let wav_err: WavError = io_err.into();
        match wav_err {
            WavError::ReadFailed { details } => {
                assert!(details.contains("test io error"));
            }
            other => panic!("Expected ReadFailed, got {:?}", other),
        }
    }
}
