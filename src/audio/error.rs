use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    FlacError(#[from] claxon::Error),

    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    #[error("{0} sources cannot be split, supported are FLAC, WAVE and raw CD audio")]
    UnsupportedSourceFormat(String),

    #[error("Unsupported sample format: tag 0x{format_tag:04x}, {bits_per_sample} bits per sample")]
    UnsupportedSampleFormat { format_tag: u16, bits_per_sample: u16 },

    #[error("Source declares a sample rate of 0 Hz")]
    ZeroSampleRate,

    #[error("Not a RIFF/WAVE file: {0}")]
    InvalidWave(String),

    #[error("Source ended after {found} of {expected} samples")]
    TruncatedSource { expected: u64, found: u64 },

    #[error("Requested samples {start}..{end} outside of the {total} available")]
    InvalidRange { start: u64, end: u64, total: u64 },

    #[error("FLAC encoding failed: {0}")]
    EncodeError(String),
}

pub type AudioResult<T> = Result<T, AudioError>;
