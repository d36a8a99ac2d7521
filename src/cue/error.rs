use thiserror::Error;

#[derive(Debug, Error)]
pub enum CueError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("CUE sheet is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),

    #[error("Line {line}: expected a directive, found {found:?}")]
    MalformedLine { line: usize, found: String },

    #[error("Line {line}: unterminated quoted string")]
    UnterminatedQuote { line: usize },

    #[error("Line {line}: {directive} is missing an argument")]
    MissingArgument { line: usize, directive: &'static str },

    #[error("Line {line}: invalid {directive} argument {value:?}")]
    InvalidArgument {
        line: usize,
        directive: &'static str,
        value: String,
    },

    #[error("Line {line}: invalid timecode {value:?}, expected MM:SS:FF")]
    InvalidTimecode { line: usize, value: String },

    #[error("Line {line}: only one FILE per CUE sheet is supported")]
    UnsupportedMultiFile { line: usize },

    #[error("Line {line}: TRACK appears before any FILE")]
    TrackOutsideFile { line: usize },

    #[error("Line {line}: expected TRACK {expected:02}, found TRACK {found:02}")]
    TrackSequenceError {
        line: usize,
        expected: u8,
        found: u8,
    },

    #[error("Line {line}: INDEX appears before any TRACK")]
    IndexOutsideTrack { line: usize },

    #[error("Line {line}: {directive} appears before any TRACK")]
    TrackScopeRequired { line: usize, directive: &'static str },

    #[error("Line {line}: indexes of track {track:02} must increase in number and time")]
    IndexOrder { line: usize, track: u8 },

    #[error("Track {track:02} has no INDEX 01")]
    MissingIndex01 { track: u8 },

    #[error("No FILE is referenced in the CUE sheet")]
    MissingFile,

    #[error("CUE sheet contains no tracks")]
    NoTracks,
}

pub type CueResult<T> = Result<T, CueError>;
