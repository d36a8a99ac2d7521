use crate::audio::error::AudioError;
use crate::cue::error::CueError;
use crate::planner::error::PlanError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    JoinError(#[from] tokio::task::JoinError),

    #[error(transparent)]
    CueError(#[from] CueError),

    #[error(transparent)]
    PlanError(#[from] PlanError),

    #[error(transparent)]
    AudioError(#[from] AudioError),

    #[error("Source audio {0:?} referenced by the CUE sheet was not found")]
    SourceNotFound(PathBuf),

    #[error("Output file {0:?} already exists, use --force to overwrite")]
    OutputExists(PathBuf),

    #[error("Invalid filename template {template:?}: unknown placeholder {{{placeholder}}}")]
    InvalidTemplate {
        template: String,
        placeholder: String,
    },

    #[error("Extracting track {track:02} to {destination:?} failed: {source}")]
    ExtractionFailed {
        track: u8,
        destination: PathBuf,
        #[source]
        source: AudioError,
    },

    #[error("No CUE sheets found in {0:?}")]
    NoCueSheets(PathBuf),

    #[error("{failed} of {total} CUE sheets could not be split")]
    BatchFailed { failed: usize, total: usize },
}

pub type SplitResult<T> = Result<T, SplitError>;
