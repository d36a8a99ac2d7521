use crate::planner::timebase::Timebase;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(
        "Track {track:02} starts at {start} but the media ends at {duration} ({timebase}), the CUE sheet claims audio beyond the file"
    )]
    SheetExceedsMedia {
        track: u8,
        start: u64,
        duration: u64,
        timebase: Timebase,
    },

    #[error("Track {track:02} starts at {start}, expected a position after {previous} ({timebase})")]
    TrackOrder {
        track: u8,
        start: u64,
        previous: u64,
        timebase: Timebase,
    },

    #[error("Track {track:02} has no INDEX 01")]
    MissingStart { track: u8 },
}

pub type PlanResult<T> = Result<T, PlanError>;
