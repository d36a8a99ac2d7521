use crate::cd::FRAMES_PER_SECOND;
use crate::cue::models::Timecode;
use std::fmt;

/// Resolution of an absolute offset, in units per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    units_per_second: u32,
}

impl Timebase {
    pub const CD_FRAMES: Timebase = Timebase {
        units_per_second: FRAMES_PER_SECOND as u32,
    };
    pub const MILLISECONDS: Timebase = Timebase {
        units_per_second: 1000,
    };

    pub const fn samples(sample_rate: u32) -> Self {
        Self {
            units_per_second: sample_rate,
        }
    }

    /// Whether every CUE frame maps onto a whole number of units.
    pub fn is_frame_exact(&self) -> bool {
        self.units_per_second as u64 % FRAMES_PER_SECOND == 0
    }

    /// Offset of a frame count. Exact when [`Self::is_frame_exact`], otherwise
    /// rounded half up to the nearest unit.
    pub fn from_frames(&self, frames: u64) -> u64 {
        let scaled = frames * self.units_per_second as u64;
        if self.is_frame_exact() {
            scaled / FRAMES_PER_SECOND
        } else {
            (scaled + FRAMES_PER_SECOND / 2) / FRAMES_PER_SECOND
        }
    }

    pub fn from_timecode(&self, timecode: Timecode) -> u64 {
        self.from_frames(timecode.total_frames())
    }

    /// Nearest frame to an offset in this timebase.
    pub fn to_timecode(&self, offset: u64) -> Timecode {
        let per_second = self.divisor() as u64;
        Timecode::from_frames((offset * FRAMES_PER_SECOND + per_second / 2) / per_second)
    }

    /// Re-expresses an offset in another timebase, rounding half up.
    pub fn convert(&self, offset: u64, target: Timebase) -> u64 {
        if *self == target {
            return offset;
        }
        let from = self.divisor() as u128;
        let to = target.units_per_second as u128;
        ((offset as u128 * to + from / 2) / from) as u64
    }

    pub fn to_seconds(&self, offset: u64) -> f64 {
        offset as f64 / self.divisor() as f64
    }

    // A zero rate only comes from a broken header, which the audio backends
    // reject. Treat it as one unit per second rather than dividing by zero.
    fn divisor(&self) -> u32 {
        self.units_per_second.max(1)
    }
}

impl fmt::Display for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.units_per_second {
            75 => write!(f, "CD frames"),
            1000 => write!(f, "milliseconds"),
            rate => write!(f, "samples @ {rate} Hz"),
        }
    }
}
