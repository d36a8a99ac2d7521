// src/cue/models
use crate::cd::{FRAMES_PER_SECOND, SECONDS_PER_MINUTE};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A parsed CUE sheet. Only built through [`crate::cue::builder::CueSheetBuilder`],
/// which guarantees a single `FILE`, at least one track, contiguous track numbers
/// and an `INDEX 01` on every track.
#[derive(Debug, Clone)]
pub struct CueSheet {
    pub title: Option<String>,
    pub performer: Option<String>,
    pub songwriter: Option<String>,
    pub catalog: Option<String>,
    pub cd_text_file: Option<String>,
    pub file: CueFile,
    pub rem: Vec<RemEntry>,
    pub tracks: Vec<Track>,
}

impl CueSheet {
    pub fn rem(&self, key: RemKey) -> Option<&str> {
        find_rem(&self.rem, key)
    }

    /// Track performer with the disc performer as fallback.
    pub fn performer_of<'a>(&'a self, track: &'a Track) -> Option<&'a str> {
        track
            .performer
            .as_deref()
            .or(self.performer.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueFile {
    pub filename: String,
    pub file_type: FileType,
}

#[derive(Debug, Clone, Default)]
pub struct Track {
    pub number: u8,
    pub track_type: TrackType,
    pub title: Option<String>,
    pub performer: Option<String>,
    pub songwriter: Option<String>,
    pub isrc: Option<String>,
    pub flags: Vec<String>,
    pub pregap: Option<Timecode>,
    pub postgap: Option<Timecode>,
    pub rem: Vec<RemEntry>,
    pub indices: Vec<Index>,
}

impl Track {
    pub fn index(&self, number: u8) -> Option<&Index> {
        self.indices.iter().find(|i| i.number == number)
    }

    /// Audible start of the track (`INDEX 01`).
    pub fn start(&self) -> Option<Timecode> {
        self.index(1).map(|i| i.position)
    }

    /// Start of the pre-gap (`INDEX 00`) if the sheet marks one.
    pub fn pregap_start(&self) -> Option<Timecode> {
        self.index(0).map(|i| i.position)
    }

    pub fn rem(&self, key: RemKey) -> Option<&str> {
        find_rem(&self.rem, key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index {
    pub number: u8,
    pub position: Timecode,
}

/// `REM` sub-forms kept as metadata. Everything else after `REM` is a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemKey {
    Date,
    Genre,
    DiscId,
    Comment,
    DiscNumber,
    TotalDiscs,
    ReplayGainAlbumGain,
    ReplayGainAlbumPeak,
    ReplayGainTrackGain,
    ReplayGainTrackPeak,
}

impl RemKey {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "DATE" => Some(RemKey::Date),
            "GENRE" => Some(RemKey::Genre),
            "DISCID" => Some(RemKey::DiscId),
            "COMMENT" => Some(RemKey::Comment),
            "DISCNUMBER" => Some(RemKey::DiscNumber),
            "TOTALDISCS" => Some(RemKey::TotalDiscs),
            "REPLAYGAIN_ALBUM_GAIN" => Some(RemKey::ReplayGainAlbumGain),
            "REPLAYGAIN_ALBUM_PEAK" => Some(RemKey::ReplayGainAlbumPeak),
            "REPLAYGAIN_TRACK_GAIN" => Some(RemKey::ReplayGainTrackGain),
            "REPLAYGAIN_TRACK_PEAK" => Some(RemKey::ReplayGainTrackPeak),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemEntry {
    pub key: RemKey,
    pub value: String,
}

fn find_rem(entries: &[RemEntry], key: RemKey) -> Option<&str> {
    entries
        .iter()
        .find(|e| e.key == key)
        .map(|e| e.value.as_str())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimecodeError {
    #[error("expected MM:SS:FF")]
    InvalidFormat,

    #[error(transparent)]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("seconds must be below 60 and frames below 75")]
    OutOfRange,
}

/// CUE time position, `minutes:seconds:frames` at 75 frames per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timecode {
    minutes: u32,
    seconds: u8,
    frames: u8,
}

impl Timecode {
    pub fn new(minutes: u32, seconds: u8, frames: u8) -> Result<Self, TimecodeError> {
        if seconds as u64 >= SECONDS_PER_MINUTE || frames as u64 >= FRAMES_PER_SECOND {
            return Err(TimecodeError::OutOfRange);
        }
        Ok(Self {
            minutes,
            seconds,
            frames,
        })
    }

    pub fn from_frames(total: u64) -> Self {
        let frames = (total % FRAMES_PER_SECOND) as u8;
        let total_seconds = total / FRAMES_PER_SECOND;
        Self {
            minutes: (total_seconds / SECONDS_PER_MINUTE) as u32,
            seconds: (total_seconds % SECONDS_PER_MINUTE) as u8,
            frames,
        }
    }

    pub fn total_frames(&self) -> u64 {
        (self.minutes as u64 * SECONDS_PER_MINUTE + self.seconds as u64) * FRAMES_PER_SECOND
            + self.frames as u64
    }
}

impl FromStr for Timecode {
    type Err = TimecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(TimecodeError::InvalidFormat);
        }

        Timecode::new(parts[0].parse()?, parts[1].parse()?, parts[2].parse()?)
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.minutes, self.seconds, self.frames
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackType {
    #[default]
    Audio,
    CdG,
    Mode1_2048,
    Mode1_2352,
    Mode2_2336,
    Mode2_2352,
    CdI2336,
    CdI2352,
}

impl TrackType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "AUDIO" => Some(TrackType::Audio),
            "CDG" => Some(TrackType::CdG),
            "MODE1/2048" => Some(TrackType::Mode1_2048),
            "MODE1/2352" => Some(TrackType::Mode1_2352),
            "MODE2/2336" => Some(TrackType::Mode2_2336),
            "MODE2/2352" => Some(TrackType::Mode2_2352),
            "CDI/2336" => Some(TrackType::CdI2336),
            "CDI/2352" => Some(TrackType::CdI2352),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Binary,
    Motorola,
    Aiff,
    Wave,
    Mp3,
    Flac,
}

impl FileType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "BINARY" => Some(FileType::Binary),
            "MOTOROLA" => Some(FileType::Motorola),
            "AIFF" => Some(FileType::Aiff),
            "WAVE" => Some(FileType::Wave),
            "MP3" => Some(FileType::Mp3),
            "FLAC" => Some(FileType::Flac),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timecode() {
        let tc: Timecode = "03:30:12".parse().unwrap();
        assert_eq!((tc.minutes, tc.seconds, tc.frames), (3, 30, 12));
        assert_eq!(tc.total_frames(), 210 * 75 + 12);
        assert_eq!(tc.to_string(), "03:30:12");
    }

    #[test]
    fn accepts_minutes_beyond_99() {
        let tc: Timecode = "120:00:00".parse().unwrap();
        assert_eq!(tc.total_frames(), 120 * 60 * 75);
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert_eq!(
            "00:60:00".parse::<Timecode>(),
            Err(TimecodeError::OutOfRange)
        );
        assert_eq!(
            "00:00:75".parse::<Timecode>(),
            Err(TimecodeError::OutOfRange)
        );
        assert_eq!(
            "00:00".parse::<Timecode>(),
            Err(TimecodeError::InvalidFormat)
        );
        assert!(matches!(
            "00:aa:00".parse::<Timecode>(),
            Err(TimecodeError::ParseIntError(_))
        ));
    }

    #[test]
    fn from_frames_inverts_total_frames() {
        let tc = Timecode::new(74, 59, 74).unwrap();
        assert_eq!(Timecode::from_frames(tc.total_frames()), tc);
    }

    #[test]
    fn millisecond_conversion_is_lossless_at_frame_resolution() {
        let to_millis = |tc: Timecode| (tc.total_frames() * 1000 + 37) / 75;
        let from_millis = |ms: u64| Timecode::from_frames((ms * 75 + 500) / 1000);

        for total in 0..(3 * 60 * 75) {
            let tc = Timecode::from_frames(total);
            assert_eq!(from_millis(to_millis(tc)), tc, "frame {total}");
        }
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(FileType::from_keyword("wave"), Some(FileType::Wave));
        assert_eq!(TrackType::from_keyword("mode1/2352"), Some(TrackType::Mode1_2352));
        assert_eq!(RemKey::from_keyword("Genre"), Some(RemKey::Genre));
        assert_eq!(RemKey::from_keyword("ACCURATERIPID"), None);
    }
}
