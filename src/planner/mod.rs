use crate::cue::models::{CueSheet, RemKey, Timecode, Track};
use crate::planner::error::{PlanError, PlanResult};
use crate::planner::timebase::Timebase;
use log::debug;

pub mod error;
pub mod timebase;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOptions {
    /// Start each track at its `INDEX 00` instead of `INDEX 01`, so the pre-gap
    /// is exported with the track it leads into rather than the one before it.
    pub include_pregap: bool,
}

/// Total length of the source media, measured in `timebase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaDuration {
    pub length: u64,
    pub timebase: Timebase,
}

impl MediaDuration {
    pub fn new(length: u64, timebase: Timebase) -> Self {
        Self { length, timebase }
    }

    pub fn samples(total_samples: u64, sample_rate: u32) -> Self {
        Self::new(total_samples, Timebase::samples(sample_rate))
    }
}

/// Metadata of one output track, with disc-level fallbacks already applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub album: Option<String>,
    pub album_performer: Option<String>,
    pub number: u8,
    pub total_tracks: u8,
    pub title: Option<String>,
    pub performer: Option<String>,
    pub songwriter: Option<String>,
    pub date: Option<String>,
    pub genre: Option<String>,
    pub isrc: Option<String>,
    pub comment: Option<String>,
    pub disc_number: Option<String>,
    pub total_discs: Option<String>,
    pub album_gain: Option<String>,
    pub album_peak: Option<String>,
    pub track_gain: Option<String>,
    pub track_peak: Option<String>,
}

impl TrackMetadata {
    pub fn resolve(sheet: &CueSheet, track: &Track) -> Self {
        Self {
            album: sheet.title.clone(),
            album_performer: sheet.performer.clone(),
            number: track.number,
            total_tracks: sheet.tracks.len() as u8,
            title: track.title.clone(),
            performer: sheet.performer_of(track).map(str::to_string),
            songwriter: track.songwriter.clone().or_else(|| sheet.songwriter.clone()),
            date: sheet.rem(RemKey::Date).map(str::to_string),
            genre: sheet.rem(RemKey::Genre).map(str::to_string),
            isrc: track.isrc.clone(),
            comment: track
                .rem(RemKey::Comment)
                .or_else(|| sheet.rem(RemKey::Comment))
                .map(str::to_string),
            disc_number: sheet.rem(RemKey::DiscNumber).map(str::to_string),
            total_discs: sheet.rem(RemKey::TotalDiscs).map(str::to_string),
            album_gain: sheet.rem(RemKey::ReplayGainAlbumGain).map(str::to_string),
            album_peak: sheet.rem(RemKey::ReplayGainAlbumPeak).map(str::to_string),
            track_gain: track.rem(RemKey::ReplayGainTrackGain).map(str::to_string),
            track_peak: track.rem(RemKey::ReplayGainTrackPeak).map(str::to_string),
        }
    }
}

/// A segment whose end may still be open because the media duration is not
/// known yet. Only the last draft segment is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftSegment {
    pub track: u8,
    pub start: u64,
    pub end: Option<u64>,
    pub metadata: TrackMetadata,
}

/// `[start, end)` range of the source that becomes one output track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub track: u8,
    pub start: u64,
    pub end: u64,
    pub metadata: TrackMetadata,
}

impl Segment {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
    timebase: Timebase,
    media_duration: u64,
    include_pregap: bool,
    segments: Vec<Segment>,
}

impl SplitPlan {
    pub fn timebase(&self) -> Timebase {
        self.timebase
    }

    pub fn media_duration(&self) -> u64 {
        self.media_duration
    }

    pub fn include_pregap(&self) -> bool {
        self.include_pregap
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackPlanner {
    options: PlanOptions,
}

impl TrackPlanner {
    pub fn new(options: PlanOptions) -> Self {
        Self { options }
    }

    /// Segments with every end resolved except the last, which stays open.
    pub fn draft(&self, sheet: &CueSheet, timebase: Timebase) -> PlanResult<Vec<DraftSegment>> {
        let mut starts: Vec<(u8, u64)> = Vec::with_capacity(sheet.tracks.len());

        for track in &sheet.tracks {
            let start = timebase.from_timecode(self.start_of(track)?);
            if let Some(&(_, previous)) = starts.last() {
                if start <= previous {
                    return Err(PlanError::TrackOrder {
                        track: track.number,
                        start,
                        previous,
                        timebase,
                    });
                }
            }
            starts.push((track.number, start));
        }

        Ok(sheet
            .tracks
            .iter()
            .enumerate()
            .map(|(idx, track)| DraftSegment {
                track: track.number,
                start: starts[idx].1,
                end: starts.get(idx + 1).map(|&(_, next)| next),
                metadata: TrackMetadata::resolve(sheet, track),
            })
            .collect())
    }

    pub fn plan(&self, sheet: &CueSheet, duration: MediaDuration) -> PlanResult<SplitPlan> {
        let timebase = duration.timebase;
        let drafts = self.draft(sheet, timebase)?;

        if let Some(last) = drafts.last() {
            if duration.length <= last.start {
                return Err(PlanError::SheetExceedsMedia {
                    track: last.track,
                    start: last.start,
                    duration: duration.length,
                    timebase,
                });
            }
        }

        if let Some(first) = drafts.first() {
            if first.start > 0 {
                debug!(
                    "Skipping {:.3}s of audio before track {:02}",
                    timebase.to_seconds(first.start),
                    first.track
                );
            }
        }

        let segments: Vec<Segment> = drafts
            .into_iter()
            .map(|draft| Segment {
                track: draft.track,
                start: draft.start,
                end: draft.end.unwrap_or(duration.length),
                metadata: draft.metadata,
            })
            .collect();

        debug_assert!(segments.iter().all(|s| !s.is_empty()));
        debug_assert!(segments.windows(2).all(|w| w[0].end == w[1].start));

        Ok(SplitPlan {
            timebase,
            media_duration: duration.length,
            include_pregap: self.options.include_pregap,
            segments,
        })
    }

    fn start_of(&self, track: &Track) -> PlanResult<Timecode> {
        let audible = track.start().ok_or(PlanError::MissingStart {
            track: track.number,
        })?;

        if self.options.include_pregap {
            Ok(track.pregap_start().unwrap_or(audible))
        } else {
            Ok(audible)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::parse_str;

    fn millis(length: u64) -> MediaDuration {
        MediaDuration::new(length, Timebase::MILLISECONDS)
    }

    const TWO_TRACKS: &str = r#"
PERFORMER "Band"
TITLE "Album"
FILE "album.wav" WAVE
  TRACK 01 AUDIO
    TITLE "One"
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    TITLE "Two"
    INDEX 00 03:28:00
    INDEX 01 03:30:00
"#;

    #[test]
    fn two_track_scenario_in_milliseconds() {
        let sheet = parse_str(TWO_TRACKS).unwrap();
        let plan = TrackPlanner::default()
            .plan(&sheet, millis(300_000))
            .unwrap();

        let bounds: Vec<_> = plan
            .segments()
            .iter()
            .map(|s| (s.track, s.start, s.end))
            .collect();
        assert_eq!(bounds, vec![(1, 0, 210_000), (2, 210_000, 300_000)]);
        assert!(!plan.include_pregap());
        assert_eq!(plan.media_duration(), 300_000);
    }

    #[test]
    fn two_track_scenario_in_samples() {
        let sheet = parse_str(TWO_TRACKS).unwrap();
        let plan = TrackPlanner::default()
            .plan(&sheet, MediaDuration::samples(300 * 44_100, 44_100))
            .unwrap();

        assert_eq!(plan.segments()[0].end, 210 * 44_100);
        assert_eq!(plan.segments()[1].start, 210 * 44_100);
        assert_eq!(plan.segments()[1].end, 300 * 44_100);
    }

    #[test]
    fn include_pregap_moves_boundary_to_index_00() {
        let sheet = parse_str(TWO_TRACKS).unwrap();
        let plan = TrackPlanner::new(PlanOptions {
            include_pregap: true,
        })
        .plan(&sheet, millis(300_000))
        .unwrap();

        assert!(plan.include_pregap());
        assert_eq!(plan.segments()[0].end, 208_000);
        assert_eq!(plan.segments()[1].start, 208_000);
    }

    #[test]
    fn sheet_longer_than_media_fails() {
        let sheet = parse_str(
            "FILE a.wav WAVE\nTRACK 01 AUDIO\nINDEX 01 00:00:00\nTRACK 02 AUDIO\nINDEX 01 05:00:00",
        )
        .unwrap();
        let err = TrackPlanner::default()
            .plan(&sheet, millis(200_000))
            .unwrap_err();

        assert!(matches!(
            err,
            PlanError::SheetExceedsMedia {
                track: 2,
                start: 300_000,
                duration: 200_000,
                ..
            }
        ));
    }

    #[test]
    fn track_starting_at_media_end_fails() {
        let sheet = parse_str(
            "FILE a.wav WAVE\nTRACK 01 AUDIO\nINDEX 01 00:00:00\nTRACK 02 AUDIO\nINDEX 01 01:00:00",
        )
        .unwrap();
        let err = TrackPlanner::default()
            .plan(&sheet, millis(60_000))
            .unwrap_err();
        assert!(matches!(err, PlanError::SheetExceedsMedia { track: 2, .. }));
    }

    #[test]
    fn out_of_order_tracks_fail() {
        let sheet = parse_str(
            "FILE a.wav WAVE\nTRACK 01 AUDIO\nINDEX 01 02:00:00\nTRACK 02 AUDIO\nINDEX 01 01:00:00",
        )
        .unwrap();
        let err = TrackPlanner::default()
            .plan(&sheet, millis(600_000))
            .unwrap_err();
        assert!(matches!(
            err,
            PlanError::TrackOrder {
                track: 2,
                start: 60_000,
                previous: 120_000,
                ..
            }
        ));
    }

    #[test]
    fn draft_leaves_last_end_open() {
        let sheet = parse_str(TWO_TRACKS).unwrap();
        let drafts = TrackPlanner::default()
            .draft(&sheet, Timebase::CD_FRAMES)
            .unwrap();
        assert_eq!(drafts[0].end, Some(210 * 75));
        assert_eq!(drafts[1].end, None);
    }

    #[test]
    fn segments_are_contiguous_and_cover_the_media() {
        let mut text = String::from("FILE a.flac WAVE\n");
        for n in 1..=20u32 {
            text.push_str(&format!(
                "TRACK {n:02} AUDIO\nINDEX 01 {:02}:{:02}:{:02}\n",
                n * 3,
                (n * 7) % 60,
                (n * 11) % 75
            ));
        }
        let sheet = parse_str(&text).unwrap();
        let duration = MediaDuration::samples(70 * 60 * 48_000, 48_000);
        let plan = TrackPlanner::default().plan(&sheet, duration).unwrap();

        let segments = plan.segments();
        assert_eq!(segments.len(), 20);
        assert_eq!(segments.last().unwrap().end, duration.length);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].start < pair[1].start);
            assert!(pair[0].track < pair[1].track);
        }
        assert!(segments.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn metadata_falls_back_to_disc_values() {
        let sheet = parse_str(TWO_TRACKS).unwrap();
        let plan = TrackPlanner::default()
            .plan(&sheet, millis(300_000))
            .unwrap();
        let meta = &plan.segments()[1].metadata;

        assert_eq!(meta.album.as_deref(), Some("Album"));
        assert_eq!(meta.title.as_deref(), Some("Two"));
        assert_eq!(meta.performer.as_deref(), Some("Band"));
        assert_eq!(meta.number, 2);
        assert_eq!(meta.total_tracks, 2);
    }

    #[test]
    fn rem_entries_reach_track_metadata() {
        let sheet = parse_str(
            r#"
REM COMMENT "ExactAudioCopy"
REM DISCNUMBER 2
REM TOTALDISCS 3
REM REPLAYGAIN_ALBUM_GAIN -7.10 dB
REM REPLAYGAIN_ALBUM_PEAK 0.988
FILE a.flac WAVE
  TRACK 01 AUDIO
    REM REPLAYGAIN_TRACK_GAIN -6.50 dB
    REM REPLAYGAIN_TRACK_PEAK 0.912
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    REM COMMENT "Live"
    INDEX 01 01:00:00
"#,
        )
        .unwrap();
        let plan = TrackPlanner::default()
            .plan(&sheet, millis(120_000))
            .unwrap();
        let first = &plan.segments()[0].metadata;
        let second = &plan.segments()[1].metadata;

        assert_eq!(first.track_gain.as_deref(), Some("-6.50 dB"));
        assert_eq!(first.track_peak.as_deref(), Some("0.912"));
        assert_eq!(first.album_gain.as_deref(), Some("-7.10 dB"));
        assert_eq!(first.album_peak.as_deref(), Some("0.988"));
        assert_eq!(first.disc_number.as_deref(), Some("2"));
        assert_eq!(first.total_discs.as_deref(), Some("3"));
        assert_eq!(first.comment.as_deref(), Some("ExactAudioCopy"));

        assert_eq!(second.track_gain, None);
        assert_eq!(second.comment.as_deref(), Some("Live"));
    }
}
