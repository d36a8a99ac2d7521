use crate::cue::directive::Directive;
use crate::cue::error::{CueError, CueResult};
use crate::cue::models::{CueFile, CueSheet, Index, RemEntry, RemKey, Track};
use crate::cue::tokenizer::DirectiveRecord;
use log::debug;

/// Folds directive records into a [`CueSheet`]. Until the first `TRACK` every
/// scoped directive applies to the disc, afterwards to the most recent track.
#[derive(Debug, Default)]
pub struct CueSheetBuilder {
    title: Option<String>,
    performer: Option<String>,
    songwriter: Option<String>,
    catalog: Option<String>,
    cd_text_file: Option<String>,
    file: Option<CueFile>,
    rem: Vec<RemEntry>,
    tracks: Vec<Track>,
    current_track: Option<Track>,
}

impl CueSheetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build<I>(records: I) -> CueResult<CueSheet>
    where
        I: IntoIterator<Item = CueResult<DirectiveRecord>>,
    {
        records
            .into_iter()
            .try_fold(Self::new(), |builder, record| builder.apply(record?))?
            .finish()
    }

    pub fn apply(mut self, record: DirectiveRecord) -> CueResult<Self> {
        let line = record.line;

        match Directive::from_record(record)? {
            Directive::Title(title) => match self.current_track.as_mut() {
                Some(track) => track.title = Some(title),
                None => self.title = Some(title),
            },
            Directive::Performer(performer) => match self.current_track.as_mut() {
                Some(track) => track.performer = Some(performer),
                None => self.performer = Some(performer),
            },
            Directive::Songwriter(songwriter) => match self.current_track.as_mut() {
                Some(track) => track.songwriter = Some(songwriter),
                None => self.songwriter = Some(songwriter),
            },
            Directive::Catalog(catalog) => self.catalog = Some(catalog),
            Directive::CdTextFile(name) => self.cd_text_file = Some(name),
            Directive::File { name, file_type } => {
                if self.file.is_some() {
                    return Err(CueError::UnsupportedMultiFile { line });
                }
                self.file = Some(CueFile {
                    filename: name,
                    file_type,
                });
            }
            Directive::Track { number, track_type } => {
                if self.file.is_none() {
                    return Err(CueError::TrackOutsideFile { line });
                }

                let expected = match &self.current_track {
                    Some(track) => track.number.saturating_add(1),
                    None => 1,
                };
                if number != expected {
                    return Err(CueError::TrackSequenceError {
                        line,
                        expected,
                        found: number,
                    });
                }

                if let Some(track) = self.current_track.take() {
                    self.tracks.push(track);
                }
                self.current_track = Some(Track {
                    number,
                    track_type,
                    ..Default::default()
                });
            }
            Directive::Index { number, timecode } => {
                let track = self
                    .current_track
                    .as_mut()
                    .ok_or(CueError::IndexOutsideTrack { line })?;

                if let Some(last) = track.indices.last() {
                    if number <= last.number || timecode <= last.position {
                        return Err(CueError::IndexOrder {
                            line,
                            track: track.number,
                        });
                    }
                }
                track.indices.push(Index {
                    number,
                    position: timecode,
                });
            }
            Directive::Pregap(gap) => self.track_scope(line, "PREGAP")?.pregap = Some(gap),
            Directive::Postgap(gap) => self.track_scope(line, "POSTGAP")?.postgap = Some(gap),
            Directive::Isrc(isrc) => self.track_scope(line, "ISRC")?.isrc = Some(isrc),
            Directive::Flags(flags) => self.track_scope(line, "FLAGS")?.flags = flags,
            Directive::Rem { key, value } => {
                let Some(keyword) = key else {
                    return Ok(self);
                };
                match RemKey::from_keyword(&keyword) {
                    Some(key) => {
                        let entry = RemEntry { key, value };
                        match self.current_track.as_mut() {
                            Some(track) => track.rem.push(entry),
                            None => self.rem.push(entry),
                        }
                    }
                    None => debug!("Line {line}: ignoring REM {keyword}"),
                }
            }
            Directive::Unknown { command, .. } => {
                debug!("Line {line}: ignoring unsupported directive {command}");
            }
        }

        Ok(self)
    }

    pub fn finish(mut self) -> CueResult<CueSheet> {
        let file = self.file.ok_or(CueError::MissingFile)?;

        if let Some(track) = self.current_track.take() {
            self.tracks.push(track);
        }
        if self.tracks.is_empty() {
            return Err(CueError::NoTracks);
        }
        if let Some(track) = self.tracks.iter().find(|t| t.index(1).is_none()) {
            return Err(CueError::MissingIndex01 {
                track: track.number,
            });
        }

        Ok(CueSheet {
            title: self.title,
            performer: self.performer,
            songwriter: self.songwriter,
            catalog: self.catalog,
            cd_text_file: self.cd_text_file,
            file,
            rem: self.rem,
            tracks: self.tracks,
        })
    }

    fn track_scope(&mut self, line: usize, directive: &'static str) -> CueResult<&mut Track> {
        self.current_track
            .as_mut()
            .ok_or(CueError::TrackScopeRequired { line, directive })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::models::{FileType, Timecode};
    use crate::cue::tokenizer::tokenize;

    fn build(text: &str) -> CueResult<CueSheet> {
        CueSheetBuilder::build(tokenize(text))
    }

    const ALBUM: &str = r#"
REM GENRE "Progressive Rock"
REM DATE 1973
REM COMMENT "ExactAudioCopy v1.6"
REM ACCURATERIPID 0123
PERFORMER "Disc Artist"
TITLE "Disc Title"
FILE "album.flac" WAVE
  TRACK 01 AUDIO
    TITLE "First"
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    TITLE "Second"
    PERFORMER "Guest"
    FLAGS DCP
    ISRC GBAYE7300001
    REM REPLAYGAIN_TRACK_GAIN -3.2 dB
    INDEX 00 03:28:00
    INDEX 01 03:30:00
"#;

    #[test]
    fn builds_disc_and_track_scopes() {
        let sheet = build(ALBUM).unwrap();

        assert_eq!(sheet.title.as_deref(), Some("Disc Title"));
        assert_eq!(sheet.performer.as_deref(), Some("Disc Artist"));
        assert_eq!(sheet.file.filename, "album.flac");
        assert_eq!(sheet.file.file_type, FileType::Wave);
        assert_eq!(sheet.rem(RemKey::Genre), Some("Progressive Rock"));
        assert_eq!(sheet.rem(RemKey::Date), Some("1973"));
        assert_eq!(sheet.rem.len(), 3);

        assert_eq!(sheet.tracks.len(), 2);
        let first = &sheet.tracks[0];
        assert_eq!(first.title.as_deref(), Some("First"));
        assert_eq!(sheet.performer_of(first), Some("Disc Artist"));

        let second = &sheet.tracks[1];
        assert_eq!(sheet.performer_of(second), Some("Guest"));
        assert_eq!(second.flags, vec!["DCP"]);
        assert_eq!(second.isrc.as_deref(), Some("GBAYE7300001"));
        assert_eq!(second.rem(RemKey::ReplayGainTrackGain), Some("-3.2 dB"));
        assert_eq!(second.pregap_start(), Some(Timecode::new(3, 28, 0).unwrap()));
        assert_eq!(second.start(), Some(Timecode::new(3, 30, 0).unwrap()));
    }

    #[test]
    fn skipped_track_number_fails() {
        let err = build(
            "FILE a.wav WAVE\nTRACK 01 AUDIO\nINDEX 01 00:00:00\nTRACK 03 AUDIO\nINDEX 01 01:00:00",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CueError::TrackSequenceError {
                line: 4,
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn first_track_must_be_one() {
        let err = build("FILE a.wav WAVE\nTRACK 02 AUDIO\nINDEX 01 00:00:00").unwrap_err();
        assert!(matches!(
            err,
            CueError::TrackSequenceError {
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn index_before_track_fails() {
        let err = build("FILE a.wav WAVE\nINDEX 01 00:00:00\nTRACK 01 AUDIO").unwrap_err();
        assert!(matches!(err, CueError::IndexOutsideTrack { line: 2 }));
    }

    #[test]
    fn second_file_is_rejected() {
        let err = build(
            "FILE a.wav WAVE\nTRACK 01 AUDIO\nINDEX 01 00:00:00\nFILE b.wav WAVE\nTRACK 02 AUDIO\nINDEX 01 00:00:00",
        )
        .unwrap_err();
        assert!(matches!(err, CueError::UnsupportedMultiFile { line: 4 }));
    }

    #[test]
    fn track_requires_file() {
        let err = build("TRACK 01 AUDIO\nINDEX 01 00:00:00").unwrap_err();
        assert!(matches!(err, CueError::TrackOutsideFile { line: 1 }));
    }

    #[test]
    fn track_scoped_directives_require_track() {
        let err = build("FILE a.wav WAVE\nPREGAP 00:02:00").unwrap_err();
        assert!(matches!(
            err,
            CueError::TrackScopeRequired {
                line: 2,
                directive: "PREGAP"
            }
        ));
    }

    #[test]
    fn indexes_must_increase() {
        let err = build(
            "FILE a.wav WAVE\nTRACK 01 AUDIO\nINDEX 01 00:10:00\nINDEX 02 00:05:00",
        )
        .unwrap_err();
        assert!(matches!(err, CueError::IndexOrder { line: 4, track: 1 }));
    }

    #[test]
    fn track_without_index_01_fails() {
        let err = build(
            "FILE a.wav WAVE\nTRACK 01 AUDIO\nINDEX 01 00:00:00\nTRACK 02 AUDIO\nINDEX 00 01:00:00",
        )
        .unwrap_err();
        assert!(matches!(err, CueError::MissingIndex01 { track: 2 }));
    }

    #[test]
    fn empty_sheets_fail() {
        assert!(matches!(build("TITLE x"), Err(CueError::MissingFile)));
        assert!(matches!(build("FILE a.wav WAVE"), Err(CueError::NoTracks)));
    }

    #[test]
    fn unknown_directives_are_ignored() {
        let sheet = build(
            "FILE a.wav WAVE\nTRACK 01 AUDIO\nARRANGER \"x\"\nREM\nINDEX 01 00:00:00",
        )
        .unwrap();
        assert_eq!(sheet.tracks.len(), 1);
    }
}
