use crate::audio::error::{AudioError, AudioResult};
use crate::cue::models::FileType;
use crate::planner::{MediaDuration, TrackMetadata};
use clap::ValueEnum;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

pub mod error;
pub mod flac;
pub mod raw;
pub mod wave;

/// Layout of interleaved integer PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl PcmSpec {
    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample as usize).div_ceil(8)
    }

    pub fn block_align(&self) -> usize {
        self.bytes_per_sample() * self.channels as usize
    }
}

/// What the splitter needs to know about a source before planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaInfo {
    pub spec: PcmSpec,
    /// Samples per channel.
    pub total_samples: u64,
}

impl MediaInfo {
    pub fn duration(&self) -> MediaDuration {
        MediaDuration::samples(self.total_samples, self.spec.sample_rate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Flac,
    Wave,
    RawLittleEndian,
    RawBigEndian,
}

impl SourceFormat {
    /// Picks the decoder from the file extension, falling back to the CUE
    /// `FILE` type. Rips often keep `WAVE` in the sheet after transcoding.
    pub fn detect(path: &Path, file_type: FileType) -> AudioResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("flac") => return Ok(SourceFormat::Flac),
            Some("wav") | Some("wave") => return Ok(SourceFormat::Wave),
            _ => {}
        }

        match file_type {
            FileType::Flac => Ok(SourceFormat::Flac),
            FileType::Wave => Ok(SourceFormat::Wave),
            FileType::Binary => Ok(SourceFormat::RawLittleEndian),
            FileType::Motorola => Ok(SourceFormat::RawBigEndian),
            FileType::Aiff => Err(AudioError::UnsupportedSourceFormat("AIFF".to_string())),
            FileType::Mp3 => Err(AudioError::UnsupportedSourceFormat("MP3".to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Flac,
    Wav,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Flac => "flac",
            OutputFormat::Wav => "wav",
        }
    }
}

pub fn probe(path: &Path, format: SourceFormat) -> AudioResult<MediaInfo> {
    match format {
        SourceFormat::Flac => flac::probe(path),
        SourceFormat::Wave => wave::probe(path),
        SourceFormat::RawLittleEndian | SourceFormat::RawBigEndian => raw::probe(path),
    }
}

/// Decodes samples `[start, end)` (per channel) into interleaved PCM.
pub fn read_range(
    path: &Path,
    format: SourceFormat,
    start: u64,
    end: u64,
) -> AudioResult<(PcmSpec, Vec<i32>)> {
    match format {
        SourceFormat::Flac => flac::read_range(path, start, end),
        SourceFormat::Wave => wave::read_range(path, start, end),
        SourceFormat::RawLittleEndian => raw::read_range(path, raw::Endian::Little, start, end),
        SourceFormat::RawBigEndian => raw::read_range(path, raw::Endian::Big, start, end),
    }
}

/// Encodes `samples` to `destination`. The file only appears once it is
/// completely written.
pub fn write_track(
    destination: &Path,
    format: OutputFormat,
    spec: PcmSpec,
    samples: &[i32],
    metadata: &TrackMetadata,
) -> AudioResult<()> {
    let dir = match destination.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::with_capacity(1024 * 1024, tmp.as_file_mut());
        match format {
            OutputFormat::Flac => {
                let bytes = flac::encode(spec, samples, metadata)?;
                writer.write_all(&bytes)?;
            }
            OutputFormat::Wav => wave::write(&mut writer, spec, samples, metadata)?,
        }
        writer.flush()?;
    }
    tmp.persist(destination).map_err(|err| err.error)?;

    Ok(())
}

/// Vorbis comment style tags for a track, in a stable order.
pub fn tags(metadata: &TrackMetadata) -> Vec<(&'static str, String)> {
    let mut tags = Vec::new();
    let mut push = |key: &'static str, value: Option<&String>| {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            tags.push((key, value.clone()));
        }
    };

    push("TITLE", metadata.title.as_ref());
    push("ARTIST", metadata.performer.as_ref());
    push("ALBUM", metadata.album.as_ref());
    push("ALBUMARTIST", metadata.album_performer.as_ref());
    push("COMPOSER", metadata.songwriter.as_ref());
    push("DATE", metadata.date.as_ref());
    push("GENRE", metadata.genre.as_ref());
    push("ISRC", metadata.isrc.as_ref());
    push("COMMENT", metadata.comment.as_ref());
    push("DISCNUMBER", metadata.disc_number.as_ref());
    push("DISCTOTAL", metadata.total_discs.as_ref());
    push("REPLAYGAIN_ALBUM_GAIN", metadata.album_gain.as_ref());
    push("REPLAYGAIN_ALBUM_PEAK", metadata.album_peak.as_ref());
    push("REPLAYGAIN_TRACK_GAIN", metadata.track_gain.as_ref());
    push("REPLAYGAIN_TRACK_PEAK", metadata.track_peak.as_ref());
    tags.push(("TRACKNUMBER", metadata.number.to_string()));
    tags.push(("TRACKTOTAL", metadata.total_tracks.to_string()));

    tags
}
