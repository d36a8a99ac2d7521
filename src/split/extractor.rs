use crate::audio;
use crate::audio::error::AudioResult;
use crate::audio::flac::FlacCursor;
use crate::audio::{OutputFormat, PcmSpec, SourceFormat};
use crate::planner::TrackMetadata;
use log::debug;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// One unit of work: samples `[start, end)` of `source` into `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    pub source: PathBuf,
    pub format: SourceFormat,
    pub start: u64,
    pub end: u64,
    pub destination: PathBuf,
    pub output: OutputFormat,
    pub metadata: TrackMetadata,
}

/// Turns one segment of the source into an output file. Implementations are
/// called from the blocking thread pool. `decode` is called once per segment in
/// track order and never concurrently, `encode` runs for several segments at once.
pub trait Extractor: Send + Sync + 'static {
    fn decode(&self, request: &ExtractRequest) -> AudioResult<(PcmSpec, Vec<i32>)>;

    fn encode(
        &self,
        request: &ExtractRequest,
        spec: PcmSpec,
        samples: Vec<i32>,
    ) -> AudioResult<()>;
}

/// Decodes ranges to PCM and re-encodes them in the requested output format.
/// FLAC sources are decoded with a single cursor that moves forward from one
/// segment to the next.
#[derive(Default)]
pub struct PcmExtractor {
    flac: Mutex<Option<(PathBuf, FlacCursor)>>,
}

impl Extractor for PcmExtractor {
    fn decode(&self, request: &ExtractRequest) -> AudioResult<(PcmSpec, Vec<i32>)> {
        debug!(
            "Decoding samples {}..{} of {:?}",
            request.start, request.end, request.source
        );

        if request.format != SourceFormat::Flac {
            return audio::read_range(&request.source, request.format, request.start, request.end);
        }

        let mut slot = self.flac.lock().unwrap_or_else(PoisonError::into_inner);
        let mut cursor = match slot.take() {
            Some((path, cursor))
                if path == request.source && cursor.position() <= request.start =>
            {
                cursor
            }
            _ => FlacCursor::open(&request.source)?,
        };

        let samples = cursor.read_range(request.start, request.end)?;
        let spec = cursor.spec();
        *slot = Some((request.source.clone(), cursor));

        Ok((spec, samples))
    }

    fn encode(
        &self,
        request: &ExtractRequest,
        spec: PcmSpec,
        samples: Vec<i32>,
    ) -> AudioResult<()> {
        debug!("Encoding {:?}", request.destination);
        audio::write_track(
            &request.destination,
            request.output,
            spec,
            &samples,
            &request.metadata,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{flac, wave};
    use std::io::Write;
    use std::path::Path;

    fn request(source: &Path, format: SourceFormat, start: u64, end: u64) -> ExtractRequest {
        ExtractRequest {
            source: source.to_path_buf(),
            format,
            start,
            end,
            destination: source.with_file_name(format!("{start}.wav")),
            output: OutputFormat::Wav,
            metadata: TrackMetadata::default(),
        }
    }

    #[test]
    fn extracts_raw_audio_to_wave() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("image.bin");
        let mut file = std::fs::File::create(&source).unwrap();
        for s in 0i16..2000 {
            file.write_all(&s.to_le_bytes()).unwrap();
        }
        drop(file);

        let mut request = request(&source, SourceFormat::RawLittleEndian, 100, 300);
        request.destination = dir.path().join("out").join("01.wav");
        let extractor = PcmExtractor::default();

        let info = audio::probe(&source, request.format).unwrap();
        assert_eq!(info.total_samples, 1000);

        let (spec, samples) = extractor.decode(&request).unwrap();
        extractor.encode(&request, spec, samples).unwrap();
        let (_, pcm) = wave::read_range(&request.destination, 0, 200).unwrap();
        assert_eq!(pcm.first(), Some(&200));
        assert_eq!(pcm.last(), Some(&599));
        assert_eq!(wave::probe(&request.destination).unwrap().total_samples, 200);
    }

    #[test]
    fn flac_segments_share_one_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("image.flac");
        let spec = PcmSpec {
            sample_rate: 8_000,
            channels: 1,
            bits_per_sample: 16,
        };
        let samples: Vec<i32> = (0..12_000).map(|i| (i % 500) - 250).collect();
        let bytes = flac::encode(spec, &samples, &TrackMetadata::default()).unwrap();
        std::fs::write(&source, bytes).unwrap();

        let extractor = PcmExtractor::default();
        for (start, end) in [(0, 5000), (5000, 9000), (9000, 12_000)] {
            let (_, pcm) = extractor
                .decode(&request(&source, SourceFormat::Flac, start, end))
                .unwrap();
            assert_eq!(pcm, samples[start as usize..end as usize].to_vec());

            let slot = extractor.flac.lock().unwrap();
            assert_eq!(slot.as_ref().map(|(_, c)| c.position()), Some(end));
        }

        // going backwards reopens the stream
        let (_, pcm) = extractor
            .decode(&request(&source, SourceFormat::Flac, 10, 20))
            .unwrap();
        assert_eq!(pcm, samples[10..20].to_vec());
    }
}
