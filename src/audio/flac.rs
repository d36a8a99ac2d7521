use crate::audio::error::{AudioError, AudioResult};
use crate::audio::{MediaInfo, PcmSpec, tags};
use crate::planner::TrackMetadata;
use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use claxon::FlacReader;
use claxon::frame::Block;
use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;
use log::warn;
use std::fs::File;
use std::io;
use std::mem;
use std::ops::Range;
use std::path::Path;

const VENDOR: &str = concat!("cues ", env!("CARGO_PKG_VERSION"));
const BLOCK_TYPE_VORBIS_COMMENT: u8 = 4;
const LAST_BLOCK_FLAG: u8 = 0x80;

pub fn probe(path: &Path) -> AudioResult<MediaInfo> {
    let mut reader = FlacReader::open(path)?;
    let info = reader.streaminfo();
    let spec = spec_of(&info)?;

    let total_samples = match info.samples {
        Some(samples) => samples,
        None => {
            warn!("{path:?} does not declare its length, decoding to count samples");
            let mut blocks = reader.blocks();
            let mut buffer = Vec::new();
            let mut total = 0u64;
            while let Some(block) = blocks.read_next_or_eof(buffer)? {
                total += block.duration() as u64;
                buffer = block.into_buffer();
            }
            total
        }
    };

    Ok(MediaInfo {
        spec,
        total_samples,
    })
}

pub fn read_range(path: &Path, start: u64, end: u64) -> AudioResult<(PcmSpec, Vec<i32>)> {
    let mut cursor = FlacCursor::open(path)?;
    let samples = cursor.read_range(start, end)?;
    Ok((cursor.spec(), samples))
}

/// Forward-only decoder that resumes where the previous range ended, so
/// consecutive tracks decode the stream once. Samples of the last block that
/// lie past the returned range are kept for the next call.
pub struct FlacCursor {
    reader: FlacReader<File>,
    spec: PcmSpec,
    position: u64,
    carry: Vec<i32>,
    buffer: Vec<i32>,
}

impl FlacCursor {
    pub fn open(path: &Path) -> AudioResult<Self> {
        let reader = FlacReader::open(path)?;
        let spec = spec_of(&reader.streaminfo())?;

        Ok(Self {
            reader,
            spec,
            position: 0,
            carry: Vec::new(),
            buffer: Vec::new(),
        })
    }

    pub fn spec(&self) -> PcmSpec {
        self.spec
    }

    /// First sample the next range may start at.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Interleaved samples `[start, end)`. `start` must not lie before
    /// [`Self::position`].
    pub fn read_range(&mut self, start: u64, end: u64) -> AudioResult<Vec<i32>> {
        if start > end || start < self.position {
            return Err(AudioError::InvalidRange {
                start,
                end,
                total: self.reader.streaminfo().samples.unwrap_or(0),
            });
        }

        let channels = self.spec.channels as usize;
        let mut samples = Vec::with_capacity((end - start) as usize * channels);

        let carry_end = self.position + (self.carry.len() / channels) as u64;
        if start < carry_end {
            let from = (start - self.position) as usize * channels;
            let to = (end.min(carry_end) - self.position) as usize * channels;
            samples.extend_from_slice(&self.carry[from..to]);
        }
        if end <= carry_end {
            self.carry.drain(..(end - self.position) as usize * channels);
            self.position = end;
            return Ok(samples);
        }
        self.carry.clear();
        self.position = carry_end;

        let mut blocks = self.reader.blocks();
        let mut buffer = mem::take(&mut self.buffer);
        while let Some(block) = blocks.read_next_or_eof(buffer)? {
            let block_start = block.time();
            let block_end = block_start + block.duration() as u64;

            if block_end > start {
                let from = start.saturating_sub(block_start) as u32;
                let to = (end.min(block_end) - block_start) as u32;
                push_samples(&mut samples, &block, from..to, channels);
            }

            if block_end >= end {
                let rest = (end - block_start) as u32..block.duration();
                push_samples(&mut self.carry, &block, rest, channels);
                self.position = end;
                self.buffer = block.into_buffer();
                return Ok(samples);
            }
            buffer = block.into_buffer();
        }

        Err(AudioError::TruncatedSource {
            expected: end - start,
            found: (samples.len() / channels) as u64,
        })
    }
}

fn push_samples(out: &mut Vec<i32>, block: &Block, range: Range<u32>, channels: usize) {
    for i in range {
        for ch in 0..channels as u32 {
            out.push(block.sample(ch, i));
        }
    }
}

fn spec_of(info: &claxon::metadata::StreamInfo) -> AudioResult<PcmSpec> {
    if info.sample_rate == 0 {
        return Err(AudioError::ZeroSampleRate);
    }

    Ok(PcmSpec {
        sample_rate: info.sample_rate,
        channels: u16::try_from(info.channels).map_err(|_| {
            AudioError::UnsupportedSampleFormat {
                format_tag: 0,
                bits_per_sample: info.bits_per_sample as u16,
            }
        })?,
        bits_per_sample: info.bits_per_sample as u16,
    })
}

/// Encodes interleaved samples into a complete FLAC stream with the track tags.
pub fn encode(spec: PcmSpec, samples: &[i32], metadata: &TrackMetadata) -> AudioResult<Vec<u8>> {
    let channels = spec.channels as usize;
    if channels == 0 || samples.len() % channels != 0 || spec.bits_per_sample > 24 {
        return Err(AudioError::UnsupportedSampleFormat {
            format_tag: 0,
            bits_per_sample: spec.bits_per_sample,
        });
    }

    let config = config::Encoder::default();
    let config = config
        .into_verified()
        .map_err(|(_, err)| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    let source = MemSource::from_samples(
        samples,
        channels,
        spec.bits_per_sample as usize,
        spec.sample_rate as usize,
    );
    let stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|_| AudioError::EncodeError("could not encode with fixed block size".into()))?;

    let mut sink = ByteSink::new();
    stream
        .write(&mut sink)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    insert_vorbis_comment(sink.into_inner(), &tags(metadata))
}

/// Splices a `VORBIS_COMMENT` block in as the last metadata block.
fn insert_vorbis_comment(mut flac: Vec<u8>, tags: &[(&str, String)]) -> AudioResult<Vec<u8>> {
    if flac.len() < 4 || &flac[..4] != b"fLaC" {
        return Err(AudioError::EncodeError("missing fLaC marker".into()));
    }

    let mut pos = 4;
    loop {
        if pos + 4 > flac.len() {
            return Err(AudioError::EncodeError("truncated metadata block".into()));
        }
        let header = flac[pos];
        let len = BigEndian::read_u24(&flac[pos + 1..pos + 4]) as usize;
        if header & LAST_BLOCK_FLAG != 0 {
            flac[pos] = header & !LAST_BLOCK_FLAG;
            pos += 4 + len;
            break;
        }
        pos += 4 + len;
    }

    let block = vorbis_comment_block(tags)?;
    let frames = flac.split_off(pos);
    flac.extend_from_slice(&block);
    flac.extend_from_slice(&frames);
    Ok(flac)
}

fn vorbis_comment_block(tags: &[(&str, String)]) -> AudioResult<Vec<u8>> {
    let mut body = Vec::new();
    body.write_u32::<LittleEndian>(VENDOR.len() as u32)?;
    body.extend_from_slice(VENDOR.as_bytes());
    body.write_u32::<LittleEndian>(tags.len() as u32)?;
    for (key, value) in tags {
        let comment = format!("{key}={value}");
        body.write_u32::<LittleEndian>(comment.len() as u32)?;
        body.extend_from_slice(comment.as_bytes());
    }

    let mut block = Vec::with_capacity(body.len() + 4);
    block.push(LAST_BLOCK_FLAG | BLOCK_TYPE_VORBIS_COMMENT);
    block.write_u24::<BigEndian>(body.len() as u32)?;
    block.extend_from_slice(&body);
    Ok(block)
}
