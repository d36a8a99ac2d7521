use crate::audio::error::{AudioError, AudioResult};
use crate::audio::{MediaInfo, PcmSpec};
use crate::planner::TrackMetadata;
use binrw::{BinRead, BinWrite};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use log::warn;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

const WAVE_FORMAT_PCM: u16 = 0x0001;
const WAVE_FORMAT_EXTENSIBLE: u16 = 0xfffe;

/// `RIFF` header. The form type must be `WAVE`.
#[derive(Debug, BinRead, BinWrite)]
#[brw(little, magic = b"RIFF")]
struct RiffHeader {
    size: u32,
    form: [u8; 4],
}

#[derive(Debug, BinRead, BinWrite)]
#[brw(little)]
struct ChunkHeader {
    id: [u8; 4],
    size: u32,
}

/// Common part of the `fmt ` chunk (16 bytes).
#[derive(Debug, BinRead, BinWrite)]
#[brw(little)]
struct FmtChunk {
    format_tag: u16,
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
}

/// `WAVE_FORMAT_EXTENSIBLE` tail of the `fmt ` chunk.
#[derive(Debug, BinRead)]
#[br(little)]
struct FmtExtension {
    _cb_size: u16,
    _valid_bits: u16,
    _channel_mask: u32,
    sub_format: [u8; 16],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveLayout {
    pub spec: PcmSpec,
    pub data_offset: u64,
    pub data_len: u64,
}

impl WaveLayout {
    pub fn total_samples(&self) -> u64 {
        self.data_len / self.spec.block_align() as u64
    }
}

pub fn read_layout<R: Read + Seek>(reader: &mut R) -> AudioResult<WaveLayout> {
    let riff = RiffHeader::read(reader)?;
    if &riff.form != b"WAVE" {
        return Err(AudioError::InvalidWave(
            String::from_utf8_lossy(&riff.form).into_owned(),
        ));
    }

    let stream_len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(12))?;

    let mut spec = None;
    loop {
        let chunk = ChunkHeader::read(reader)?;
        let body_start = reader.stream_position()?;

        match &chunk.id {
            b"fmt " => {
                let fmt = FmtChunk::read(reader)?;
                let mut format_tag = fmt.format_tag;
                if format_tag == WAVE_FORMAT_EXTENSIBLE && chunk.size >= 40 {
                    let ext = FmtExtension::read(reader)?;
                    format_tag = LittleEndian::read_u16(&ext.sub_format[..2]);
                }
                if format_tag != WAVE_FORMAT_PCM
                    || !matches!(fmt.bits_per_sample, 8 | 16 | 24 | 32)
                    || fmt.channels == 0
                {
                    return Err(AudioError::UnsupportedSampleFormat {
                        format_tag,
                        bits_per_sample: fmt.bits_per_sample,
                    });
                }
                if fmt.sample_rate == 0 {
                    return Err(AudioError::ZeroSampleRate);
                }
                spec = Some(PcmSpec {
                    sample_rate: fmt.sample_rate,
                    channels: fmt.channels,
                    bits_per_sample: fmt.bits_per_sample,
                });
            }
            b"data" => {
                let spec = spec.ok_or_else(|| {
                    AudioError::InvalidWave("data chunk before fmt chunk".to_string())
                })?;

                // Streamed or >4 GiB captures carry a placeholder size.
                let available = stream_len.saturating_sub(body_start);
                let mut data_len = chunk.size as u64;
                if data_len > available {
                    warn!(
                        "WAVE data chunk claims {} bytes but only {} are present",
                        data_len, available
                    );
                    data_len = available;
                }
                data_len -= data_len % spec.block_align() as u64;

                return Ok(WaveLayout {
                    spec,
                    data_offset: body_start,
                    data_len,
                });
            }
            _ => {}
        }

        let padded = chunk.size as u64 + (chunk.size as u64 & 1);
        reader.seek(SeekFrom::Start(body_start + padded))?;
    }
}

pub fn probe(path: &Path) -> AudioResult<MediaInfo> {
    let mut reader = BufReader::new(File::open(path)?);
    let layout = read_layout(&mut reader)?;

    Ok(MediaInfo {
        spec: layout.spec,
        total_samples: layout.total_samples(),
    })
}

pub fn read_range(path: &Path, start: u64, end: u64) -> AudioResult<(PcmSpec, Vec<i32>)> {
    let mut reader = BufReader::with_capacity(8 * 1024 * 1024, File::open(path)?);
    let layout = read_layout(&mut reader)?;

    let total = layout.total_samples();
    if start > end || end > total {
        return Err(AudioError::InvalidRange { start, end, total });
    }

    let block_align = layout.spec.block_align() as u64;
    reader.seek(SeekFrom::Start(layout.data_offset + start * block_align))?;

    let mut bytes = vec![0u8; ((end - start) * block_align) as usize];
    reader.read_exact(&mut bytes)?;

    Ok((layout.spec, decode(&bytes, layout.spec.bits_per_sample)))
}

fn decode(bytes: &[u8], bits_per_sample: u16) -> Vec<i32> {
    match bits_per_sample {
        8 => bytes.iter().map(|&b| b as i32 - 128).collect(),
        16 => bytes
            .chunks_exact(2)
            .map(|c| LittleEndian::read_i16(c) as i32)
            .collect(),
        24 => bytes
            .chunks_exact(3)
            .map(|c| LittleEndian::read_i24(c))
            .collect(),
        _ => bytes.chunks_exact(4).map(LittleEndian::read_i32).collect(),
    }
}

/// Writes a PCM WAVE file with a `LIST/INFO` chunk carrying the track tags.
/// Depths that are not a whole number of bytes are stored left-justified in
/// the next larger container, e.g. 12-bit samples as 16-bit.
pub fn write<W: Write + Seek>(
    writer: &mut W,
    spec: PcmSpec,
    samples: &[i32],
    metadata: &TrackMetadata,
) -> AudioResult<()> {
    let container = spec.bytes_per_sample();
    if spec.bits_per_sample == 0 || container > 4 {
        return Err(AudioError::UnsupportedSampleFormat {
            format_tag: WAVE_FORMAT_PCM,
            bits_per_sample: spec.bits_per_sample,
        });
    }
    let shift = (container * 8) as u32 - spec.bits_per_sample as u32;
    let spec = PcmSpec {
        bits_per_sample: (container * 8) as u16,
        ..spec
    };

    let info = info_chunk(metadata)?;
    let data_len = samples.len() * container;
    let riff_size = 4 + (8 + 16) + info.len() + 8 + data_len + (data_len & 1);

    RiffHeader {
        size: riff_size as u32,
        form: *b"WAVE",
    }
    .write(writer)?;

    ChunkHeader {
        id: *b"fmt ",
        size: 16,
    }
    .write(writer)?;
    FmtChunk {
        format_tag: WAVE_FORMAT_PCM,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        byte_rate: spec.sample_rate * spec.block_align() as u32,
        block_align: spec.block_align() as u16,
        bits_per_sample: spec.bits_per_sample,
    }
    .write(writer)?;

    writer.write_all(&info)?;

    ChunkHeader {
        id: *b"data",
        size: data_len as u32,
    }
    .write(writer)?;
    for &sample in samples {
        let sample = sample << shift;
        match container {
            1 => writer.write_u8((sample + 128) as u8)?,
            2 => writer.write_i16::<LittleEndian>(sample as i16)?,
            3 => writer.write_i24::<LittleEndian>(sample)?,
            _ => writer.write_i32::<LittleEndian>(sample)?,
        }
    }
    if data_len & 1 == 1 {
        writer.write_u8(0)?;
    }

    Ok(())
}

fn info_chunk(metadata: &TrackMetadata) -> AudioResult<Vec<u8>> {
    let track = metadata.number.to_string();
    let fields = [
        (b"INAM", metadata.title.as_deref()),
        (b"IART", metadata.performer.as_deref()),
        (b"IPRD", metadata.album.as_deref()),
        (b"ITRK", Some(track.as_str())),
        (b"ICRD", metadata.date.as_deref()),
        (b"IGNR", metadata.genre.as_deref()),
        (b"ICMT", metadata.comment.as_deref()),
    ];

    let mut body = Vec::new();
    body.extend_from_slice(b"INFO");
    for (id, value) in fields {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            continue;
        };
        let len = value.len() + 1;
        body.extend_from_slice(id);
        body.write_u32::<LittleEndian>(len as u32)?;
        body.extend_from_slice(value.as_bytes());
        body.push(0);
        if len & 1 == 1 {
            body.push(0);
        }
    }

    let mut chunk = Vec::with_capacity(body.len() + 8);
    chunk.extend_from_slice(b"LIST");
    chunk.write_u32::<LittleEndian>(body.len() as u32)?;
    chunk.extend_from_slice(&body);
    Ok(chunk)
}
