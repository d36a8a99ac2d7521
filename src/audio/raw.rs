// Headerless Red Book audio, as referenced by `FILE ... BINARY` / `MOTOROLA`.
use crate::audio::error::{AudioError, AudioResult};
use crate::audio::{MediaInfo, PcmSpec};
use crate::cd::{BITS_PER_SAMPLE, BYTES_PER_SAMPLE_FRAME, CHANNELS, SAMPLE_RATE, SECTOR_SIZE};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::warn;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

pub const CD_AUDIO: PcmSpec = PcmSpec {
    sample_rate: SAMPLE_RATE,
    channels: CHANNELS,
    bits_per_sample: BITS_PER_SAMPLE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

pub fn probe(path: &Path) -> AudioResult<MediaInfo> {
    let len = std::fs::metadata(path)?.len();
    if len % SECTOR_SIZE as u64 != 0 {
        warn!(
            "Size of {:?} is not a multiple of {} bytes, the image may be incomplete",
            path, SECTOR_SIZE
        );
    }

    Ok(MediaInfo {
        spec: CD_AUDIO,
        total_samples: len / BYTES_PER_SAMPLE_FRAME as u64,
    })
}

pub fn read_range(
    path: &Path,
    endian: Endian,
    start: u64,
    end: u64,
) -> AudioResult<(PcmSpec, Vec<i32>)> {
    let total = probe(path)?.total_samples;
    if start > end || end > total {
        return Err(AudioError::InvalidRange { start, end, total });
    }

    let mut reader = BufReader::with_capacity(8 * 1024 * 1024, File::open(path)?);
    reader.seek(SeekFrom::Start(start * BYTES_PER_SAMPLE_FRAME as u64))?;

    let mut bytes = vec![0u8; ((end - start) as usize) * BYTES_PER_SAMPLE_FRAME];
    reader.read_exact(&mut bytes)?;

    Ok((CD_AUDIO, decode_i16(&bytes, endian)))
}

fn decode_i16(bytes: &[u8], endian: Endian) -> Vec<i32> {
    let mut samples = vec![0i16; bytes.len() / 2];
    match endian {
        Endian::Little => LittleEndian::read_i16_into(bytes, &mut samples),
        Endian::Big => BigEndian::read_i16_into(bytes, &mut samples),
    }
    samples.into_iter().map(i32::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn decodes_both_byte_orders() {
        let bytes = [0x01, 0x00, 0xff, 0xff];
        assert_eq!(decode_i16(&bytes, Endian::Little), vec![1, -1]);
        assert_eq!(decode_i16(&bytes, Endian::Big), vec![256, -1]);
    }

    #[test]
    fn reads_a_sample_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let samples: Vec<i16> = (0..40).collect();
        for s in &samples {
            file.write_all(&s.to_le_bytes()).unwrap();
        }

        let info = probe(file.path()).unwrap();
        assert_eq!(info.total_samples, 20);

        let (spec, pcm) = read_range(file.path(), Endian::Little, 5, 8).unwrap();
        assert_eq!(spec, CD_AUDIO);
        assert_eq!(pcm, vec![10, 11, 12, 13, 14, 15]);

        assert!(matches!(
            read_range(file.path(), Endian::Little, 5, 21),
            Err(AudioError::InvalidRange { total: 20, .. })
        ));
    }
}
