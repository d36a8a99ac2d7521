// src/cd/mod.rs
// Red Book audio layout. One CUE frame is one CD sector of audio.

pub const FRAMES_PER_SECOND: u64 = 75;
pub const SECONDS_PER_MINUTE: u64 = 60;

pub const SAMPLE_RATE: u32 = 44_100;
pub const CHANNELS: u16 = 2;
pub const BITS_PER_SAMPLE: u16 = 16;

pub const SECTOR_SIZE: usize = 2352;
pub const BYTES_PER_SAMPLE_FRAME: usize = (CHANNELS as usize) * (BITS_PER_SAMPLE as usize / 8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sector_holds_one_frame_of_audio() {
        let samples_per_sector = SECTOR_SIZE / BYTES_PER_SAMPLE_FRAME;
        assert_eq!(samples_per_sector, 588);
        assert_eq!(
            samples_per_sector as u64 * FRAMES_PER_SECOND,
            SAMPLE_RATE as u64
        );
    }
}
