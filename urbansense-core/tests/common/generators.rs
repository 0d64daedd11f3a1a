//! Synthetic signal sources

use urbansense_core::constants::audio::AUDIO_BLOCK_LEN;
use urbansense_core::errors::AudioError;
use urbansense_core::{AdcSource, AudioSource, RadioTx, Uptime};

/// Audio source producing constant-amplitude square-wave blocks
///
/// RMS equals the amplitude exactly, which makes expected dBFS easy to
/// compute in assertions.
pub struct SquareWaveAudio {
    pub amplitude: i32,
}

impl AudioSource for SquareWaveAudio {
    fn read_block(&mut self, block: &mut [i32; AUDIO_BLOCK_LEN]) -> Result<usize, AudioError> {
        for (i, s) in block.iter_mut().enumerate() {
            *s = if i % 2 == 0 {
                self.amplitude
            } else {
                -self.amplitude
            };
        }
        Ok(AUDIO_BLOCK_LEN)
    }
}

/// Audio source whose driver always fails
pub struct BrokenAudio;

impl AudioSource for BrokenAudio {
    fn read_block(&mut self, _: &mut [i32; AUDIO_BLOCK_LEN]) -> Result<usize, AudioError> {
        Err(AudioError::Driver { code: -3 })
    }
}

/// ADC pinned at a constant raw count
pub struct ConstAdc(pub u16);

impl AdcSource for ConstAdc {
    fn read_raw(&mut self) -> u16 {
        self.0
    }
}

/// Radio that records every transmitted frame
#[derive(Default)]
pub struct RecordingRadio {
    pub frames: Vec<Vec<u8>>,
}

impl RadioTx for RecordingRadio {
    type Error = std::convert::Infallible;

    fn transmit(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        self.frames.push(frame.to_vec());
        Ok(())
    }
}

/// Fixed uptime source
pub struct ConstUptime(pub u64);

impl Uptime for ConstUptime {
    fn now_ms(&self) -> u64 {
        self.0
    }
}
