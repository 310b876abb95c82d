use log::trace;

use crate::capacity::{COLOR_CHANNELS, MAX_BITS_PER_CHANNEL};
use crate::collision::PixelLocation;
use crate::error::SteganoError;
use crate::media::Canvas;
use crate::result::Result;

use super::{check_transition, Phase, Placement};

/// Raster order placement: row by row, pixel by pixel, R then G then B.
///
/// A channel carries `bits_per_channel` bits, least significant first. The traversal
/// never revisits a location, so no collision bookkeeping is needed.
#[derive(Debug)]
pub struct Sequential {
    width: u32,
    height: u32,
    /// index of the next channel, `(y * width + x) * 3 + channel`
    channel: u64,
    /// next bit within that channel
    bit: u8,
    phase: Phase,
    used: u64,
}

impl Sequential {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            channel: 0,
            bit: 0,
            phase: Phase::Header,
            used: 0,
        }
    }

    fn next_location(&mut self) -> Option<PixelLocation> {
        let channels = self.width as u64 * self.height as u64 * COLOR_CHANNELS;
        if self.channel >= channels {
            return None;
        }

        let pixel = self.channel / COLOR_CHANNELS;
        let location = PixelLocation {
            x: (pixel % self.width as u64) as u32,
            y: (pixel / self.width as u64) as u32,
            channel: (self.channel % COLOR_CHANNELS) as u8,
            bit: self.bit,
        };

        self.bit += 1;
        if self.bit >= self.phase.bits_per_channel() {
            self.bit = 0;
            self.channel += 1;
        }
        self.used += 1;

        Some(location)
    }
}

impl Placement for Sequential {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn enter_payload_phase(&mut self, bits_per_channel: u8, payload_bits: u64) -> Result<()> {
        check_transition(self.phase, bits_per_channel, MAX_BITS_PER_CHANNEL)?;
        // the header always ends on a channel boundary, it uses one bit per channel
        debug_assert_eq!(self.bit, 0);

        trace!(
            "sequential: payload of {payload_bits} bits starts at channel {} with {bits_per_channel} bits per channel",
            self.channel
        );
        self.phase = Phase::Payload { bits_per_channel };

        Ok(())
    }

    fn hide_bit(&mut self, canvas: &mut Canvas<'_>, bit: bool) -> Result<()> {
        let Some(PixelLocation {
            x,
            y,
            channel,
            bit: offset,
        }) = self.next_location()
        else {
            return Err(SteganoError::ImageSizeInsufficient {
                required: self.used + 1,
                available: self.used,
            });
        };
        canvas.set_channel_bit(x, y, channel, offset, bit);

        Ok(())
    }

    fn unveil_bit(&mut self, canvas: &Canvas<'_>) -> Result<bool> {
        let location = self.next_location().ok_or(SteganoError::ShortRead)?;
        Ok(canvas.channel_bit(location.x, location.y, location.channel, location.bit))
    }

    fn claimed_locations(&self) -> u64 {
        self.used
    }
}
