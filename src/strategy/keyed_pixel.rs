use fastrand::Rng;
use log::trace;

use crate::capacity::{pixel_domain_capacity_bits, MAX_BITS_PER_CHANNEL};
use crate::collision::{draw_attempt_cap, CollisionSet, PixelLocation};
use crate::error::SteganoError;
use crate::media::Canvas;
use crate::result::Result;

use super::{check_transition, Phase, Placement};

/// Password keyed random placement in the pixel domain.
///
/// Every bit goes to a random `(x, y, channel, bit)`, drawn from a generator that is
/// seeded once. Locations already used are drawn again. After the header the same
/// generator simply continues with the wider bit range of the payload phase.
#[derive(Debug)]
pub struct KeyedRandomPixel {
    width: u32,
    height: u32,
    rng: Rng,
    claimed: CollisionSet<PixelLocation>,
    phase: Phase,
}

impl KeyedRandomPixel {
    pub fn new(width: u32, height: u32, seed: u64, header_bits: u64) -> Self {
        Self {
            width,
            height,
            rng: Rng::with_seed(seed),
            claimed: CollisionSet::new(header_bits),
            phase: Phase::Header,
        }
    }

    /// Locations of the current phase, header locations included
    fn space(&self) -> u64 {
        pixel_domain_capacity_bits(self.width, self.height, self.phase.bits_per_channel())
    }

    /// `None` once every location of the current phase is used
    fn next_location(&mut self) -> Result<Option<PixelLocation>> {
        let space = self.space();
        if self.claimed.len() >= space {
            return Ok(None);
        }

        let (width, height) = (self.width, self.height);
        let bits = self.phase.bits_per_channel();
        let rng = &mut self.rng;
        let location = self.claimed.claim_with(draw_attempt_cap(space), || PixelLocation {
            x: rng.u32(0..width),
            y: rng.u32(0..height),
            channel: rng.u8(0..3),
            bit: rng.u8(0..bits),
        })?;

        Ok(Some(location))
    }
}

impl Placement for KeyedRandomPixel {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn enter_payload_phase(&mut self, bits_per_channel: u8, payload_bits: u64) -> Result<()> {
        check_transition(self.phase, bits_per_channel, MAX_BITS_PER_CHANNEL)?;
        self.claimed.extend_bound(payload_bits);
        self.phase = Phase::Payload { bits_per_channel };
        trace!(
            "keyed pixel: payload phase with {bits_per_channel} bits per channel, {} of {} locations claimed",
            self.claimed.len(),
            self.space()
        );

        Ok(())
    }

    fn hide_bit(&mut self, canvas: &mut Canvas<'_>, bit: bool) -> Result<()> {
        let Some(location) = self.next_location()? else {
            return Err(SteganoError::ImageSizeInsufficient {
                required: self.claimed.len() + 1,
                available: self.space(),
            });
        };
        canvas.set_channel_bit(location.x, location.y, location.channel, location.bit, bit);

        Ok(())
    }

    fn unveil_bit(&mut self, canvas: &Canvas<'_>) -> Result<bool> {
        let location = self.next_location()?.ok_or(SteganoError::ShortRead)?;
        Ok(canvas.channel_bit(location.x, location.y, location.channel, location.bit))
    }

    fn claimed_locations(&self) -> u64 {
        self.claimed.len()
    }
}
