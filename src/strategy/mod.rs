//! The placement strategies decide which physical location of the cover carries which bit.
//!
//! Every strategy runs through the same two phases. In [`Phase::Header`] exactly one bit
//! per color channel (or per block) is used. Only after the header is complete the
//! stream switches the strategy into [`Phase::Payload`] with the negotiated depth, so
//! an unveil can always read the header before it knows that depth.

mod keyed_coefficient;
mod keyed_pixel;
mod sequential;

use enum_dispatch::enum_dispatch;

pub use keyed_coefficient::KeyedRandomCoefficient;
pub use keyed_pixel::KeyedRandomPixel;
pub use sequential::Sequential;

use crate::capacity::{BASE_BITS_PER_CHANNEL, MAX_BITS_PER_CHANNEL};
use crate::config::Strategy;
use crate::error::SteganoError;
use crate::media::Canvas;
use crate::result::Result;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Phase {
    Header,
    Payload { bits_per_channel: u8 },
}

impl Phase {
    pub fn bits_per_channel(&self) -> u8 {
        match self {
            Phase::Header => BASE_BITS_PER_CHANNEL,
            Phase::Payload { bits_per_channel } => *bits_per_channel,
        }
    }
}

#[enum_dispatch]
pub trait Placement {
    fn phase(&self) -> Phase;

    /// Switches from the header to the payload phase, `payload_bits` is what is still to come.
    fn enter_payload_phase(&mut self, bits_per_channel: u8, payload_bits: u64) -> Result<()>;

    fn hide_bit(&mut self, canvas: &mut Canvas<'_>, bit: bool) -> Result<()>;

    fn unveil_bit(&mut self, canvas: &Canvas<'_>) -> Result<bool>;

    /// Number of distinct locations used so far
    fn claimed_locations(&self) -> u64;
}

#[enum_dispatch(Placement)]
#[derive(Debug)]
pub enum PlacementStrategy {
    Sequential,
    KeyedRandomPixel,
    KeyedRandomCoefficient,
}

impl PlacementStrategy {
    /// `seed` is ignored by [`Strategy::Sequential`], `header_bits` bounds the header phase.
    pub fn new(strategy: Strategy, width: u32, height: u32, seed: u64, header_bits: u64) -> Self {
        match strategy {
            Strategy::Sequential => Sequential::new(width, height).into(),
            Strategy::KeyedRandomPixel => {
                KeyedRandomPixel::new(width, height, seed, header_bits).into()
            }
            Strategy::KeyedRandomCoefficient => {
                KeyedRandomCoefficient::new(width, height, seed, header_bits).into()
            }
        }
    }
}

/// Phase transitions happen once and only from the header phase.
pub(crate) fn check_transition(phase: Phase, bits_per_channel: u8, max: u8) -> Result<()> {
    if phase != Phase::Header {
        return Err(SteganoError::PayloadPhaseAlreadyEntered);
    }
    if !(BASE_BITS_PER_CHANNEL..=max.min(MAX_BITS_PER_CHANNEL)).contains(&bits_per_channel) {
        return Err(SteganoError::InvalidPlacementParameter(bits_per_channel));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::BlockTables;
    use crate::test_utils::textured_gray;

    #[test]
    fn should_dispatch_to_the_configured_strategy() {
        let strategy = PlacementStrategy::new(Strategy::KeyedRandomPixel, 4, 4, 1, 8);
        assert!(matches!(strategy, PlacementStrategy::KeyedRandomPixel(_)));
        assert_eq!(strategy.phase(), Phase::Header);
        assert_eq!(strategy.phase().bits_per_channel(), 1);
    }

    #[test]
    fn should_refuse_a_second_transition_and_bad_depths() {
        let mut strategy = PlacementStrategy::new(Strategy::Sequential, 4, 4, 0, 0);
        assert!(matches!(
            strategy.enter_payload_phase(9, 8),
            Err(SteganoError::InvalidPlacementParameter(9))
        ));
        assert!(matches!(
            strategy.enter_payload_phase(0, 8),
            Err(SteganoError::InvalidPlacementParameter(0))
        ));

        strategy.enter_payload_phase(2, 8).unwrap();
        assert_eq!(strategy.phase(), Phase::Payload { bits_per_channel: 2 });
        assert!(matches!(
            strategy.enter_payload_phase(2, 8),
            Err(SteganoError::PayloadPhaseAlreadyEntered)
        ));
    }

    #[test]
    fn should_replay_the_same_locations_for_every_strategy() {
        let tables = BlockTables::standard();
        let bits = [true, false, false, true, true, true, false, true, false, false];

        for kind in [
            Strategy::Sequential,
            Strategy::KeyedRandomPixel,
            Strategy::KeyedRandomCoefficient,
        ] {
            let mut canvas = Canvas::for_write(textured_gray(32, 32), &tables);
            let mut hide = PlacementStrategy::new(kind, 32, 32, 42, 4);
            for bit in &bits[..4] {
                hide.hide_bit(&mut canvas, *bit).unwrap();
            }
            hide.enter_payload_phase(1, 6).unwrap();
            for bit in &bits[4..] {
                hide.hide_bit(&mut canvas, *bit).unwrap();
            }
            assert_eq!(hide.claimed_locations(), bits.len() as u64);

            let stego = canvas.into_image();
            let canvas = Canvas::for_read(&stego, &tables);
            let mut unveil = PlacementStrategy::new(kind, 32, 32, 42, 4);
            let mut read = Vec::new();
            for _ in 0..4 {
                read.push(unveil.unveil_bit(&canvas).unwrap());
            }
            unveil.enter_payload_phase(1, 6).unwrap();
            for _ in 4..bits.len() {
                read.push(unveil.unveil_bit(&canvas).unwrap());
            }

            assert_eq!(read, bits, "{kind:?} did not replay");
        }
    }
}
