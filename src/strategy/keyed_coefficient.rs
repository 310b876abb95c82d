use fastrand::Rng;
use image::Rgba;
use log::{trace, warn};

use crate::capacity::{block_grid, BASE_BITS_PER_CHANNEL, BITS_PER_BLOCK};
use crate::collision::{draw_attempt_cap, BlockLocation, CollisionSet};
use crate::error::SteganoError;
use crate::media::block::BLOCK_LEN;
use crate::media::{BlockTables, Canvas, FrequencyBand};
use crate::result::Result;

use super::{check_transition, Phase, Placement};

/// How far the quantized value may move away from the original one
const MAX_QUANTIZED_DISTANCE: i32 = 5;
/// Color range a saturated block is compressed into, leaves room for the edit to swing
const UNSATURATED_LOW: u8 = 16;
const UNSATURATED_HIGH: u8 = 239;

/// Password keyed random placement in the frequency domain.
///
/// Every bit claims a whole random 8x8 block of the luminance plane and is stored in
/// the parity of the quantized value of one random mid frequency coefficient of it.
/// All other coefficients of the block keep their exact values.
#[derive(Debug)]
pub struct KeyedRandomCoefficient {
    blocks_wide: u32,
    blocks_tall: u32,
    rng: Rng,
    claimed: CollisionSet<BlockLocation>,
    phase: Phase,
}

impl KeyedRandomCoefficient {
    pub fn new(width: u32, height: u32, seed: u64, header_bits: u64) -> Self {
        let (blocks_wide, blocks_tall) = block_grid(width, height);
        Self {
            blocks_wide,
            blocks_tall,
            rng: Rng::with_seed(seed),
            claimed: CollisionSet::new(header_bits),
            phase: Phase::Header,
        }
    }

    fn space(&self) -> u64 {
        self.blocks_wide as u64 * self.blocks_tall as u64 * BITS_PER_BLOCK as u64
    }

    /// The next block and the mid frequency coefficient within it
    fn next_location(&mut self) -> Result<Option<(BlockLocation, usize)>> {
        let space = self.space();
        if self.claimed.len() >= space {
            return Ok(None);
        }

        let (wide, tall) = (self.blocks_wide, self.blocks_tall);
        let rng = &mut self.rng;
        let block = self.claimed.claim_with(draw_attempt_cap(space), || BlockLocation {
            x: rng.u32(0..wide),
            y: rng.u32(0..tall),
        })?;

        let cap = draw_attempt_cap(BLOCK_LEN as u64);
        for _ in 0..cap {
            let index = self.rng.usize(1..BLOCK_LEN);
            if BlockTables::classify(index) == FrequencyBand::Mid {
                return Ok(Some((block, index)));
            }
        }

        Err(SteganoError::CollisionExhausted {
            claimed: self.claimed.len(),
            bound: self.claimed.bound(),
            attempts: cap,
        })
    }
}

/// Quantized value of coefficient `index` as an unveil measures it
fn measure(canvas: &Canvas<'_>, block: BlockLocation, index: usize) -> i32 {
    let tables = canvas.tables();
    let coefficients = tables.forward(&canvas.luma_block(block.x, block.y));
    tables.quantize_coefficient(index, coefficients[index])
}

fn parity(quantized: i32) -> bool {
    quantized.rem_euclid(2) == 1
}

/// Quantized values with the wanted parity around `ratio`, nearest first
fn candidates(ratio: f32, bit: bool) -> Vec<i32> {
    let nearest = ratio.round() as i32;
    let range = nearest - MAX_QUANTIZED_DISTANCE..=nearest + MAX_QUANTIZED_DISTANCE;
    let mut candidates: Vec<i32> = range.filter(|q| parity(*q) == bit).collect();
    candidates.sort_by(|a, b| {
        let da = (*a as f32 - ratio).abs();
        let db = (*b as f32 - ratio).abs();
        da.total_cmp(&db)
    });
    candidates
}

/// Maps a color channel linearly into `UNSATURATED_LOW..=UNSATURATED_HIGH`
fn pull_from_rails(value: u8) -> u8 {
    let span = (UNSATURATED_HIGH - UNSATURATED_LOW) as u16;
    UNSATURATED_LOW + ((value as u16 * span + 127) / 255) as u8
}

/// Stores the nearest quantized value with parity `bit` that survives the pixel grid.
///
/// After every candidate that did not survive, the block is reset to `fallback`.
fn embed_parity(
    canvas: &mut Canvas<'_>,
    block: BlockLocation,
    index: usize,
    bit: bool,
    fallback: &[Rgba<u8>; BLOCK_LEN],
) -> bool {
    let tables = canvas.tables();
    let coefficients = tables.forward(&canvas.luma_block(block.x, block.y));
    let ratio = coefficients[index] / tables.quantization(index) as f32;

    for quantized in candidates(ratio, bit) {
        let mut edited = coefficients;
        edited[index] = tables.dequantize_coefficient(index, quantized);
        canvas.store_luma_block(block.x, block.y, &tables.inverse(&edited));

        if parity(measure(canvas, block, index)) == bit {
            return true;
        }
        trace!(
            "coefficient {index} of block ({}, {}) lost its parity at {quantized}",
            block.x,
            block.y
        );
        canvas.store_pixel_block(block.x, block.y, fallback);
    }

    false
}

impl Placement for KeyedRandomCoefficient {
    fn phase(&self) -> Phase {
        self.phase
    }

    /// The frequency domain knows no bit depth, the only valid parameter is 1.
    fn enter_payload_phase(&mut self, bits_per_channel: u8, payload_bits: u64) -> Result<()> {
        check_transition(self.phase, bits_per_channel, BASE_BITS_PER_CHANNEL)?;
        self.claimed.extend_bound(payload_bits);
        self.phase = Phase::Payload { bits_per_channel };
        trace!(
            "keyed coefficient: payload phase, {} of {} blocks claimed",
            self.claimed.len(),
            self.space()
        );

        Ok(())
    }

    /// Sets the parity of the quantized coefficient and commits the block to the pixels.
    ///
    /// Rounding and clamping the pixels may move the coefficient again, so the block is
    /// measured once more. Should the parity not have survived, the next nearest
    /// quantized value with the right parity is tried. A block that sits at 0 or 255
    /// swallows every candidate, its colors are compressed into `16..=239` and the
    /// candidates are tried once more.
    fn hide_bit(&mut self, canvas: &mut Canvas<'_>, bit: bool) -> Result<()> {
        let Some((block, index)) = self.next_location()? else {
            return Err(SteganoError::ImageSizeInsufficient {
                required: self.claimed.len() + 1,
                available: self.space(),
            });
        };

        if parity(measure(canvas, block, index)) == bit {
            return Ok(());
        }

        let original = canvas.pixel_block(block.x, block.y);
        if embed_parity(canvas, block, index, bit, &original) {
            return Ok(());
        }

        warn!(
            "block ({}, {}) is saturated, compressing it into {UNSATURATED_LOW}..={UNSATURATED_HIGH}",
            block.x, block.y
        );
        let compressed = original.map(|p| {
            let [r, g, b, a] = p.0;
            Rgba([pull_from_rails(r), pull_from_rails(g), pull_from_rails(b), a])
        });
        canvas.store_pixel_block(block.x, block.y, &compressed);
        if parity(measure(canvas, block, index)) == bit
            || embed_parity(canvas, block, index, bit, &compressed)
        {
            return Ok(());
        }

        canvas.store_pixel_block(block.x, block.y, &original);
        Err(SteganoError::UnstableCoefficient {
            block_x: block.x,
            block_y: block.y,
        })
    }

    fn unveil_bit(&mut self, canvas: &Canvas<'_>) -> Result<bool> {
        let (block, index) = self.next_location()?.ok_or(SteganoError::ShortRead)?;
        Ok(parity(measure(canvas, block, index)))
    }

    fn claimed_locations(&self) -> u64 {
        self.claimed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn textured(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let g = (96 + (x * 31 + y * 17) % 64) as u8;
            Rgba([g, g.wrapping_add(20), g.wrapping_sub(30), 255])
        })
    }

    #[test]
    fn should_order_candidates_by_distance() {
        assert_eq!(candidates(2.2, true), vec![3, 1, 5, -1, 7, -3]);
        assert_eq!(candidates(2.2, false), vec![2, 4, 0, 6, -2]);
        assert_eq!(candidates(-0.6, true), vec![-1, 1, -3, 3, -5]);
    }

    #[test]
    fn should_only_pick_mid_frequency_coefficients() {
        let mut s = KeyedRandomCoefficient::new(64, 64, 11, 64);
        for _ in 0..64 {
            let (block, index) = s.next_location().unwrap().unwrap();
            assert_eq!(BlockTables::classify(index), FrequencyBand::Mid);
            assert!(block.x < 8 && block.y < 8);
        }
        assert!(s.next_location().unwrap().is_none());
    }

    /// Hides `bits` in every block of `cover` and unveils them again
    fn hide_and_unveil(cover: RgbaImage, bits: &[bool]) -> (RgbaImage, Vec<bool>) {
        let tables = BlockTables::standard();
        let (width, height) = cover.dimensions();

        let mut canvas = Canvas::for_write(cover, &tables);
        let mut s = KeyedRandomCoefficient::new(width, height, 99, 0);
        s.enter_payload_phase(1, bits.len() as u64).unwrap();
        for bit in bits {
            s.hide_bit(&mut canvas, *bit).unwrap();
        }
        let image = canvas.into_image();

        let canvas = Canvas::for_read(&image, &tables);
        let mut s = KeyedRandomCoefficient::new(width, height, 99, 0);
        s.enter_payload_phase(1, bits.len() as u64).unwrap();
        let read = bits.iter().map(|_| s.unveil_bit(&canvas).unwrap()).collect();
        assert!(matches!(s.unveil_bit(&canvas), Err(SteganoError::ShortRead)));

        (image, read)
    }

    #[test]
    fn should_store_bits_that_survive_the_pixel_grid() {
        let bits: Vec<bool> = (0..32).map(|i| i % 3 == 0).collect();

        let (image, read) = hide_and_unveil(textured(64, 32), &bits);
        assert_ne!(image, textured(64, 32));
        assert_eq!(read, bits);
    }

    #[test]
    fn should_store_bits_in_saturated_blocks() {
        let bits: Vec<bool> = (0..32).map(|i| i % 2 == 0 || i % 5 == 0).collect();

        for color in [
            [255, 255, 255, 255],
            [0, 0, 0, 255],
            [255, 0, 0, 255],
            [0, 255, 255, 255],
        ] {
            let cover = RgbaImage::from_pixel(64, 32, Rgba(color));
            let (_, read) = hide_and_unveil(cover, &bits);
            assert_eq!(read, bits, "{color:?} cover");
        }
    }

    #[test]
    fn should_store_bits_next_to_white_and_red_blocks() {
        let bits: Vec<bool> = (0..32).map(|i| i % 3 != 1).collect();
        // left half white, right half pure red, a gray stripe through the middle rows
        let cover = RgbaImage::from_fn(64, 32, |x, y| match (x < 32, (12..20).contains(&y)) {
            (_, true) => Rgba([128, 128, 128, 255]),
            (true, false) => Rgba([255, 255, 255, 255]),
            (false, false) => Rgba([255, 0, 0, 255]),
        });

        let (image, read) = hide_and_unveil(cover, &bits);
        assert_eq!(read, bits);
        assert!(image.pixels().all(|p| p.0[3] == 255), "alpha is never touched");
    }

    #[test]
    fn should_pull_colors_from_the_rails() {
        assert_eq!(pull_from_rails(0), UNSATURATED_LOW);
        assert_eq!(pull_from_rails(255), UNSATURATED_HIGH);
        assert_eq!(pull_from_rails(128), 128);
    }

    #[test]
    fn should_not_accept_a_bit_depth() {
        let mut s = KeyedRandomCoefficient::new(64, 64, 1, 8);
        assert!(matches!(
            s.enter_payload_phase(2, 8),
            Err(SteganoError::InvalidPlacementParameter(2))
        ));
    }
}
