//! Bit budget arithmetic shared by all placement strategies.
//!
//! The header is always hidden at [`BASE_BITS_PER_CHANNEL`], no matter which depth is
//! negotiated for the payload. That way an unveil can always find the header before it
//! knows how densely the rest of the image is used.

use log::debug;

use crate::config::Strategy;
use crate::error::SteganoError;
use crate::result::Result;

/// Bit depth used for the header
pub const BASE_BITS_PER_CHANNEL: u8 = 1;
/// Highest bit depth a color channel of 8 bits can provide
pub const MAX_BITS_PER_CHANNEL: u8 = 8;
/// R, G and B, alpha is never touched
pub const COLOR_CHANNELS: u64 = 3;
/// Edge length of the blocks used by the frequency domain strategy
pub const BLOCK_SIZE: u32 = 8;
/// Every block carries exactly one bit in one mid frequency coefficient
pub const BITS_PER_BLOCK: u8 = 1;

/// `width * height * 3 * bits_per_channel`
pub fn pixel_domain_capacity_bits(width: u32, height: u32, bits_per_channel: u8) -> u64 {
    width as u64 * height as u64 * COLOR_CHANNELS * bits_per_channel as u64
}

/// Whole 8x8 blocks times the bits every block carries
pub fn frequency_domain_capacity_bits(width: u32, height: u32, bits_per_block: u8) -> u64 {
    let (blocks_wide, blocks_tall) = block_grid(width, height);
    blocks_wide as u64 * blocks_tall as u64 * bits_per_block as u64
}

/// Number of whole blocks horizontally and vertically, partial blocks at the edges are not used
pub fn block_grid(width: u32, height: u32) -> (u32, u32) {
    (width / BLOCK_SIZE, height / BLOCK_SIZE)
}

/// Capacity of the raster order placement.
///
/// The first `header_bits` channels carry one bit each, every channel after that
/// carries `bits_per_channel` bits.
pub fn sequential_capacity_bits(
    width: u32,
    height: u32,
    header_bits: u64,
    bits_per_channel: u8,
) -> u64 {
    let channels = pixel_domain_capacity_bits(width, height, BASE_BITS_PER_CHANNEL);
    if header_bits >= channels {
        return channels;
    }
    header_bits + (channels - header_bits) * bits_per_channel as u64
}

/// Smallest bit depth with `pixel_domain_capacity_bits >= required_bits`.
pub fn choose_bit_depth(
    required_bits: u64,
    width: u32,
    height: u32,
    max_allowed_bits_per_channel: u8,
) -> Result<u8> {
    choose_bit_depth_with(required_bits, max_allowed_bits_per_channel, |depth| {
        pixel_domain_capacity_bits(width, height, depth)
    })
}

/// Smallest bit depth in `1..=max_allowed_bits_per_channel` for which `capacity`
/// covers `required_bits`.
pub fn choose_bit_depth_with<F>(
    required_bits: u64,
    max_allowed_bits_per_channel: u8,
    capacity: F,
) -> Result<u8>
where
    F: Fn(u8) -> u64,
{
    let max_depth = max_allowed_bits_per_channel.clamp(BASE_BITS_PER_CHANNEL, MAX_BITS_PER_CHANNEL);
    for depth in BASE_BITS_PER_CHANNEL..=max_depth {
        if capacity(depth) >= required_bits {
            debug!("negotiated {depth} bits per channel for {required_bits} bits");
            return Ok(depth);
        }
    }

    Err(SteganoError::ImageSizeInsufficient {
        required: required_bits,
        available: capacity(max_depth),
    })
}

/// Total capacity of `strategy` at `bits_per_channel`, the header included
pub fn strategy_capacity_bits(
    strategy: Strategy,
    width: u32,
    height: u32,
    header_bits: u64,
    bits_per_channel: u8,
) -> u64 {
    match strategy {
        Strategy::Sequential => {
            sequential_capacity_bits(width, height, header_bits, bits_per_channel)
        }
        Strategy::KeyedRandomPixel => pixel_domain_capacity_bits(width, height, bits_per_channel),
        Strategy::KeyedRandomCoefficient => {
            frequency_domain_capacity_bits(width, height, BITS_PER_BLOCK)
        }
    }
}

/// Negotiates the payload bit depth of `strategy` for `required_bits` (header and payload).
///
/// The header alone has to fit at [`BASE_BITS_PER_CHANNEL`], the frequency domain
/// strategy never goes beyond it.
pub fn negotiate_bit_depth(
    strategy: Strategy,
    width: u32,
    height: u32,
    header_bits: u64,
    required_bits: u64,
    max_allowed_bits_per_channel: u8,
) -> Result<u8> {
    let capacity = |depth| strategy_capacity_bits(strategy, width, height, header_bits, depth);

    let base_capacity = capacity(BASE_BITS_PER_CHANNEL);
    if header_bits > base_capacity {
        debug!("header of {header_bits} bits does not fit {base_capacity} bits at base depth");
        return Err(SteganoError::ImageSizeInsufficient {
            required: required_bits,
            available: base_capacity,
        });
    }

    let max_depth = match strategy {
        Strategy::KeyedRandomCoefficient => BASE_BITS_PER_CHANNEL,
        _ => max_allowed_bits_per_channel,
    };
    choose_bit_depth_with(required_bits, max_depth, capacity)
}

/// Bits required to hide a header of `header_bytes` and a payload of `payload_bytes`
pub fn required_bits(header_bytes: usize, payload_bytes: usize) -> u64 {
    (header_bytes as u64 + payload_bytes as u64) * 8
}

/// Smallest image of roughly 4:3 whose depth 1 pixel capacity covers `required_bits`
pub fn generate_cover_dimensions(required_bits: u64) -> (u32, u32) {
    let pixels = required_bits.div_ceil(COLOR_CHANNELS).max(1);
    aspect_4_3(pixels)
}

/// Smallest image of roughly 4:3 made of whole blocks, one block per required bit
pub fn generate_block_cover_dimensions(required_bits: u64) -> (u32, u32) {
    let (blocks_wide, blocks_tall) = aspect_4_3(required_bits.max(1));
    (blocks_wide * BLOCK_SIZE, blocks_tall * BLOCK_SIZE)
}

/// `width * height >= cells` with `width / height` close to 4:3
fn aspect_4_3(cells: u64) -> (u32, u32) {
    let width = ((cells as f64 * 4.0 / 3.0).sqrt().ceil() as u64).max(1);
    let height = cells.div_ceil(width).max(1);

    (width as u32, height as u32)
}
