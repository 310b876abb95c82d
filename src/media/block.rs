//! The 8x8 block transform used by the frequency domain placement.
//!
//! Coefficients are addressed by their natural (row major) index `row * 8 + col`,
//! `row` being the vertical and `col` the horizontal frequency.

use std::f32::consts::PI;

/// Number of coefficients in a block
pub const BLOCK_LEN: usize = 64;

const N: usize = 8;
const LEVEL_SHIFT: f32 = 128.0;

/// JPEG (ITU T.81, Annex K) luminance quantization table at quality 50
const LUMINANCE_QUANTIZATION: [u16; BLOCK_LEN] = [
    16, 11, 10, 16, 24, 40, 51, 61, //
    12, 12, 14, 19, 26, 58, 60, 55, //
    14, 13, 16, 24, 40, 57, 69, 56, //
    14, 17, 22, 29, 51, 87, 80, 62, //
    18, 22, 37, 56, 68, 109, 103, 77, //
    24, 35, 55, 64, 81, 104, 113, 92, //
    49, 64, 78, 87, 103, 121, 120, 101, //
    72, 92, 95, 98, 112, 100, 103, 99, //
];

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FrequencyBand {
    Low,
    Mid,
    High,
}

/// Precomputed tables for the block transform.
///
/// Constructed once by the caller and handed to the streams by reference.
#[derive(Debug, Clone)]
pub struct BlockTables {
    /// `cosine[u][x] = c(u) * cos((2x + 1) * u * PI / 16)`, orthonormal
    cosine: [[f32; N]; N],
    quantization: [u16; BLOCK_LEN],
}

impl Default for BlockTables {
    fn default() -> Self {
        Self::standard()
    }
}

impl BlockTables {
    pub fn standard() -> Self {
        Self::with_quantization(LUMINANCE_QUANTIZATION)
    }

    /// Tables with a custom quantization table, entries of 0 are treated as 1
    pub fn with_quantization(mut quantization: [u16; BLOCK_LEN]) -> Self {
        quantization.iter_mut().for_each(|q| *q = (*q).max(1));

        let mut cosine = [[0.0; N]; N];
        for (u, row) in cosine.iter_mut().enumerate() {
            let scale = if u == 0 {
                (1.0 / N as f32).sqrt()
            } else {
                (2.0 / N as f32).sqrt()
            };
            for (x, value) in row.iter_mut().enumerate() {
                *value = scale * (((2 * x + 1) * u) as f32 * PI / (2 * N) as f32).cos();
            }
        }

        Self {
            cosine,
            quantization,
        }
    }

    pub fn quantization(&self, index: usize) -> u16 {
        self.quantization[index]
    }

    /// Level shifted 2D DCT-II of 8x8 samples in `0.0..=255.0`
    pub fn forward(&self, samples: &[f32; BLOCK_LEN]) -> [f32; BLOCK_LEN] {
        let mut shifted = [0.0; BLOCK_LEN];
        for (s, value) in shifted.iter_mut().zip(samples) {
            *s = value - LEVEL_SHIFT;
        }

        // rows first, then columns
        let mut tmp = [0.0; BLOCK_LEN];
        for y in 0..N {
            for v in 0..N {
                tmp[y * N + v] = (0..N).map(|x| self.cosine[v][x] * shifted[y * N + x]).sum();
            }
        }
        let mut coefficients = [0.0; BLOCK_LEN];
        for u in 0..N {
            for v in 0..N {
                coefficients[u * N + v] = (0..N).map(|y| self.cosine[u][y] * tmp[y * N + v]).sum();
            }
        }

        coefficients
    }

    /// Inverse of [`BlockTables::forward`], the samples are not rounded or clamped
    pub fn inverse(&self, coefficients: &[f32; BLOCK_LEN]) -> [f32; BLOCK_LEN] {
        let mut tmp = [0.0; BLOCK_LEN];
        for y in 0..N {
            for v in 0..N {
                tmp[y * N + v] = (0..N)
                    .map(|u| self.cosine[u][y] * coefficients[u * N + v])
                    .sum();
            }
        }
        let mut samples = [0.0; BLOCK_LEN];
        for y in 0..N {
            for x in 0..N {
                samples[y * N + x] =
                    (0..N).map(|v| self.cosine[v][x] * tmp[y * N + v]).sum::<f32>() + LEVEL_SHIFT;
            }
        }

        samples
    }

    pub fn quantize_coefficient(&self, index: usize, coefficient: f32) -> i32 {
        (coefficient / self.quantization[index] as f32).round() as i32
    }

    pub fn dequantize_coefficient(&self, index: usize, quantized: i32) -> f32 {
        quantized as f32 * self.quantization[index] as f32
    }

    pub fn quantize(&self, coefficients: &[f32; BLOCK_LEN]) -> [i32; BLOCK_LEN] {
        let mut quantized = [0; BLOCK_LEN];
        for (i, q) in quantized.iter_mut().enumerate() {
            *q = self.quantize_coefficient(i, coefficients[i]);
        }
        quantized
    }

    pub fn dequantize(&self, quantized: &[i32; BLOCK_LEN]) -> [f32; BLOCK_LEN] {
        let mut coefficients = [0.0; BLOCK_LEN];
        for (i, c) in coefficients.iter_mut().enumerate() {
            *c = self.dequantize_coefficient(i, quantized[i]);
        }
        coefficients
    }

    /// `row + col` of 0..=2 is low, 3..=5 mid and everything above high frequency
    pub fn classify(index: usize) -> FrequencyBand {
        match index / N + index % N {
            0..=2 => FrequencyBand::Low,
            3..=5 => FrequencyBand::Mid,
            _ => FrequencyBand::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textured_block() -> [f32; BLOCK_LEN] {
        let mut block = [0.0; BLOCK_LEN];
        for (i, s) in block.iter_mut().enumerate() {
            *s = ((i * 37 + 11) % 200) as f32 + 20.0;
        }
        block
    }

    #[test]
    fn should_put_a_flat_block_into_dc_only() {
        let tables = BlockTables::standard();
        let coefficients = tables.forward(&[136.0; BLOCK_LEN]);

        // 8 * (136 - 128)
        assert!((coefficients[0] - 64.0).abs() < 1e-3);
        assert!(coefficients[1..].iter().all(|c| c.abs() < 1e-3));
    }

    #[test]
    fn should_invert_the_forward_transform() {
        let tables = BlockTables::standard();
        let block = textured_block();
        let restored = tables.inverse(&tables.forward(&block));

        for (a, b) in block.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-2, "{a} != {b}");
        }
    }

    #[test]
    fn should_quantize_to_the_nearest_step() {
        let tables = BlockTables::standard();
        assert_eq!(tables.quantization(1), 11);
        assert_eq!(tables.quantize_coefficient(1, 27.0), 2);
        assert_eq!(tables.quantize_coefficient(1, -27.0), -2);
        assert_eq!(tables.dequantize_coefficient(1, -2), -22.0);

        let quantized = tables.quantize(&tables.forward(&textured_block()));
        let again = tables.quantize(&tables.dequantize(&quantized));
        assert_eq!(quantized, again);
    }

    #[test]
    fn should_classify_by_diagonal() {
        assert_eq!(BlockTables::classify(0), FrequencyBand::Low);
        assert_eq!(BlockTables::classify(2), FrequencyBand::Low);
        assert_eq!(BlockTables::classify(3), FrequencyBand::Mid);
        assert_eq!(BlockTables::classify(8 * 2 + 2), FrequencyBand::Mid);
        assert_eq!(BlockTables::classify(8 * 5), FrequencyBand::Mid);
        assert_eq!(BlockTables::classify(8 * 3 + 3), FrequencyBand::High);
        assert_eq!(BlockTables::classify(63), FrequencyBand::High);

        let mid = (1..BLOCK_LEN)
            .filter(|i| BlockTables::classify(*i) == FrequencyBand::Mid)
            .count();
        assert_eq!(mid, 15);
    }
}
