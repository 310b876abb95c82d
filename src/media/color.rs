//! Full range BT.601 (JFIF) conversion between RGB pixels and YUV planes.

use image::{Rgba, RgbaImage};

use crate::capacity::BLOCK_SIZE;

/// `(y, u, v)` of one pixel, chroma is centered at 128
pub fn rgb_to_yuv(pixel: &Rgba<u8>) -> (f32, f32, f32) {
    let [r, g, b, _] = pixel.0.map(f32::from);

    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = -0.168_736 * r - 0.331_264 * g + 0.5 * b + 128.0;
    let v = 0.5 * r - 0.418_688 * g - 0.081_312 * b + 128.0;

    (y, u, v)
}

/// Rounds and clamps to `0..=255`, `alpha` is passed through untouched
pub fn yuv_to_rgb(y: f32, u: f32, v: f32, alpha: u8) -> Rgba<u8> {
    let u = u - 128.0;
    let v = v - 128.0;

    let r = y + 1.402 * v;
    let g = y - 0.344_136 * u - 0.714_136 * v;
    let b = y + 1.772 * u;

    Rgba([clamp_channel(r), clamp_channel(g), clamp_channel(b), alpha])
}

fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// The luminance and chrominance planes of an image, row major.
#[derive(Debug, Clone, PartialEq)]
pub struct YuvPlanes {
    width: u32,
    height: u32,
    y: Vec<f32>,
    u: Vec<f32>,
    v: Vec<f32>,
}

impl YuvPlanes {
    pub fn from_image(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let len = width as usize * height as usize;
        let mut planes = Self {
            width,
            height,
            y: vec![0.0; len],
            u: vec![0.0; len],
            v: vec![0.0; len],
        };
        planes.refresh_region(image, 0, 0, width, height);

        planes
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn luma(&self, x: u32, y: u32) -> f32 {
        self.y[self.index(x, y)]
    }

    /// Converts the planes back, the alpha channel of `image` is kept.
    pub fn write_into(&self, image: &mut RgbaImage) {
        self.commit_region(image, 0, 0, self.width, self.height);
    }

    /// Luminance of the 8x8 block at block coordinates `(block_x, block_y)`, row major
    pub fn luma_block(&self, block_x: u32, block_y: u32) -> [f32; 64] {
        let mut block = [0.0; 64];
        let (x0, y0) = (block_x * BLOCK_SIZE, block_y * BLOCK_SIZE);
        for (i, value) in block.iter_mut().enumerate() {
            let (dx, dy) = (i as u32 % BLOCK_SIZE, i as u32 / BLOCK_SIZE);
            *value = self.luma(x0 + dx, y0 + dy);
        }

        block
    }

    pub fn set_luma_block(&mut self, block_x: u32, block_y: u32, block: &[f32; 64]) {
        let (x0, y0) = (block_x * BLOCK_SIZE, block_y * BLOCK_SIZE);
        for (i, value) in block.iter().enumerate() {
            let (dx, dy) = (i as u32 % BLOCK_SIZE, i as u32 / BLOCK_SIZE);
            let idx = self.index(x0 + dx, y0 + dy);
            self.y[idx] = *value;
        }
    }

    /// Writes the pixels of a region from the planes
    pub fn commit_region(&self, image: &mut RgbaImage, x0: u32, y0: u32, width: u32, height: u32) {
        for y in y0..y0 + height {
            for x in x0..x0 + width {
                let idx = self.index(x, y);
                let alpha = image.get_pixel(x, y).0[3];
                image.put_pixel(x, y, yuv_to_rgb(self.y[idx], self.u[idx], self.v[idx], alpha));
            }
        }
    }

    /// Re-measures the planes of a region from the pixels
    pub fn refresh_region(&mut self, image: &RgbaImage, x0: u32, y0: u32, width: u32, height: u32) {
        for y in y0..y0 + height {
            for x in x0..x0 + width {
                let idx = self.index(x, y);
                let (luma, u, v) = rgb_to_yuv(image.get_pixel(x, y));
                self.y[idx] = luma;
                self.u[idx] = u;
                self.v[idx] = v;
            }
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
