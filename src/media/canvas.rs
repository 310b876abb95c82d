use std::borrow::Cow;
use std::cell::OnceCell;

use image::{Rgba, RgbaImage};

use crate::capacity::BLOCK_SIZE;
use crate::media::block::{BlockTables, BLOCK_LEN};
use crate::media::color::YuvPlanes;

/// The pixels a placement strategy works on.
///
/// The pixel grid is the only source of truth. The YUV planes are derived on first
/// use and every block that is stored is committed to the pixels right away, so a
/// re-measured block sees exactly what an unveil will see later.
#[derive(Debug)]
pub struct Canvas<'a> {
    pixels: Cow<'a, RgbaImage>,
    planes: OnceCell<YuvPlanes>,
    tables: &'a BlockTables,
}

impl<'a> Canvas<'a> {
    /// Owns the image, it is handed back by [`Canvas::into_image`]
    pub fn for_write(image: RgbaImage, tables: &'a BlockTables) -> Self {
        Self {
            pixels: Cow::Owned(image),
            planes: OnceCell::new(),
            tables,
        }
    }

    pub fn for_read(image: &'a RgbaImage, tables: &'a BlockTables) -> Self {
        Self {
            pixels: Cow::Borrowed(image),
            planes: OnceCell::new(),
            tables,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn tables(&self) -> &'a BlockTables {
        self.tables
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Bit `bit` (0 is the least significant) of color channel `channel` at `(x, y)`
    pub fn channel_bit(&self, x: u32, y: u32, channel: u8, bit: u8) -> bool {
        let value = self.pixels.get_pixel(x, y).0[channel as usize];
        (value >> bit) & 1 == 1
    }

    pub fn set_channel_bit(&mut self, x: u32, y: u32, channel: u8, bit: u8, value: bool) {
        let pixels = self.pixels.to_mut();
        let color = &mut pixels.get_pixel_mut(x, y).0[channel as usize];
        *color = (*color & !(1 << bit)) | ((value as u8) << bit);
        // pixel edits invalidate derived planes
        self.planes.take();
    }

    pub fn luma_block(&self, block_x: u32, block_y: u32) -> [f32; BLOCK_LEN] {
        self.planes().luma_block(block_x, block_y)
    }

    /// Replaces the luminance of a block and commits the block to the pixels.
    ///
    /// Afterwards the planes of that block are re-measured from the rounded pixels.
    pub fn store_luma_block(&mut self, block_x: u32, block_y: u32, block: &[f32; BLOCK_LEN]) {
        self.planes();
        let (x0, y0) = (block_x * BLOCK_SIZE, block_y * BLOCK_SIZE);
        let pixels = self.pixels.to_mut();
        if let Some(planes) = self.planes.get_mut() {
            planes.set_luma_block(block_x, block_y, block);
            planes.commit_region(pixels, x0, y0, BLOCK_SIZE, BLOCK_SIZE);
            planes.refresh_region(pixels, x0, y0, BLOCK_SIZE, BLOCK_SIZE);
        }
    }

    /// Copy of the pixels of a block, row major
    pub fn pixel_block(&self, block_x: u32, block_y: u32) -> [Rgba<u8>; BLOCK_LEN] {
        let (x0, y0) = (block_x * BLOCK_SIZE, block_y * BLOCK_SIZE);
        let mut block = [Rgba([0; 4]); BLOCK_LEN];
        for (i, p) in block.iter_mut().enumerate() {
            let (dx, dy) = (i as u32 % BLOCK_SIZE, i as u32 / BLOCK_SIZE);
            *p = *self.pixels.get_pixel(x0 + dx, y0 + dy);
        }
        block
    }

    /// Overwrites the pixels of a block, for example with what [`Canvas::pixel_block`] returned
    pub fn store_pixel_block(
        &mut self,
        block_x: u32,
        block_y: u32,
        block: &[Rgba<u8>; BLOCK_LEN],
    ) {
        let (x0, y0) = (block_x * BLOCK_SIZE, block_y * BLOCK_SIZE);
        let pixels = self.pixels.to_mut();
        for (i, p) in block.iter().enumerate() {
            let (dx, dy) = (i as u32 % BLOCK_SIZE, i as u32 / BLOCK_SIZE);
            pixels.put_pixel(x0 + dx, y0 + dy, *p);
        }
        if let Some(planes) = self.planes.get_mut() {
            planes.refresh_region(pixels, x0, y0, BLOCK_SIZE, BLOCK_SIZE);
        }
    }

    /// The final stego image, all edits are already committed
    pub fn into_image(self) -> RgbaImage {
        self.pixels.into_owned()
    }

    fn planes(&self) -> &YuvPlanes {
        self.planes
            .get_or_init(|| YuvPlanes::from_image(&self.pixels))
    }
}
