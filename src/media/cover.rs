use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::ops::RangeInclusive;
use std::path::Path;

use image::codecs::bmp::BmpDecoder;
use image::{ImageFormat, RgbaImage};
use log::{debug, error};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::SteganoError;
use crate::result::Result;

/// A decoded cover image.
///
/// Palette based images decode just fine, but flipping low order bits of their
/// color channels would not survive the way back into the palette, so they are kept
/// apart and rejected by the streams.
#[derive(Debug, Clone)]
pub enum Cover {
    TrueColor(RgbaImage),
    Indexed(RgbaImage),
}

impl Cover {
    pub fn from_image(image: RgbaImage) -> Self {
        Self::TrueColor(image)
    }

    /// Decodes PNG, BMP or GIF data
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes).map_err(|_e| SteganoError::UnsupportedMedia)?;
        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| {
                error!("Error decoding {format:?} image: {e}");
                SteganoError::InvalidImageMedia
            })?
            .to_rgba8();

        if is_indexed(bytes, format)? {
            debug!("{format:?} image uses a palette");
            Ok(Self::Indexed(image))
        } else {
            Ok(Self::TrueColor(image))
        }
    }

    pub fn from_file(f: &Path) -> Result<Self> {
        let bytes = std::fs::read(f).map_err(|source| SteganoError::ReadError { source })?;
        Self::decode(&bytes)
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed(_))
    }

    pub fn image(&self) -> &RgbaImage {
        match self {
            Self::TrueColor(i) | Self::Indexed(i) => i,
        }
    }

    pub fn into_image(self) -> RgbaImage {
        match self {
            Self::TrueColor(i) | Self::Indexed(i) => i,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image().dimensions()
    }
}

impl From<RgbaImage> for Cover {
    fn from(image: RgbaImage) -> Self {
        Self::from_image(image)
    }
}

/// PNG colour type 3, every GIF and every BMP that carries a palette
fn is_indexed(bytes: &[u8], format: ImageFormat) -> Result<bool> {
    match format {
        ImageFormat::Gif => Ok(true),
        ImageFormat::Png => {
            let reader = png::Decoder::new(bytes).read_info().map_err(|e| {
                error!("Error reading PNG header: {e}");
                SteganoError::InvalidImageMedia
            })?;
            Ok(reader.info().color_type == png::ColorType::Indexed)
        }
        ImageFormat::Bmp => {
            let decoder = BmpDecoder::new(Cursor::new(bytes)).map_err(|e| {
                error!("Error reading BMP header: {e}");
                SteganoError::InvalidImageMedia
            })?;
            Ok(decoder.get_palette().is_some())
        }
        _ => Ok(false),
    }
}

/// Encodes the image, the format decides the container
pub fn encode_image(image: &RgbaImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).map_err(|e| {
        error!("Error encoding image as {format:?}: {e}");
        SteganoError::ImageEncodingError
    })?;

    Ok(buf.into_inner())
}

/// Saves the image, the format is derived from the file extension
pub fn save_image(image: &RgbaImage, file: &Path) -> Result<()> {
    let format = ImageFormat::from_path(file).map_err(|_e| SteganoError::UnsupportedMedia)?;
    let f = File::create(file).map_err(|e| {
        error!("Error creating file {file:?}: {e}");
        SteganoError::WriteError { source: e }
    })?;
    let mut writer = BufWriter::new(f);

    image.write_to(&mut writer, format).map_err(|e| {
        error!("Error saving image: {e}");
        SteganoError::ImageEncodingError
    })
}

/// Opaque image of cryptographically random noise, every color channel within `range`
pub fn generate_noise_cover(width: u32, height: u32, range: RangeInclusive<u8>) -> RgbaImage {
    let (low, high) = (*range.start(), *range.end().max(range.start()));
    let span = (high - low) as u16 + 1;

    let mut noise = vec![0u8; width as usize * height as usize * 3];
    OsRng.fill_bytes(&mut noise);

    let mut channels = noise
        .into_iter()
        .map(|n| low + ((n as u16 * span) >> 8) as u8);
    RgbaImage::from_fn(width, height, |_, _| {
        let mut rgb = [0u8; 3];
        rgb.iter_mut()
            .for_each(|c| *c = channels.next().unwrap_or(low));
        image::Rgba([rgb[0], rgb[1], rgb[2], u8::MAX])
    })
}
