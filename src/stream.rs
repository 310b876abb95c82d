//! Byte oriented streams that plug a placement strategy into a cover image.
//!
//! [`EmbeddingStream`] writes the header and then the payload into a cover,
//! [`ExtractionStream`] reads them back. Both drive the very same strategy with the
//! very same seed, so they visit the same locations in the same order.

use std::io::{self, Cursor, Read, Write};

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};
use image::RgbaImage;
use log::{debug, trace};

use crate::capacity::{negotiate_bit_depth, required_bits, strategy_capacity_bits};
use crate::config::{RecoveredFlags, StegoConfig};
use crate::error::SteganoError;
use crate::header::StegoHeader;
use crate::key::derive_seed;
use crate::media::{BlockTables, Canvas, Cover};
use crate::result::Result;
use crate::strategy::{Placement, PlacementStrategy};

/// Hides every bit of `bytes`, most significant bit first
fn hide_bytes(
    strategy: &mut PlacementStrategy,
    canvas: &mut Canvas<'_>,
    bytes: &[u8],
) -> Result<()> {
    let mut bits = BitReader::endian(Cursor::new(bytes), BigEndian);
    for _ in 0..bytes.len() * 8 {
        let bit = bits.read_bit().map_err(SteganoError::from_io)?;
        strategy.hide_bit(canvas, bit)?;
    }

    Ok(())
}

/// Fills `buf` with unveiled bits, most significant bit first
fn unveil_bytes(
    strategy: &mut PlacementStrategy,
    canvas: &Canvas<'_>,
    buf: &mut [u8],
) -> Result<()> {
    let len = buf.len();
    let mut bits = BitWriter::endian(Cursor::new(buf), BigEndian);
    for _ in 0..len * 8 {
        let bit = strategy.unveil_bit(canvas)?;
        bits.write_bit(bit).map_err(SteganoError::from_io)?;
    }

    Ok(())
}

/// The write half: hides a header and a payload of known length in a cover.
///
/// ```rust
/// use image::{Rgba, RgbaImage};
/// use stegano_engine::{BlockTables, Cover, EmbeddingStream, ExtractionStream, StegoConfig};
///
/// let tables = BlockTables::standard();
/// let config = StegoConfig::default();
/// let cover = Cover::from_image(RgbaImage::from_pixel(32, 32, Rgba([90, 120, 150, 255])));
///
/// let mut stream =
///     EmbeddingStream::open_for_write(Some(cover), 5, "a.txt", &config, &tables).unwrap();
/// stream.write_bytes(b"HELLO").unwrap();
/// let stego = Cover::from_image(stream.finish().unwrap());
///
/// let mut stream = ExtractionStream::open_for_read(Some(&stego), &config, &tables).unwrap();
/// assert_eq!(stream.header().payload_name(), "a.txt");
/// assert_eq!(stream.read_to_end_payload().unwrap(), b"HELLO");
/// ```
#[derive(Debug)]
pub struct EmbeddingStream<'a> {
    canvas: Canvas<'a>,
    strategy: PlacementStrategy,
    header: StegoHeader,
    written: u64,
    /// a write stopped halfway, the strategy is out of step with `written`
    failed: bool,
}

impl<'a> EmbeddingStream<'a> {
    /// Validates the cover, negotiates the bit depth and hides the header.
    ///
    /// Everything that can fail because of capacity fails here, before the cover is touched.
    pub fn open_for_write(
        cover: Option<Cover>,
        payload_length: usize,
        payload_name: &str,
        config: &StegoConfig,
        tables: &'a BlockTables,
    ) -> Result<Self> {
        let image = match cover {
            None => return Err(SteganoError::NullImage),
            Some(Cover::Indexed(_)) => return Err(SteganoError::IndexedImageUnsupported),
            Some(Cover::TrueColor(image)) => image,
        };
        let (width, height) = image.dimensions();

        let mut header = StegoHeader::new(payload_length, payload_name, config)?;
        let header_bits = header.size() as u64 * 8;
        let required = required_bits(header.size(), payload_length);
        let bits_per_channel = negotiate_bit_depth(
            config.strategy,
            width,
            height,
            header_bits,
            required,
            config.get_max_bits_per_channel(),
        )?;
        header.set_placement_parameter(bits_per_channel);
        debug!(
            "hiding {payload_length} bytes with a {} byte header in {width}x{height} using {:?} at {bits_per_channel} bits per channel",
            header.size(),
            config.strategy
        );

        let mut strategy = PlacementStrategy::new(
            config.strategy,
            width,
            height,
            derive_seed(&config.password),
            header_bits,
        );
        let mut canvas = Canvas::for_write(image, tables);

        hide_bytes(&mut strategy, &mut canvas, &header.serialize())?;
        trace!("header written, {} locations used", strategy.claimed_locations());
        strategy.enter_payload_phase(bits_per_channel, payload_length as u64 * 8)?;

        Ok(Self {
            canvas,
            strategy,
            header,
            written: 0,
            failed: false,
        })
    }

    pub fn header(&self) -> &StegoHeader {
        &self.header
    }

    pub fn bits_per_channel(&self) -> u8 {
        self.header.placement_parameter()
    }

    pub fn locations_claimed(&self) -> u64 {
        self.strategy.claimed_locations()
    }

    /// Payload bytes that are still expected
    pub fn remaining(&self) -> u64 {
        self.header.payload_length() as u64 - self.written
    }

    /// Hides `bytes`, a write beyond the declared payload length is refused as a whole.
    ///
    /// A write that fails halfway leaves the stream unusable, every further call
    /// returns [`SteganoError::StreamFailed`].
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        if self.failed {
            return Err(SteganoError::StreamFailed);
        }
        let attempted = self.written + bytes.len() as u64;
        if attempted > self.header.payload_length() as u64 {
            return Err(SteganoError::PayloadOverflow {
                declared: self.header.payload_length(),
                attempted,
            });
        }

        if let Err(e) = hide_bytes(&mut self.strategy, &mut self.canvas, bytes) {
            self.failed = true;
            return Err(e);
        }
        self.written = attempted;

        Ok(bytes.len())
    }

    /// The stego image, requires the declared payload to be written completely.
    pub fn finish(self) -> Result<RgbaImage> {
        if self.failed {
            return Err(SteganoError::StreamFailed);
        }
        if self.remaining() > 0 {
            return Err(SteganoError::IncompletePayload {
                declared: self.header.payload_length(),
                written: self.written as u32,
            });
        }
        debug!(
            "finished embedding, {} locations used",
            self.strategy.claimed_locations()
        );

        Ok(self.canvas.into_image())
    }
}

impl Write for EmbeddingStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf).map_err(SteganoError::into_io)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Feeds the header parser with unveiled bytes
struct HeaderSource<'s, 'a> {
    strategy: &'s mut PlacementStrategy,
    canvas: &'s Canvas<'a>,
}

impl Read for HeaderSource<'_, '_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        unveil_bytes(self.strategy, self.canvas, buf).map_err(SteganoError::into_io)?;
        Ok(buf.len())
    }
}

/// The read half: unveils the header and then the payload from a stego image.
#[derive(Debug)]
pub struct ExtractionStream<'a> {
    canvas: Canvas<'a>,
    strategy: PlacementStrategy,
    header: StegoHeader,
    flags: RecoveredFlags,
    read: u64,
    failed: bool,
}

impl<'a> ExtractionStream<'a> {
    /// Reads the header at base depth and switches to the depth it declares.
    ///
    /// Fails with [`SteganoError::ShortRead`] when the image cannot hold the declared payload.
    pub fn open_for_read(
        cover: Option<&'a Cover>,
        config: &StegoConfig,
        tables: &'a BlockTables,
    ) -> Result<Self> {
        let image = match cover {
            None => return Err(SteganoError::NullImage),
            Some(Cover::Indexed(_)) => return Err(SteganoError::IndexedImageUnsupported),
            Some(Cover::TrueColor(image)) => image,
        };
        let (width, height) = image.dimensions();
        let canvas = Canvas::for_read(image, tables);
        let mut strategy = PlacementStrategy::new(
            config.strategy,
            width,
            height,
            derive_seed(&config.password),
            StegoHeader::max_size() as u64 * 8,
        );

        let (header, flags) = StegoHeader::deserialize(&mut HeaderSource {
            strategy: &mut strategy,
            canvas: &canvas,
        })?;
        let header_bits = header.size() as u64 * 8;
        let payload_bits = header.payload_length() as u64 * 8;
        let bits_per_channel = header.placement_parameter();
        strategy.enter_payload_phase(bits_per_channel, payload_bits)?;

        let available =
            strategy_capacity_bits(config.strategy, width, height, header_bits, bits_per_channel)
                .saturating_sub(header_bits);
        if payload_bits > available {
            debug!("header declares {payload_bits} payload bits, the image holds only {available}");
            return Err(SteganoError::ShortRead);
        }
        debug!(
            "unveiling {} bytes named {:?} at {bits_per_channel} bits per channel",
            header.payload_length(),
            header.payload_name()
        );

        Ok(Self {
            canvas,
            strategy,
            header,
            flags,
            read: 0,
            failed: false,
        })
    }

    pub fn header(&self) -> &StegoHeader {
        &self.header
    }

    /// Flags the caller needs to undo its compression or encryption, see [`StegoConfig::apply`]
    pub fn recovered_flags(&self) -> &RecoveredFlags {
        &self.flags
    }

    pub fn remaining(&self) -> u64 {
        self.header.payload_length() as u64 - self.read
    }

    /// Unveils up to `buf.len()` payload bytes, 0 means the payload is complete.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.failed {
            return Err(SteganoError::StreamFailed);
        }
        let n = buf.len().min(self.remaining() as usize);
        if let Err(e) = unveil_bytes(&mut self.strategy, &self.canvas, &mut buf[..n]) {
            self.failed = true;
            return Err(e);
        }
        self.read += n as u64;

        Ok(n)
    }

    /// Unveils whatever is left of the payload
    pub fn read_to_end_payload(&mut self) -> Result<Vec<u8>> {
        let mut payload = vec![0; self.remaining() as usize];
        self.read_bytes(&mut payload)?;

        Ok(payload)
    }
}

impl Read for ExtractionStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_bytes(buf).map_err(SteganoError::into_io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Strategy;
    use crate::test_utils::gradient;
    use image::Rgba;

    fn cover(width: u32, height: u32) -> Cover {
        Cover::from_image(gradient(width, height))
    }

    #[test]
    fn should_reject_missing_and_indexed_covers() {
        let tables = BlockTables::standard();
        let config = StegoConfig::default();

        assert!(matches!(
            EmbeddingStream::open_for_write(None, 1, "", &config, &tables),
            Err(SteganoError::NullImage)
        ));
        let indexed = Cover::Indexed(RgbaImage::new(16, 16));
        assert!(matches!(
            EmbeddingStream::open_for_write(Some(indexed.clone()), 1, "", &config, &tables),
            Err(SteganoError::IndexedImageUnsupported)
        ));
        assert!(matches!(
            ExtractionStream::open_for_read(Some(&indexed), &config, &tables),
            Err(SteganoError::IndexedImageUnsupported)
        ));
        assert!(matches!(
            ExtractionStream::open_for_read(None, &config, &tables),
            Err(SteganoError::NullImage)
        ));
    }

    #[test]
    fn should_refuse_writing_beyond_the_declared_length() {
        let tables = BlockTables::standard();
        let config = StegoConfig::default();
        let mut stream =
            EmbeddingStream::open_for_write(Some(cover(16, 16)), 3, "", &config, &tables).unwrap();

        stream.write_bytes(b"ab").unwrap();
        assert!(matches!(
            stream.write_bytes(b"cd"),
            Err(SteganoError::PayloadOverflow { declared: 3, attempted: 4 })
        ));
        assert_eq!(stream.remaining(), 1);
    }

    #[test]
    fn should_refuse_finishing_early() {
        let tables = BlockTables::standard();
        let config = StegoConfig::default();
        let mut stream =
            EmbeddingStream::open_for_write(Some(cover(16, 16)), 3, "", &config, &tables).unwrap();
        stream.write_bytes(b"a").unwrap();

        assert!(matches!(
            stream.finish(),
            Err(SteganoError::IncompletePayload { declared: 3, written: 1 })
        ));
    }

    #[test]
    fn should_fail_before_touching_the_cover() {
        let tables = BlockTables::standard();
        let config = StegoConfig::default().with_max_bits_per_channel(1);
        // 8x8 holds 192 bits at depth 1, the header alone needs 208
        assert!(matches!(
            EmbeddingStream::open_for_write(Some(cover(8, 8)), 0, "", &config, &tables),
            Err(SteganoError::ImageSizeInsufficient { available: 192, .. })
        ));
    }

    #[test]
    fn should_refuse_further_writes_after_a_failed_one() {
        let tables = BlockTables::standard();
        let config = StegoConfig::default();
        // a single pixel, three channels are left for a two byte payload
        let mut strategy = PlacementStrategy::new(Strategy::Sequential, 1, 1, 0, 0);
        strategy.enter_payload_phase(1, 16).unwrap();
        let mut stream = EmbeddingStream {
            canvas: Canvas::for_write(RgbaImage::new(1, 1), &tables),
            strategy,
            header: StegoHeader::new(2, "", &config).unwrap(),
            written: 0,
            failed: false,
        };

        assert!(matches!(
            stream.write_bytes(b"a"),
            Err(SteganoError::ImageSizeInsufficient { .. })
        ));
        assert_eq!(stream.remaining(), 2);
        assert!(matches!(stream.write_bytes(b"b"), Err(SteganoError::StreamFailed)));
        assert!(matches!(stream.finish(), Err(SteganoError::StreamFailed)));
    }

    #[test]
    fn should_work_through_io_traits() {
        let tables = BlockTables::standard();
        let config = StegoConfig::default()
            .with_strategy(Strategy::KeyedRandomPixel)
            .with_password("io");
        let payload = b"some bytes through std::io";

        let mut stream = EmbeddingStream::open_for_write(
            Some(cover(32, 32)),
            payload.len(),
            "io.bin",
            &config,
            &tables,
        )
        .unwrap();
        stream.write_all(payload).unwrap();
        stream.flush().unwrap();
        let stego = Cover::from_image(stream.finish().unwrap());

        let mut stream = ExtractionStream::open_for_read(Some(&stego), &config, &tables).unwrap();
        let mut read = Vec::new();
        stream.read_to_end(&mut read).unwrap();
        assert_eq!(read, payload);
        assert_eq!(stream.read(&mut [0; 4]).unwrap(), 0);
    }

    #[test]
    fn should_report_payloads_larger_than_the_image_as_short_read() {
        let tables = BlockTables::standard();
        let config = StegoConfig::default();
        let mut header = StegoHeader::new(10_000, "", &config).unwrap();
        header.set_placement_parameter(1);

        // hide a forged header that declares more than 32x32 can hold
        let mut strategy = PlacementStrategy::new(Strategy::Sequential, 32, 32, 0, 208);
        let mut canvas = Canvas::for_write(cover(32, 32).into_image(), &tables);
        hide_bytes(&mut strategy, &mut canvas, &header.serialize()).unwrap();
        let stego = Cover::from_image(canvas.into_image());

        assert!(matches!(
            ExtractionStream::open_for_read(Some(&stego), &config, &tables),
            Err(SteganoError::ShortRead)
        ));
    }

    #[test]
    fn should_reject_images_without_a_header() {
        let tables = BlockTables::standard();
        let config = StegoConfig::default();
        let plain = Cover::from_image(RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 255])));

        assert!(matches!(
            ExtractionStream::open_for_read(Some(&plain), &config, &tables),
            Err(SteganoError::InvalidHeaderStamp)
        ));
    }
}
