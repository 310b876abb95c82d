//! The self describing prologue that precedes every hidden payload.
//!
//! Layout, all integers little endian:
//!
//! | field                  | bytes |
//! |------------------------|-------|
//! | magic stamp            | 9     |
//! | format version         | 1     |
//! | payload length         | 4     |
//! | placement parameter    | 1     |
//! | payload name length    | 1     |
//! | compression flag       | 1     |
//! | encryption flag        | 1     |
//! | encryption algorithm   | 8     |
//! | payload name           | n     |

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

use crate::config::{RecoveredFlags, StegoConfig};
use crate::error::SteganoError;
use crate::result::Result;

pub const MAGIC_STAMP: [u8; 9] = *b"STEGENGN\x1a";
pub const FORMAT_VERSION: u8 = 0x01;
pub const ALGORITHM_NAME_LEN: usize = 8;
pub const MAX_PAYLOAD_NAME_LEN: usize = u8::MAX as usize;

/// payload length + placement parameter + name length + compression + encryption
const FIXED_FIELDS_LEN: usize = 4 + 1 + 1 + 1 + 1;
const PREFIX_LEN: usize = MAGIC_STAMP.len() + 1 + FIXED_FIELDS_LEN + ALGORITHM_NAME_LEN;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StegoHeader {
    payload_length: u32,
    placement_parameter: u8,
    payload_name: String,
    compression: bool,
    encryption: bool,
    encryption_algorithm: String,
}

impl StegoHeader {
    /// Header for a payload of `payload_length` bytes, flags are taken from `config`.
    ///
    /// The placement parameter starts at 1 and is set once the bit depth is negotiated.
    pub fn new(payload_length: usize, payload_name: &str, config: &StegoConfig) -> Result<Self> {
        let payload_length = u32::try_from(payload_length)
            .map_err(|_| SteganoError::PayloadTooLarge(payload_length))?;
        if payload_name.len() > MAX_PAYLOAD_NAME_LEN {
            return Err(SteganoError::PayloadNameTooLong(payload_name.len()));
        }
        let algorithm = config.encryption_algorithm.trim();
        if !algorithm.is_ascii() || algorithm.len() > ALGORITHM_NAME_LEN {
            return Err(SteganoError::InvalidAlgorithmName(algorithm.to_string()));
        }

        Ok(Self {
            payload_length,
            placement_parameter: 1,
            payload_name: payload_name.to_string(),
            compression: config.compression,
            encryption: config.encryption,
            encryption_algorithm: algorithm.to_string(),
        })
    }

    pub fn payload_length(&self) -> u32 {
        self.payload_length
    }

    pub fn placement_parameter(&self) -> u8 {
        self.placement_parameter
    }

    pub fn set_placement_parameter(&mut self, parameter: u8) {
        self.placement_parameter = parameter;
    }

    pub fn payload_name(&self) -> &str {
        &self.payload_name
    }

    pub fn recovered_flags(&self) -> RecoveredFlags {
        RecoveredFlags {
            compression: self.compression,
            encryption: self.encryption,
            encryption_algorithm: self.encryption_algorithm.clone(),
        }
    }

    /// Serialized size in bytes
    pub fn size(&self) -> usize {
        Self::size_for_name(self.payload_name.len())
    }

    pub fn size_for_name(name_len: usize) -> usize {
        PREFIX_LEN + name_len
    }

    /// Upper bound for pre-flight checks, assumes a 256 byte name
    pub fn max_size() -> usize {
        Self::size_for_name(MAX_PAYLOAD_NAME_LEN + 1)
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size());
        buf.extend_from_slice(&MAGIC_STAMP);
        buf.push(FORMAT_VERSION);
        buf.extend_from_slice(&self.payload_length.to_le_bytes());
        buf.push(self.placement_parameter);
        buf.push(self.payload_name.len() as u8);
        buf.push(self.compression as u8);
        buf.push(self.encryption as u8);

        let mut algorithm = [b' '; ALGORITHM_NAME_LEN];
        algorithm[..self.encryption_algorithm.len()]
            .copy_from_slice(self.encryption_algorithm.as_bytes());
        buf.extend_from_slice(&algorithm);
        buf.extend_from_slice(self.payload_name.as_bytes());

        buf
    }

    /// Reads a header field by field, the stamp first and the version second,
    /// so that foreign data is rejected as early as possible.
    pub fn deserialize<R: Read + ?Sized>(source: &mut R) -> Result<(Self, RecoveredFlags)> {
        let mut stamp = [0u8; MAGIC_STAMP.len()];
        source
            .read_exact(&mut stamp)
            .map_err(SteganoError::from_io)?;
        if stamp != MAGIC_STAMP {
            return Err(SteganoError::InvalidHeaderStamp);
        }

        let version = source.read_u8().map_err(SteganoError::from_io)?;
        if version != FORMAT_VERSION {
            return Err(SteganoError::InvalidHeaderVersion(version));
        }

        let mut fields = [0u8; FIXED_FIELDS_LEN + ALGORITHM_NAME_LEN];
        source
            .read_exact(&mut fields)
            .map_err(SteganoError::from_io)?;
        let mut fields = &fields[..];
        let payload_length = fields.read_u32::<LittleEndian>()?;
        let placement_parameter = fields.read_u8()?;
        let name_len = fields.read_u8()? as usize;
        let compression = fields.read_u8()? != 0;
        let encryption = fields.read_u8()? != 0;
        let encryption_algorithm = String::from_utf8_lossy(fields).trim().to_string();

        let mut name = vec![0u8; name_len];
        source.read_exact(&mut name).map_err(SteganoError::from_io)?;
        let payload_name = String::from_utf8(name)?;

        let header = Self {
            payload_length,
            placement_parameter,
            payload_name,
            compression,
            encryption,
            encryption_algorithm,
        };
        let flags = header.recovered_flags();

        Ok((header, flags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(name: &str) -> StegoHeader {
        StegoHeader::new(5, name, &StegoConfig::default()).expect("valid header")
    }

    #[test]
    fn should_compute_sizes() {
        assert_eq!(header("").size(), 26);
        assert_eq!(header("a.txt").size(), 31);
        assert_eq!(StegoHeader::max_size(), 26 + 256);
        assert_eq!(header("a.txt").serialize().len(), header("a.txt").size());
    }

    #[test]
    fn should_lay_out_fields_little_endian() {
        let mut h = StegoHeader::new(
            0x0102_0304,
            "ab",
            &StegoConfig::default()
                .with_compression(true)
                .with_encryption("AES"),
        )
        .unwrap();
        h.set_placement_parameter(3);
        let buf = h.serialize();

        assert_eq!(&buf[0..9], &MAGIC_STAMP);
        assert_eq!(buf[9], FORMAT_VERSION);
        assert_eq!(&buf[10..14], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(buf[14], 3, "placement parameter");
        assert_eq!(buf[15], 2, "name length");
        assert_eq!(buf[16], 1, "compression flag");
        assert_eq!(buf[17], 1, "encryption flag");
        assert_eq!(&buf[18..26], b"AES     ");
        assert_eq!(&buf[26..], b"ab");
    }

    #[test]
    fn should_deserialize_what_was_serialized() {
        let mut h = StegoHeader::new(
            1024,
            "secret-message.txt",
            &StegoConfig::default().with_encryption("XCHACHA"),
        )
        .unwrap();
        h.set_placement_parameter(2);

        let (read, flags) = StegoHeader::deserialize(&mut Cursor::new(h.serialize())).unwrap();

        assert_eq!(read, h);
        assert!(flags.encryption);
        assert!(!flags.compression);
        assert_eq!(flags.encryption_algorithm, "XCHACHA");
    }

    #[test]
    fn should_reject_a_foreign_stamp() {
        let mut buf = header("a.txt").serialize();
        buf[3] ^= 0xff;

        match StegoHeader::deserialize(&mut Cursor::new(buf)) {
            Err(SteganoError::InvalidHeaderStamp) => (),
            other => panic!("expected InvalidHeaderStamp, got {other:?}"),
        }
    }

    #[test]
    fn should_reject_a_foreign_version() {
        let mut buf = header("a.txt").serialize();
        buf[MAGIC_STAMP.len()] = FORMAT_VERSION + 1;

        match StegoHeader::deserialize(&mut Cursor::new(buf)) {
            Err(SteganoError::InvalidHeaderVersion(v)) => assert_eq!(v, FORMAT_VERSION + 1),
            other => panic!("expected InvalidHeaderVersion, got {other:?}"),
        }
    }

    #[test]
    fn should_report_a_truncated_header_as_short_read() {
        let buf = header("a.txt").serialize();

        match StegoHeader::deserialize(&mut Cursor::new(&buf[..buf.len() - 1])) {
            Err(SteganoError::ShortRead) => (),
            other => panic!("expected ShortRead, got {other:?}"),
        }
    }

    #[test]
    fn should_reject_long_names_and_bad_algorithm_names() {
        let long_name = "x".repeat(256);
        assert!(matches!(
            StegoHeader::new(1, &long_name, &StegoConfig::default()),
            Err(SteganoError::PayloadNameTooLong(256))
        ));
        assert!(matches!(
            StegoHeader::new(1, "a", &StegoConfig::default().with_encryption("BLOWFISH448")),
            Err(SteganoError::InvalidAlgorithmName(_))
        ));
    }
}
