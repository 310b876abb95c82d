use std::io;
use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SteganoError {
    /// Represents a missing cover image where one is required
    #[error("No cover image was provided")]
    NullImage,

    /// Represents a palette based cover, for example a GIF or a PNG with colour type 3
    #[error("Indexed (palette based) images cannot carry hidden data")]
    IndexedImageUnsupported,

    /// Represents data that does not start with the stego magic stamp,
    /// so it is no stego image at all
    #[error("No stego header stamp found")]
    InvalidHeaderStamp,

    /// Represents a stego image written by an incompatible format version
    #[error("Unsupported stego format version: {0}")]
    InvalidHeaderVersion(u8),

    #[error(
        "Capacity Error: {required} bits are required to hide all data, but the image only provides {available} bits"
    )]
    ImageSizeInsufficient { required: u64, available: u64 },

    /// Represents an image that ended before all declared data was extracted,
    /// for example a truncated or corrupted image
    #[error("The image ended before all declared data could be read")]
    ShortRead,

    /// Represents a capacity planning defect, no free location was left although one was expected
    #[error(
        "Location bookkeeping exhausted after {claimed} claims (bound {bound}) and {attempts} draws"
    )]
    CollisionExhausted {
        claimed: u64,
        bound: u64,
        attempts: u64,
    },

    /// Represents a payload name that does not fit into the one byte length field
    #[error("Payload name is {0} bytes long, at most 255 bytes are supported")]
    PayloadNameTooLong(usize),

    /// Represents a payload name that is not valid UTF-8
    #[error("Invalid payload name found inside the header")]
    InvalidPayloadName(#[from] FromUtf8Error),

    /// Represents an encryption algorithm name that is not ASCII or longer than 8 bytes
    #[error("Invalid encryption algorithm name: {0:?}")]
    InvalidAlgorithmName(String),

    /// Represents a placement parameter in a header that the selected strategy cannot use
    #[error("Invalid placement parameter: {0}")]
    InvalidPlacementParameter(u8),

    /// Represents a second switch into the payload phase, the switch happens exactly once
    #[error("Placement already left the header phase")]
    PayloadPhaseAlreadyEntered,

    /// Represents a payload that cannot be described by the 32 bit length field
    #[error("Payload of {0} bytes is too large")]
    PayloadTooLarge(usize),

    /// Represents a write beyond the declared payload length
    #[error("Payload overflow: {declared} bytes were declared but {attempted} bytes were written")]
    PayloadOverflow { declared: u32, attempted: u64 },

    /// Represents a stream that was finished before the declared payload was written
    #[error("Incomplete payload: {declared} bytes were declared but only {written} bytes were written")]
    IncompletePayload { declared: u32, written: u32 },

    /// Represents a stream that is used again after one of its writes or reads failed
    #[error("Stream is unusable after an earlier failure")]
    StreamFailed,

    /// Represents a frequency domain bit that did not survive the conversion back into pixels
    #[error("Coefficient in block ({block_x}, {block_y}) could not be stabilized")]
    UnstableCoefficient { block_x: u32, block_y: u32 },

    /// Represents an unsupported image format, for example a movie file
    #[error("Media format is not supported")]
    UnsupportedMedia,

    /// Represents an invalid image media. For example, a broken PNG file
    #[error("Image media is invalid")]
    InvalidImageMedia,

    /// Represents a failure when encoding an image file.
    #[error("Image encoding error")]
    ImageEncodingError,

    /// Represents a failure to read from input.
    #[error("Read error")]
    ReadError { source: io::Error },

    /// Represents a failure to write target file.
    #[error("Write error")]
    WriteError { source: io::Error },

    /// Represents all other cases of `std::io::Error`.
    #[error(transparent)]
    IoError(#[from] io::Error),

    #[error("API Error: Missing payload")]
    MissingPayload,
}

impl SteganoError {
    /// unwraps a `SteganoError` that travelled through an `io::Read`/`io::Write` boundary
    pub(crate) fn from_io(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            return SteganoError::ShortRead;
        }
        if err.get_ref().map_or(false, |e| e.is::<SteganoError>()) {
            if let Some(inner) = err.into_inner() {
                if let Ok(e) = inner.downcast::<SteganoError>() {
                    return *e;
                }
            }
            return SteganoError::ShortRead;
        }

        SteganoError::IoError(err)
    }

    pub(crate) fn into_io(self) -> io::Error {
        match self {
            SteganoError::IoError(e) => e,
            e => io::Error::new(io::ErrorKind::Other, e),
        }
    }
}
