//! # Stegano Engine
//!
//! Hides a byte payload in the pixels of a cover image and unveils it again. The
//! stego image carries everything needed for that in a small header, only the
//! placement [`Strategy`] and, for the keyed strategies, the password have to be
//! known on both sides.
//!
//! - [`Strategy::Sequential`] raster order, no password
//! - [`Strategy::KeyedRandomPixel`] password keyed random pixels, channels and bits
//! - [`Strategy::KeyedRandomCoefficient`] password keyed random 8x8 blocks, one bit per
//!   block in a quantized mid frequency DCT coefficient of the luminance
//!
//! # Usage Examples
//!
//! ## Hide data inside an image
//!
//! ```rust
//! use stegano_engine::Strategy;
//! use tempfile::tempdir;
//!
//! let temp_dir = tempdir().expect("Failed to create temporary directory");
//!
//! stegano_engine::api::hide::prepare()
//!     .with_message("Hello, World!")          // will hide this message
//!     .with_payload_name("hello.txt")         // under this name
//!     .with_strategy(Strategy::KeyedRandomPixel)
//!     .with_password("SuperSecret42")         // keys the random placement
//!     .with_generated_cover()                 // no image at hand, use noise
//!     .with_output(temp_dir.path().join("image-with-a-secret.png"))
//!     .execute()
//!     .expect("Failed to hide message in image");
//! ```
//!
//! ## Unveil data from an image
//!
//! ```rust
//! use stegano_engine::Strategy;
//! use tempfile::tempdir;
//!
//! let temp_dir = tempdir().expect("Failed to create temporary directory");
//! let secret_image = temp_dir.path().join("image-with-a-secret.png");
//! # stegano_engine::api::hide::prepare()
//! #     .with_message("Hello, World!")
//! #     .with_payload_name("hello.txt")
//! #     .with_strategy(Strategy::KeyedRandomPixel)
//! #     .with_password("SuperSecret42")
//! #     .with_generated_cover()
//! #     .with_output(&secret_image)
//! #     .execute()
//! #     .unwrap();
//!
//! let unveiled = stegano_engine::api::unveil::prepare()
//!     .from_secret_file(&secret_image)
//!     .with_strategy(Strategy::KeyedRandomPixel)
//!     .using_password("SuperSecret42")
//!     .into_output_folder(temp_dir.path())
//!     .execute()
//!     .expect("Failed to unveil message from image");
//!
//! assert_eq!(unveiled.name, "hello.txt");
//! assert_eq!(unveiled.payload, b"Hello, World!");
//! ```
//!
//! The streams below the API, [`EmbeddingStream`] and [`ExtractionStream`], work on
//! in-memory images and implement [`std::io::Write`] and [`std::io::Read`].

#![warn(clippy::redundant_else)]

pub mod api;
pub mod capacity;
pub mod collision;
pub mod config;
pub mod error;
pub mod header;
pub mod key;
pub mod media;
pub mod password;
pub mod result;
pub mod strategy;
pub mod stream;

pub use crate::config::{RecoveredFlags, StegoConfig, Strategy};
pub use crate::error::SteganoError;
pub use crate::header::StegoHeader;
pub use crate::media::{BlockTables, Cover};
pub use crate::password::Password;
pub use crate::result::Result;
pub use crate::stream::{EmbeddingStream, ExtractionStream};
