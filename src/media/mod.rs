//! Everything that touches pixels: covers, color planes and the 8x8 block transform.

pub mod block;
pub mod canvas;
pub mod color;
pub mod cover;

pub use block::{BlockTables, FrequencyBand};
pub use canvas::Canvas;
pub use color::YuvPlanes;
pub use cover::Cover;
