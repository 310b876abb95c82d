use std::path::{Path, PathBuf};

use image::RgbaImage;
use log::debug;

use crate::capacity::{generate_block_cover_dimensions, generate_cover_dimensions, required_bits};
use crate::config::{StegoConfig, Strategy};
use crate::header::StegoHeader;
use crate::media::cover::{generate_noise_cover, save_image};
use crate::media::{BlockTables, Cover};
use crate::password::Password;
use crate::stream::EmbeddingStream;
use crate::{Result, SteganoError};

/// Noise range of generated covers for the frequency domain, block edits must not clip
const BLOCK_COVER_NOISE: std::ops::RangeInclusive<u8> = 32..=224;

pub fn prepare() -> HideApi {
    HideApi::default()
}

#[derive(Default, Debug)]
pub struct HideApi {
    payload: Option<Vec<u8>>,
    payload_file: Option<PathBuf>,
    payload_name: Option<String>,
    image: Option<PathBuf>,
    cover: Option<Cover>,
    generate_cover: bool,
    output: Option<PathBuf>,
    config: StegoConfig,
}

impl HideApi {
    pub fn with_config(mut self, config: StegoConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Hides these bytes as they are
    pub fn with_payload<B: Into<Vec<u8>>>(mut self, payload: B) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.payload = Some(message.as_bytes().to_vec());
        self
    }

    /// Hides the content of a file, its file name becomes the payload name
    pub fn with_file<A: AsRef<Path>>(mut self, data_file: A) -> Self {
        self.payload_file = Some(data_file.as_ref().to_path_buf());
        self
    }

    pub fn with_payload_name(mut self, name: &str) -> Self {
        self.payload_name = Some(name.to_string());
        self
    }

    pub fn with_image<A: AsRef<Path>>(mut self, image: A) -> Self {
        self.image = Some(image.as_ref().to_path_buf());
        self
    }

    pub fn with_cover(mut self, cover: Cover) -> Self {
        self.cover = Some(cover);
        self
    }

    /// Without an image or cover, a noise cover that just fits is generated
    pub fn with_generated_cover(mut self) -> Self {
        self.generate_cover = true;
        self
    }

    pub fn with_output<A: AsRef<Path>>(mut self, output: A) -> Self {
        self.output = Some(output.as_ref().to_path_buf());
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.config.password = password.into();
        self
    }

    /// Set the password
    /// If `None` is passed, the default seed keys the random strategies
    pub fn use_password<S: AsRef<str>>(mut self, password: Option<S>) -> Self {
        self.config.password = Password::from(password.map(|s| s.as_ref().to_string()));
        self
    }

    /// Hides the payload and returns the stego image, it is saved if an output was set.
    pub fn execute(self) -> Result<RgbaImage> {
        let (payload, name) = self.load_payload()?;
        let cover = match (self.cover, self.image) {
            (Some(cover), _) => cover,
            (None, Some(image)) => Cover::from_file(&image)?,
            (None, None) if self.generate_cover => {
                generated_cover(&self.config, name.len(), payload.len())
            }
            (None, None) => return Err(SteganoError::NullImage),
        };

        let tables = BlockTables::standard();
        let mut stream = EmbeddingStream::open_for_write(
            Some(cover),
            payload.len(),
            &name,
            &self.config,
            &tables,
        )?;
        stream.write_bytes(&payload)?;
        let stego = stream.finish()?;

        if let Some(output) = self.output {
            save_image(&stego, &output)?;
        }

        Ok(stego)
    }

    fn load_payload(&self) -> Result<(Vec<u8>, String)> {
        if let Some(payload) = &self.payload {
            let name = self.payload_name.clone().unwrap_or_default();
            return Ok((payload.clone(), name));
        }
        let Some(file) = &self.payload_file else {
            return Err(SteganoError::MissingPayload);
        };

        let payload = std::fs::read(file).map_err(|source| SteganoError::ReadError { source })?;
        let name = match &self.payload_name {
            Some(name) => name.clone(),
            None => file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        };

        Ok((payload, name))
    }
}

/// The smallest noise cover the configured strategy can hide the payload in at base depth
fn generated_cover(config: &StegoConfig, name_len: usize, payload_len: usize) -> Cover {
    let required = required_bits(StegoHeader::size_for_name(name_len), payload_len);
    let image = match config.strategy {
        Strategy::KeyedRandomCoefficient => {
            let (width, height) = generate_block_cover_dimensions(required);
            generate_noise_cover(width, height, BLOCK_COVER_NOISE)
        }
        Strategy::Sequential | Strategy::KeyedRandomPixel => {
            let (width, height) = generate_cover_dimensions(required);
            generate_noise_cover(width, height, 0..=u8::MAX)
        }
    };
    debug!("generated a {}x{} noise cover", image.width(), image.height());

    Cover::from_image(image)
}
