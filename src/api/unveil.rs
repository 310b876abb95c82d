use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{RecoveredFlags, StegoConfig, Strategy};
use crate::media::{BlockTables, Cover};
use crate::password::Password;
use crate::stream::ExtractionStream;
use crate::{Result, SteganoError};

/// File name used when the payload was hidden without a name
pub const UNNAMED_PAYLOAD: &str = "secret-payload.bin";

pub fn prepare() -> UnveilApi {
    UnveilApi::default()
}

/// What an unveil recovered
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Unveiled {
    pub name: String,
    pub payload: Vec<u8>,
    pub flags: RecoveredFlags,
}

#[derive(Default, Debug)]
pub struct UnveilApi {
    secret_media: Option<PathBuf>,
    cover: Option<Cover>,
    output_folder: Option<PathBuf>,
    config: StegoConfig,
}

impl UnveilApi {
    /// Use the given configuration, strategy and password must match the hiding side
    pub fn with_config(mut self, config: StegoConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// This is the secret image that contains the data to be unveiled
    pub fn from_secret_file(mut self, secret_image: impl AsRef<Path>) -> Self {
        self.secret_media = Some(secret_image.as_ref().to_path_buf());
        self
    }

    /// An already decoded secret image
    pub fn from_cover(mut self, cover: Cover) -> Self {
        self.cover = Some(cover);
        self
    }

    /// This is the folder where the payload will be saved to
    pub fn into_output_folder(mut self, output_folder: impl AsRef<Path>) -> Self {
        self.output_folder = Some(output_folder.as_ref().to_path_buf());
        self
    }

    /// Set the password that keyed the random placement
    /// If `None` is passed, the default seed is used
    pub fn using_password<P: Into<Password>>(mut self, password: P) -> Self {
        self.config.password = password.into();
        self
    }

    /// Execute the unveil process and blocks until it is finished
    pub fn execute(mut self) -> Result<Unveiled> {
        let cover = match (self.cover.take(), &self.secret_media) {
            (Some(cover), _) => cover,
            (None, Some(secret_media)) => Cover::from_file(secret_media)?,
            (None, None) => return Err(SteganoError::NullImage),
        };

        let tables = BlockTables::standard();
        let mut stream = ExtractionStream::open_for_read(Some(&cover), &self.config, &tables)?;
        let payload = stream.read_to_end_payload()?;
        let unveiled = Unveiled {
            name: stream.header().payload_name().to_string(),
            payload,
            flags: stream.recovered_flags().clone(),
        };

        if let Some(output_folder) = &self.output_folder {
            write_payload(output_folder, &unveiled)?;
        }

        Ok(unveiled)
    }
}

/// Writes the payload into `output_folder`, only the file name part of the payload name is used
fn write_payload(output_folder: &Path, unveiled: &Unveiled) -> Result<PathBuf> {
    let file_name = Path::new(&unveiled.name)
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| UNNAMED_PAYLOAD.into());
    let target = output_folder.join(file_name);

    let mut target_file =
        File::create(&target).map_err(|source| SteganoError::WriteError { source })?;
    target_file
        .write_all(&unveiled.payload)
        .map_err(|source| SteganoError::WriteError { source })?;

    Ok(target)
}
