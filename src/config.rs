use crate::password::Password;

/// Default upper limit for the negotiated bits per color channel
pub const DEFAULT_MAX_BITS_PER_CHANNEL: u8 = 3;

/// Decides where inside the cover the bits of header and payload end up.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Strategy {
    /// Raster order, row by row, R then G then B. No password involved.
    #[default]
    Sequential,
    /// Password keyed random pixel, channel and bit, each location used once.
    KeyedRandomPixel,
    /// Password keyed random 8x8 block, one bit in the quantized value
    /// of a mid frequency coefficient.
    KeyedRandomCoefficient,
}

/// Configuration for hiding and unveiling
#[derive(Debug, Clone)]
pub struct StegoConfig {
    /// The placement strategy, must be the same for hiding and unveiling.
    pub strategy: Strategy,

    /// Keys the random strategies, ignored by [`Strategy::Sequential`].
    pub password: Password,

    /// Upper limit when negotiating how many low order bits of a color channel are used.
    ///
    /// The header is always written with one bit per channel, only the payload is
    /// written with the negotiated depth. Values outside `1..=8` are clamped.
    pub max_bits_per_channel: u8,

    /// The payload was compressed by the caller before hiding.
    pub compression: bool,

    /// The payload was encrypted by the caller before hiding.
    pub encryption: bool,

    /// Name of the encryption algorithm, at most 8 ASCII characters.
    pub encryption_algorithm: String,
}

impl Default for StegoConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            password: Password::default(),
            max_bits_per_channel: DEFAULT_MAX_BITS_PER_CHANNEL,
            compression: false,
            encryption: false,
            encryption_algorithm: String::new(),
        }
    }
}

impl StegoConfig {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_password<P: Into<Password>>(mut self, password: P) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_max_bits_per_channel(mut self, bits: u8) -> Self {
        self.max_bits_per_channel = bits;
        self
    }

    pub fn with_compression(mut self, compression: bool) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_encryption<S: Into<String>>(mut self, algorithm: S) -> Self {
        self.encryption = true;
        self.encryption_algorithm = algorithm.into();
        self
    }

    pub fn get_max_bits_per_channel(&self) -> u8 {
        self.max_bits_per_channel.clamp(1, 8)
    }

    /// Takes over the flags that an unveiled header carried.
    pub fn apply(&mut self, flags: &RecoveredFlags) {
        self.compression = flags.compression;
        self.encryption = flags.encryption;
        self.encryption_algorithm = flags.encryption_algorithm.clone();
    }
}

/// Payload pre-processing flags as found in an unveiled header.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct RecoveredFlags {
    pub compression: bool,
    pub encryption: bool,
    pub encryption_algorithm: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_clamp_max_bits_per_channel() {
        assert_eq!(
            StegoConfig::default()
                .with_max_bits_per_channel(0)
                .get_max_bits_per_channel(),
            1
        );
        assert_eq!(
            StegoConfig::default()
                .with_max_bits_per_channel(12)
                .get_max_bits_per_channel(),
            8
        );
        assert_eq!(StegoConfig::default().get_max_bits_per_channel(), 3);
    }

    #[test]
    fn should_apply_recovered_flags() {
        let mut config = StegoConfig::default();
        config.apply(&RecoveredFlags {
            compression: true,
            encryption: true,
            encryption_algorithm: "AES128".to_string(),
        });

        assert!(config.compression);
        assert!(config.encryption);
        assert_eq!(config.encryption_algorithm, "AES128");
        assert_eq!(config.strategy, Strategy::Sequential);
    }
}
