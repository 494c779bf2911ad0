//! Embedding configuration.

use provenant_core::{HashAlgorithm, MAX_EXCLUSIONS};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for an [`EmbedSession`](crate::EmbedSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// Digest used for single-pass embedding.
    pub hash_algorithm: HashAlgorithm,
    /// Append the manifest to the asset; when false it is returned out of band.
    pub embed: bool,
    /// Extra bytes on top of the signer's capacity for the manifest slot.
    pub reserve_padding: usize,
    /// Buffer size for stream copies and hashing.
    pub copy_buffer_size: usize,
    /// Most exclusion ranges a digest descriptor may carry.
    pub max_exclusions: usize,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::Sha256,
            embed: true,
            reserve_padding: 0,
            copy_buffer_size: 64 * 1024,
            max_exclusions: MAX_EXCLUSIONS,
        }
    }
}

impl EmbedConfig {
    /// Load settings text. Only the `"json"` format is understood.
    pub fn from_settings(settings: &str, format: &str) -> Result<Self> {
        if !format.eq_ignore_ascii_case("json") {
            return Err(Error::Configuration(format!(
                "unsupported settings format {format:?}"
            )));
        }
        let config: EmbedConfig = serde_json::from_str(settings)
            .map_err(|e| Error::Configuration(format!("invalid settings: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no session can work with.
    pub fn validate(&self) -> Result<()> {
        if self.copy_buffer_size == 0 {
            return Err(Error::Configuration("copy_buffer_size must be non-zero".into()));
        }
        if self.max_exclusions == 0 || self.max_exclusions > MAX_EXCLUSIONS {
            return Err(Error::Configuration(format!(
                "max_exclusions must be between 1 and {MAX_EXCLUSIONS}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provenant_core::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = EmbedConfig::default();
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha256);
        assert!(config.embed);
        assert_eq!(config.copy_buffer_size, 65536);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_settings() {
        let config =
            EmbedConfig::from_settings(r#"{"hash_algorithm":"sha384","embed":false}"#, "json")
                .unwrap();
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha384);
        assert!(!config.embed);
        assert_eq!(config.max_exclusions, MAX_EXCLUSIONS);
    }

    #[test]
    fn test_unsupported_format() {
        let err = EmbedConfig::from_settings("embed = true", "toml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(EmbedConfig::from_settings(r#"{"copy_buffer_size":0}"#, "json").is_err());
        assert!(EmbedConfig::from_settings(r#"{"max_exclusions":17}"#, "json").is_err());
        assert!(EmbedConfig::from_settings("{not json", "json").is_err());
    }
}
