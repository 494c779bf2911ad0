//! Library initialization and the capability handle.

use std::sync::OnceLock;

use provenant_core::SigningAlgorithm;

use crate::config::EmbedConfig;
use crate::error::Result;
use crate::session::EmbedSession;

static CAPABILITIES: OnceLock<Capabilities> = OnceLock::new();

/// What this build of the library can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Library version, from the package manifest.
    pub version: &'static str,
    /// Every signing algorithm the library can embed.
    pub algorithms: Vec<SigningAlgorithm>,
    /// Algorithms a hardware key store may be asked to sign with.
    pub hardware_algorithms: Vec<SigningAlgorithm>,
}

impl Capabilities {
    fn detect() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            algorithms: SigningAlgorithm::ALL.to_vec(),
            hardware_algorithms: SigningAlgorithm::ALL
                .into_iter()
                .filter(|alg| alg.supports_hardware_keystore())
                .collect(),
        }
    }
}

/// Handle proving the library was initialized.
#[derive(Debug, Clone, Copy)]
pub struct Provenant {
    capabilities: &'static Capabilities,
}

/// Initialize the library. Idempotent; every call returns an equivalent handle.
pub fn init() -> Provenant {
    let capabilities = CAPABILITIES.get_or_init(|| {
        let caps = Capabilities::detect();
        tracing::debug!(version = caps.version, "provenant initialized");
        caps
    });
    Provenant { capabilities }
}

impl Provenant {
    pub fn version(&self) -> &'static str {
        self.capabilities.version
    }

    pub fn capabilities(&self) -> &'static Capabilities {
        self.capabilities
    }

    pub fn supported_algorithms(&self) -> &'static [SigningAlgorithm] {
        &self.capabilities.algorithms
    }

    /// Start a new embed session.
    pub fn session(&self, config: EmbedConfig) -> Result<EmbedSession> {
        config.validate()?;
        Ok(EmbedSession::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let a = init();
        let b = init();
        assert!(std::ptr::eq(a.capabilities(), b.capabilities()));
        assert_eq!(a.version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_capabilities() {
        let lib = init();
        assert_eq!(lib.supported_algorithms().len(), 7);
        assert!(!lib
            .capabilities()
            .hardware_algorithms
            .contains(&SigningAlgorithm::Ed25519));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EmbedConfig {
            copy_buffer_size: 0,
            ..EmbedConfig::default()
        };
        assert!(init().session(config).is_err());
    }
}
