use derive_builder::Builder;
use getset::CopyGetters;
use thiserror::Error;

use crate::{cid::MAX_CID_SIZE, space::Spaces};

/// Configuration of the alternate connection ID coordinator of one connection.
///
/// ```
/// use qbase::{config::AltCidConfig, space::Spaces};
///
/// let config = AltCidConfig::builder()
///     .num_alt_cids(4usize)
///     .eligible_spaces(Spaces::ZERO_RTT | Spaces::ONE_RTT)
///     .build()
///     .unwrap();
/// assert_eq!(config.num_alt_cids(), 4);
/// assert_eq!(config.cid_len(), 8);
/// ```
#[derive(Builder, CopyGetters, Debug, Clone, Copy, PartialEq, Eq)]
#[builder(
    default,
    setter(into),
    build_fn(private, name = "fallible_build")
)]
#[getset(get_copy = "pub")]
pub struct AltCidConfig {
    /// Number of alternate connection IDs issued to the peer at any time.
    num_alt_cids: usize,
    /// Length of the locally generated connection IDs.
    cid_len: usize,
    /// Identifier of this endpoint instance, mixed into the stateless reset tokens.
    instance_id: u32,
    /// The spaces allowed to carry NEW_CONNECTION_ID and RETIRE_CONNECTION_ID frames.
    eligible_spaces: Spaces,
}

impl Default for AltCidConfig {
    fn default() -> Self {
        Self {
            num_alt_cids: 8,
            cid_len: 8,
            instance_id: 0,
            eligible_spaces: Spaces::ONE_RTT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("num_alt_cids must be in 1..=255, got {0}")]
    NumAltCids(usize),
    #[error("cid_len must be in 1..=20, got {0}")]
    CidLen(usize),
    #[error("{num_alt_cids} alternate connection ids can not be rotated within {cid_len} byte ids")]
    IdSpace { num_alt_cids: usize, cid_len: usize },
    #[error("no space is eligible to carry connection ID frames")]
    NoEligibleSpace,
    #[error("{0}")]
    Builder(String),
}

impl AltCidConfig {
    pub fn builder() -> AltCidConfigBuilder {
        AltCidConfigBuilder::default()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if !(1..=u8::MAX as usize).contains(&self.num_alt_cids) {
            return Err(ConfigError::NumAltCids(self.num_alt_cids));
        }
        if !(1..=MAX_CID_SIZE).contains(&self.cid_len) {
            return Err(ConfigError::CidLen(self.cid_len));
        }
        // Rotating the pool draws a whole new pool while the old one is still in use.
        let id_space = 1usize
            .checked_shl(8 * self.cid_len as u32)
            .unwrap_or(usize::MAX);
        if 2 * self.num_alt_cids > id_space {
            return Err(ConfigError::IdSpace {
                num_alt_cids: self.num_alt_cids,
                cid_len: self.cid_len,
            });
        }
        if self.eligible_spaces.is_empty() {
            return Err(ConfigError::NoEligibleSpace);
        }
        Ok(self)
    }
}

impl AltCidConfigBuilder {
    pub fn build(&self) -> Result<AltCidConfig, ConfigError> {
        self.fallible_build()
            .map_err(|e| ConfigError::Builder(e.to_string()))?
            .validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AltCidConfig::builder().build().unwrap();
        assert_eq!(config, AltCidConfig::default());
        assert_eq!(config.num_alt_cids(), 8);
        assert_eq!(config.eligible_spaces(), Spaces::ONE_RTT);
    }

    #[test]
    fn test_invalid_config() {
        assert_eq!(
            AltCidConfig::builder().num_alt_cids(0usize).build(),
            Err(ConfigError::NumAltCids(0))
        );
        assert_eq!(
            AltCidConfig::builder().num_alt_cids(256usize).build(),
            Err(ConfigError::NumAltCids(256))
        );
        assert_eq!(
            AltCidConfig::builder().cid_len(21usize).build(),
            Err(ConfigError::CidLen(21))
        );
        assert_eq!(
            AltCidConfig::builder()
                .eligible_spaces(Spaces::empty())
                .build(),
            Err(ConfigError::NoEligibleSpace)
        );
    }

    #[test]
    fn test_id_space_too_small() {
        let build = |num_alt_cids: usize, cid_len: usize| {
            AltCidConfig::builder()
                .num_alt_cids(num_alt_cids)
                .cid_len(cid_len)
                .build()
        };
        assert!(build(128, 1).is_ok());
        assert_eq!(
            build(129, 1),
            Err(ConfigError::IdSpace {
                num_alt_cids: 129,
                cid_len: 1
            })
        );
        assert!(build(255, 2).is_ok());
        assert!(build(255, 20).is_ok());
    }
}
