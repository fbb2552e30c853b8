//! Runtime configuration for one node (spec §4.9 `init`, §6 "Configuration
//! knobs").

use std::path::PathBuf;

use flud_proto::{Capabilities, Role, BATTERY_UNKNOWN};

use crate::errors::{ApiError, Result};

/// Valid radio channel numbers (spec §4.9 `init`).
pub const CHANNEL_RANGE: std::ops::RangeInclusive<u8> = 0..=14;
/// Valid hop-budget range.
pub const MAX_TTL_RANGE: std::ops::RangeInclusive<u8> = 1..=9;
/// Valid unsolicited-HELLO interval range, in seconds.
pub const HELLO_INTERVAL_RANGE: std::ops::RangeInclusive<u32> = 10..=3600;

/// Default dup-suppression cache capacity (spec §8 scenario 5 works this
/// example at a capacity of 64).
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Every runtime knob `init` needs to bring a node up (spec §4.9, §6).
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Device name, carried in every HELLO this node sends.
    pub name: String,
    /// Root of the on-disk layout (spec §3).
    pub context_path: PathBuf,
    /// Radio channel number, `0..=14`.
    pub channel: u8,
    /// Max hop budget stamped on frames this node originates, `1..=9`.
    pub max_ttl: u8,
    /// Unsolicited HELLO cadence, in seconds, `10..=3600`.
    pub hello_interval_secs: u32,
    /// Forwarding-policy role advertised in HELLO.
    pub role: Role,
    /// Capability bitmask advertised in HELLO.
    pub capabilities: Capabilities,
    /// Battery percent, or [`BATTERY_UNKNOWN`].
    pub battery: u8,
    /// Dup-suppression cache capacity.
    pub cache_capacity: usize,
    /// Bounded send-queue depth (spec §4.6).
    pub queue_depth: usize,
}

impl NodeConfig {
    /// Build a config with sensible defaults for everything but identity
    /// and on-disk path.
    #[must_use]
    pub fn new(name: impl Into<String>, context_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            context_path: context_path.into(),
            channel: 1,
            max_ttl: 5,
            hello_interval_secs: 60,
            role: Role::Client,
            capabilities: Capabilities::empty(),
            battery: BATTERY_UNKNOWN,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            queue_depth: flud_engine::DEFAULT_DEPTH,
        }
    }

    /// Validate the range-constrained fields (spec §4.9 `init`).
    ///
    /// # Errors
    ///
    /// `InvalidArg` naming whichever field is out of range.
    pub fn validate(&self) -> Result<()> {
        if !CHANNEL_RANGE.contains(&self.channel) {
            return Err(ApiError::InvalidArg(format!("channel {} out of range 0..=14", self.channel)));
        }
        if !MAX_TTL_RANGE.contains(&self.max_ttl) {
            return Err(ApiError::InvalidArg(format!("max_ttl {} out of range 1..=9", self.max_ttl)));
        }
        if !HELLO_INTERVAL_RANGE.contains(&self.hello_interval_secs) {
            return Err(ApiError::InvalidArg(format!(
                "hello_interval_secs {} out of range 10..=3600",
                self.hello_interval_secs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = NodeConfig::new("Alpha", "/tmp/fludmesh-does-not-need-to-exist");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn out_of_range_channel_is_rejected() {
        let mut config = NodeConfig::new("Alpha", "/tmp/x");
        config.channel = 15;
        assert!(matches!(config.validate(), Err(ApiError::InvalidArg(_))));
    }

    #[test]
    fn out_of_range_max_ttl_is_rejected() {
        let mut config = NodeConfig::new("Alpha", "/tmp/x");
        config.max_ttl = 0;
        assert!(matches!(config.validate(), Err(ApiError::InvalidArg(_))));
        config.max_ttl = 10;
        assert!(matches!(config.validate(), Err(ApiError::InvalidArg(_))));
    }

    #[test]
    fn out_of_range_hello_interval_is_rejected() {
        let mut config = NodeConfig::new("Alpha", "/tmp/x");
        config.hello_interval_secs = 5;
        assert!(matches!(config.validate(), Err(ApiError::InvalidArg(_))));
        config.hello_interval_secs = 4000;
        assert!(matches!(config.validate(), Err(ApiError::InvalidArg(_))));
    }
}
