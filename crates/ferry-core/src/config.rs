//! Configuration for a ferrymesh node

use std::time::Duration;

/// Configuration for the routing core of a single node.
#[derive(Debug, Clone)]
pub struct FerryConfig {
    /// Flood budget: number of hops a data packet may travel before it
    /// is discarded.
    pub hop_count: u32,
    /// Maximum number of packets the store aims to hold.
    pub queue_length: usize,
    /// Maximum time a packet may live in any store, counted from its
    /// origination at the source.
    pub queue_entry_expire_time: Duration,
    /// Interval between beacon broadcasts.
    pub beacon_interval: Duration,
    /// Upper bound of the uniform random jitter added to each beacon
    /// interval to avoid collisions.
    pub beacon_jitter_max: Duration,
    /// Window in which a neighbor is considered recently contacted and
    /// a new summary-vector exchange is suppressed.
    pub host_recent_period: Duration,
}

impl Default for FerryConfig {
    fn default() -> Self {
        Self {
            hop_count: 64,
            queue_length: 64,
            queue_entry_expire_time: Duration::from_secs(100),
            beacon_interval: Duration::from_secs(1),
            beacon_jitter_max: Duration::from_millis(100),
            host_recent_period: Duration::from_secs(10),
        }
    }
}

impl FerryConfig {
    /// Config tuned for a sparse network with long inter-contact times.
    ///
    /// Packets live longer and beacons fire less often.
    pub fn sparse_network() -> Self {
        Self {
            hop_count: 128,
            queue_length: 256,
            queue_entry_expire_time: Duration::from_secs(600),
            beacon_interval: Duration::from_secs(5),
            beacon_jitter_max: Duration::from_millis(500),
            host_recent_period: Duration::from_secs(30),
        }
    }

    /// Config tuned for dense segments where replication must stay cheap.
    pub fn dense_network() -> Self {
        Self {
            hop_count: 16,
            queue_length: 32,
            queue_entry_expire_time: Duration::from_secs(30),
            beacon_interval: Duration::from_secs(1),
            beacon_jitter_max: Duration::from_millis(200),
            host_recent_period: Duration::from_secs(20),
        }
    }

    /// Validate configuration invariants.
    ///
    /// Returns warnings for settings that are legal but likely wrong.
    /// An empty list means the configuration is sound.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.hop_count < 2 {
            // Receivers drop anything arriving with hop_count <= 1, so a
            // budget below 2 never leaves the first hop.
            warnings.push(ConfigWarning::HopCountTooSmall);
        }
        if self.queue_length == 0 {
            warnings.push(ConfigWarning::ZeroQueueLength);
        }
        if self.beacon_interval.is_zero() {
            warnings.push(ConfigWarning::ZeroBeaconInterval);
        }
        if self.host_recent_period < self.beacon_interval {
            warnings.push(ConfigWarning::RecentPeriodBelowBeaconInterval);
        }
        if self.queue_entry_expire_time < self.beacon_interval {
            warnings.push(ConfigWarning::ExpiryBelowBeaconInterval);
        }

        warnings
    }

    /// Check that the configuration has no warnings.
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

/// Configuration warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Hop budget below 2; packets cannot leave the originating node
    HopCountTooSmall,
    /// Store capacity of zero
    ZeroQueueLength,
    /// Beacon interval of zero would busy-loop the timer
    ZeroBeaconInterval,
    /// Recent-contact window shorter than a beacon interval disables
    /// session suppression entirely
    RecentPeriodBelowBeaconInterval,
    /// Packets expire before a single beacon cycle completes
    ExpiryBelowBeaconInterval,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::HopCountTooSmall => {
                write!(f, "hop_count below 2 prevents any forwarding")
            }
            ConfigWarning::ZeroQueueLength => write!(f, "queue_length is zero"),
            ConfigWarning::ZeroBeaconInterval => write!(f, "beacon_interval is zero"),
            ConfigWarning::RecentPeriodBelowBeaconInterval => {
                write!(f, "host_recent_period is shorter than beacon_interval")
            }
            ConfigWarning::ExpiryBelowBeaconInterval => {
                write!(f, "queue_entry_expire_time is shorter than beacon_interval")
            }
        }
    }
}
