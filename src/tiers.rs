/// Subscription tier limits
///
/// The quota ledger and the per-upload size check consume these numbers;
/// computing them (billing, plan changes) lives outside this service.
use serde::{Deserialize, Serialize};

/// Numeric limits supplied by a subscription tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierLimits {
    pub storage_limit_bytes: i64,
    pub max_file_size_bytes: i64,
    /// Default item retention; feeds the expiry timestamp when a client
    /// supplies no TTL. None means items default to no expiry.
    pub retention_days: Option<u32>,
}

/// Lookup of tier limits for a workspace's tier name
pub trait TierLimitProvider: Send + Sync {
    fn limits_for(&self, tier: &str) -> TierLimits;
}

/// Fixed tier table
///
/// Unknown tier names fall back to the free tier rather than failing the
/// request path.
#[derive(Debug, Clone, Default)]
pub struct StaticTierProvider;

const GIB: i64 = 1024 * 1024 * 1024;
const MIB: i64 = 1024 * 1024;

impl TierLimitProvider for StaticTierProvider {
    fn limits_for(&self, tier: &str) -> TierLimits {
        match tier {
            "pro" => TierLimits {
                storage_limit_bytes: 50 * GIB,
                max_file_size_bytes: 500 * MIB,
                retention_days: None,
            },
            "team" => TierLimits {
                storage_limit_bytes: 250 * GIB,
                max_file_size_bytes: 2 * GIB,
                retention_days: None,
            },
            _ => TierLimits {
                storage_limit_bytes: GIB,
                max_file_size_bytes: 25 * MIB,
                retention_days: Some(30),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tiers() {
        let provider = StaticTierProvider;
        assert_eq!(provider.limits_for("free").storage_limit_bytes, GIB);
        assert_eq!(provider.limits_for("pro").storage_limit_bytes, 50 * GIB);
        assert!(provider.limits_for("pro").retention_days.is_none());
    }

    #[test]
    fn test_unknown_tier_falls_back_to_free() {
        let provider = StaticTierProvider;
        let limits = provider.limits_for("enterprise-legacy");
        assert_eq!(limits.storage_limit_bytes, GIB);
        assert_eq!(limits.retention_days, Some(30));
    }
}
