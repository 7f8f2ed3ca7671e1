//! Entitlement Guard: decides whether an organization may start a new generation.
//!
//! Stateless: every call is evaluated against the tier, status, and usage count the
//! caller just read from the store. Admission here is advisory; the binding quota
//! check is the conditional increment performed when the document is committed
//! (see `store::PgStore::commit_document`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel limit for tiers with unlimited generations.
pub const UNLIMITED: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Trial,
    Basic,
    Pro,
}

impl Tier {
    /// Maximum successful generations for the tier, or `UNLIMITED`.
    pub fn limit(&self) -> i64 {
        match self {
            Tier::Trial => 3,
            Tier::Basic => 10,
            Tier::Pro => UNLIMITED,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Trial => "trial",
            Tier::Basic => "basic",
            Tier::Pro => "pro",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "trial" => Some(Tier::Trial),
            "basic" => Some(Tier::Basic),
            "pro" => Some(Tier::Pro),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    PastDue,
}

impl SubscriptionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(SubscriptionStatus::Active),
            "cancelled" | "canceled" => Some(SubscriptionStatus::Cancelled),
            "past_due" => Some(SubscriptionStatus::PastDue),
            _ => None,
        }
    }
}

/// Machine-readable reason attached to a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    SubscriptionInactive,
    LimitReached,
}

impl DenialReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::SubscriptionInactive => "SUBSCRIPTION_INACTIVE",
            DenialReason::LimitReached => "LIMIT_REACHED",
        }
    }
}

/// Everything a client needs to render an upgrade prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementDenial {
    pub reason: DenialReason,
    pub usage: i64,
    pub limit: i64,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(EntitlementDenial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Evaluates an entitlement. Inactive subscriptions are denied before usage is considered.
pub fn check(tier: Tier, status: SubscriptionStatus, usage_count: i64) -> Decision {
    let limit = tier.limit();

    if !status.is_active() {
        return Decision::Deny(EntitlementDenial {
            reason: DenialReason::SubscriptionInactive,
            usage: usage_count,
            limit,
            tier,
        });
    }

    if limit != UNLIMITED && usage_count >= limit {
        return Decision::Deny(EntitlementDenial {
            reason: DenialReason::LimitReached,
            usage: usage_count,
            limit,
            tier,
        });
    }

    Decision::Allow
}

/// Remaining generations, or `None` when the tier is unlimited.
pub fn remaining(tier: Tier, usage_count: i64) -> Option<i64> {
    match tier.limit() {
        UNLIMITED => None,
        limit => Some((limit - usage_count).max(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIERS: [Tier; 3] = [Tier::Trial, Tier::Basic, Tier::Pro];

    #[test]
    fn test_limit_reached_iff_usage_at_or_over_limit() {
        for tier in TIERS {
            for usage in 0..=50 {
                let decision = check(tier, SubscriptionStatus::Active, usage);
                let expect_deny = tier != Tier::Pro && usage >= tier.limit();
                match decision {
                    Decision::Deny(denial) => {
                        assert!(expect_deny, "{tier} usage={usage} denied unexpectedly");
                        assert_eq!(denial.reason, DenialReason::LimitReached);
                    }
                    Decision::Allow => {
                        assert!(!expect_deny, "{tier} usage={usage} allowed unexpectedly")
                    }
                }
            }
        }
    }

    #[test]
    fn test_pro_never_denied_for_usage() {
        assert!(check(Tier::Pro, SubscriptionStatus::Active, 1_000_000).is_allowed());
    }

    #[test]
    fn test_trial_at_limit_reports_quota_payload() {
        let decision = check(Tier::Trial, SubscriptionStatus::Active, 3);
        assert_eq!(
            decision,
            Decision::Deny(EntitlementDenial {
                reason: DenialReason::LimitReached,
                usage: 3,
                limit: 3,
                tier: Tier::Trial,
            })
        );
    }

    #[test]
    fn test_inactive_status_checked_before_usage() {
        for status in [SubscriptionStatus::Cancelled, SubscriptionStatus::PastDue] {
            // Over the limit too, but the status reason wins.
            match check(Tier::Basic, status, 99) {
                Decision::Deny(denial) => {
                    assert_eq!(denial.reason, DenialReason::SubscriptionInactive)
                }
                Decision::Allow => panic!("inactive subscription must be denied"),
            }
            assert!(!check(Tier::Pro, status, 0).is_allowed());
        }
    }

    #[test]
    fn test_remaining_quota() {
        assert_eq!(remaining(Tier::Trial, 1), Some(2));
        assert_eq!(remaining(Tier::Basic, 14), Some(0));
        assert_eq!(remaining(Tier::Pro, 500), None);
    }

    #[test]
    fn test_tier_and_status_parse() {
        assert_eq!(Tier::parse("basic"), Some(Tier::Basic));
        assert_eq!(Tier::parse("enterprise"), None);
        assert_eq!(
            SubscriptionStatus::parse("past_due"),
            Some(SubscriptionStatus::PastDue)
        );
        assert_eq!(
            SubscriptionStatus::parse("canceled"),
            Some(SubscriptionStatus::Cancelled)
        );
    }

    #[test]
    fn test_denial_reason_serializes_as_code() {
        let json = serde_json::to_string(&DenialReason::LimitReached).unwrap();
        assert_eq!(json, "\"LIMIT_REACHED\"");
        assert_eq!(DenialReason::SubscriptionInactive.code(), "SUBSCRIPTION_INACTIVE");
    }
}
