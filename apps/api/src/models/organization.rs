use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::entitlements::{SubscriptionStatus, Tier};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationRow {
    pub id: Uuid,
    pub name: String,
    pub tier: String,
    pub subscription_status: String,
    pub usage_count: i64,
}

impl OrganizationRow {
    pub fn tier(&self) -> Option<Tier> {
        Tier::parse(&self.tier)
    }

    pub fn status(&self) -> Option<SubscriptionStatus> {
        SubscriptionStatus::parse(&self.subscription_status)
    }
}
