//! Tenant configuration passed explicitly to booking logic

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::BookingConfig;

/// Per-tenant booking settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    /// URL slug identifying the shop
    pub slug: String,
    /// Spacing between bookable start times
    pub slot_interval_minutes: u32,
    /// Offset of the shop's single operating timezone from UTC
    pub utc_offset_minutes: i32,
    /// Hide slots that already started when looking at today
    pub hide_past_slots: bool,
}

impl TenantConfig {
    pub fn new(slug: impl Into<String>, booking: &BookingConfig) -> Self {
        Self {
            slug: slug.into(),
            slot_interval_minutes: booking.slot_interval_minutes,
            utc_offset_minutes: booking.utc_offset_minutes,
            hide_past_slots: booking.hide_past_slots,
        }
    }

    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Current wall-clock time in the shop's timezone.
    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset()).naive_local()
    }

    pub fn today(&self) -> NaiveDate {
        self.local_now().date()
    }
}

/// Check a tenant slug: 2-63 chars of lowercase ASCII letters, digits and
/// hyphens, not starting or ending with a hyphen.
pub fn is_valid_slug(s: &str) -> bool {
    let len = s.len();
    (2..=63).contains(&len)
        && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !s.starts_with('-')
        && !s.ends_with('-')
}
