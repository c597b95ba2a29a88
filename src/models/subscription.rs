use chrono::{DateTime, Duration, Months, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{FromSqliteRow, MemberProfile};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Pending,
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "active" => SubscriptionStatus::Active,
            "cancelled" => SubscriptionStatus::Cancelled,
            "expired" => SubscriptionStatus::Expired,
            _ => SubscriptionStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub plan_name: String,
    pub amount: i64,
    pub duration: String,
    pub status: SubscriptionStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub payment_id: Option<String>,
    pub gateway_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for Subscription {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let status: String = row.get("status")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            plan_name: row.get("plan_name")?,
            amount: row.get("amount")?,
            duration: row.get("duration")?,
            status: SubscriptionStatus::parse(&status),
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
            payment_id: row.get("payment_id")?,
            gateway_order_id: row.get("gateway_order_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        days_remaining(self.end_date, now)
    }

    pub fn progress_percentage(&self, now: DateTime<Utc>) -> u8 {
        progress_percentage(self.start_date, self.end_date, now)
    }
}

/// Whole days left until `end_date`, rounded up, never negative.
///
/// A subscription without an end date has no days remaining.
pub fn days_remaining(end_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    let Some(end) = end_date else {
        return 0;
    };
    let diff_ms = (end - now).num_milliseconds();
    if diff_ms <= 0 {
        return 0;
    }
    (diff_ms + DAY_MS - 1) / DAY_MS
}

/// Elapsed share of the validity window, clamped to 0..=100.
pub fn progress_percentage(
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> u8 {
    let (Some(start), Some(end)) = (start_date, end_date) else {
        return 0;
    };
    let total = (end - start).num_milliseconds();
    if total <= 0 {
        return 100;
    }
    let elapsed = (now - start).num_milliseconds();
    let percentage = (elapsed as f64 / total as f64 * 100.0).floor();
    percentage.clamp(0.0, 100.0) as u8
}

/// End of a validity window starting at `start` for a plan duration such as
/// `"month"`, `"3 months"`, `"1 year"` or `"14 days"`.
pub fn end_date_for(start: DateTime<Utc>, duration: &str) -> Option<DateTime<Utc>> {
    let normalized = duration.trim().to_lowercase();
    let mut parts = normalized.split_whitespace();
    let first = parts.next()?;

    let (count, unit) = match first.parse::<u32>() {
        Ok(count) => (count, parts.next()?),
        Err(_) => (1, first),
    };
    if count == 0 {
        return None;
    }

    match unit.trim_end_matches('s') {
        "day" | "daily" => start.checked_add_signed(Duration::days(count.into())),
        "week" | "weekly" => start.checked_add_signed(Duration::weeks(count.into())),
        "month" | "monthly" => start.checked_add_months(Months::new(count)),
        "quarter" | "quarterly" => start.checked_add_months(Months::new(count.checked_mul(3)?)),
        "year" | "yearly" | "annual" | "annually" => {
            start.checked_add_months(Months::new(count.checked_mul(12)?))
        }
        _ => None,
    }
}

/// Figures shown above the admin subscriptions table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionSummary {
    pub active_count: usize,
    pub expiring_this_week: usize,
    pub total_revenue: i64,
}

impl SubscriptionSummary {
    pub fn from_subscriptions<'a, I>(subscriptions: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a Subscription>,
    {
        subscriptions
            .into_iter()
            .fold(Self::default(), |mut summary, sub| {
                if sub.is_active() {
                    summary.active_count += 1;
                    summary.total_revenue = summary.total_revenue.saturating_add(sub.amount);
                }
                if sub.end_date.is_some() {
                    let days = sub.days_remaining(now);
                    if days > 0 && days <= 7 {
                        summary.expiring_this_week += 1;
                    }
                }
                summary
            })
    }
}

/// Admin listing entry: the subscription plus whatever the identity provider
/// knows about its owner.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionWithMember {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub user: Option<MemberProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscription {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub plan_name: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub duration: String,
}

impl CreateSubscription {
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty()
            || self.plan_name.trim().is_empty()
            || self.duration.trim().is_empty()
        {
            return Err("Missing required subscription fields".to_string());
        }
        if self.amount <= 0 {
            return Err("Amount must be positive".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub name: &'static str,
    pub price: i64,
    pub duration: &'static str,
    pub features: &'static [&'static str],
    pub popular: bool,
}

pub const PLANS: &[Plan] = &[
    Plan {
        name: "Basic",
        price: 999,
        duration: "month",
        features: &[
            "Access to gym floor",
            "Locker room access",
            "Workout catalog",
        ],
        popular: false,
    },
    Plan {
        name: "Premium",
        price: 2499,
        duration: "3 months",
        features: &[
            "Everything in Basic",
            "Group classes",
            "Monthly body composition check",
        ],
        popular: true,
    },
    Plan {
        name: "Elite",
        price: 8999,
        duration: "year",
        features: &[
            "Everything in Premium",
            "Personal trainer sessions",
            "Partner gym access",
        ],
        popular: false,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_days_remaining_rounds_up() {
        let now = at(2025, 5, 1, 12);
        assert_eq!(days_remaining(Some(at(2025, 5, 2, 13)), now), 2);
        assert_eq!(days_remaining(Some(at(2025, 5, 2, 12)), now), 1);
        assert_eq!(days_remaining(Some(now + Duration::minutes(1)), now), 1);
    }

    #[test]
    fn test_days_remaining_floors_at_zero() {
        let now = at(2025, 5, 10, 0);
        assert_eq!(days_remaining(Some(at(2025, 5, 1, 0)), now), 0);
        assert_eq!(days_remaining(Some(now), now), 0);
        assert_eq!(days_remaining(None, now), 0);
    }

    #[test]
    fn test_progress_percentage() {
        let start = at(2025, 1, 1, 0);
        let end = at(2025, 1, 11, 0);
        assert_eq!(progress_percentage(Some(start), Some(end), at(2025, 1, 6, 0)), 50);
        assert_eq!(progress_percentage(Some(start), Some(end), at(2024, 12, 1, 0)), 0);
        assert_eq!(progress_percentage(Some(start), Some(end), at(2025, 2, 1, 0)), 100);
        assert_eq!(progress_percentage(None, Some(end), start), 0);
    }

    #[test]
    fn test_end_date_for_durations() {
        let start = at(2025, 1, 31, 0);
        assert_eq!(end_date_for(start, "month"), Some(at(2025, 2, 28, 0)));
        assert_eq!(end_date_for(start, "3 months"), Some(at(2025, 4, 30, 0)));
        assert_eq!(end_date_for(start, "1 Year"), Some(at(2026, 1, 31, 0)));
        assert_eq!(end_date_for(start, "14 days"), Some(at(2025, 2, 14, 0)));
        assert_eq!(end_date_for(start, "2 weeks"), Some(at(2025, 2, 14, 0)));
        assert_eq!(end_date_for(start, "forever"), None);
        assert_eq!(end_date_for(start, "0 months"), None);
    }

    #[test]
    fn test_end_date_for_huge_durations() {
        let start = at(2025, 1, 31, 0);
        assert_eq!(end_date_for(start, "400000000 years"), None);
        assert_eq!(end_date_for(start, "4000000000 quarters"), None);
        assert_eq!(end_date_for(start, "4294967295 days"), None);
    }

    #[test]
    fn test_status_parse_round_trip() {
        for status in [
            SubscriptionStatus::Pending,
            SubscriptionStatus::Active,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Expired,
        ] {
            assert_eq!(SubscriptionStatus::parse(status.as_str()), status);
        }
        assert_eq!(SubscriptionStatus::parse("bogus"), SubscriptionStatus::Pending);
    }

    fn subscription(status: SubscriptionStatus, amount: i64, end: DateTime<Utc>) -> Subscription {
        Subscription {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: "user_1".to_string(),
            plan_name: "Basic".to_string(),
            amount,
            duration: "month".to_string(),
            status,
            start_date: None,
            end_date: Some(end),
            payment_id: None,
            gateway_order_id: None,
            created_at: end,
        }
    }

    #[test]
    fn test_summary() {
        let now = at(2025, 5, 1, 0);
        let subs = vec![
            subscription(SubscriptionStatus::Active, 999, at(2025, 5, 4, 0)),
            subscription(SubscriptionStatus::Active, 2499, at(2025, 7, 1, 0)),
            subscription(SubscriptionStatus::Pending, 8999, at(2025, 5, 2, 0)),
            subscription(SubscriptionStatus::Active, 500, at(2025, 4, 1, 0)),
        ];

        let summary = SubscriptionSummary::from_subscriptions(&subs, now);

        assert_eq!(summary.active_count, 3);
        assert_eq!(summary.total_revenue, 999 + 2499 + 500);
        assert_eq!(summary.expiring_this_week, 2);
    }

    #[test]
    fn test_summary_revenue_saturates() {
        let end = at(2025, 7, 1, 0);
        let subs = vec![
            subscription(SubscriptionStatus::Active, i64::MAX, end),
            subscription(SubscriptionStatus::Active, 999, end),
        ];

        let summary = SubscriptionSummary::from_subscriptions(&subs, at(2025, 5, 1, 0));

        assert_eq!(summary.total_revenue, i64::MAX);
    }

    #[test]
    fn test_create_subscription_validation() {
        let mut req = CreateSubscription {
            user_id: "user_1".to_string(),
            plan_name: "Basic".to_string(),
            amount: 999,
            duration: "month".to_string(),
        };
        assert!(req.validate().is_ok());
        req.amount = 0;
        assert!(req.validate().is_err());
    }
}
