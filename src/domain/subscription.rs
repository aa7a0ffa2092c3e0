use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recurring billing relationship between a user and the service.
///
/// The billing job only ever flips `active` off or moves `next_payment_date`
/// forward; subscriptions are never deleted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub active: bool,
    pub next_payment_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn new(user_id: Uuid, next_payment_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            active: true,
            next_payment_date,
            end_date: None,
        }
    }

    pub fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Active and with a billing date at or before `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.active && self.next_payment_date <= now
    }

    /// Active but past its end date.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.active && self.end_date.is_some_and(|end| end <= now)
    }

    /// The billing date that follows a successful charge of this cycle.
    pub fn following_payment_date(&self) -> DateTime<Utc> {
        add_one_month(self.next_payment_date)
    }
}

/// Adds one calendar month, keeping the day of month and time of day.
///
/// Days that do not exist in the target month clamp to its last day
/// (Jan 31 -> Feb 28/29).
pub fn add_one_month(date: DateTime<Utc>) -> DateTime<Utc> {
    date.checked_add_months(Months::new(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
