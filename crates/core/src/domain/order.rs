use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::job::{total_overflow, Job};
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub i64);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Quote,
    Tentative,
    Confirmed,
    Cancelled,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Tentative => "tentative",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "quote" => Some(Self::Quote),
            "tentative" => Some(Self::Tentative),
            "confirmed" => Some(Self::Confirmed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

pub const DEFAULT_ORDER_NAME: &str = "New Internal Order";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub name: String,
    pub client_name: String,
    pub event_date: Option<NaiveDate>,
    pub location: String,
    pub status: OrderStatus,
    pub sales_manager: String,
    pub primary_contact: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl Order {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvariantViolation("order name must not be empty".into()));
        }
        if self.total < Decimal::ZERO {
            return Err(DomainError::InvariantViolation("order total must not be negative".into()));
        }
        Ok(())
    }
}

/// Fields a caller may supply when creating an order. Missing fields take
/// the new-order defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrderDraft {
    pub name: Option<String>,
    pub client_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub status: Option<OrderStatus>,
    pub sales_manager: Option<String>,
    pub primary_contact: Option<String>,
}

impl OrderDraft {
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            name: self
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ORDER_NAME.to_string()),
            client_name: self.client_name.unwrap_or_default(),
            event_date: self.event_date,
            location: self.location.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            sales_manager: self.sales_manager.unwrap_or_default(),
            primary_contact: self.primary_contact.unwrap_or_default(),
            total: Decimal::ZERO,
        }
    }

    /// Overwrites the fields this draft sets, leaving the rest of `order` alone.
    pub fn apply_to(self, order: &mut Order) {
        if let Some(name) = self.name.filter(|name| !name.trim().is_empty()) {
            order.name = name;
        }
        if let Some(client_name) = self.client_name {
            order.client_name = client_name;
        }
        if self.event_date.is_some() {
            order.event_date = self.event_date;
        }
        if let Some(location) = self.location {
            order.location = location;
        }
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(sales_manager) = self.sales_manager {
            order.sales_manager = sales_manager;
        }
        if let Some(primary_contact) = self.primary_contact {
            order.primary_contact = primary_contact;
        }
    }
}

/// Search criteria for the order list. Unset fields do not filter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct OrderFilter {
    pub id: Option<OrderId>,
    pub name: Option<String>,
    pub client_name: Option<String>,
    pub status: Option<OrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        if self.id.is_some_and(|id| id != order.id) {
            return false;
        }
        if !contains_ignore_case(&order.name, self.name.as_deref()) {
            return false;
        }
        if !contains_ignore_case(&order.client_name, self.client_name.as_deref()) {
            return false;
        }
        if self.status.is_some_and(|status| status != order.status) {
            return false;
        }
        match (order.event_date, self.start_date, self.end_date) {
            (Some(date), Some(start), _) if date < start => false,
            (Some(date), _, Some(end)) if date > end => false,
            (None, Some(_), _) | (None, _, Some(_)) => false,
            _ => true,
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim).filter(|needle| !needle.is_empty()) {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

/// Sorts newest event first; undated orders go last.
/// Order total: the sum of its job totals.
pub fn jobs_total<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Result<Decimal, DomainError> {
    jobs.into_iter().try_fold(Decimal::ZERO, |total, job| {
        total.checked_add(job.job_total).ok_or_else(|| total_overflow("order"))
    })
}

pub fn sort_by_event_date_desc(orders: &mut [Order]) {
    orders.sort_by(|left, right| {
        right.event_date.cmp(&left.event_date).then_with(|| left.id.cmp(&right.id))
    });
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{
        jobs_total, sort_by_event_date_desc, Order, OrderDraft, OrderFilter, OrderId, OrderStatus,
        DEFAULT_ORDER_NAME,
    };
    use crate::domain::job::{JobDraft, JobId};

    fn order(id: i64, name: &str, client: &str, date: Option<(i32, u32, u32)>) -> Order {
        Order {
            id: OrderId(id),
            name: name.to_string(),
            client_name: client.to_string(),
            event_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            location: "Meeting Room 1".to_string(),
            status: OrderStatus::Confirmed,
            sales_manager: "David Calvillo".to_string(),
            primary_contact: "Avery Andrews".to_string(),
            total: Decimal::ZERO,
        }
    }

    #[test]
    fn filter_matches_name_and_client_case_insensitively() {
        let order = order(5824, "Google Presentation Setup", "Google", Some((2025, 4, 14)));
        let filter = OrderFilter {
            name: Some("presentation".to_string()),
            client_name: Some("GOOG".to_string()),
            ..OrderFilter::default()
        };
        assert!(filter.matches(&order));

        let miss = OrderFilter { client_name: Some("Apple".to_string()), ..OrderFilter::default() };
        assert!(!miss.matches(&order));
    }

    #[test]
    fn filter_applies_date_range_and_excludes_undated() {
        let dated = order(1, "Launch", "Acme", Some((2025, 5, 1)));
        let undated = order(2, "Draft", "Acme", None);
        let filter = OrderFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 4, 20),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 7),
            ..OrderFilter::default()
        };

        assert!(filter.matches(&dated));
        assert!(!filter.matches(&undated));
        assert!(OrderFilter::default().matches(&undated));
    }

    #[test]
    fn sorts_newest_first_with_undated_last() {
        let mut orders = vec![
            order(1, "a", "x", Some((2025, 4, 14))),
            order(2, "b", "x", None),
            order(3, "c", "x", Some((2025, 5, 8))),
        ];
        sort_by_event_date_desc(&mut orders);
        let ids: Vec<i64> = orders.iter().map(|order| order.id.0).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn order_total_sums_jobs_and_reports_overflow() {
        let mut meeting = JobDraft::default().into_job(JobId(27205), OrderId(5824));
        meeting.job_total = Decimal::new(3500, 0);
        let mut teardown = JobDraft::default().into_job(JobId(26940), OrderId(5824));
        teardown.job_total = Decimal::new(1200, 0);
        assert_eq!(jobs_total([&meeting, &teardown]), Ok(Decimal::new(4700, 0)));

        meeting.job_total = Decimal::MAX;
        assert!(jobs_total([&meeting, &teardown]).is_err());
    }

    #[test]
    fn blank_name_fails_validation() {
        let order = order(1, "  ", "Acme", None);
        assert!(order.validate().is_err());
    }

    #[test]
    fn empty_draft_takes_new_order_defaults() {
        let order = OrderDraft::default().into_order(OrderId(6119));
        assert_eq!(order.name, DEFAULT_ORDER_NAME);
        assert_eq!(order.status, OrderStatus::Quote);
        assert_eq!(order.total, Decimal::ZERO);
    }

    #[test]
    fn draft_updates_only_supplied_fields() {
        let mut stored = order(6118, "Pharma Conference Operation", "Pfizer", Some((2025, 5, 1)));
        stored.total = Decimal::new(2400, 0);

        OrderDraft {
            name: Some("  ".to_string()),
            status: Some(OrderStatus::Cancelled),
            location: Some("Grand Ballroom 1".to_string()),
            ..OrderDraft::default()
        }
        .apply_to(&mut stored);

        assert_eq!(stored.name, "Pharma Conference Operation");
        assert_eq!(stored.status, OrderStatus::Cancelled);
        assert_eq!(stored.location, "Grand Ballroom 1");
        assert_eq!(stored.client_name, "Pfizer");
        assert_eq!(stored.total, Decimal::new(2400, 0));
    }
}
