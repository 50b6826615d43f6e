use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::equipment::{EquipmentId, EquipmentItem};
use crate::domain::order::OrderId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub i64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub order_id: OrderId,
    pub name: String,
    pub room: String,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub account_name: String,
    pub sales_manager: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub job_total: Decimal,
}

impl Job {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvariantViolation("job name must not be empty".into()));
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end < start {
                return Err(DomainError::InvariantViolation(format!(
                    "job {} ends before it starts",
                    self.id
                )));
            }
        }
        Ok(())
    }

    /// Leaves the stored total untouched when the lines overflow.
    pub fn recompute_total(&mut self, lines: &[JobEquipmentLine]) -> Result<(), DomainError> {
        self.job_total = lines_total(lines)?;
        Ok(())
    }
}

/// Sum of `rate × quantity × days` over the lines.
pub fn lines_total(lines: &[JobEquipmentLine]) -> Result<Decimal, DomainError> {
    lines.iter().try_fold(Decimal::ZERO, |total, line| {
        total.checked_add(line.line_total()?).ok_or_else(|| total_overflow("job"))
    })
}

pub fn total_overflow(what: &str) -> DomainError {
    DomainError::InvariantViolation(format!("{what} total is too large"))
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JobDraft {
    pub name: Option<String>,
    pub room: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub account_name: Option<String>,
    pub sales_manager: Option<String>,
}

impl JobDraft {
    pub fn into_job(self, id: JobId, order_id: OrderId) -> Job {
        Job {
            id,
            order_id,
            name: self
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "New Job".to_string()),
            room: self.room.unwrap_or_default(),
            start_time: self.start_time,
            end_time: self.end_time,
            account_name: self.account_name.unwrap_or_default(),
            sales_manager: self.sales_manager.unwrap_or_default(),
            job_total: Decimal::ZERO,
        }
    }

    pub fn apply_to(self, job: &mut Job) {
        if let Some(name) = self.name.filter(|name| !name.trim().is_empty()) {
            job.name = name;
        }
        if let Some(room) = self.room {
            job.room = room;
        }
        if self.start_time.is_some() {
            job.start_time = self.start_time;
        }
        if self.end_time.is_some() {
            job.end_time = self.end_time;
        }
        if let Some(account_name) = self.account_name {
            job.account_name = account_name;
        }
        if let Some(sales_manager) = self.sales_manager {
            job.sales_manager = sales_manager;
        }
    }
}

/// One equipment row on a job: `rate × quantity × days`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEquipmentLine {
    pub equipment_id: EquipmentId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    pub quantity: u32,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default)]
    pub notes: String,
}

fn default_days() -> u32 {
    1
}

impl JobEquipmentLine {
    pub fn from_catalog(item: &EquipmentItem, quantity: u32, days: u32, notes: &str) -> Self {
        Self {
            equipment_id: item.id,
            name: item.name.clone(),
            category: item.category.clone(),
            rate: item.rate,
            quantity,
            days,
            notes: notes.to_string(),
        }
    }

    pub fn line_total(&self) -> Result<Decimal, DomainError> {
        self.rate
            .checked_mul(Decimal::from(self.quantity))
            .and_then(|total| total.checked_mul(Decimal::from(self.days)))
            .ok_or_else(|| {
                DomainError::InvariantViolation(format!(
                    "equipment `{}` line total is too large",
                    self.name
                ))
            })
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.quantity == 0 {
            return Err(DomainError::InvariantViolation(format!(
                "equipment `{}` must have quantity of at least 1",
                self.name
            )));
        }
        if self.days == 0 {
            return Err(DomainError::InvariantViolation(format!(
                "equipment `{}` must be booked for at least 1 day",
                self.name
            )));
        }
        if self.rate < Decimal::ZERO {
            return Err(DomainError::InvariantViolation(format!(
                "equipment `{}` has a negative rate",
                self.name
            )));
        }
        self.line_total().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Job, JobDraft, JobEquipmentLine, JobId};
    use crate::domain::equipment::{EquipmentId, EquipmentItem};
    use crate::domain::order::OrderId;

    fn line(rate: Decimal, quantity: u32, days: u32) -> JobEquipmentLine {
        JobEquipmentLine {
            equipment_id: EquipmentId(1),
            name: "Tripod Screen 8'".to_string(),
            category: "Video".to_string(),
            rate,
            quantity,
            days,
            notes: String::new(),
        }
    }

    #[test]
    fn line_total_multiplies_rate_quantity_and_days() {
        assert_eq!(line(Decimal::new(5750, 2), 1, 2).line_total(), Ok(Decimal::new(11500, 2)));
        assert_eq!(line(Decimal::new(25, 0), 25, 2).line_total(), Ok(Decimal::new(1250, 0)));
    }

    #[test]
    fn job_total_sums_lines() {
        let mut job = Job {
            id: JobId(27205),
            order_id: OrderId(5824),
            name: "Meeting Room Setup".to_string(),
            room: "Meeting Room 1".to_string(),
            start_time: None,
            end_time: None,
            account_name: "Google".to_string(),
            sales_manager: "David Calvillo".to_string(),
            job_total: Decimal::ZERO,
        };
        job.recompute_total(&[
            line(Decimal::new(7454, 2), 1, 2),
            line(Decimal::new(18, 0), 1, 2),
        ])
        .expect("total");
        assert_eq!(job.job_total, Decimal::new(18508, 2));
    }

    #[test]
    fn oversized_lines_are_rejected_without_touching_the_total() {
        let huge =
            line(Decimal::from_i128_with_scale(10_i128.pow(22), 0), 4_000_000_000, 4_000_000_000);
        assert!(huge.line_total().is_err());
        assert!(huge.validate().is_err());

        let mut job = JobDraft::default().into_job(JobId(27205), OrderId(5824));
        job.job_total = Decimal::new(3500, 0);
        let near_max = line(Decimal::MAX, 1, 1);
        assert!(near_max.validate().is_ok());
        assert!(job.recompute_total(&[near_max.clone(), near_max]).is_err());
        assert_eq!(job.job_total, Decimal::new(3500, 0));
    }

    #[test]
    fn zero_quantity_or_days_is_rejected() {
        assert!(line(Decimal::ONE, 0, 1).validate().is_err());
        assert!(line(Decimal::ONE, 1, 0).validate().is_err());
        assert!(line(Decimal::new(-1, 0), 1, 1).validate().is_err());
        assert!(line(Decimal::ZERO, 1, 1).validate().is_ok());
    }

    #[test]
    fn catalog_line_copies_rate_and_category() {
        let item = EquipmentItem::new(21, "Power Strip - 6 Outlet", Decimal::new(15, 0), "Electrical");
        let line = JobEquipmentLine::from_catalog(&item, 3, 2, "stage left");
        assert_eq!(line.line_total(), Ok(Decimal::new(90, 0)));
        assert_eq!(line.category, "Electrical");
    }

    #[test]
    fn draft_keeps_total_and_unsupplied_fields() {
        let mut job = JobDraft { room: Some("Ballroom A".to_string()), ..JobDraft::default() }
            .into_job(JobId(28496), OrderId(6119));
        job.job_total = Decimal::new(400, 0);
        assert_eq!(job.name, "New Job");

        JobDraft {
            name: Some("  ".to_string()),
            sales_manager: Some("Sarah Brown".to_string()),
            ..JobDraft::default()
        }
        .apply_to(&mut job);

        assert_eq!(job.name, "New Job");
        assert_eq!(job.room, "Ballroom A");
        assert_eq!(job.sales_manager, "Sarah Brown");
        assert_eq!(job.job_total, Decimal::new(400, 0));
    }
}
