use async_trait::async_trait;
use thiserror::Error;

use navigator_core::domain::equipment::{EquipmentId, EquipmentItem};
use navigator_core::domain::job::{Job, JobDraft, JobEquipmentLine, JobId};
use navigator_core::domain::order::{Order, OrderDraft, OrderFilter, OrderId};
use navigator_core::errors::{ApplicationError, DomainError};

pub mod equipment;
pub mod job;
pub mod job_equipment;
pub mod memory;
pub mod order;

pub use equipment::SqlEquipmentRepository;
pub use job::SqlJobRepository;
pub use job_equipment::SqlJobEquipmentRepository;
pub use memory::InMemoryStore;
pub use order::SqlOrderRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepositoryError::Invalid(domain) => Self::Domain(domain),
            other => Self::Persistence(other.to_string()),
        }
    }
}

#[async_trait]
pub trait EquipmentRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<EquipmentItem>, RepositoryError>;
    async fn find_by_id(&self, id: EquipmentId) -> Result<Option<EquipmentItem>, RepositoryError>;
    async fn save(&self, item: EquipmentItem) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Matching orders, newest event date first.
    async fn search(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError>;
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;
    /// Inserts with the next id (current max + 1).
    async fn create(&self, draft: OrderDraft) -> Result<Order, RepositoryError>;
    /// Replaces the editable fields. The stored total is kept.
    async fn update(&self, order: Order) -> Result<Order, RepositoryError>;
    /// Removes the order together with its jobs and their equipment.
    async fn delete(&self, id: OrderId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn list_for_order(&self, order_id: OrderId) -> Result<Vec<Job>, RepositoryError>;
    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;
    async fn create(&self, order_id: OrderId, draft: JobDraft) -> Result<Job, RepositoryError>;
    async fn update(&self, job: Job) -> Result<Job, RepositoryError>;
    async fn delete(&self, id: JobId) -> Result<(), RepositoryError>;
}

/// Equipment lines of a job. Every mutation recomputes the job total and the
/// parent order total and returns the updated job.
#[async_trait]
pub trait JobEquipmentRepository: Send + Sync {
    async fn list_for_job(&self, job_id: JobId) -> Result<Vec<JobEquipmentLine>, RepositoryError>;
    async fn replace_lines(
        &self,
        job_id: JobId,
        lines: Vec<JobEquipmentLine>,
    ) -> Result<Job, RepositoryError>;
    /// Adds a line, or raises the quantity when the job already carries the item.
    async fn add_line(&self, job_id: JobId, line: JobEquipmentLine) -> Result<Job, RepositoryError>;
    async fn remove_line(
        &self,
        job_id: JobId,
        equipment_id: EquipmentId,
    ) -> Result<Job, RepositoryError>;
}

pub(crate) fn validate_lines(lines: &[JobEquipmentLine]) -> Result<(), RepositoryError> {
    for line in lines {
        line.validate()?;
    }
    Ok(())
}

/// Folds a new line into an existing list: same equipment raises quantity.
pub(crate) fn merge_line(lines: &mut Vec<JobEquipmentLine>, line: JobEquipmentLine) {
    match lines.iter_mut().find(|existing| existing.equipment_id == line.equipment_id) {
        Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
        None => lines.push(line),
    }
}

pub(crate) fn decode_err(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}
