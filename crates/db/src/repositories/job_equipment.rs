use rust_decimal::Decimal;
use sqlx::{Row, SqliteConnection};

use navigator_core::domain::equipment::EquipmentId;
use navigator_core::domain::job::{Job, JobEquipmentLine, JobId};

use super::equipment::parse_decimal;
use super::job::fetch_job;
use super::order::recompute_order_total;
use super::{decode_err, merge_line, validate_lines, JobEquipmentRepository, RepositoryError};
use crate::DbPool;

pub struct SqlJobEquipmentRepository {
    pool: DbPool,
}

impl SqlJobEquipmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_line(row: &sqlx::sqlite::SqliteRow) -> Result<JobEquipmentLine, RepositoryError> {
    let equipment_id: i64 = row.try_get("equipment_id").map_err(decode_err)?;
    let rate: String = row.try_get("rate").map_err(decode_err)?;
    let quantity: i64 = row.try_get("quantity").map_err(decode_err)?;
    let days: i64 = row.try_get("days").map_err(decode_err)?;

    Ok(JobEquipmentLine {
        equipment_id: EquipmentId(equipment_id),
        name: row.try_get("name").map_err(decode_err)?,
        category: row.try_get("category").map_err(decode_err)?,
        rate: parse_decimal("rate", &rate)?,
        quantity: u32::try_from(quantity).map_err(decode_err)?,
        days: u32::try_from(days).map_err(decode_err)?,
        notes: row.try_get("notes").map_err(decode_err)?,
    })
}

async fn require_job(conn: &mut SqliteConnection, job_id: JobId) -> Result<Job, RepositoryError> {
    fetch_job(conn, job_id).await?.ok_or(RepositoryError::NotFound { entity: "job", id: job_id.0 })
}

async fn load_lines(
    conn: &mut SqliteConnection,
    job_id: JobId,
) -> Result<Vec<JobEquipmentLine>, RepositoryError> {
    let rows = sqlx::query(
        "SELECT equipment_id, name, category, rate, quantity, days, notes
         FROM job_equipment WHERE job_id = ? ORDER BY position",
    )
    .bind(job_id.0)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(row_to_line).collect()
}

/// Rewrites the job's lines, then rolls the totals up to the job and its order.
async fn store_lines(
    conn: &mut SqliteConnection,
    job: Job,
    lines: &[JobEquipmentLine],
) -> Result<Job, RepositoryError> {
    let mut job = job;
    job.recompute_total(lines)?;

    sqlx::query("DELETE FROM job_equipment WHERE job_id = ?")
        .bind(job.id.0)
        .execute(&mut *conn)
        .await?;

    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            "INSERT INTO job_equipment (job_id, equipment_id, position, name, category, rate,
                                        quantity, days, notes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(job.id.0)
        .bind(line.equipment_id.0)
        .bind(position as i64)
        .bind(&line.name)
        .bind(&line.category)
        .bind(line.rate.to_string())
        .bind(i64::from(line.quantity))
        .bind(i64::from(line.days))
        .bind(&line.notes)
        .execute(&mut *conn)
        .await?;
    }

    sqlx::query("UPDATE jobs SET job_total = ? WHERE id = ?")
        .bind(job.job_total.to_string())
        .bind(job.id.0)
        .execute(&mut *conn)
        .await?;
    let order_total: Decimal = recompute_order_total(conn, job.order_id).await?;

    tracing::debug!(
        event_name = "db.job_equipment.stored",
        job_id = job.id.0,
        lines = lines.len(),
        job_total = %job.job_total,
        order_total = %order_total,
        "job equipment stored"
    );
    Ok(job)
}

#[async_trait::async_trait]
impl JobEquipmentRepository for SqlJobEquipmentRepository {
    async fn list_for_job(&self, job_id: JobId) -> Result<Vec<JobEquipmentLine>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        require_job(&mut conn, job_id).await?;
        load_lines(&mut conn, job_id).await
    }

    async fn replace_lines(
        &self,
        job_id: JobId,
        lines: Vec<JobEquipmentLine>,
    ) -> Result<Job, RepositoryError> {
        validate_lines(&lines)?;
        let mut merged = Vec::with_capacity(lines.len());
        for line in lines {
            merge_line(&mut merged, line);
        }

        let mut tx = self.pool.begin().await?;
        let job = require_job(&mut tx, job_id).await?;
        let job = store_lines(&mut tx, job, &merged).await?;
        tx.commit().await?;
        Ok(job)
    }

    async fn add_line(&self, job_id: JobId, line: JobEquipmentLine) -> Result<Job, RepositoryError> {
        line.validate()?;
        let mut tx = self.pool.begin().await?;
        let job = require_job(&mut tx, job_id).await?;

        let mut lines = load_lines(&mut tx, job_id).await?;
        merge_line(&mut lines, line);
        let job = store_lines(&mut tx, job, &lines).await?;

        tx.commit().await?;
        Ok(job)
    }

    async fn remove_line(
        &self,
        job_id: JobId,
        equipment_id: EquipmentId,
    ) -> Result<Job, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let job = require_job(&mut tx, job_id).await?;

        let mut lines = load_lines(&mut tx, job_id).await?;
        let before = lines.len();
        lines.retain(|line| line.equipment_id != equipment_id);
        if lines.len() == before {
            return Err(RepositoryError::NotFound { entity: "job equipment", id: equipment_id.0 });
        }
        let job = store_lines(&mut tx, job, &lines).await?;

        tx.commit().await?;
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use navigator_core::catalog::Catalog;
    use navigator_core::domain::equipment::EquipmentId;
    use navigator_core::domain::job::{JobEquipmentLine, JobId};
    use navigator_core::domain::order::OrderId;

    use super::SqlJobEquipmentRepository;
    use crate::fixtures::DemoDataset;
    use crate::repositories::{
        JobEquipmentRepository, OrderRepository, RepositoryError, SqlOrderRepository,
    };
    use crate::{connect_with_settings, migrations, DbPool};

    async fn seeded_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        DemoDataset::load(&pool).await.expect("seed");
        pool
    }

    fn catalog_line(id: i64, quantity: u32, days: u32) -> JobEquipmentLine {
        let catalog = Catalog::builtin();
        let item = catalog.find(EquipmentId(id)).expect("catalog item");
        JobEquipmentLine::from_catalog(item, quantity, days, "")
    }

    #[tokio::test]
    async fn replacing_lines_rolls_totals_up_to_order() {
        let pool = seeded_pool().await;
        let repo = SqlJobEquipmentRepository::new(pool.clone());
        let orders = SqlOrderRepository::new(pool);

        // Projector - Standard 200 × 1 × 2 and Wireless Microphone 75 × 2 × 2.
        let job = repo
            .replace_lines(JobId(27205), vec![catalog_line(1, 1, 2), catalog_line(3, 2, 2)])
            .await
            .expect("replace");
        assert_eq!(job.job_total, Decimal::new(700, 0));

        let order = orders.find_by_id(OrderId(5824)).await.expect("find").expect("order");
        assert_eq!(order.total, Decimal::new(1900, 0));

        let lines = repo.list_for_job(JobId(27205)).await.expect("lines");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].equipment_id, EquipmentId(1));
    }

    #[tokio::test]
    async fn add_merges_and_remove_recomputes() {
        let repo = SqlJobEquipmentRepository::new(seeded_pool().await);

        repo.add_line(JobId(27323), catalog_line(21, 2, 1)).await.expect("add");
        let job = repo.add_line(JobId(27323), catalog_line(21, 1, 1)).await.expect("add again");
        assert_eq!(job.job_total, Decimal::new(45, 0));

        let missing = repo.remove_line(JobId(27323), EquipmentId(3)).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));

        let job = repo.remove_line(JobId(27323), EquipmentId(21)).await.expect("remove");
        assert_eq!(job.job_total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn rejects_zero_day_lines_and_unknown_jobs() {
        let repo = SqlJobEquipmentRepository::new(seeded_pool().await);

        let invalid = repo.replace_lines(JobId(27205), vec![catalog_line(1, 1, 0)]).await;
        assert!(matches!(invalid, Err(RepositoryError::Invalid(_))));

        let unknown = repo.list_for_job(JobId(1)).await;
        assert!(matches!(unknown, Err(RepositoryError::NotFound { entity: "job", id: 1 })));
    }
}
