use chrono::NaiveDateTime;
use sqlx::{Row, SqliteConnection};

use navigator_core::domain::job::{Job, JobDraft, JobId};
use navigator_core::domain::order::OrderId;

use super::equipment::parse_decimal;
use super::order::{fetch_order, recompute_order_total};
use super::{decode_err, JobRepository, RepositoryError};
use crate::DbPool;

const JOB_COLUMNS: &str =
    "id, order_id, name, room, start_time, end_time, account_name, sales_manager, job_total";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct SqlJobRepository {
    pool: DbPool,
}

impl SqlJobRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn format_time(time: NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn parse_time(raw: Option<String>) -> Result<Option<NaiveDateTime>, RepositoryError> {
    raw.filter(|raw| !raw.trim().is_empty())
        .map(|raw| NaiveDateTime::parse_from_str(&raw, TIME_FORMAT).map_err(decode_err))
        .transpose()
}

fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> Result<Job, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(decode_err)?;
    let order_id: i64 = row.try_get("order_id").map_err(decode_err)?;
    let job_total: String = row.try_get("job_total").map_err(decode_err)?;

    Ok(Job {
        id: JobId(id),
        order_id: OrderId(order_id),
        name: row.try_get("name").map_err(decode_err)?,
        room: row.try_get("room").map_err(decode_err)?,
        start_time: parse_time(row.try_get("start_time").map_err(decode_err)?)?,
        end_time: parse_time(row.try_get("end_time").map_err(decode_err)?)?,
        account_name: row.try_get("account_name").map_err(decode_err)?,
        sales_manager: row.try_get("sales_manager").map_err(decode_err)?,
        job_total: parse_decimal("job_total", &job_total)?,
    })
}

pub(crate) async fn fetch_job(
    conn: &mut SqliteConnection,
    id: JobId,
) -> Result<Option<Job>, RepositoryError> {
    let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"))
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(row_to_job).transpose()
}

#[async_trait::async_trait]
impl JobRepository for SqlJobRepository {
    async fn list_for_order(&self, order_id: OrderId) -> Result<Vec<Job>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE order_id = ? ORDER BY start_time, id"
        ))
        .bind(order_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_job).collect()
    }

    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_job(&mut conn, id).await
    }

    async fn create(&self, order_id: OrderId, draft: JobDraft) -> Result<Job, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        if fetch_order(&mut tx, order_id).await?.is_none() {
            return Err(RepositoryError::NotFound { entity: "order", id: order_id.0 });
        }

        let next: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(id), 0) + 1 FROM jobs")
            .fetch_one(&mut *tx)
            .await?;
        let job = draft.into_job(JobId(next), order_id);
        job.validate()?;

        sqlx::query(
            "INSERT INTO jobs (id, order_id, name, room, start_time, end_time,
                               account_name, sales_manager, job_total)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(job.id.0)
        .bind(job.order_id.0)
        .bind(&job.name)
        .bind(&job.room)
        .bind(job.start_time.map(format_time))
        .bind(job.end_time.map(format_time))
        .bind(&job.account_name)
        .bind(&job.sales_manager)
        .bind(job.job_total.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(job)
    }

    async fn update(&self, job: Job) -> Result<Job, RepositoryError> {
        job.validate()?;
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE jobs SET name = ?, room = ?, start_time = ?, end_time = ?,
                             account_name = ?, sales_manager = ?
             WHERE id = ?",
        )
        .bind(&job.name)
        .bind(&job.room)
        .bind(job.start_time.map(format_time))
        .bind(job.end_time.map(format_time))
        .bind(&job.account_name)
        .bind(&job.sales_manager)
        .bind(job.id.0)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "job", id: job.id.0 });
        }

        let stored = fetch_job(&mut tx, job.id)
            .await?
            .ok_or(RepositoryError::NotFound { entity: "job", id: job.id.0 })?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn delete(&self, id: JobId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let job = fetch_job(&mut tx, id)
            .await?
            .ok_or(RepositoryError::NotFound { entity: "job", id: id.0 })?;

        sqlx::query("DELETE FROM jobs WHERE id = ?").bind(id.0).execute(&mut *tx).await?;
        recompute_order_total(&mut tx, job.order_id).await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use navigator_core::domain::job::{JobDraft, JobId};
    use navigator_core::domain::order::OrderId;

    use super::SqlJobRepository;
    use crate::fixtures::DemoDataset;
    use crate::repositories::{JobRepository, OrderRepository, RepositoryError, SqlOrderRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn seeded_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        DemoDataset::load(&pool).await.expect("seed");
        pool
    }

    #[tokio::test]
    async fn lists_jobs_for_order_in_start_order() {
        let repo = SqlJobRepository::new(seeded_pool().await);
        let jobs = repo.list_for_order(OrderId(5824)).await.expect("jobs");

        let ids: Vec<i64> = jobs.iter().map(|job| job.id.0).collect();
        assert_eq!(ids, vec![27205, 26940]);
        assert_eq!(
            jobs[0].start_time,
            NaiveDate::from_ymd_opt(2025, 4, 14).and_then(|day| day.and_hms_opt(8, 0, 0))
        );
    }

    #[tokio::test]
    async fn create_requires_existing_order() {
        let repo = SqlJobRepository::new(seeded_pool().await);

        let missing = repo.create(OrderId(1), JobDraft::default()).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound { entity: "order", .. })));

        let job = repo
            .create(OrderId(6101), JobDraft { room: Some("Meeting Room 2".into()), ..JobDraft::default() })
            .await
            .expect("create");
        assert_eq!(job.id, JobId(28496));
        assert_eq!(job.job_total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn deleting_job_recomputes_order_total() {
        let pool = seeded_pool().await;
        let jobs = SqlJobRepository::new(pool.clone());
        let orders = SqlOrderRepository::new(pool);

        jobs.delete(JobId(26940)).await.expect("delete");

        let order = orders.find_by_id(OrderId(5824)).await.expect("find").expect("order");
        assert_eq!(order.total, Decimal::new(3500, 0));
    }
}
