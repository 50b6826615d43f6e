use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};

use navigator_core::domain::job::total_overflow;
use navigator_core::domain::order::{Order, OrderDraft, OrderFilter, OrderId, OrderStatus};

use super::equipment::parse_decimal;
use super::{decode_err, OrderRepository, RepositoryError};
use crate::DbPool;

const ORDER_COLUMNS: &str = "id, name, client_name, event_date, location, status, sales_manager,
                             primary_contact, total";

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_order(row: &sqlx::sqlite::SqliteRow) -> Result<Order, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(decode_err)?;
    let event_date: Option<String> = row.try_get("event_date").map_err(decode_err)?;
    let status: String = row.try_get("status").map_err(decode_err)?;
    let total: String = row.try_get("total").map_err(decode_err)?;

    let event_date = event_date
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(decode_err))
        .transpose()?;

    Ok(Order {
        id: OrderId(id),
        name: row.try_get("name").map_err(decode_err)?,
        client_name: row.try_get("client_name").map_err(decode_err)?,
        event_date,
        location: row.try_get("location").map_err(decode_err)?,
        status: OrderStatus::parse(&status)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown order status `{status}`")))?,
        sales_manager: row.try_get("sales_manager").map_err(decode_err)?,
        primary_contact: row.try_get("primary_contact").map_err(decode_err)?,
        total: parse_decimal("total", &total)?,
    })
}

pub(crate) async fn fetch_order(
    conn: &mut SqliteConnection,
    id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(row_to_order).transpose()
}

/// Sets the order total to the sum of its job totals.
pub(crate) async fn recompute_order_total(
    conn: &mut SqliteConnection,
    order_id: OrderId,
) -> Result<Decimal, RepositoryError> {
    let totals: Vec<String> = sqlx::query_scalar("SELECT job_total FROM jobs WHERE order_id = ?")
        .bind(order_id.0)
        .fetch_all(&mut *conn)
        .await?;

    let mut total = Decimal::ZERO;
    for raw in &totals {
        total = total
            .checked_add(parse_decimal("job_total", raw)?)
            .ok_or_else(|| total_overflow("order"))?;
    }

    sqlx::query("UPDATE orders SET total = ? WHERE id = ?")
        .bind(total.to_string())
        .bind(order_id.0)
        .execute(&mut *conn)
        .await?;

    Ok(total)
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn search(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"));

        if let Some(id) = filter.id {
            query.push(" AND id = ").push_bind(id.0);
        }
        if let Some(name) = filter.name.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            query.push(" AND name LIKE ").push_bind(format!("%{name}%"));
        }
        if let Some(client) =
            filter.client_name.as_deref().map(str::trim).filter(|v| !v.is_empty())
        {
            query.push(" AND client_name LIKE ").push_bind(format!("%{client}%"));
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(start) = filter.start_date {
            query.push(" AND event_date >= ").push_bind(start.to_string());
        }
        if let Some(end) = filter.end_date {
            query.push(" AND event_date <= ").push_bind(end.to_string());
        }
        query.push(" ORDER BY event_date IS NULL, event_date DESC, id ASC");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_order).collect()
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    async fn create(&self, draft: OrderDraft) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let next: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(id), 0) + 1 FROM orders")
            .fetch_one(&mut *tx)
            .await?;

        let order = draft.into_order(OrderId(next));
        order.validate()?;

        sqlx::query(
            "INSERT INTO orders (id, name, client_name, event_date, location, status,
                                 sales_manager, primary_contact, total)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.id.0)
        .bind(&order.name)
        .bind(&order.client_name)
        .bind(order.event_date.map(|date| date.to_string()))
        .bind(&order.location)
        .bind(order.status.as_str())
        .bind(&order.sales_manager)
        .bind(&order.primary_contact)
        .bind(order.total.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    async fn update(&self, order: Order) -> Result<Order, RepositoryError> {
        order.validate()?;
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE orders SET name = ?, client_name = ?, event_date = ?, location = ?,
                               status = ?, sales_manager = ?, primary_contact = ?
             WHERE id = ?",
        )
        .bind(&order.name)
        .bind(&order.client_name)
        .bind(order.event_date.map(|date| date.to_string()))
        .bind(&order.location)
        .bind(order.status.as_str())
        .bind(&order.sales_manager)
        .bind(&order.primary_contact)
        .bind(order.id.0)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "order", id: order.id.0 });
        }

        let stored = fetch_order(&mut tx, order.id)
            .await?
            .ok_or(RepositoryError::NotFound { entity: "order", id: order.id.0 })?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let deleted =
            sqlx::query("DELETE FROM orders WHERE id = ?").bind(id.0).execute(&self.pool).await?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "order", id: id.0 });
        }
        Ok(())
    }
}
