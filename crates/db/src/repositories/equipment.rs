use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::Row;

use navigator_core::domain::equipment::{EquipmentId, EquipmentItem};

use super::{decode_err, EquipmentRepository, RepositoryError};
use crate::DbPool;

pub struct SqlEquipmentRepository {
    pool: DbPool,
}

impl SqlEquipmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw.trim())
        .map_err(|error| RepositoryError::Decode(format!("{field} `{raw}`: {error}")))
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<EquipmentItem, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(decode_err)?;
    let name: String = row.try_get("name").map_err(decode_err)?;
    let rate: String = row.try_get("rate").map_err(decode_err)?;
    let category: String = row.try_get("category").map_err(decode_err)?;

    Ok(EquipmentItem::new(id, &name, parse_decimal("rate", &rate)?, &category))
}

#[async_trait::async_trait]
impl EquipmentRepository for SqlEquipmentRepository {
    async fn list(&self) -> Result<Vec<EquipmentItem>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, rate, category FROM equipment ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_item).collect()
    }

    async fn find_by_id(&self, id: EquipmentId) -> Result<Option<EquipmentItem>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, rate, category FROM equipment WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn save(&self, item: EquipmentItem) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO equipment (id, name, rate, category) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 rate = excluded.rate,
                 category = excluded.category",
        )
        .bind(item.id.0)
        .bind(&item.name)
        .bind(item.rate.to_string())
        .bind(&item.category)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
