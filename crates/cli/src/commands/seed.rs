use crate::commands::{prepare, CommandResult};
use navigator_db::repositories::{OrderRepository, SqlOrderRepository};
use navigator_db::{connection::connect_with_config, migrations, DbPool, DemoDataset, SeedResult};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seeded = DemoDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let missing = missing_orders(&pool)
            .await
            .map_err(|error| ("seed_verification", error, 6u8))?;

        pool.close().await;
        match verification_failure(&missing) {
            Some(message) => Err(("seed_verification", message, 6u8)),
            None => Ok(seeded),
        }
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", summary(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

async fn missing_orders(pool: &DbPool) -> Result<Vec<i64>, String> {
    let orders = SqlOrderRepository::new(pool.clone());
    let mut missing = Vec::new();
    for order in DemoDataset::orders() {
        let found = orders.find_by_id(order.id).await.map_err(|error| error.to_string())?;
        if found.is_none() {
            missing.push(order.id.0);
        }
    }
    Ok(missing)
}

fn verification_failure(missing: &[i64]) -> Option<String> {
    if missing.is_empty() {
        return None;
    }
    let ids = missing.iter().map(i64::to_string).collect::<Vec<_>>();
    Some(format!("demo orders missing after seeding: {}", ids.join(", ")))
}

fn summary(seeded: &SeedResult) -> String {
    let total = DemoDataset::orders().len();
    format!(
        "demo dataset ready ({total} orders): inserted {} equipment, {} orders, {} jobs",
        seeded.equipment, seeded.orders, seeded.jobs
    )
}

#[cfg(test)]
mod tests {
    use navigator_db::SeedResult;

    use super::{summary, verification_failure};

    #[test]
    fn verification_lists_missing_order_ids() {
        assert_eq!(verification_failure(&[]), None);
        assert_eq!(
            verification_failure(&[5824, 6101]).as_deref(),
            Some("demo orders missing after seeding: 5824, 6101")
        );
    }

    #[test]
    fn summary_reports_inserted_rows() {
        let seeded = SeedResult { equipment: 24, orders: 6, jobs: 6 };
        assert_eq!(
            summary(&seeded),
            "demo dataset ready (6 orders): inserted 24 equipment, 6 orders, 6 jobs"
        );
    }
}
