use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use navigator_core::catalog::Catalog;
use navigator_core::domain::equipment::EquipmentItem;
use navigator_core::domain::job::{Job, JobId};
use navigator_core::domain::order::{Order, OrderId, OrderStatus};

use crate::connection::DbPool;
use crate::repositories::{memory::InMemoryStore, RepositoryError};

/// Demo orders and jobs shown when the service starts without a database, and
/// loaded into SQLite by `navigator seed`.
pub struct DemoDataset;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub equipment: usize,
    pub orders: usize,
    pub jobs: usize,
}

struct OrderSeed {
    id: i64,
    name: &'static str,
    client: &'static str,
    date: (i32, u32, u32),
    location: &'static str,
    sales_manager: &'static str,
    contact: &'static str,
    total: i64,
}

struct JobSeed {
    id: i64,
    order_id: i64,
    name: &'static str,
    room: &'static str,
    start: &'static str,
    end: &'static str,
    account: &'static str,
    sales_manager: &'static str,
    total: i64,
}

const ORDERS: &[OrderSeed] = &[
    OrderSeed {
        id: 5824,
        name: "Google Presentation Setup",
        client: "Google",
        date: (2025, 4, 14),
        location: "Meeting Room 1",
        sales_manager: "David Calvillo",
        contact: "Avery Andrews",
        total: 7200,
    },
    OrderSeed {
        id: 6102,
        name: "Encore Meeting Setup",
        client: "Encore",
        date: (2025, 4, 20),
        location: "Boardroom 3",
        sales_manager: "Eder Castillo",
        contact: "Mark Johnson",
        total: 8400,
    },
    OrderSeed {
        id: 6117,
        name: "WWDC 2025 Setup",
        client: "Apple",
        date: (2025, 4, 25),
        location: "Grand Ballroom 2",
        sales_manager: "Dylan Neal",
        contact: "Tim Hanson",
        total: 15000,
    },
    OrderSeed {
        id: 6118,
        name: "Pharma Conference Operation",
        client: "Pfizer",
        date: (2025, 5, 1),
        location: "Meeting Room 3",
        sales_manager: "Sarah Brown",
        contact: "Emily Rodriguez",
        total: 2400,
    },
    OrderSeed {
        id: 6115,
        name: "Microsoft Ignite Teardown",
        client: "Microsoft",
        date: (2025, 5, 7),
        location: "Grand Ballroom 1",
        sales_manager: "Darren Lins",
        contact: "Satya Nadella",
        total: 11400,
    },
    OrderSeed {
        id: 6101,
        name: "Company Retreat Strike",
        client: "AbbVie",
        date: (2025, 5, 8),
        location: "Meeting Room 2",
        sales_manager: "David Calvillo",
        contact: "Jessica Miller",
        total: 0,
    },
];

const JOBS: &[JobSeed] = &[
    JobSeed {
        id: 27205,
        order_id: 5824,
        name: "Meeting Room Setup",
        room: "Meeting Room 1",
        start: "2025-04-14T08:00:00",
        end: "2025-04-14T12:00:00",
        account: "Google",
        sales_manager: "David Calvillo",
        total: 3500,
    },
    JobSeed {
        id: 26940,
        order_id: 5824,
        name: "AV Equipment Teardown",
        room: "Meeting Room 1",
        start: "2025-04-14T17:00:00",
        end: "2025-04-14T19:00:00",
        account: "Google",
        sales_manager: "David Calvillo",
        total: 1200,
    },
    JobSeed {
        id: 27323,
        order_id: 6102,
        name: "Board Meeting",
        room: "Boardroom 3",
        start: "2025-04-20T09:00:00",
        end: "2025-04-20T16:00:00",
        account: "Encore",
        sales_manager: "Eder Castillo",
        total: 8400,
    },
    JobSeed {
        id: 28438,
        order_id: 6117,
        name: "Developer Conference",
        room: "Grand Ballroom 2",
        start: "2025-04-25T07:00:00",
        end: "2025-04-28T19:00:00",
        account: "Apple",
        sales_manager: "Dylan Neal",
        total: 15000,
    },
    JobSeed {
        id: 28495,
        order_id: 6118,
        name: "Pharmaceutical Conference",
        room: "Meeting Room 3",
        start: "2025-05-01T08:00:00",
        end: "2025-05-01T17:00:00",
        account: "Pfizer",
        sales_manager: "Sarah Brown",
        total: 2400,
    },
    JobSeed {
        id: 27482,
        order_id: 6115,
        name: "Tech Conference Teardown",
        room: "Grand Ballroom 1",
        start: "2025-05-07T15:00:00",
        end: "2025-05-07T23:00:00",
        account: "Microsoft",
        sales_manager: "Darren Lins",
        total: 11400,
    },
];

fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok()
}

impl DemoDataset {
    pub fn equipment() -> Vec<EquipmentItem> {
        Catalog::builtin().items().to_vec()
    }

    pub fn orders() -> Vec<Order> {
        ORDERS
            .iter()
            .map(|seed| Order {
                id: OrderId(seed.id),
                name: seed.name.to_string(),
                client_name: seed.client.to_string(),
                event_date: NaiveDate::from_ymd_opt(seed.date.0, seed.date.1, seed.date.2),
                location: seed.location.to_string(),
                status: OrderStatus::Confirmed,
                sales_manager: seed.sales_manager.to_string(),
                primary_contact: seed.contact.to_string(),
                total: Decimal::new(seed.total, 0),
            })
            .collect()
    }

    pub fn jobs() -> Vec<Job> {
        JOBS.iter()
            .map(|seed| Job {
                id: JobId(seed.id),
                order_id: OrderId(seed.order_id),
                name: seed.name.to_string(),
                room: seed.room.to_string(),
                start_time: parse_time(seed.start),
                end_time: parse_time(seed.end),
                account_name: seed.account.to_string(),
                sales_manager: seed.sales_manager.to_string(),
                job_total: Decimal::new(seed.total, 0),
            })
            .collect()
    }

    pub fn memory_store() -> InMemoryStore {
        InMemoryStore::with_data(Self::equipment(), Self::orders(), Self::jobs())
    }

    /// Writes the dataset into SQLite. Existing rows with the same ids are
    /// left untouched, so seeding twice is harmless.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        let mut result = SeedResult::default();

        for item in Self::equipment() {
            let inserted = sqlx::query(
                "INSERT OR IGNORE INTO equipment (id, name, rate, category) VALUES (?, ?, ?, ?)",
            )
            .bind(item.id.0)
            .bind(&item.name)
            .bind(item.rate.to_string())
            .bind(&item.category)
            .execute(&mut *tx)
            .await?;
            result.equipment += inserted.rows_affected() as usize;
        }

        for order in Self::orders() {
            let inserted = sqlx::query(
                "INSERT OR IGNORE INTO orders (id, name, client_name, event_date, location, status,
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
            result.orders += inserted.rows_affected() as usize;
        }

        for job in Self::jobs() {
            let inserted = sqlx::query(
                "INSERT OR IGNORE INTO jobs (id, order_id, name, room, start_time, end_time,
                                             account_name, sales_manager, job_total)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(job.id.0)
            .bind(job.order_id.0)
            .bind(&job.name)
            .bind(&job.room)
            .bind(job.start_time.map(crate::repositories::job::format_time))
            .bind(job.end_time.map(crate::repositories::job::format_time))
            .bind(&job.account_name)
            .bind(&job.sales_manager)
            .bind(job.job_total.to_string())
            .execute(&mut *tx)
            .await?;
            result.jobs += inserted.rows_affected() as usize;
        }

        tx.commit().await?;
        tracing::info!(
            event_name = "db.seed.loaded",
            equipment = result.equipment,
            orders = result.orders,
            jobs = result.jobs,
            "demo dataset loaded"
        );
        Ok(result)
    }
}
