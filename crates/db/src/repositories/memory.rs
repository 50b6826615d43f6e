use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;

use navigator_core::domain::equipment::{EquipmentId, EquipmentItem};
use navigator_core::domain::job::{
    lines_total, total_overflow, Job, JobDraft, JobEquipmentLine, JobId,
};
use navigator_core::domain::order::{
    jobs_total, sort_by_event_date_desc, Order, OrderDraft, OrderFilter, OrderId,
};

use super::{
    merge_line, validate_lines, EquipmentRepository, JobEquipmentRepository, JobRepository,
    OrderRepository, RepositoryError,
};

#[derive(Debug, Default)]
struct MemoryState {
    equipment: BTreeMap<EquipmentId, EquipmentItem>,
    orders: BTreeMap<OrderId, Order>,
    jobs: BTreeMap<JobId, Job>,
    lines: HashMap<JobId, Vec<JobEquipmentLine>>,
}

impl MemoryState {
    fn job_mut(&mut self, id: JobId) -> Result<&mut Job, RepositoryError> {
        self.jobs.get_mut(&id).ok_or(RepositoryError::NotFound { entity: "job", id: id.0 })
    }

    fn recompute_order(&mut self, order_id: OrderId) -> Result<(), RepositoryError> {
        let total = jobs_total(self.jobs.values().filter(|job| job.order_id == order_id))?;
        if let Some(order) = self.orders.get_mut(&order_id) {
            order.total = total;
        }
        Ok(())
    }

    /// Stores a job's new lines. Both totals are computed first so a rejected
    /// change leaves the lines, the job and the order as they were.
    fn store_lines(
        &mut self,
        job_id: JobId,
        lines: Vec<JobEquipmentLine>,
    ) -> Result<Job, RepositoryError> {
        let job_total = lines_total(&lines)?;
        let order_id = self.job_mut(job_id)?.order_id;
        let siblings = self.jobs.values().filter(|job| job.order_id == order_id && job.id != job_id);
        let order_total = job_total
            .checked_add(jobs_total(siblings)?)
            .ok_or_else(|| total_overflow("order"))?;

        self.lines.insert(job_id, lines);
        let job = self.job_mut(job_id)?;
        job.job_total = job_total;
        let job = job.clone();
        if let Some(order) = self.orders.get_mut(&order_id) {
            order.total = order_total;
        }
        Ok(job)
    }
}

/// Process-local store backing every repository trait. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn with_data(equipment: Vec<EquipmentItem>, orders: Vec<Order>, jobs: Vec<Job>) -> Self {
        let state = MemoryState {
            equipment: equipment.into_iter().map(|item| (item.id, item)).collect(),
            orders: orders.into_iter().map(|order| (order.id, order)).collect(),
            jobs: jobs.into_iter().map(|job| (job.id, job)).collect(),
            lines: HashMap::new(),
        };
        Self { state: Arc::new(RwLock::new(state)) }
    }
}

#[async_trait::async_trait]
impl EquipmentRepository for InMemoryStore {
    async fn list(&self) -> Result<Vec<EquipmentItem>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.equipment.values().cloned().collect())
    }

    async fn find_by_id(&self, id: EquipmentId) -> Result<Option<EquipmentItem>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.equipment.get(&id).cloned())
    }

    async fn save(&self, item: EquipmentItem) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state.equipment.insert(item.id, item);
        Ok(())
    }
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryStore {
    async fn search(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> =
            state.orders.values().filter(|order| filter.matches(order)).cloned().collect();
        sort_by_event_date_desc(&mut orders);
        Ok(orders)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.orders.get(&id).cloned())
    }

    async fn create(&self, draft: OrderDraft) -> Result<Order, RepositoryError> {
        let mut state = self.state.write().await;
        let next = state.orders.keys().next_back().map(|id| id.0 + 1).unwrap_or(1);
        let order = draft.into_order(OrderId(next));
        order.validate()?;
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn update(&self, mut order: Order) -> Result<Order, RepositoryError> {
        order.validate()?;
        let mut state = self.state.write().await;
        let stored = state
            .orders
            .get_mut(&order.id)
            .ok_or(RepositoryError::NotFound { entity: "order", id: order.id.0 })?;
        order.total = stored.total;
        *stored = order.clone();
        Ok(order)
    }

    async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if state.orders.remove(&id).is_none() {
            return Err(RepositoryError::NotFound { entity: "order", id: id.0 });
        }
        let job_ids: Vec<JobId> =
            state.jobs.values().filter(|job| job.order_id == id).map(|job| job.id).collect();
        for job_id in job_ids {
            state.jobs.remove(&job_id);
            state.lines.remove(&job_id);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl JobRepository for InMemoryStore {
    async fn list_for_order(&self, order_id: OrderId) -> Result<Vec<Job>, RepositoryError> {
        let state = self.state.read().await;
        let mut jobs: Vec<Job> =
            state.jobs.values().filter(|job| job.order_id == order_id).cloned().collect();
        jobs.sort_by(|left, right| {
            left.start_time.cmp(&right.start_time).then_with(|| left.id.cmp(&right.id))
        });
        Ok(jobs)
    }

    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.jobs.get(&id).cloned())
    }

    async fn create(&self, order_id: OrderId, draft: JobDraft) -> Result<Job, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.orders.contains_key(&order_id) {
            return Err(RepositoryError::NotFound { entity: "order", id: order_id.0 });
        }
        let next = state.jobs.keys().next_back().map(|id| id.0 + 1).unwrap_or(1);
        let job = draft.into_job(JobId(next), order_id);
        job.validate()?;
        state.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn update(&self, mut job: Job) -> Result<Job, RepositoryError> {
        job.validate()?;
        let mut state = self.state.write().await;
        let stored = state.job_mut(job.id)?;
        job.order_id = stored.order_id;
        job.job_total = stored.job_total;
        *stored = job.clone();
        Ok(job)
    }

    async fn delete(&self, id: JobId) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let job = state.jobs.remove(&id).ok_or(RepositoryError::NotFound { entity: "job", id: id.0 })?;
        state.lines.remove(&id);
        state.recompute_order(job.order_id)
    }
}

#[async_trait::async_trait]
impl JobEquipmentRepository for InMemoryStore {
    async fn list_for_job(&self, job_id: JobId) -> Result<Vec<JobEquipmentLine>, RepositoryError> {
        let state = self.state.read().await;
        if !state.jobs.contains_key(&job_id) {
            return Err(RepositoryError::NotFound { entity: "job", id: job_id.0 });
        }
        Ok(state.lines.get(&job_id).cloned().unwrap_or_default())
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
        let mut state = self.state.write().await;
        state.store_lines(job_id, merged)
    }

    async fn add_line(&self, job_id: JobId, line: JobEquipmentLine) -> Result<Job, RepositoryError> {
        line.validate()?;
        let mut state = self.state.write().await;
        state.job_mut(job_id)?;
        let mut lines = state.lines.get(&job_id).cloned().unwrap_or_default();
        merge_line(&mut lines, line);
        state.store_lines(job_id, lines)
    }

    async fn remove_line(
        &self,
        job_id: JobId,
        equipment_id: EquipmentId,
    ) -> Result<Job, RepositoryError> {
        let mut state = self.state.write().await;
        state.job_mut(job_id)?;
        let mut lines = state.lines.get(&job_id).cloned().unwrap_or_default();
        let before = lines.len();
        lines.retain(|line| line.equipment_id != equipment_id);
        if lines.len() == before {
            return Err(RepositoryError::NotFound { entity: "job equipment", id: equipment_id.0 });
        }
        state.store_lines(job_id, lines)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use navigator_core::domain::equipment::{EquipmentId, EquipmentItem};
    use navigator_core::domain::job::{JobDraft, JobEquipmentLine, JobId};
    use navigator_core::domain::order::{OrderDraft, OrderFilter, OrderId};

    use crate::fixtures::DemoDataset;
    use crate::repositories::{
        InMemoryStore, JobEquipmentRepository, JobRepository, OrderRepository, RepositoryError,
    };

    fn line(id: i64, rate: i64, quantity: u32, days: u32) -> JobEquipmentLine {
        let item = EquipmentItem::new(id, "Item", Decimal::new(rate, 0), "Audio");
        JobEquipmentLine::from_catalog(&item, quantity, days, "")
    }

    #[tokio::test]
    async fn create_order_uses_next_id_and_defaults() {
        let store = DemoDataset::memory_store();
        let order = OrderRepository::create(&store, OrderDraft::default()).await.expect("create");

        assert_eq!(order.id, OrderId(6119));
        assert_eq!(order.name, "New Internal Order");
    }

    #[tokio::test]
    async fn search_filters_and_sorts_newest_first() {
        let store = DemoDataset::memory_store();
        let all = store.search(&OrderFilter::default()).await.expect("search");
        assert_eq!(all.first().map(|order| order.id), Some(OrderId(6101)));

        let google = store
            .search(&OrderFilter { client_name: Some("google".into()), ..OrderFilter::default() })
            .await
            .expect("search");
        assert_eq!(google.len(), 1);
    }

    #[tokio::test]
    async fn equipment_changes_roll_up_into_job_and_order_totals() {
        let store = DemoDataset::memory_store();
        let order = OrderRepository::create(&store, OrderDraft::default()).await.expect("order");
        let job = JobRepository::create(&store, order.id, JobDraft::default()).await.expect("job");

        store
            .replace_lines(job.id, vec![line(1, 200, 1, 2), line(3, 75, 2, 2)])
            .await
            .expect("replace");
        let job = store.add_line(job.id, line(3, 75, 1, 2)).await.expect("add");

        assert_eq!(job.job_total, Decimal::new(850, 0));
        let lines = store.list_for_job(job.id).await.expect("lines");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].quantity, 3);

        let order = OrderRepository::find_by_id(&store, order.id).await.expect("find").expect("order");
        assert_eq!(order.total, Decimal::new(850, 0));

        let job = store.remove_line(job.id, EquipmentId(1)).await.expect("remove");
        assert_eq!(job.job_total, Decimal::new(450, 0));
    }

    #[tokio::test]
    async fn invalid_lines_are_rejected_without_changes() {
        let store = DemoDataset::memory_store();
        let result = store.replace_lines(JobId(27205), vec![line(1, 200, 0, 1)]).await;

        assert!(matches!(result, Err(RepositoryError::Invalid(_))));
        assert!(store.list_for_job(JobId(27205)).await.expect("lines").is_empty());
    }

    #[tokio::test]
    async fn overflowing_totals_leave_job_and_order_untouched() {
        let store = DemoDataset::memory_store();

        let mut huge = line(1, 1, 4_000_000_000, 4_000_000_000);
        huge.rate = Decimal::from_i128_with_scale(10_i128.pow(22), 0);
        let result = store.replace_lines(JobId(27205), vec![huge]).await;
        assert!(matches!(result, Err(RepositoryError::Invalid(_))));

        let mut first = line(1, 1, 1, 1);
        first.rate = Decimal::MAX;
        let mut second = line(2, 1, 1, 1);
        second.rate = Decimal::MAX;
        let result = store.replace_lines(JobId(27205), vec![first.clone(), second]).await;
        assert!(matches!(result, Err(RepositoryError::Invalid(_))));

        // fits the job on its own but not next to the 1200 sibling job on the order
        let result = store.add_line(JobId(27205), first).await;
        assert!(matches!(result, Err(RepositoryError::Invalid(_))));

        assert!(store.list_for_job(JobId(27205)).await.expect("lines").is_empty());
        let job = JobRepository::find_by_id(&store, JobId(27205)).await.expect("find").expect("job");
        assert_eq!(job.job_total, Decimal::new(3500, 0));
        let order =
            OrderRepository::find_by_id(&store, OrderId(5824)).await.expect("find").expect("order");
        assert_eq!(order.total, Decimal::new(7200, 0));
    }

    #[tokio::test]
    async fn deleting_order_cascades_to_jobs() {
        let store = DemoDataset::memory_store();
        OrderRepository::delete(&store, OrderId(5824)).await.expect("delete");

        assert!(store.list_for_order(OrderId(5824)).await.expect("jobs").is_empty());
        assert!(JobRepository::find_by_id(&store, JobId(27205)).await.expect("find").is_none());
        assert!(matches!(
            OrderRepository::delete(&store, OrderId(5824)).await,
            Err(RepositoryError::NotFound { entity: "order", .. })
        ));
    }

    #[tokio::test]
    async fn job_for_missing_order_is_not_found() {
        let store = InMemoryStore::default();
        let result = JobRepository::create(&store, OrderId(1), JobDraft::default()).await;
        assert!(matches!(result, Err(RepositoryError::NotFound { entity: "order", id: 1 })));
    }
}
