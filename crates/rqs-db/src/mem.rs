use crate::RequisitionStore;
use anyhow::Result;
use rqs_schemas::{Comment, Order, Requisition, RequisitionStatus};
use rqs_workflow::{search_order, OrderSearchParams, RequisitionSearchParams};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory store. Each call holds the lock for its whole body, so single
/// calls are atomic; sequences of calls are not.
#[derive(Debug, Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    requisitions: HashMap<Uuid, Requisition>,
    // Insertion-ordered; creation order ties break on position.
    comments: Vec<Comment>,
    orders: HashMap<Uuid, Order>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted(mut v: Vec<Requisition>) -> Vec<Requisition> {
    v.sort_by(search_order);
    v
}

fn sorted_orders(mut v: Vec<Order>) -> Vec<Order> {
    v.sort_by(|a, b| {
        a.created_date
            .cmp(&b.created_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    v
}

#[async_trait::async_trait]
impl RequisitionStore for MemStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn find_requisition(&self, id: Uuid) -> Result<Option<Requisition>> {
        Ok(self.inner.read().await.requisitions.get(&id).cloned())
    }

    async fn save_requisition(&self, r: &Requisition) -> Result<()> {
        self.inner
            .write()
            .await
            .requisitions
            .insert(r.id, r.clone());
        Ok(())
    }

    async fn delete_requisition(&self, id: Uuid) -> Result<bool> {
        let mut g = self.inner.write().await;
        let removed = g.requisitions.remove(&id).is_some();
        if removed {
            g.comments.retain(|c| c.requisition != id);
        }
        Ok(removed)
    }

    async fn list_requisitions(&self) -> Result<Vec<Requisition>> {
        let g = self.inner.read().await;
        Ok(sorted(g.requisitions.values().cloned().collect()))
    }

    async fn search_requisitions(&self, params: &RequisitionSearchParams) -> Result<Vec<Requisition>> {
        let g = self.inner.read().await;
        Ok(sorted(
            g.requisitions
                .values()
                .filter(|r| params.matches(r))
                .cloned()
                .collect(),
        ))
    }

    async fn find_regular_requisition(
        &self,
        facility: Uuid,
        program: Uuid,
        processing_period: Uuid,
    ) -> Result<Option<Requisition>> {
        let g = self.inner.read().await;
        let hits = sorted(
            g.requisitions
                .values()
                .filter(|r| {
                    !r.emergency
                        && r.facility == facility
                        && r.program == program
                        && r.processing_period == processing_period
                })
                .cloned()
                .collect(),
        );
        Ok(hits.into_iter().next())
    }

    async fn requisitions_by_creator(&self, creator: Uuid) -> Result<Vec<Requisition>> {
        let g = self.inner.read().await;
        Ok(sorted(
            g.requisitions
                .values()
                .filter(|r| r.creator == Some(creator))
                .cloned()
                .collect(),
        ))
    }

    async fn requisitions_by_supervisory_node(
        &self,
        node: Uuid,
        status: RequisitionStatus,
    ) -> Result<Vec<Requisition>> {
        let g = self.inner.read().await;
        Ok(sorted(
            g.requisitions
                .values()
                .filter(|r| r.supervisory_node == Some(node) && r.status == status)
                .cloned()
                .collect(),
        ))
    }

    async fn save_comment(&self, c: &Comment) -> Result<()> {
        let mut g = self.inner.write().await;
        match g.comments.iter_mut().find(|existing| existing.id == c.id) {
            Some(slot) => *slot = c.clone(),
            None => g.comments.push(c.clone()),
        }
        Ok(())
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        let g = self.inner.read().await;
        Ok(g.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn comments_for(&self, requisition: Uuid) -> Result<Vec<Comment>> {
        let g = self.inner.read().await;
        let mut out: Vec<Comment> = g
            .comments
            .iter()
            .filter(|c| c.requisition == requisition)
            .cloned()
            .collect();
        // Stable: equal timestamps keep insertion order.
        out.sort_by_key(|c| c.created_date);
        Ok(out)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let mut g = self.inner.write().await;
        let before = g.comments.len();
        g.comments.retain(|c| c.id != id);
        Ok(g.comments.len() != before)
    }

    async fn save_order(&self, o: &Order) -> Result<()> {
        self.inner.write().await.orders.insert(o.id, o.clone());
        Ok(())
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let g = self.inner.read().await;
        Ok(sorted_orders(g.orders.values().cloned().collect()))
    }

    async fn search_orders(&self, params: &OrderSearchParams) -> Result<Vec<Order>> {
        let g = self.inner.read().await;
        Ok(sorted_orders(
            g.orders
                .values()
                .filter(|o| params.matches(o))
                .cloned()
                .collect(),
        ))
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool> {
        Ok(self.inner.write().await.orders.remove(&id).is_some())
    }
}
