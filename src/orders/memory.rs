use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{NewOrder, Order, OrderStatus, OrderStore, OrderStoreError, Transition};

/// Process-local order store. Records are lost on restart.
#[derive(Debug, Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<String, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn record_initiated(&self, order: &NewOrder) -> Result<(), OrderStoreError> {
        let mut orders = self.orders.write().await;
        orders
            .entry(order.transaction_id.clone())
            .or_insert_with(|| Order {
                transaction_id: order.transaction_id.clone(),
                buyer_id: Some(order.buyer_id.clone()),
                amount: Some(order.amount),
                status: OrderStatus::Initiated,
            });
        Ok(())
    }

    async fn record_transition(
        &self,
        transaction_id: &str,
        status: OrderStatus,
    ) -> Result<Transition, OrderStoreError> {
        let mut orders = self.orders.write().await;
        let current = orders.get(transaction_id).map(|o| o.status);
        let transition = status.transition_from(current);
        if transition == Transition::Applied {
            orders
                .entry(transaction_id.to_string())
                .and_modify(|o| o.status = status)
                .or_insert_with(|| Order {
                    transaction_id: transaction_id.to_string(),
                    buyer_id: None,
                    amount: None,
                    status,
                });
        }
        Ok(transition)
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<Order>, OrderStoreError> {
        let orders = self.orders.read().await;
        Ok(orders.get(transaction_id).cloned())
    }
}
