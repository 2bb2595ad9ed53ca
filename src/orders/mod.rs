//! Merchant order records keyed by merchant transaction id
//!
//! The gateway only asks for state transitions. Stores must apply them idempotently because
//! the processor delivers callbacks at least once.
use std::{fmt::Display, str::FromStr};

use async_trait::async_trait;

mod db;
mod memory;

pub use db::SqliteOrderStore;
pub use memory::InMemoryOrderStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Initiated,
    Paid,
    Failed,
    /// Processor reported something that is neither success nor failure
    PendingUnknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::PendingUnknown => "pending-unknown",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Failed)
    }

    /// Decide whether moving from `current` to `self` changes anything.
    pub fn transition_from(self, current: Option<OrderStatus>) -> Transition {
        match current {
            Some(current) if current.is_terminal() || current == self => Transition::Unchanged,
            _ => Transition::Applied,
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiated" => Ok(Self::Initiated),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "pending-unknown" => Ok(Self::PendingUnknown),
            other => Err(OrderStoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// Outcome of a transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// Order already had this status or was already settled
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub transaction_id: String,
    pub buyer_id: String,
    /// Amount in minor currency units
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub transaction_id: String,
    /// Unknown when the order was first seen through a callback
    pub buyer_id: Option<String>,
    pub amount: Option<u64>,
    pub status: OrderStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum OrderStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("database file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid database url: {0}")]
    InvalidUrl(String),
    #[error("unknown order status in store: {0}")]
    UnknownStatus(String),
    #[error("amount {0} does not fit the order store")]
    AmountOutOfRange(u64),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Register a freshly initiated payment attempt. Existing records are left untouched.
    async fn record_initiated(&self, order: &NewOrder) -> Result<(), OrderStoreError>;

    /// Move an order to `status`. Settled orders never change again.
    /// Unknown transaction ids are created with `status`.
    async fn record_transition(
        &self,
        transaction_id: &str,
        status: OrderStatus,
    ) -> Result<Transition, OrderStoreError>;

    async fn get(&self, transaction_id: &str) -> Result<Option<Order>, OrderStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settled_orders_never_transition() {
        for settled in [OrderStatus::Paid, OrderStatus::Failed] {
            for next in [
                OrderStatus::Paid,
                OrderStatus::Failed,
                OrderStatus::PendingUnknown,
            ] {
                assert_eq!(next.transition_from(Some(settled)), Transition::Unchanged);
            }
        }
    }

    #[test]
    fn pending_orders_can_settle() {
        assert_eq!(
            OrderStatus::Paid.transition_from(Some(OrderStatus::PendingUnknown)),
            Transition::Applied
        );
        assert_eq!(
            OrderStatus::Failed.transition_from(Some(OrderStatus::Initiated)),
            Transition::Applied
        );
        assert_eq!(
            OrderStatus::PendingUnknown.transition_from(Some(OrderStatus::PendingUnknown)),
            Transition::Unchanged
        );
        assert_eq!(OrderStatus::Paid.transition_from(None), Transition::Applied);
    }

    #[test]
    fn status_text_round_trip() {
        for status in [
            OrderStatus::Initiated,
            OrderStatus::Paid,
            OrderStatus::Failed,
            OrderStatus::PendingUnknown,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("settled".parse::<OrderStatus>().is_err());
    }
}
