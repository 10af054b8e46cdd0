//! In-memory order store.
//!
//! # Design Decisions
//! - Id counter and order map share one lock; id assignment and insertion
//!   are a single step
//! - The counter only advances after a successful insert and never rewinds,
//!   so deleted ids are never handed out again
//! - Orders are kept in id order for listing

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::orders::types::{NewOrder, Order};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("order {0} not found")]
    NotFound(u64),

    /// The next id is already taken. Indicates a bug, never user input.
    #[error("order id {0} already in use")]
    DuplicateId(u64),
}

#[derive(Debug)]
struct Ledger {
    next_id: u64,
    orders: BTreeMap<u64, Order>,
}

/// Process-wide order collection.
#[derive(Debug)]
pub struct OrderStore {
    ledger: Mutex<Ledger>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self {
            ledger: Mutex::new(Ledger {
                next_id: 1,
                orders: BTreeMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Assign the next id to `draft` and store it.
    pub fn create(&self, draft: NewOrder) -> Result<Order, StoreError> {
        let mut ledger = self.lock();
        let order_id = ledger.next_id;

        if ledger.orders.contains_key(&order_id) {
            tracing::error!(order_id, "Refusing to overwrite existing order");
            return Err(StoreError::DuplicateId(order_id));
        }

        let order = draft.into_order(order_id);
        ledger.orders.insert(order_id, order.clone());
        ledger.next_id += 1;
        Ok(order)
    }

    /// All orders, by ascending id.
    pub fn list(&self) -> Vec<Order> {
        self.lock().orders.values().cloned().collect()
    }

    pub fn get(&self, order_id: u64) -> Result<Order, StoreError> {
        self.lock()
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::NotFound(order_id))
    }

    /// Remove an order, returning it.
    pub fn delete(&self, order_id: u64) -> Result<Order, StoreError> {
        self.lock()
            .orders
            .remove(&order_id)
            .ok_or(StoreError::NotFound(order_id))
    }

    pub fn len(&self) -> usize {
        self.lock().orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}
