//! Order creation workflow.
//!
//! ```text
//! CreateOrderRequest
//!     → validate (local; never reaches the breaker)
//!     → CircuitBreaker::execute(PartsSource::fetch_part)
//!     → stock check against the snapshot
//!     → price, then OrderStore::create
//! ```

use std::sync::Arc;

use crate::observability::metrics;
use crate::orders::error::WorkflowError;
use crate::orders::store::OrderStore;
use crate::orders::types::{CreateOrderRequest, NewOrder, Order};
use crate::parts::{PartLookup, PartsSource};
use crate::resilience::{BreakerResult, CircuitBreaker};

/// Creates orders against a breaker-guarded parts service.
pub struct OrderWorkflow {
    parts: Arc<dyn PartsSource>,
    breaker: Arc<CircuitBreaker>,
    store: Arc<OrderStore>,
}

impl OrderWorkflow {
    pub fn new(
        parts: Arc<dyn PartsSource>,
        breaker: Arc<CircuitBreaker>,
        store: Arc<OrderStore>,
    ) -> Self {
        Self {
            parts,
            breaker,
            store,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    /// Validate, check stock and price with the parts service, then store.
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, WorkflowError> {
        let result = self.try_create(request).await;
        match &result {
            Ok(order) => {
                metrics::record_order_created();
                tracing::info!(
                    order_id = order.order_id,
                    part_id = order.part_id,
                    quantity = order.quantity,
                    total_price = %order.total_price,
                    "Order created"
                );
            }
            Err(e) => {
                metrics::record_order_rejected(e.label());
                tracing::info!(reason = e.label(), error = %e, "Order rejected");
            }
        }
        result
    }

    async fn try_create(&self, request: CreateOrderRequest) -> Result<Order, WorkflowError> {
        let request = request.validate()?;

        let lookup = match self
            .breaker
            .execute(|| self.parts.fetch_part(request.part_id))
            .await
        {
            BreakerResult::Completed(lookup) => lookup,
            BreakerResult::Failed(failure) => {
                return Err(WorkflowError::DependencyUnavailable(failure))
            }
            BreakerResult::ShortCircuited => return Err(WorkflowError::BreakerOpen),
        };

        let snapshot = match lookup {
            PartLookup::Found(snapshot) => snapshot,
            PartLookup::NotFound => return Err(WorkflowError::PartNotFound),
            PartLookup::Malformed(reason) => return Err(WorkflowError::BadUpstream(reason)),
        };

        if request.quantity > snapshot.stock {
            return Err(WorkflowError::InsufficientStock {
                available: snapshot.stock,
            });
        }

        let draft = NewOrder::priced(&request, &snapshot).ok_or_else(|| {
            WorkflowError::BadUpstream(format!("total for price {} overflows", snapshot.unit_price))
        })?;

        let order = self.store.create(draft).map_err(|e| {
            tracing::error!(error = %e, "Order store rejected insert");
            WorkflowError::Store(e)
        })?;
        Ok(order)
    }
}
