//! Order types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::orders::error::WorkflowError;
use crate::parts::PartSnapshot;

/// Lifecycle status of an order. Orders only ever reach `created` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
}

/// A stored order. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: u64,
    pub user_id: u64,
    pub part_id: u64,
    pub quantity: u64,
    /// Price per unit, snapshotted from the parts service at creation.
    pub unit_price: Decimal,
    /// Always `unit_price * quantity`.
    pub total_price: Decimal,
    pub status: OrderStatus,
}

/// Request payload for creating an order.
///
/// Fields are signed so that zero and negative values reach validation
/// instead of failing deserialization with a less useful message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: i64,
    pub part_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// A create request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidOrderRequest {
    pub user_id: u64,
    pub part_id: u64,
    pub quantity: u64,
}

impl CreateOrderRequest {
    /// Check field ranges. Cheap and local; never touches the dependency.
    pub fn validate(&self) -> Result<ValidOrderRequest, WorkflowError> {
        let user_id = positive("user_id", self.user_id)?;
        let part_id = positive("part_id", self.part_id)?;
        let quantity = positive("quantity", self.quantity)?;
        Ok(ValidOrderRequest {
            user_id,
            part_id,
            quantity,
        })
    }
}

fn positive(field: &str, value: i64) -> Result<u64, WorkflowError> {
    if value >= 1 {
        Ok(value as u64)
    } else {
        Err(WorkflowError::Validation(format!(
            "{field} must be >= 1, got {value}"
        )))
    }
}

/// Order contents before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: u64,
    pub part_id: u64,
    pub quantity: u64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl NewOrder {
    /// Price a validated request against a snapshot.
    ///
    /// Returns `None` if the total does not fit in a decimal.
    pub fn priced(request: &ValidOrderRequest, snapshot: &PartSnapshot) -> Option<Self> {
        let total_price = snapshot
            .unit_price
            .checked_mul(Decimal::from(request.quantity))?;
        Some(Self {
            user_id: request.user_id,
            part_id: request.part_id,
            quantity: request.quantity,
            unit_price: snapshot.unit_price,
            total_price,
        })
    }

    pub(crate) fn into_order(self, order_id: u64) -> Order {
        Order {
            order_id,
            user_id: self.user_id,
            part_id: self.part_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.total_price,
            status: OrderStatus::Created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(stock: u64, unit_price: Decimal) -> PartSnapshot {
        PartSnapshot {
            part_id: 1,
            stock,
            unit_price,
        }
    }

    #[test]
    fn test_quantity_defaults_to_one() {
        let request: CreateOrderRequest =
            serde_json::from_str(r#"{"user_id": 1, "part_id": 2}"#).unwrap();
        assert_eq!(request.quantity, 1);
    }

    #[test]
    fn test_validation_names_offending_field() {
        let request = CreateOrderRequest {
            user_id: 1,
            part_id: 0,
            quantity: 1,
        };
        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "part_id must be >= 1, got 0");

        let request = CreateOrderRequest {
            user_id: 1,
            part_id: 1,
            quantity: -4,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_total_is_unit_times_quantity() {
        let cases = [
            (Decimal::new(1000, 2), 3, Decimal::new(3000, 2)),
            (Decimal::new(1999, 2), 7, Decimal::new(13993, 2)),
            (Decimal::ZERO, 12, Decimal::ZERO),
            (Decimal::new(1, 1), 3, Decimal::new(3, 1)),
        ];
        for (unit_price, quantity, expected) in cases {
            let request = ValidOrderRequest {
                user_id: 1,
                part_id: 1,
                quantity,
            };
            let order = NewOrder::priced(&request, &snapshot(100, unit_price)).unwrap();
            assert_eq!(order.total_price, expected);
            assert_eq!(order.total_price, order.unit_price * Decimal::from(order.quantity));
        }
    }

    #[test]
    fn test_total_overflow_is_refused() {
        let request = ValidOrderRequest {
            user_id: 1,
            part_id: 1,
            quantity: u64::MAX,
        };
        assert!(NewOrder::priced(&request, &snapshot(u64::MAX, Decimal::MAX)).is_none());
    }

    #[test]
    fn test_order_json_shape() {
        let order = NewOrder {
            user_id: 1,
            part_id: 2,
            quantity: 3,
            unit_price: Decimal::from(10),
            total_price: Decimal::from(30),
        }
        .into_order(9);

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["order_id"], 9);
        assert_eq!(json["unit_price"].as_f64(), Some(10.0));
        assert_eq!(json["total_price"].as_f64(), Some(30.0));
        assert_eq!(json["status"], "created");
    }
}
