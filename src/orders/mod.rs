//! Orders subsystem.
//!
//! # Data Flow
//! ```text
//! API layer
//!     → workflow.rs (validate → guarded parts lookup → stock check)
//!     → store.rs (id assignment + insert)
//!     → Order | WorkflowError (error.rs)
//! ```

pub mod error;
pub mod store;
pub mod types;
pub mod workflow;

pub use error::{ErrorKind, WorkflowError};
pub use store::{OrderStore, StoreError};
pub use types::{CreateOrderRequest, NewOrder, Order, OrderStatus};
pub use workflow::OrderWorkflow;
