// ============================================================================
// Order Domain - Business Logic for the Order Aggregate
// ============================================================================
//
// This module contains ALL order-specific code:
// - Value objects (OrderItem, OrderStatus, PaymentStatus)
// - Commands (CreateOrderRequest and its validation)
// - Events (integration event kinds on the order-events topic)
// - Errors (OrderError enum)
// - Aggregate (Order with its transition rules)
// - Builder (request -> pending aggregate, via the inventory gateway)
// - Service (the creation workflow and lifecycle updates)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod builder;
pub mod service;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use builder::*;
pub use service::*;
