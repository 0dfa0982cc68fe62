// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// The order aggregate and the workflow around it live here, separate from
// the transport, storage and messaging layers.
//
// ============================================================================

pub mod order;
