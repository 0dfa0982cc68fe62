// ============================================================================
// Order Events - integration events on the order-events topic
// ============================================================================
//
// The payload of every event is the full order document in the platform
// wire format; the message key tells consumers what happened.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEventKind {
    Created,
    StatusUpdated,
    PaymentUpdated,
}

impl OrderEventKind {
    /// Message key on the order-events topic.
    pub fn key(&self) -> &'static str {
        match self {
            OrderEventKind::Created => "order.created",
            OrderEventKind::StatusUpdated => "order.status.updated",
            OrderEventKind::PaymentUpdated => "order.payment.updated",
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
