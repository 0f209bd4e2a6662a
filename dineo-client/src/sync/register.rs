use shared::order::OrderStatus;

/// Monotone status register
///
/// Holds the displayed status. A candidate is adopted only when it is
/// strictly later in the lifecycle; equal or earlier candidates are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRegister {
    current: OrderStatus,
}

impl StatusRegister {
    pub fn new(floor: OrderStatus) -> Self {
        Self { current: floor }
    }

    pub fn current(&self) -> OrderStatus {
        self.current
    }

    /// Offer a candidate; returns `true` only if the register advanced
    pub fn apply(&mut self, candidate: OrderStatus) -> bool {
        if candidate > self.current {
            self.current = candidate;
            true
        } else {
            false
        }
    }
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new(OrderStatus::Received)
    }
}
