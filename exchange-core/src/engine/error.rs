use thiserror::Error;

/// Represents possible errors when trying to cancel an order (§4.2 `cancel`).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelError {
    /// No order with this `order_id` has ever been admitted.
    #[error("order not found")]
    Unknown,
    /// The order exists but is already terminal (Filled, Canceled, or Rejected).
    #[error("order is not cancellable")]
    NotCancellable,
}
