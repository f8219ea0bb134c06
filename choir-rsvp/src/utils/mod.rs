//! Scheduling utilities for outbound spreadsheet calls

pub mod request_queue;
pub mod retry;

pub use request_queue::{QueueConfig, RequestQueue};
pub use retry::{do_async_operation_with_retry, RetryPolicy, RetryState};
