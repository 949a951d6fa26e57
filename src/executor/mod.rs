pub mod apply;
pub mod retry;

pub use apply::{ApplyStatus, ApplySummary, Executor, ResourceResult};
pub use retry::{with_retry, RetryPolicy};
