//! Scheduled, retried access to the spreadsheet backend
//!
//! Every call is composed as `retry(|| queue.add(|| transport_call()))`: each
//! attempt re-enters the shared queue, so retries also respect the
//! concurrency bound and dispatch delay.

use std::sync::Arc;

use choir_common::cell::Row;
use choir_common::Result;

use super::sheets_client::SheetsBackend;
use crate::utils::{do_async_operation_with_retry, RequestQueue, RetryPolicy};

pub struct SheetsGateway {
    backend: Arc<dyn SheetsBackend>,
    queue: Arc<RequestQueue>,
    retry_policy: RetryPolicy,
}

impl SheetsGateway {
    pub fn new(
        backend: Arc<dyn SheetsBackend>,
        queue: Arc<RequestQueue>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            queue,
            retry_policy,
        }
    }

    pub async fn read_rows(&self, range: &str) -> Result<Vec<Row>> {
        let operation_name = format!("read {}", range);
        do_async_operation_with_retry(&operation_name, &self.retry_policy, || {
            let backend = Arc::clone(&self.backend);
            let range = range.to_string();
            self.queue
                .add(move || async move { backend.get_values(&range).await })
        })
        .await
    }

    pub async fn append_row(&self, range: &str, row: Row) -> Result<()> {
        let operation_name = format!("append {}", range);
        do_async_operation_with_retry(&operation_name, &self.retry_policy, || {
            let backend = Arc::clone(&self.backend);
            let range = range.to_string();
            let row = row.clone();
            self.queue
                .add(move || async move { backend.append_row(&range, row).await })
        })
        .await
    }
}
