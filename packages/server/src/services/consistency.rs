use std::sync::Arc;
use std::time::Duration;

use common::judging::SubmissionId;
use tracing::{error, info, warn};

use crate::store::{ResultStore, StoreError};

/// Run the duplicate-valid-judging scan as a background task.
pub async fn run_consistency_monitor(store: Arc<dyn ResultStore>, scan_interval_secs: u64) {
    info!(scan_interval_secs, "Starting judging consistency monitor");

    let mut interval = tokio::time::interval(Duration::from_secs(scan_interval_secs.max(1)));

    loop {
        interval.tick().await;

        if let Err(e) = scan(store.as_ref()).await {
            error!(error = %e, "Judging consistency scan failed");
        }
    }
}

/// Warn about every submission with more than one valid judging and return them.
pub async fn scan(store: &dyn ResultStore) -> Result<Vec<SubmissionId>, StoreError> {
    let inconsistent = store.submissions_with_multiple_valid_judgings().await?;
    for &submission_id in &inconsistent {
        warn!(submission_id, "Submission has more than one valid judging");
    }
    Ok(inconsistent)
}
